//! Session lifecycle state.

use std::{
    fmt,
    sync::atomic::{AtomicU8, Ordering},
};

/// Lifecycle of a [`ClientSession`](super::ClientSession).
///
/// `Idle → Connecting → Connected → Disconnected`. `Disconnected` is
/// terminal; a failed connect attempt returns to `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    /// Created, never connected.
    Idle = 0,
    /// Connection establishment in progress.
    Connecting = 1,
    /// Connected; reads and writes are active.
    Connected = 2,
    /// Terminal.
    Disconnected = 3,
}

impl SessionState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        })
    }
}

/// Atomic holder for a [`SessionState`].
#[derive(Debug)]
pub(super) struct StateCell(AtomicU8);

impl StateCell {
    pub(super) const fn new() -> Self { Self(AtomicU8::new(SessionState::Idle as u8)) }

    pub(super) fn load(&self) -> SessionState { SessionState::from_u8(self.0.load(Ordering::Acquire)) }

    /// Move from `from` to `to`; returns `false` if the state was not `from`.
    pub(super) fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
