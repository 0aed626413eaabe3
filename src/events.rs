//! Observable session events.
//!
//! Each event kind has its own [`ListenerRegistry`]: an ordered list of
//! callbacks held behind an [`ArcSwap`]. Registration and removal replace the
//! list copy-on-write, while dispatch iterates a snapshot loaded up front.
//! Listeners may therefore add or remove listeners, themselves included,
//! while being dispatched; the change takes effect from the next event.

use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use arc_swap::ArcSwap;
use bytes::Bytes;
use log::warn;

use crate::{error::DisconnectReason, panic::format_panic};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle identifying a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self { Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed)) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered callbacks for one event kind.
pub struct ListenerRegistry<T: ?Sized + 'static> {
    name: &'static str,
    listeners: ArcSwap<Vec<(ListenerId, Listener<T>)>>,
}

impl<T: ?Sized + 'static> ListenerRegistry<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Append `listener`; it runs after every listener registered before it.
    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        let listener: Listener<T> = Arc::new(listener);
        self.listeners.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push((id, Arc::clone(&listener)));
            next
        });
        id
    }

    /// Remove the listener registered as `id`.
    ///
    /// Returns `false` if no such listener is registered here.
    pub fn remove(&self, id: ListenerId) -> bool {
        let previous = self.listeners.rcu(|current| {
            current
                .iter()
                .filter(|(existing, _)| *existing != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|(existing, _)| *existing == id)
    }

    /// Remove every listener.
    pub fn clear(&self) { self.listeners.store(Arc::new(Vec::new())); }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize { self.listeners.load().len() }

    /// Returns `true` when nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.listeners.load().is_empty() }

    /// Invoke every listener with `event`, in registration order.
    ///
    /// A panicking listener is logged and skipped; the remaining listeners
    /// still run. Returns the number of listeners invoked.
    pub fn dispatch(&self, event: &T) -> usize {
        let snapshot = self.listeners.load_full();
        for (id, listener) in snapshot.iter() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                let panic_msg = format_panic(payload.as_ref());
                // Emit via both `log` and `tracing` for tests that capture either.
                warn!(
                    "event listener panicked: registry={}, listener={id}, panic={panic_msg}",
                    self.name
                );
                tracing::warn!(registry = self.name, listener = %id, panic = %panic_msg, "event listener panicked");
            }
        }
        snapshot.len()
    }
}

impl<T: ?Sized + 'static> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("name", &self.name)
            .field("listeners", &self.len())
            .finish()
    }
}

/// The four observable outputs of a session.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use wireline::events::EventBus;
///
/// let bus = EventBus::default();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let id = bus.messages().add(move |msg: &str| sink.lock().expect("lock").push(msg.to_owned()));
/// bus.messages().dispatch("hello");
/// assert!(bus.remove(id));
/// bus.messages().dispatch("ignored");
/// assert_eq!(*seen.lock().expect("lock"), ["hello"]);
/// ```
#[derive(Debug)]
pub struct EventBus {
    messages: ListenerRegistry<str>,
    raw_bytes: ListenerRegistry<Bytes>,
    disconnects: ListenerRegistry<DisconnectReason>,
    logs: ListenerRegistry<str>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self {
            messages: ListenerRegistry::new("message"),
            raw_bytes: ListenerRegistry::new("raw_bytes"),
            disconnects: ListenerRegistry::new("disconnect"),
            logs: ListenerRegistry::new("log"),
        }
    }
}

impl EventBus {
    /// Listeners for complete, decoded messages.
    #[must_use]
    pub fn messages(&self) -> &ListenerRegistry<str> { &self.messages }

    /// Listeners for every chunk read from the socket, before framing.
    ///
    /// Each listener receives an owned copy of the chunk; the session's
    /// receive buffer is never exposed.
    #[must_use]
    pub fn raw_bytes(&self) -> &ListenerRegistry<Bytes> { &self.raw_bytes }

    /// Listeners for the single end-of-connection event.
    #[must_use]
    pub fn disconnects(&self) -> &ListenerRegistry<DisconnectReason> { &self.disconnects }

    /// Listeners for human-readable trace lines. Diagnostic only.
    #[must_use]
    pub fn logs(&self) -> &ListenerRegistry<str> { &self.logs }

    /// Remove the listener registered as `id` from whichever registry
    /// holds it.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.messages.remove(id)
            || self.raw_bytes.remove(id)
            || self.disconnects.remove(id)
            || self.logs.remove(id)
    }

    /// Emit a trace line through `tracing` and the log channel.
    pub(crate) fn log(&self, line: fmt::Arguments<'_>) {
        tracing::trace!("{line}");
        if !self.logs.is_empty() {
            self.logs.dispatch(&line.to_string());
        }
    }
}

#[cfg(test)]
mod tests;
