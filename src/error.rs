//! Error taxonomy for sessions.
//!
//! Configuration problems ([`ConfigError`]) and connection establishment
//! failures ([`ConnectError`]) are returned directly to the caller. Failures
//! after a connection is up never surface as errors: the [`TransportError`]
//! or [`CodecError`] is folded into a [`DisconnectReason`] and delivered once
//! through the disconnect event.

use std::io;

use thiserror::Error;

use crate::codec::{CodecError, ProtocolKind};

/// Invalid framing configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An empty delimiter would make every position a message boundary.
    #[error("delimiter must not be empty")]
    EmptyDelimiter,
    /// Fixed-length framing needs a positive size.
    #[error("fixed frame length must be greater than zero")]
    ZeroFrameLength,
    /// Delimiter access on a protocol that has no delimiter.
    #[error("delimiter is only available for delimited framing, protocol is {kind}")]
    NotDelimited {
        /// The protocol in use.
        kind: ProtocolKind,
    },
    /// The session has not been given a framing protocol yet.
    #[error("no framing protocol configured")]
    NotConfigured,
}

/// Errors returned by session connect operations.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The framing configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The session has already connected or been disconnected.
    #[error("session is single-use and has already been started")]
    AlreadyUsed,
    /// `disconnect` was called while the connection was being established.
    #[error("connection attempt aborted by disconnect")]
    Aborted,
    /// Host resolution produced no addresses.
    #[error("no addresses resolved for {host}:{port}")]
    NoAddresses {
        /// Host that was resolved.
        host: String,
        /// Requested port.
        port: u16,
    },
    /// Resolution, socket setup or the TCP handshake failed.
    #[error("connect failed: {0}")]
    Io(#[from] io::Error),
}

/// Low-level failures reported by the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Operation attempted on a closed connection.
    #[error("connection already disconnected")]
    AlreadyDisconnected,
    /// The peer performed an orderly close (zero-length read).
    #[error("connection closed by peer")]
    RemoteClosed,
    /// Read or write failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Why a connection ended, delivered with the disconnect event.
#[derive(Debug, Error)]
pub enum DisconnectReason {
    /// The application called `disconnect`.
    #[error("disconnect requested")]
    Requested,
    /// The peer closed the connection.
    #[error("connection closed by peer")]
    RemoteClosed,
    /// Reading from the socket failed.
    #[error("read failed: {0}")]
    ReadFailed(#[source] io::Error),
    /// Writing to the socket failed.
    #[error("write failed: {0}")]
    WriteFailed(#[source] io::Error),
    /// The peer violated the framing protocol.
    #[error("framing failed: {0}")]
    Framing(#[source] CodecError),
}

impl DisconnectReason {
    /// Fold a read-side transport failure into a reason.
    #[must_use]
    pub fn from_read(err: TransportError) -> Self {
        match err {
            TransportError::AlreadyDisconnected => Self::Requested,
            TransportError::RemoteClosed => Self::RemoteClosed,
            TransportError::Io(err) => Self::ReadFailed(err),
        }
    }

    /// Fold a write-side transport failure into a reason.
    #[must_use]
    pub fn from_write(err: TransportError) -> Self {
        match err {
            TransportError::AlreadyDisconnected => Self::Requested,
            TransportError::RemoteClosed => Self::RemoteClosed,
            TransportError::Io(err) => Self::WriteFailed(err),
        }
    }

    /// Short label suitable for metrics and structured logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::RemoteClosed => "remote_closed",
            Self::ReadFailed(_) => "read_failed",
            Self::WriteFailed(_) => "write_failed",
            Self::Framing(_) => "framing",
        }
    }

    /// Returns `true` when the connection ended because of a failure rather
    /// than an orderly close by either side.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ReadFailed(_) | Self::WriteFailed(_) | Self::Framing(_)
        )
    }
}
