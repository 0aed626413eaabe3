#![doc(html_root_url = "https://docs.rs/wireline/latest")]
//! Public API for the `wireline` library.
//!
//! `wireline` maintains a single TCP connection to a remote peer and turns
//! the raw byte stream into discrete messages. A [`ClientSession`] pairs a
//! [`Transport`](transport::Transport) with a pluggable
//! [`FramingProtocol`](codec::FramingProtocol) and publishes complete
//! messages, raw chunks, disconnects and trace lines to registered
//! listeners.

pub mod codec;
pub mod error;
pub mod events;
pub mod metrics;
pub mod panic;
pub mod session;
pub mod transport;

pub use codec::{FramingProtocol, ProtocolConfig, ProtocolKind, TextEncoding};
pub use error::{ConfigError, ConnectError, DisconnectReason, TransportError};
pub use events::{EventBus, ListenerId};
pub use session::{ClientSession, SessionBuilder, SessionConfig, SessionState};
pub use transport::SocketOptions;
