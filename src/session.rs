//! Single-connection client session.
//!
//! A [`ClientSession`] owns one connection at most. Once connected, a read
//! loop task awaits one read at a time, hands each chunk to the session's
//! [`FramingProtocol`], and publishes the resulting messages on the
//! session's [`EventBus`]. A write loop task drains queued frames in FIFO
//! order. Every way a connection can end (local disconnect, remote close,
//! read or write failure, framing violation) funnels through one atomic
//! `Connected → Disconnected` transition, and the read loop publishes exactly
//! one disconnect event afterwards.

use std::{
    fmt,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

mod builder;
mod state;
mod tasks;

pub use builder::{SessionBuilder, SessionConfig};
pub use state::SessionState;
use state::StateCell;

use crate::{
    codec::{CodecError, FramingProtocol, ProtocolConfig, ProtocolKind, TextEncoding},
    error::{ConfigError, ConnectError, DisconnectReason},
    events::{EventBus, ListenerId},
    metrics,
    transport::{self, ClientStream, Transport},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a single-use client connection.
///
/// Handles are cheap to clone and may be captured by listeners, for example
/// to reply from inside [`on_message`](Self::on_message). Dropping handles
/// does not close the connection; call [`disconnect`](Self::disconnect).
///
/// # Examples
///
/// ```no_run
/// use wireline::{ClientSession, codec::{ProtocolConfig, TextEncoding}};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), wireline::ConnectError> {
/// let session = ClientSession::new();
/// session.on_message(|msg| println!("received {msg}"));
/// session.on_disconnected(|reason| eprintln!("gone: {reason}"));
/// session
///     .connect("127.0.0.1", 7000, ProtocolConfig::lines(), TextEncoding::Utf8)
///     .await?;
/// assert!(session.send("hello"));
/// session.disconnect();
/// session.closed().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    state: StateCell,
    events: EventBus,
    framing: Mutex<Option<FramingProtocol>>,
    outbound: OnceLock<mpsc::UnboundedSender<Bytes>>,
    peer_addr: OnceLock<SocketAddr>,
    reason: Mutex<Option<DisconnectReason>>,
    shutdown: CancellationToken,
    // Cancelled once the disconnect event has been published.
    terminated: CancellationToken,
}

impl SessionInner {
    /// Perform the `Connected → Disconnected` transition.
    ///
    /// Returns `false` if another path already ended the connection (or it
    /// never started); `reason` is then discarded.
    fn begin_disconnect(&self, reason: DisconnectReason) -> bool {
        if !self
            .state
            .transition(SessionState::Connected, SessionState::Disconnected)
        {
            return false;
        }
        self.events.log(format_args!("disconnecting: {reason}"));
        *lock(&self.reason) = Some(reason);
        self.shutdown.cancel();
        true
    }
}

impl Default for ClientSession {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("state", &self.state())
            .field("peer_addr", &self.peer_addr())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ClientSession {
    /// Create an idle session with default settings.
    #[must_use]
    pub fn new() -> Self { Self::with_config(SessionConfig::default()) }

    /// Start building a session with custom settings.
    #[must_use]
    pub fn builder() -> SessionBuilder { SessionBuilder::new() }

    fn with_config(config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                state: StateCell::new(),
                events: EventBus::default(),
                framing: Mutex::new(None),
                outbound: OnceLock::new(),
                peer_addr: OnceLock::new(),
                reason: Mutex::new(None),
                shutdown: CancellationToken::new(),
                terminated: CancellationToken::new(),
            }),
        }
    }

    /// Settings this session was built with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig { &self.inner.config }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState { self.inner.state.load() }

    /// Returns `true` while the connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.state() == SessionState::Connected }

    /// Remote address of a TCP connection.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> { self.inner.peer_addr.get().copied() }

    /// The session's event registries.
    #[must_use]
    pub fn events(&self) -> &EventBus { &self.inner.events }

    /// Register a listener for complete, decoded messages.
    pub fn on_message<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.events.messages().add(listener)
    }

    /// Register a listener for every chunk read, before framing.
    pub fn on_raw_bytes<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Bytes) + Send + Sync + 'static,
    {
        self.inner.events.raw_bytes().add(listener)
    }

    /// Register a listener for the end of the connection.
    pub fn on_disconnected<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&DisconnectReason) + Send + Sync + 'static,
    {
        self.inner.events.disconnects().add(listener)
    }

    /// Register a listener for diagnostic trace lines.
    pub fn on_log<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.events.logs().add(listener)
    }

    /// Remove a listener registered through any of the `on_*` methods.
    pub fn remove_listener(&self, id: ListenerId) -> bool { self.inner.events.remove(id) }

    /// Kind of the configured framing protocol, if any.
    #[must_use]
    pub fn protocol_kind(&self) -> Option<ProtocolKind> {
        lock(&self.inner.framing).as_ref().map(FramingProtocol::kind)
    }

    /// Text encoding of the configured framing protocol, if any.
    #[must_use]
    pub fn encoding(&self) -> Option<TextEncoding> {
        lock(&self.inner.framing).as_ref().map(FramingProtocol::encoding)
    }

    /// Return the delimiter of a delimited protocol.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] before a connect attempt and
    /// [`ConfigError::NotDelimited`] for other protocols.
    pub fn delimiter(&self) -> Result<Vec<u8>, ConfigError> {
        lock(&self.inner.framing)
            .as_ref()
            .ok_or(ConfigError::NotConfigured)?
            .delimiter()
            .map(<[u8]>::to_vec)
    }

    /// Replace the delimiter of a delimited protocol.
    ///
    /// The change applies to the next chunk read and the next message sent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] before a connect attempt,
    /// [`ConfigError::NotDelimited`] for other protocols and
    /// [`ConfigError::EmptyDelimiter`] for an empty delimiter.
    pub fn set_delimiter(&self, delimiter: impl Into<Vec<u8>>) -> Result<(), ConfigError> {
        lock(&self.inner.framing)
            .as_mut()
            .ok_or(ConfigError::NotConfigured)?
            .set_delimiter(delimiter)
    }

    /// Connect to `host:port` and start delivering messages.
    ///
    /// Suspends until the TCP handshake completes. On failure the session
    /// returns to [`SessionState::Idle`] and no disconnect event fires.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Config`] for an invalid protocol
    /// configuration, [`ConnectError::AlreadyUsed`] if the session is not
    /// idle, [`ConnectError::Aborted`] if [`disconnect`](Self::disconnect)
    /// was called meanwhile, and [`ConnectError::Io`] or
    /// [`ConnectError::NoAddresses`] when the connection cannot be made.
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
        protocol: ProtocolConfig,
        encoding: TextEncoding,
    ) -> Result<(), ConnectError> {
        self.begin_connect(protocol, encoding)?;
        let peer = format!("{host}:{port}");
        let span = info_span!("session.connect", peer.addr = %peer);
        async {
            let stream =
                match transport::connect(host, port, self.inner.config.socket_options()).await {
                    Ok(stream) => stream,
                    Err(err) => {
                        warn!(error = %err, "connect failed");
                        self.inner
                            .state
                            .transition(SessionState::Connecting, SessionState::Idle);
                        return Err(err);
                    }
                };
            if let Ok(addr) = stream.peer_addr() {
                let _ = self.inner.peer_addr.set(addr);
            }
            self.start(stream)?;
            info!("connection established");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Drive an already-connected stream.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Config`] for an invalid protocol configuration
    /// and [`ConnectError::AlreadyUsed`] if the session is not idle.
    pub fn connect_stream<T: ClientStream>(
        &self,
        stream: T,
        protocol: ProtocolConfig,
        encoding: TextEncoding,
    ) -> Result<(), ConnectError> {
        self.begin_connect(protocol, encoding)?;
        self.start(stream)
    }

    fn begin_connect(
        &self,
        protocol: ProtocolConfig,
        encoding: TextEncoding,
    ) -> Result<(), ConnectError> {
        let framing = FramingProtocol::new(protocol, encoding)?;
        if !self
            .inner
            .state
            .transition(SessionState::Idle, SessionState::Connecting)
        {
            return Err(ConnectError::AlreadyUsed);
        }
        *lock(&self.inner.framing) = Some(framing);
        Ok(())
    }

    fn start<T: ClientStream>(&self, stream: T) -> Result<(), ConnectError> {
        let (reader, writer) =
            Transport::new(stream, self.inner.config.receive_buffer_size()).into_parts();
        let (tx, rx) = mpsc::unbounded_channel();
        if self.inner.outbound.set(tx).is_err() {
            return Err(ConnectError::AlreadyUsed);
        }
        if !self
            .inner
            .state
            .transition(SessionState::Connecting, SessionState::Connected)
        {
            return Err(ConnectError::Aborted);
        }
        metrics::inc_connected();
        self.inner.events.log(format_args!("connected"));
        tokio::spawn(tasks::write_loop(writer, rx, Arc::clone(&self.inner)));
        tokio::spawn(tasks::read_loop(reader, Arc::clone(&self.inner)));
        Ok(())
    }

    /// Encode `text`, frame it and queue it for writing.
    ///
    /// Returns `false` without writing anything when the session is not
    /// connected or the framing protocol rejects the payload. `true` means
    /// the write was issued; a later write failure ends the connection
    /// through the disconnect event.
    pub fn send(&self, text: &str) -> bool { self.enqueue(|framing| framing.format_text(text)) }

    /// Frame raw `payload` bytes and queue them for writing.
    ///
    /// See [`send`](Self::send) for the meaning of the return value.
    pub fn send_bytes(&self, payload: &[u8]) -> bool {
        self.enqueue(|framing| framing.format(payload))
    }

    fn enqueue(&self, format: impl FnOnce(&FramingProtocol) -> Result<Bytes, CodecError>) -> bool {
        if !self.is_connected() {
            return false;
        }
        let Some(outbound) = self.inner.outbound.get() else {
            return false;
        };
        let formatted = lock(&self.inner.framing).as_ref().map(format);
        let frame = match formatted {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                warn!(error = %err, "outgoing message rejected by framing protocol");
                self.inner.events.log(format_args!("send rejected: {err}"));
                return false;
            }
            None => return false,
        };
        if outbound.send(frame).is_err() {
            return false;
        }
        metrics::inc_messages_sent();
        true
    }

    /// End the connection.
    ///
    /// Idempotent and safe to call from inside a listener. On a connected
    /// session the disconnect event follows shortly, published by the read
    /// loop once the chunk it is processing has been delivered; await
    /// [`closed`](Self::closed) to observe it. An idle or connecting
    /// session becomes [`SessionState::Disconnected`] without an event.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        loop {
            match inner.state.load() {
                SessionState::Disconnected => return,
                SessionState::Connected => {
                    if inner.begin_disconnect(DisconnectReason::Requested) {
                        return;
                    }
                }
                from @ (SessionState::Idle | SessionState::Connecting) => {
                    if inner.state.transition(from, SessionState::Disconnected) {
                        inner.shutdown.cancel();
                        inner.terminated.cancel();
                        return;
                    }
                }
            }
        }
    }

    /// Resolve once the session has fully ended.
    ///
    /// For a connection this is after the disconnect event was published. A
    /// session that never connected resolves after
    /// [`disconnect`](Self::disconnect).
    pub async fn closed(&self) { self.inner.terminated.cancelled().await; }
}
