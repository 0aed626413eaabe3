//! Session configuration.

use super::ClientSession;
use crate::transport::{
    DEFAULT_RECEIVE_BUFFER_SIZE,
    MAX_RECEIVE_BUFFER_SIZE,
    MIN_RECEIVE_BUFFER_SIZE,
    SocketOptions,
};

/// Settings fixed for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    receive_buffer_size: usize,
    socket_options: SocketOptions,
}

impl SessionConfig {
    /// Size of the receive buffer allocated on connect.
    #[must_use]
    pub const fn receive_buffer_size(&self) -> usize { self.receive_buffer_size }

    /// Socket options applied to TCP connections.
    #[must_use]
    pub const fn socket_options(&self) -> &SocketOptions { &self.socket_options }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            socket_options: SocketOptions::default(),
        }
    }
}

/// Builder for [`ClientSession`].
///
/// # Examples
///
/// ```
/// use wireline::{session::SessionBuilder, transport::SocketOptions};
///
/// let session = SessionBuilder::new()
///     .receive_buffer_size(4096)
///     .socket_options(SocketOptions::default().nodelay(true))
///     .build();
/// assert_eq!(session.config().receive_buffer_size(), 4096);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create a builder with default settings.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Set the receive buffer size, clamped to
    /// [`MIN_RECEIVE_BUFFER_SIZE`]..=[`MAX_RECEIVE_BUFFER_SIZE`].
    #[must_use]
    pub fn receive_buffer_size(mut self, size: usize) -> Self {
        self.config.receive_buffer_size = size.clamp(MIN_RECEIVE_BUFFER_SIZE, MAX_RECEIVE_BUFFER_SIZE);
        self
    }

    /// Set the socket options used by [`ClientSession::connect`].
    #[must_use]
    pub fn socket_options(mut self, options: SocketOptions) -> Self {
        self.config.socket_options = options;
        self
    }

    /// Create an idle session.
    #[must_use]
    pub fn build(self) -> ClientSession { ClientSession::with_config(self.config) }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1, MIN_RECEIVE_BUFFER_SIZE)]
    #[case(4096, 4096)]
    #[case(MAX_RECEIVE_BUFFER_SIZE + 1, MAX_RECEIVE_BUFFER_SIZE)]
    fn receive_buffer_size_is_clamped(#[case] input: usize, #[case] expected: usize) {
        let session = SessionBuilder::new().receive_buffer_size(input).build();
        assert_eq!(session.config().receive_buffer_size(), expected);
    }

    #[test]
    fn defaults_match_session_config() {
        let session = SessionBuilder::new().build();
        assert_eq!(*session.config(), SessionConfig::default());
        assert_eq!(
            session.config().receive_buffer_size(),
            DEFAULT_RECEIVE_BUFFER_SIZE
        );
    }
}
