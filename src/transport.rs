//! Socket ownership and raw I/O.
//!
//! [`Transport`] splits a stream into a [`TransportReader`], which owns the
//! fixed receive buffer, and a [`TransportWriter`]. The halves are driven by
//! separate tasks, so a read and a write can be in flight at the same time.
//! Neither half retries: every failure is reported once as a
//! [`TransportError`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

mod socket;

pub use socket::{SocketOptions, connect};

use crate::error::TransportError;

/// Default size of the receive buffer in bytes.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 8 * 1024;
/// Smallest receive buffer a session will allocate.
pub const MIN_RECEIVE_BUFFER_SIZE: usize = 64;
/// Largest receive buffer a session will allocate (16 MiB).
pub const MAX_RECEIVE_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Trait alias for stream types a session can drive.
pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}
impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// A connected stream ready to be split into its two directions.
#[derive(Debug)]
pub struct Transport<T> {
    reader: TransportReader<T>,
    writer: TransportWriter<T>,
}

impl<T: ClientStream> Transport<T> {
    /// Wrap `stream`, allocating a receive buffer of `buffer_size` bytes.
    ///
    /// The size is clamped to
    /// [`MIN_RECEIVE_BUFFER_SIZE`]..=[`MAX_RECEIVE_BUFFER_SIZE`].
    #[must_use]
    pub fn new(stream: T, buffer_size: usize) -> Self {
        let buffer_size = buffer_size.clamp(MIN_RECEIVE_BUFFER_SIZE, MAX_RECEIVE_BUFFER_SIZE);
        let (read, write) = tokio::io::split(stream);
        Self {
            reader: TransportReader {
                read,
                buffer: vec![0; buffer_size].into_boxed_slice(),
            },
            writer: TransportWriter {
                write,
                closed: false,
            },
        }
    }

    /// Separate the read and write directions.
    #[must_use]
    pub fn into_parts(self) -> (TransportReader<T>, TransportWriter<T>) {
        (self.reader, self.writer)
    }
}

/// Read direction of a [`Transport`].
#[derive(Debug)]
pub struct TransportReader<T> {
    read: ReadHalf<T>,
    buffer: Box<[u8]>,
}

impl<T: ClientStream> TransportReader<T> {
    /// Await one read into the receive buffer and return the filled part.
    ///
    /// The returned slice is only valid until the next call; the buffer is
    /// reused for every read.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::RemoteClosed`] on a zero-length read and
    /// [`TransportError::Io`] if the read fails.
    pub async fn read(&mut self) -> Result<&[u8], TransportError> {
        let read = self.read.read(&mut self.buffer).await?;
        if read == 0 {
            return Err(TransportError::RemoteClosed);
        }
        Ok(&self.buffer[..read])
    }

    /// Size of the receive buffer in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize { self.buffer.len() }
}

/// Write direction of a [`Transport`].
#[derive(Debug)]
pub struct TransportWriter<T> {
    write: WriteHalf<T>,
    closed: bool,
}

impl<T: ClientStream> TransportWriter<T> {
    /// Write one formatted buffer in full and flush it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::AlreadyDisconnected`] once
    /// [`close`](Self::close) has run and [`TransportError::Io`] if the
    /// write fails.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::AlreadyDisconnected);
        }
        self.write.write_all(bytes).await?;
        self.write.flush().await?;
        Ok(())
    }

    /// Shut down the write direction. Errors are logged and otherwise
    /// ignored. Later calls do nothing.
    pub async fn close(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        if let Err(err) = self.write.shutdown().await {
            tracing::debug!(error = %err, "write shutdown failed");
        }
    }
}
