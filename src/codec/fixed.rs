//! Fixed-length framing: every message occupies exactly `size` bytes.

use bytes::{Bytes, BytesMut};

use super::error::{CodecError, FramingError};
use crate::error::ConfigError;

/// Splitter for fixed-size messages.
#[derive(Clone, Debug)]
pub struct FixedLengthFraming {
    size: usize,
    pending: BytesMut,
}

impl FixedLengthFraming {
    /// Create a framer producing `size`-byte messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroFrameLength`] if `size` is zero.
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroFrameLength);
        }
        Ok(Self {
            size,
            pending: BytesMut::with_capacity(size),
        })
    }

    /// Configured message size in bytes.
    #[must_use]
    pub fn size(&self) -> usize { self.size }

    /// Check that `payload` fills exactly one frame and copy it out.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::LengthMismatch`] when the payload length
    /// differs from the configured size.
    pub fn format(&self, payload: &[u8]) -> Result<Bytes, CodecError> {
        if payload.len() != self.size {
            return Err(FramingError::LengthMismatch {
                expected: self.size,
                actual: payload.len(),
            }
            .into());
        }
        Ok(Bytes::copy_from_slice(payload))
    }

    /// Consume `chunk` and return every complete frame.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.pending.extend_from_slice(chunk);
        let mut frames = Vec::with_capacity(self.pending.len() / self.size);
        while self.pending.len() >= self.size {
            frames.push(self.pending.split_to(self.size).freeze());
        }
        frames
    }

    /// Number of bytes belonging to an incomplete frame.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.pending.len() }
}
