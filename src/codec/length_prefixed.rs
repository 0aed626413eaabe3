//! Length-prefixed framing backed by `tokio_util`'s `LengthDelimitedCodec`.
//!
//! Each frame carries a 4-byte big-endian length header followed by the
//! payload.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, LengthDelimitedCodec};

use super::{
    clamp_frame_length,
    error::{CodecError, FramingError},
};

/// Length prefix header size (4 bytes for big-endian u32).
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Splitter for length-prefixed frames.
#[derive(Debug)]
pub struct LengthPrefixedFraming {
    max_frame_length: usize,
    inner: LengthDelimitedCodec,
    pending: BytesMut,
}

impl LengthPrefixedFraming {
    /// Construct a framer with a maximum payload length.
    ///
    /// The value is clamped to
    /// [`MIN_FRAME_LENGTH`](super::MIN_FRAME_LENGTH)..=[`MAX_FRAME_LENGTH`](super::MAX_FRAME_LENGTH).
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        let max_frame_length = clamp_frame_length(max_frame_length);
        Self {
            max_frame_length,
            inner: LengthDelimitedCodec::builder()
                .max_frame_length(max_frame_length)
                .new_codec(),
            pending: BytesMut::new(),
        }
    }

    /// Return the maximum payload length accepted by this framer.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }

    /// Prefix `payload` with its big-endian length.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::OversizedFrame`] if the payload exceeds the
    /// maximum frame length.
    pub fn format(&self, payload: &[u8]) -> Result<Bytes, CodecError> {
        let oversized = || FramingError::OversizedFrame {
            size: payload.len(),
            max: self.max_frame_length,
        };
        if payload.len() > self.max_frame_length {
            return Err(oversized().into());
        }
        let len = u32::try_from(payload.len()).map_err(|_| oversized())?;
        let mut out = BytesMut::with_capacity(LENGTH_HEADER_SIZE + payload.len());
        out.put_u32(len);
        out.extend_from_slice(payload);
        Ok(out.freeze())
    }

    /// Consume `chunk` and append every complete frame payload to `frames`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Io`] when a header announces a frame larger than
    /// the configured maximum. Frames that precede the bad header in the same
    /// chunk are still appended to `frames`. The stream cannot be
    /// resynchronised after the error, so callers should treat it as fatal.
    pub fn process(&mut self, chunk: &[u8], frames: &mut Vec<Bytes>) -> Result<(), CodecError> {
        self.pending.extend_from_slice(chunk);
        while let Some(frame) = self.inner.decode(&mut self.pending)? {
            frames.push(frame.freeze());
        }
        Ok(())
    }

    /// Number of buffered bytes not yet forming a complete frame.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.pending.len() }
}
