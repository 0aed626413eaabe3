//! Error types for the framing layer.
//!
//! [`FramingError`] covers wire-level frame boundary problems detected while
//! formatting or splitting a stream. [`CodecError`] wraps it together with
//! I/O errors surfaced by the underlying `tokio_util` codecs.

use std::io;

use thiserror::Error;

/// Framing-level errors occurring during frame boundary detection or
/// formatting.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Frame length exceeds the configured maximum.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Size of the offending frame.
        size: usize,
        /// Maximum allowed frame size.
        max: usize,
    },

    /// Payload does not match the fixed frame length.
    #[error("frame length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Configured frame length.
        expected: usize,
        /// Length of the payload that was supplied.
        actual: usize,
    },
}

/// Top-level framing error taxonomy.
///
/// # Examples
///
/// ```
/// use wireline::codec::{CodecError, FramingError};
///
/// let err = CodecError::Framing(FramingError::OversizedFrame {
///     size: 2000,
///     max: 1024,
/// });
/// assert_eq!(err.to_string(), "framing error: frame exceeds max length: 2000 > 1024");
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// Framing layer error.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Error reported by an inner `tokio_util` codec.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<CodecError> for io::Error {
    fn from(value: CodecError) -> Self {
        match value {
            CodecError::Io(err) => err,
            CodecError::Framing(err) => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}
