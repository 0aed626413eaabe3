//! Delimiter-based framing.
//!
//! Messages are separated by a caller-configured byte sequence. Because a
//! delimiter may straddle two physical reads, the framer keeps the partial
//! message in an accumulator together with the offset from which the next
//! scan resumes.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::ConfigError;

/// Stateful splitter for delimiter-terminated messages.
///
/// # Examples
///
/// ```
/// use wireline::codec::DelimitedFraming;
///
/// let mut framing = DelimitedFraming::new(b"\r\n".to_vec()).expect("non-empty delimiter");
/// assert!(framing.process(b"hello\r").is_empty());
/// let frames = framing.process(b"\nworld\r\n");
/// assert_eq!(frames, vec![&b"hello"[..], &b"world"[..]]);
/// ```
#[derive(Clone, Debug)]
pub struct DelimitedFraming {
    delimiter: Vec<u8>,
    pending: BytesMut,
    // Offset into `pending` before which no delimiter can start.
    scan_from: usize,
}

impl DelimitedFraming {
    /// Create a framer for `delimiter`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyDelimiter`] if `delimiter` is empty.
    pub fn new(delimiter: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let delimiter = validate(delimiter.into())?;
        Ok(Self {
            delimiter,
            pending: BytesMut::new(),
            scan_from: 0,
        })
    }

    /// Return the configured delimiter.
    #[must_use]
    pub fn delimiter(&self) -> &[u8] { &self.delimiter }

    /// Replace the delimiter.
    ///
    /// Pending bytes are kept and rescanned with the new delimiter on the
    /// next call to [`process`](Self::process).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyDelimiter`] if `delimiter` is empty; the
    /// previous delimiter stays in effect.
    pub fn set_delimiter(&mut self, delimiter: impl Into<Vec<u8>>) -> Result<(), ConfigError> {
        self.delimiter = validate(delimiter.into())?;
        self.scan_from = 0;
        Ok(())
    }

    /// Append the delimiter to `payload`.
    #[must_use]
    pub fn format(&self, payload: &[u8]) -> Bytes {
        let mut out = BytesMut::with_capacity(payload.len() + self.delimiter.len());
        out.extend_from_slice(payload);
        out.extend_from_slice(&self.delimiter);
        out.freeze()
    }

    /// Consume `chunk` and return every message it completes, in stream
    /// order, without their delimiters.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.pending.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(at) = self.find_delimiter() {
            frames.push(self.pending.split_to(at).freeze());
            self.pending.advance(self.delimiter.len());
            self.scan_from = 0;
        }
        frames
    }

    /// Number of bytes waiting for a delimiter.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.pending.len() }

    fn find_delimiter(&mut self) -> Option<usize> {
        let width = self.delimiter.len();
        let window = self.pending.get(self.scan_from..)?;
        let found = window
            .windows(width)
            .position(|candidate| candidate == self.delimiter.as_slice())
            .map(|offset| offset + self.scan_from);
        if found.is_none() && self.pending.len() >= width {
            // A delimiter completed by the next chunk starts after this point.
            self.scan_from = self.pending.len() + 1 - width;
        }
        found
    }
}

fn validate(delimiter: Vec<u8>) -> Result<Vec<u8>, ConfigError> {
    if delimiter.is_empty() {
        return Err(ConfigError::EmptyDelimiter);
    }
    Ok(delimiter)
}
