//! Pluggable framing protocols.
//!
//! A framing protocol splits an incoming byte stream into discrete messages
//! and wraps outgoing payloads for transmission. The set of protocols is
//! closed: [`ProtocolConfig`] selects one of them and
//! [`FramingProtocol::new`] validates the configuration eagerly, so an
//! unusable protocol is rejected before a connection is attempted.
//!
//! - [`DelimitedFraming`]: messages end with a caller-chosen byte sequence.
//! - [`FixedLengthFraming`]: every message has the same size.
//! - [`LengthPrefixedFraming`]: a 4-byte big-endian length precedes each message.

use std::fmt;

use bytes::Bytes;

mod delimited;
mod encoding;
pub mod error;
mod fixed;
mod length_prefixed;

pub use delimited::DelimitedFraming;
pub use encoding::TextEncoding;
pub use error::{CodecError, FramingError};
pub use fixed::FixedLengthFraming;
pub use length_prefixed::{LENGTH_HEADER_SIZE, LengthPrefixedFraming};

use crate::error::ConfigError;

/// Minimum frame length in bytes.
///
/// Length-prefixed maximums are clamped to at least this value.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Maximum frame length in bytes (16 MiB).
///
/// Length-prefixed maximums are clamped to at most this value to prevent
/// unbounded memory allocation.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Default maximum payload for length-prefixed framing.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// Identifies a framing protocol without its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    /// Delimiter-terminated messages.
    Delimited,
    /// Fixed-size messages.
    FixedLength,
    /// Length-prefixed messages.
    LengthPrefixed,
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Delimited => "delimited",
            Self::FixedLength => "fixed-length",
            Self::LengthPrefixed => "length-prefixed",
        })
    }
}

/// Caller-facing framing configuration.
///
/// # Examples
///
/// ```
/// use wireline::codec::{ProtocolConfig, ProtocolKind};
///
/// let config = ProtocolConfig::delimited(*b"\n");
/// assert_eq!(config.kind(), ProtocolKind::Delimited);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolConfig {
    /// Split on `delimiter`; outgoing payloads are suffixed with it.
    Delimited {
        /// Byte sequence marking the end of each message.
        delimiter: Vec<u8>,
    },
    /// Split into `size`-byte messages.
    FixedLength {
        /// Size of every message in bytes.
        size: usize,
    },
    /// Split on a 4-byte big-endian length prefix.
    LengthPrefixed {
        /// Largest payload accepted or produced.
        max_frame_length: usize,
    },
}

impl ProtocolConfig {
    /// Delimited framing with `delimiter`.
    #[must_use]
    pub fn delimited(delimiter: impl Into<Vec<u8>>) -> Self {
        Self::Delimited {
            delimiter: delimiter.into(),
        }
    }

    /// Newline-delimited framing.
    #[must_use]
    pub fn lines() -> Self { Self::delimited(*b"\n") }

    /// Fixed-length framing with `size`-byte messages.
    #[must_use]
    pub fn fixed_length(size: usize) -> Self { Self::FixedLength { size } }

    /// Length-prefixed framing with the given maximum payload.
    #[must_use]
    pub fn length_prefixed(max_frame_length: usize) -> Self {
        Self::LengthPrefixed { max_frame_length }
    }

    /// The protocol this configuration selects.
    #[must_use]
    pub fn kind(&self) -> ProtocolKind {
        match self {
            Self::Delimited { .. } => ProtocolKind::Delimited,
            Self::FixedLength { .. } => ProtocolKind::FixedLength,
            Self::LengthPrefixed { .. } => ProtocolKind::LengthPrefixed,
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self { Self::lines() }
}

/// The concrete framer selected by a [`ProtocolConfig`].
#[derive(Debug)]
pub enum Framing {
    /// Delimiter-terminated messages.
    Delimited(DelimitedFraming),
    /// Fixed-size messages.
    FixedLength(FixedLengthFraming),
    /// Length-prefixed messages.
    LengthPrefixed(LengthPrefixedFraming),
}

/// A configured framing protocol together with its text encoding.
///
/// `FramingProtocol` is stateful: partial messages are carried between
/// calls to [`process`](Self::process), so a single instance must see the
/// stream's chunks in arrival order.
///
/// # Examples
///
/// ```
/// use wireline::codec::{FramingProtocol, ProtocolConfig, TextEncoding};
///
/// let mut protocol =
///     FramingProtocol::new(ProtocolConfig::lines(), TextEncoding::Utf8).expect("valid config");
/// let mut messages = Vec::new();
/// for chunk in ["hel", "lo\nwor", "ld\n"] {
///     messages.extend(protocol.process_text(chunk.as_bytes()).expect("delimited never fails"));
/// }
/// assert_eq!(messages, ["hello", "world"]);
/// ```
#[derive(Debug)]
pub struct FramingProtocol {
    framing: Framing,
    encoding: TextEncoding,
}

impl FramingProtocol {
    /// Build the protocol selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyDelimiter`] for an empty delimiter and
    /// [`ConfigError::ZeroFrameLength`] for a zero fixed length.
    pub fn new(config: ProtocolConfig, encoding: TextEncoding) -> Result<Self, ConfigError> {
        let framing = match config {
            ProtocolConfig::Delimited { delimiter } => {
                Framing::Delimited(DelimitedFraming::new(delimiter)?)
            }
            ProtocolConfig::FixedLength { size } => {
                Framing::FixedLength(FixedLengthFraming::new(size)?)
            }
            ProtocolConfig::LengthPrefixed { max_frame_length } => {
                Framing::LengthPrefixed(LengthPrefixedFraming::new(max_frame_length))
            }
        };
        Ok(Self { framing, encoding })
    }

    /// The active protocol kind.
    #[must_use]
    pub fn kind(&self) -> ProtocolKind {
        match &self.framing {
            Framing::Delimited(_) => ProtocolKind::Delimited,
            Framing::FixedLength(_) => ProtocolKind::FixedLength,
            Framing::LengthPrefixed(_) => ProtocolKind::LengthPrefixed,
        }
    }

    /// Text encoding used by [`format_text`](Self::format_text) and
    /// [`process_text`](Self::process_text).
    #[must_use]
    pub fn encoding(&self) -> TextEncoding { self.encoding }

    /// Borrow the underlying framer.
    #[must_use]
    pub fn framing(&self) -> &Framing { &self.framing }

    /// Return the delimiter of a delimited protocol.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotDelimited`] for any other protocol.
    pub fn delimiter(&self) -> Result<&[u8], ConfigError> {
        match &self.framing {
            Framing::Delimited(framing) => Ok(framing.delimiter()),
            _ => Err(ConfigError::NotDelimited { kind: self.kind() }),
        }
    }

    /// Replace the delimiter of a delimited protocol.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotDelimited`] for any other protocol and
    /// [`ConfigError::EmptyDelimiter`] for an empty delimiter.
    pub fn set_delimiter(&mut self, delimiter: impl Into<Vec<u8>>) -> Result<(), ConfigError> {
        let kind = self.kind();
        match &mut self.framing {
            Framing::Delimited(framing) => framing.set_delimiter(delimiter),
            _ => Err(ConfigError::NotDelimited { kind }),
        }
    }

    /// Wrap `payload` for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the payload violates the protocol's size
    /// rules. Delimited framing never fails.
    pub fn format(&self, payload: &[u8]) -> Result<Bytes, CodecError> {
        match &self.framing {
            Framing::Delimited(framing) => Ok(framing.format(payload)),
            Framing::FixedLength(framing) => framing.format(payload),
            Framing::LengthPrefixed(framing) => framing.format(payload),
        }
    }

    /// Encode `text` and wrap it for transmission.
    ///
    /// # Errors
    ///
    /// See [`format`](Self::format).
    pub fn format_text(&self, text: &str) -> Result<Bytes, CodecError> {
        self.format(&self.encoding.encode(text))
    }

    /// Feed `chunk` to the framer and return the payloads it completes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the stream violates the protocol. Payloads
    /// completed before the violation are discarded; use
    /// [`process_into`](Self::process_into) to keep them. The framer state is
    /// unspecified afterwards.
    pub fn process(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>, CodecError> {
        let mut frames = Vec::new();
        self.process_into(chunk, &mut frames)?;
        Ok(frames)
    }

    /// Feed `chunk` to the framer, appending the payloads it completes to
    /// `frames`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the stream violates the protocol. Payloads
    /// that precede the violation in `chunk` are appended before the error is
    /// returned. The framer state is unspecified afterwards.
    pub fn process_into(
        &mut self,
        chunk: &[u8],
        frames: &mut Vec<Bytes>,
    ) -> Result<(), CodecError> {
        match &mut self.framing {
            Framing::Delimited(framing) => {
                frames.extend(framing.process(chunk));
                Ok(())
            }
            Framing::FixedLength(framing) => {
                frames.extend(framing.process(chunk));
                Ok(())
            }
            Framing::LengthPrefixed(framing) => framing.process(chunk, frames),
        }
    }

    /// Like [`process`](Self::process), decoding each payload as text.
    ///
    /// # Errors
    ///
    /// See [`process`](Self::process).
    pub fn process_text(&mut self, chunk: &[u8]) -> Result<Vec<String>, CodecError> {
        let mut messages = Vec::new();
        self.process_text_into(chunk, &mut messages)?;
        Ok(messages)
    }

    /// Like [`process_into`](Self::process_into), decoding each payload as
    /// text.
    ///
    /// # Errors
    ///
    /// See [`process_into`](Self::process_into). Messages decoded before the
    /// violation are appended to `messages` either way.
    pub fn process_text_into(
        &mut self,
        chunk: &[u8],
        messages: &mut Vec<String>,
    ) -> Result<(), CodecError> {
        let mut frames = Vec::new();
        let result = self.process_into(chunk, &mut frames);
        let encoding = self.encoding;
        messages.extend(frames.iter().map(|frame| encoding.decode(frame)));
        result
    }

    /// Number of buffered bytes belonging to an incomplete message.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        match &self.framing {
            Framing::Delimited(framing) => framing.pending_len(),
            Framing::FixedLength(framing) => framing.pending_len(),
            Framing::LengthPrefixed(framing) => framing.pending_len(),
        }
    }
}

#[cfg(test)]
mod tests;
