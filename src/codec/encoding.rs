//! Text encodings used to convert between message bytes and strings.

use std::fmt;

/// Replacement byte for characters an encoding cannot represent.
const REPLACEMENT: u8 = b'?';

/// Text encoding applied to framed payloads.
///
/// Decoding never fails: bytes that are invalid for the encoding are
/// replaced rather than rejected, so a misbehaving peer cannot stall the
/// read loop.
///
/// # Examples
///
/// ```
/// use wireline::codec::TextEncoding;
///
/// assert_eq!(TextEncoding::Latin1.decode(&[0x63, 0x61, 0x66, 0xe9]), "café");
/// assert_eq!(TextEncoding::Ascii.encode("café"), b"caf?".to_vec());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// UTF-8; invalid sequences decode to `U+FFFD`.
    #[default]
    Utf8,
    /// 7-bit ASCII; bytes and characters outside the range become `?`.
    Ascii,
    /// ISO-8859-1; characters above `U+00FF` encode as `?`.
    Latin1,
}

impl TextEncoding {
    /// Encode `text` into bytes.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Ascii => text
                .chars()
                .map(|c| u8::try_from(c).ok().filter(u8::is_ascii).unwrap_or(REPLACEMENT))
                .collect(),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c).unwrap_or(REPLACEMENT))
                .collect(),
        }
    }

    /// Decode `bytes` into an owned string.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
                .collect(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    /// Canonical lower-case name of the encoding.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin1",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}
