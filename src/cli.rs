//! Command line interface for the `wireline` terminal client.

use clap::{Parser, ValueEnum};
use thiserror::Error;
use wireline::{
    ProtocolConfig,
    SocketOptions,
    TextEncoding,
    codec::DEFAULT_MAX_FRAME_LENGTH,
    transport::DEFAULT_RECEIVE_BUFFER_SIZE,
};

/// Command line arguments for the `wireline` binary.
#[derive(Debug, Parser)]
#[command(
    name = "wireline",
    version,
    about = "Connect to a TCP peer, print every message it sends and send each stdin line"
)]
pub struct Cli {
    /// Host name or address of the peer.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// TCP port of the peer.
    #[arg(short, long)]
    pub port: u16,

    /// Message delimiter; `\n`, `\r`, `\t`, `\0` and `\\` are unescaped.
    #[arg(short, long, default_value = "\\n", value_parser = parse_delimiter)]
    pub delimiter: Delimiter,

    /// How the byte stream is split into messages.
    #[arg(long, value_enum, default_value_t = FramingArg::Delimited)]
    pub framing: FramingArg,

    /// Message size for `fixed` framing, maximum payload for `length`.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_LENGTH)]
    pub frame_size: usize,

    /// Text encoding of messages.
    #[arg(long, value_enum, default_value_t = EncodingArg::Utf8)]
    pub encoding: EncodingArg,

    /// Receive buffer size in bytes.
    #[arg(long, default_value_t = DEFAULT_RECEIVE_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Disable Nagle's algorithm.
    #[arg(long)]
    pub nodelay: bool,

    /// Print raw chunks instead of decoded messages.
    #[arg(long)]
    pub raw: bool,
}

/// Framing protocol selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FramingArg {
    /// Messages end with `--delimiter`.
    Delimited,
    /// Every message is `--frame-size` bytes.
    Fixed,
    /// Each message carries a 4-byte big-endian length prefix.
    Length,
}

/// Text encoding selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    Utf8,
    Ascii,
    Latin1,
}

impl From<EncodingArg> for TextEncoding {
    fn from(value: EncodingArg) -> Self {
        match value {
            EncodingArg::Utf8 => Self::Utf8,
            EncodingArg::Ascii => Self::Ascii,
            EncodingArg::Latin1 => Self::Latin1,
        }
    }
}

/// Unescaped delimiter bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delimiter(pub Vec<u8>);

/// Rejected `--delimiter` values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DelimiterError {
    #[error("delimiter must not be empty")]
    Empty,
    #[error("unknown escape sequence `\\{0}`")]
    UnknownEscape(char),
    #[error("delimiter ends with a lone backslash")]
    TrailingBackslash,
}

/// Parse a `--delimiter` argument, resolving backslash escapes.
///
/// # Errors
///
/// Returns [`DelimiterError`] for an empty result, an unknown escape or a
/// trailing backslash.
pub fn parse_delimiter(raw: &str) -> Result<Delimiter, DelimiterError> {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0_u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let byte = match chars.next() {
            Some('n') => b'\n',
            Some('r') => b'\r',
            Some('t') => b'\t',
            Some('0') => b'\0',
            Some('\\') => b'\\',
            Some(other) => return Err(DelimiterError::UnknownEscape(other)),
            None => return Err(DelimiterError::TrailingBackslash),
        };
        bytes.push(byte);
    }
    if bytes.is_empty() {
        return Err(DelimiterError::Empty);
    }
    Ok(Delimiter(bytes))
}

impl Cli {
    /// Framing configuration described by the flags.
    #[must_use]
    pub fn protocol_config(&self) -> ProtocolConfig {
        match self.framing {
            FramingArg::Delimited => ProtocolConfig::delimited(self.delimiter.0.clone()),
            FramingArg::Fixed => ProtocolConfig::fixed_length(self.frame_size),
            FramingArg::Length => ProtocolConfig::length_prefixed(self.frame_size),
        }
    }

    /// Socket options described by the flags.
    #[must_use]
    pub fn socket_options(&self) -> SocketOptions {
        let options = SocketOptions::default();
        if self.nodelay {
            options.nodelay(true)
        } else {
            options
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_describe_newline_framing() {
        let cli = Cli::parse_from(["wireline", "--port", "7000"]);
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.protocol_config(), ProtocolConfig::lines());
        assert_eq!(TextEncoding::from(cli.encoding), TextEncoding::Utf8);
        assert_eq!(cli.socket_options(), SocketOptions::default());
        assert!(!cli.raw);
    }

    #[rstest]
    #[case("\\r\\n", b"\r\n".as_slice())]
    #[case("|", b"|".as_slice())]
    #[case("\\0\\\\", b"\0\\".as_slice())]
    #[case("\\t;", b"\t;".as_slice())]
    fn delimiter_escapes_are_resolved(#[case] raw: &str, #[case] expected: &[u8]) {
        assert_eq!(parse_delimiter(raw), Ok(Delimiter(expected.to_vec())));
    }

    #[rstest]
    #[case("", DelimiterError::Empty)]
    #[case("\\q", DelimiterError::UnknownEscape('q'))]
    #[case("x\\", DelimiterError::TrailingBackslash)]
    fn bad_delimiters_are_rejected(#[case] raw: &str, #[case] expected: DelimiterError) {
        assert_eq!(parse_delimiter(raw), Err(expected));
    }

    #[rstest]
    #[case("fixed", ProtocolConfig::fixed_length(16))]
    #[case("length", ProtocolConfig::length_prefixed(16))]
    fn framing_flag_selects_protocol(#[case] framing: &str, #[case] expected: ProtocolConfig) {
        let cli = Cli::parse_from([
            "wireline",
            "-p",
            "1",
            "--framing",
            framing,
            "--frame-size",
            "16",
        ]);
        assert_eq!(cli.protocol_config(), expected);
    }

    #[test]
    fn nodelay_and_encoding_flags() {
        let cli = Cli::parse_from(["wireline", "-p", "1", "--nodelay", "--encoding", "latin1"]);
        assert_eq!(cli.socket_options(), SocketOptions::default().nodelay(true));
        assert_eq!(TextEncoding::from(cli.encoding), TextEncoding::Latin1);
    }
}
