//! Unit tests for the framing protocols.

use std::io;

use rstest::rstest;

use super::*;


fn protocol(config: ProtocolConfig) -> FramingProtocol {
    FramingProtocol::new(config, TextEncoding::Utf8).expect("valid protocol config")
}

fn feed(protocol: &mut FramingProtocol, chunks: &[&[u8]]) -> Vec<String> {
    chunks
        .iter()
        .flat_map(|chunk| protocol.process_text(chunk).expect("process should succeed"))
        .collect()
}

#[test]
fn newline_messages_split_across_reads() {
    let mut lines = protocol(ProtocolConfig::lines());
    let messages = feed(&mut lines, &[b"hel", b"lo\nwor", b"ld\n"]);
    assert_eq!(messages, ["hello", "world"]);
    assert_eq!(lines.pending_len(), 0);
}

#[rstest]
#[case::crlf_split_between_reads(
    &b"\r\n"[..],
    &[&b"hello\r"[..], &b"\nworld\r\n"[..]],
    &["hello", "world"]
)]
#[case::three_byte_delimiter_split_twice(
    &b"<#>"[..],
    &[&b"a<"[..], &b"#"[..], &b">b<#"[..], &b">"[..]],
    &["a", "b"]
)]
#[case::lone_delimiter_is_empty_message(&b"\n"[..], &[&b"\n"[..]], &[""])]
#[case::adjacent_delimiters(&b";"[..], &[&b"x;;y;"[..]], &["x", "", "y"])]
#[case::no_delimiter_yet(&b"\n"[..], &[&b"partial"[..], &b" still"[..]], &[])]
fn delimited_splitting(
    #[case] delimiter: &[u8],
    #[case] chunks: &[&[u8]],
    #[case] expected: &[&str],
) {
    let mut framing = protocol(ProtocolConfig::delimited(delimiter));
    assert_eq!(feed(&mut framing, chunks), expected);
}

#[test]
fn trailing_partial_message_stays_pending() {
    let mut framing = protocol(ProtocolConfig::lines());
    assert_eq!(feed(&mut framing, &[b"one\ntwo\nthr"]), ["one", "two"]);
    assert_eq!(framing.pending_len(), 3);
    assert_eq!(feed(&mut framing, &[b"ee\n"]), ["three"]);
}

#[test]
fn delimiter_spanning_three_reads_is_found() {
    let mut framing = DelimitedFraming::new(*b"ab").expect("non-empty delimiter");
    assert!(framing.process(b"xa").is_empty());
    assert!(framing.process(b"a").is_empty());
    let frames = framing.process(b"b");
    assert_eq!(frames, vec![&b"xa"[..]]);
}

#[rstest]
#[case::constructor(true)]
#[case::setter(false)]
fn empty_delimiter_is_rejected(#[case] at_construction: bool) {
    if at_construction {
        let err = FramingProtocol::new(ProtocolConfig::delimited(Vec::<u8>::new()), TextEncoding::Utf8)
            .expect_err("empty delimiter must be rejected");
        assert_eq!(err, ConfigError::EmptyDelimiter);
    } else {
        let mut framing = protocol(ProtocolConfig::lines());
        assert_eq!(
            framing.set_delimiter(Vec::<u8>::new()),
            Err(ConfigError::EmptyDelimiter)
        );
        assert_eq!(framing.delimiter(), Ok(&b"\n"[..]));
    }
}

#[test]
fn changed_delimiter_applies_to_pending_bytes() {
    let mut framing = protocol(ProtocolConfig::lines());
    assert!(feed(&mut framing, &[b"a|b"]).is_empty());
    framing.set_delimiter(*b"|").expect("non-empty delimiter");
    assert_eq!(feed(&mut framing, &[b"c|"]), ["a", "bc"]);
    assert_eq!(
        framing.format_text("d").expect("delimited format never fails"),
        &b"d|"[..]
    );
}

#[test]
fn format_appends_delimiter() {
    let framing = protocol(ProtocolConfig::delimited(*b"\r\n"));
    let frame = framing.format_text("hi").expect("delimited format never fails");
    assert_eq!(frame, &b"hi\r\n"[..]);
}

#[rstest]
#[case(ProtocolConfig::fixed_length(4), ProtocolKind::FixedLength)]
#[case(ProtocolConfig::length_prefixed(128), ProtocolKind::LengthPrefixed)]
fn delimiter_access_requires_delimited_protocol(
    #[case] config: ProtocolConfig,
    #[case] kind: ProtocolKind,
) {
    let mut framing = protocol(config);
    assert_eq!(framing.kind(), kind);
    assert_eq!(framing.delimiter(), Err(ConfigError::NotDelimited { kind }));
    assert_eq!(
        framing.set_delimiter(*b"\n"),
        Err(ConfigError::NotDelimited { kind })
    );
}

#[test]
fn fixed_length_rejects_zero_size() {
    let err = FramingProtocol::new(ProtocolConfig::fixed_length(0), TextEncoding::Utf8)
        .expect_err("zero size must be rejected");
    assert_eq!(err, ConfigError::ZeroFrameLength);
}

#[test]
fn fixed_length_splits_into_equal_frames() {
    let mut framing = protocol(ProtocolConfig::fixed_length(3));
    assert_eq!(feed(&mut framing, &[b"abcd", b"efgh"]), ["abc", "def"]);
    assert_eq!(framing.pending_len(), 2);
}

#[test]
fn fixed_length_format_requires_exact_size() {
    let framing = protocol(ProtocolConfig::fixed_length(3));
    assert_eq!(
        framing.format(b"abc").expect("exact size is accepted"),
        &b"abc"[..]
    );
    let err = framing.format(b"ab").expect_err("short payload is rejected");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::LengthMismatch {
            expected: 3,
            actual: 2
        })
    ));
}

#[test]
fn length_prefixed_format_writes_big_endian_header() {
    let framing = protocol(ProtocolConfig::length_prefixed(128));
    let frame = framing.format(b"hey").expect("payload within limit");
    assert_eq!(frame, &[0, 0, 0, 3, b'h', b'e', b'y'][..]);
}

#[test]
fn length_prefixed_reassembles_split_header_and_payload() {
    let mut framing = protocol(ProtocolConfig::length_prefixed(128));
    let messages = feed(&mut framing, &[&[0, 0], &[0, 5, b'h', b'e'], b"llo", &[0, 0, 0, 0]]);
    assert_eq!(messages, ["hello", ""]);
    assert_eq!(framing.pending_len(), 0);
}

#[test]
fn length_prefixed_rejects_oversized_payload() {
    let framing = protocol(ProtocolConfig::length_prefixed(MIN_FRAME_LENGTH));
    let err = framing
        .format(&[0; MIN_FRAME_LENGTH + 1])
        .expect_err("oversized payload is rejected");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::OversizedFrame { max: MIN_FRAME_LENGTH, .. })
    ));
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::InvalidData);
}

#[test]
fn length_prefixed_rejects_oversized_header() {
    let mut framing = protocol(ProtocolConfig::length_prefixed(MIN_FRAME_LENGTH));
    let header = u32::try_from(MIN_FRAME_LENGTH + 1)
        .expect("fits in u32")
        .to_be_bytes();
    let err = framing
        .process(&header)
        .expect_err("oversized header is a protocol violation");
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::InvalidData);
}

#[test]
fn frames_before_oversized_header_are_kept() {
    let mut framing = protocol(ProtocolConfig::length_prefixed(MIN_FRAME_LENGTH));
    let mut messages = Vec::new();
    let err = framing
        .process_text_into(&[0, 0, 0, 2, b'o', b'k', 0, 0, 1, 0], &mut messages)
        .expect_err("second header exceeds the maximum");
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::InvalidData);
    assert_eq!(messages, ["ok"]);
}

#[rstest]
#[case(0, MIN_FRAME_LENGTH)]
#[case(4096, 4096)]
#[case(usize::MAX, MAX_FRAME_LENGTH)]
fn length_prefixed_max_is_clamped(#[case] requested: usize, #[case] expected: usize) {
    assert_eq!(
        LengthPrefixedFraming::new(requested).max_frame_length(),
        expected
    );
}

#[rstest]
#[case(TextEncoding::Utf8, &[0xff, b'a'], "\u{fffd}a")]
#[case(TextEncoding::Ascii, &[b'o', 0xe9], "o?")]
#[case(TextEncoding::Latin1, &[b'o', 0xe9], "o\u{e9}")]
fn decoding_replaces_instead_of_failing(
    #[case] encoding: TextEncoding,
    #[case] bytes: &[u8],
    #[case] expected: &str,
) {
    assert_eq!(encoding.decode(bytes), expected);
}

#[test]
fn messages_use_configured_encoding() {
    let mut framing = FramingProtocol::new(ProtocolConfig::lines(), TextEncoding::Latin1)
        .expect("valid protocol config");
    assert_eq!(
        framing.format_text("\u{e9}t\u{e9}").expect("delimited format never fails"),
        &[0xe9, b't', 0xe9, b'\n'][..]
    );
    assert_eq!(feed(&mut framing, &[&[0xe9, b'\n']]), ["\u{e9}"]);
}

#[rstest]
#[case(ProtocolKind::Delimited, "delimited")]
#[case(ProtocolKind::FixedLength, "fixed-length")]
#[case(ProtocolKind::LengthPrefixed, "length-prefixed")]
fn protocol_kind_display(#[case] kind: ProtocolKind, #[case] expected: &str) {
    assert_eq!(kind.to_string(), expected);
}
