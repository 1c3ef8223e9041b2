//! Splitting a transport document into headers and segments.
//!
//! This is a private module. Its public items are re-exported by the parent.
//!
//! A transport document optionally starts with the magic `TRANSPORTABLE`
//! followed by a NUL octet, a header block length as a little-endian 32 bit
//! integer, and the header block. Then follow one or more segments, each
//! consisting of a label of up to 32 upper case letters, digits or
//! underscores, a NUL octet, the body length as a little-endian 32 bit
//! integer, and the body.

use bytes::Bytes;
use tracing::trace;
use crate::decode::DecodeError;
use super::TransportDecoder;
use super::document::Segment;
use super::header::{parse_block, Headers, HeaderWarning};


//------------ Constants -----------------------------------------------------

/// The magic starting a document with a header block.
pub const MAGIC: &[u8] = b"TRANSPORTABLE\0";

/// The label of a signed document.
pub const UA1_SIGN: &str = "UA1_SIGN";

/// The label of an encrypted document.
pub const UA1_CRYPT: &str = "UA1_CRYPT";

/// The label of the segment carrying the recipient’s certificate.
pub const CERTCRYPT: &str = "CERTCRYPT";

/// The maximum length of a label.
pub const MAX_LABEL_LEN: usize = 32;


//------------ Low-level Readers ---------------------------------------------

/// Reads a label followed by a NUL octet at `pos`.
///
/// Returns the label and the position after the NUL.
pub(super) fn read_label(data: &[u8], pos: usize) -> Option<(&str, usize)> {
    let rest = data.get(pos..)?;
    let len = rest.iter().take(MAX_LABEL_LEN + 1).position(|&ch| ch == 0)?;
    let label = rest.get(..len)?;
    if label.is_empty() || !label.iter().all(|&ch| {
        ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == b'_'
    }) {
        return None
    }
    let label = std::str::from_utf8(label).ok()?;
    Some((label, pos + len + 1))
}

/// Reads a little-endian 32 bit length at `pos`.
pub(super) fn read_len(data: &[u8], pos: usize) -> Option<usize> {
    let octets = data.get(pos..pos.checked_add(4)?)?;
    let octets: [u8; 4] = octets.try_into().ok()?;
    usize::try_from(u32::from_le_bytes(octets)).ok()
}

/// Returns whether the data starts with something that looks like a
/// transport document.
pub(super) fn recognizes(data: &[u8]) -> bool {
    data.starts_with(MAGIC) || read_label(data, 0).is_some()
}


//------------ State ---------------------------------------------------------

/// The states of the envelope parser.
#[derive(Debug)]
enum State {
    /// Look for the magic or the first label.
    SeekLabel,

    /// Parse the header block between the two offsets.
    ParseHeaders { start: usize, end: usize },

    /// Extract the segments starting at the current position.
    ExtractBody,

    /// All segments have been extracted.
    Done,

    /// Parsing failed.
    Failed(DecodeError),
}


//------------ Envelope ------------------------------------------------------

/// The parts of a transport document.
#[derive(Debug)]
pub(super) struct Envelope {
    pub headers: Headers,
    pub warnings: Vec<HeaderWarning>,
    pub segments: Vec<Segment>,
}

impl Envelope {
    /// Splits a transport document into its parts.
    pub fn parse(
        data: &Bytes, config: &TransportDecoder
    ) -> Result<Self, DecodeError> {
        let mut parser = Parser {
            data,
            config,
            pos: 0,
            envelope: Envelope {
                headers: Headers::new(),
                warnings: Vec::new(),
                segments: Vec::new(),
            }
        };
        let mut state = State::SeekLabel;
        loop {
            state = match state {
                State::SeekLabel => parser.seek_label(),
                State::ParseHeaders { start, end } => {
                    parser.parse_headers(start, end)
                }
                State::ExtractBody => parser.extract_body(),
                State::Done => return Ok(parser.envelope),
                State::Failed(err) => return Err(err),
            };
            trace!(?state, pos = parser.pos, "transport envelope");
        }
    }
}


//------------ Parser --------------------------------------------------------

struct Parser<'a> {
    data: &'a Bytes,
    config: &'a TransportDecoder,
    pos: usize,
    envelope: Envelope,
}

impl Parser<'_> {
    fn seek_label(&mut self) -> State {
        if self.data.starts_with(MAGIC) {
            let len_pos = MAGIC.len();
            let len = match read_len(self.data, len_pos) {
                Some(len) => len,
                None => return State::Failed(DecodeError::overrun(len_pos)),
            };
            let start = len_pos + 4;
            match start.checked_add(len) {
                Some(end) if end <= self.data.len() => {
                    State::ParseHeaders { start, end }
                }
                _ => State::Failed(DecodeError::overrun(len_pos)),
            }
        }
        else if read_label(self.data, 0).is_some() {
            State::ExtractBody
        }
        else {
            State::Failed(DecodeError::unrecognized(
                "missing transport magic or label", 0
            ))
        }
    }

    fn parse_headers(&mut self, start: usize, end: usize) -> State {
        let block = self.data.get(start..end).unwrap_or_default();
        let (headers, warnings) = parse_block(
            block, self.config.header_encoding
        );
        self.envelope.headers = headers;
        self.envelope.warnings = warnings;
        self.pos = end;
        State::ExtractBody
    }

    fn extract_body(&mut self) -> State {
        while self.pos < self.data.len() {
            if self.envelope.segments.len() >= self.config.max_segments {
                return State::Failed(DecodeError::malformed(
                    "too many segments", self.pos
                ))
            }
            let (label, len_pos) = match read_label(self.data, self.pos) {
                Some(some) => some,
                None => {
                    return State::Failed(DecodeError::unrecognized(
                        "invalid segment label", self.pos
                    ))
                }
            };
            let len = match read_len(self.data, len_pos) {
                Some(len) => len,
                None => return State::Failed(DecodeError::overrun(len_pos)),
            };
            let start = len_pos + 4;
            let end = match start.checked_add(len) {
                Some(end) if end <= self.data.len() => end,
                _ => return State::Failed(DecodeError::overrun(len_pos)),
            };
            trace!(label, offset = self.pos, len, "segment");
            self.envelope.segments.push(Segment {
                label: label.into(),
                body: self.data.slice(start..end),
            });
            self.pos = end;
        }
        if self.envelope.segments.is_empty() {
            State::Failed(DecodeError::unrecognized(
                "document without segments", self.pos
            ))
        }
        else {
            State::Done
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn parse(data: &'static [u8]) -> Result<Envelope, DecodeError> {
        Envelope::parse(&Bytes::from_static(data), &TransportDecoder::new())
    }

    #[test]
    fn labels() {
        assert_eq!(read_label(b"UA1_SIGN\0", 0), Some(("UA1_SIGN", 9)));
        assert_eq!(read_label(b"xUA1\0", 1), Some(("UA1", 5)));
        assert!(read_label(b"\0", 0).is_none());
        assert!(read_label(b"ua1_sign\0", 0).is_none());
        assert!(read_label(b"UA1_SIGN", 0).is_none());
        assert!(read_label(&[b'A'; 33], 0).is_none());
        let mut long = vec![b'A'; 32];
        long.push(0);
        assert!(read_label(&long, 0).is_some());
        assert!(read_label(b"A\0", 5).is_none());
    }

    #[test]
    fn segments_without_headers() {
        let env = parse(
            b"UA1_SIGN\0\x03\x00\x00\x00abcCERTCRYPT\0\x00\x00\x00\x00"
        ).unwrap();
        assert!(env.headers.is_empty());
        assert_eq!(env.segments.len(), 2);
        assert_eq!(env.segments[0].label, "UA1_SIGN");
        assert_eq!(env.segments[0].body, &b"abc"[..]);
        assert_eq!(env.segments[1].label, "CERTCRYPT");
        assert!(env.segments[1].body.is_empty());
    }

    #[test]
    fn headers_and_segment() {
        let env = parse(
            b"TRANSPORTABLE\0\x08\x00\x00\x00A=1\r\nB=2\
              UA1_CRYPT\0\x01\x00\x00\x00x"
        ).unwrap();
        assert_eq!(env.headers.get("A"), Some("1"));
        assert_eq!(env.headers.get("B"), Some("2"));
        assert_eq!(env.segments[0].label, "UA1_CRYPT");
    }

    #[test]
    fn failures() {
        assert!(matches!(
            parse(b"garbage"),
            Err(DecodeError::UnrecognizedTransport { .. })
        ));
        assert!(matches!(
            parse(b"TRANSPORTABLE\0\x00\x00\x00\x00"),
            Err(DecodeError::UnrecognizedTransport { .. })
        ));
        assert!(matches!(
            parse(b"TRANSPORTABLE\0\xff\x00\x00\x00A=1"),
            Err(DecodeError::LengthOverrun { .. })
        ));
        assert!(matches!(
            parse(b"UA1_SIGN\0\x05\x00\x00\x00abc"),
            Err(DecodeError::LengthOverrun { .. })
        ));
        assert!(matches!(
            parse(b"UA1_SIGN\0\x05\x00"),
            Err(DecodeError::LengthOverrun { .. })
        ));
        assert!(matches!(
            parse(b"UA1_SIGN\0\x00\x00\x00\x00junk"),
            Err(DecodeError::UnrecognizedTransport { .. })
        ));
    }

    #[test]
    fn segment_limit() {
        let data = Bytes::from_static(
            b"A\0\x00\x00\x00\x00B\0\x00\x00\x00\x00C\0\x00\x00\x00\x00"
        );
        let config = TransportDecoder::new().max_segments(2);
        assert!(Envelope::parse(&data, &config).is_err());
        let config = TransportDecoder::new().max_segments(3);
        assert_eq!(Envelope::parse(&data, &config).unwrap().segments.len(), 3);
    }
}
