//! Reading single tag-length-value triples.
//!
//! This is a private module. Its public items are re-exported by the parent.

use crate::ident::{Class, Ident, Tag};
use crate::length::Length;
use crate::mode::Mode;
use super::error::DecodeError;
use super::source::SliceSource;


//------------ Tlv -----------------------------------------------------------

/// A single decoded tag-length-value triple.
///
/// The content is borrowed from the buffer the value was read from. For a
/// value of definite length, it is exactly the content octets. For a value
/// of indefinite length, the end isn’t known until the end-of-contents
/// marker has been found by walking the nested values, so the content
/// extends to the end of the buffer. Use [`skip_indefinite`] to find the
/// actual end.
#[derive(Clone, Copy, Debug)]
pub struct Tlv<'a> {
    /// The identifier octets.
    ident: Ident,

    /// The length octets.
    length: Length,

    /// The offset of the first identifier octet in the buffer.
    start: usize,

    /// The offset of the first content octet in the buffer.
    content_start: usize,

    /// The content octets.
    content: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// Reads one value from `buf` starting at `offset`.
    ///
    /// Returns the value and the offset where reading should continue. For
    /// definite length values, this is the end of the value. For indefinite
    /// length values, it is the start of the content.
    ///
    /// Every bounds problem is reported as an error: a definite length
    /// exceeding the rest of the buffer is a length overrun and no slice
    /// beyond the end of the buffer is ever taken.
    pub fn read(
        buf: &'a [u8], offset: usize, mode: Mode
    ) -> Result<(Self, usize), DecodeError> {
        if offset > buf.len() {
            return Err(DecodeError::overrun(offset))
        }
        let mut source = SliceSource::new(buf, offset);
        let ident = Ident::take_from(&mut source, mode)?;
        let length = Length::take_from(&mut source, mode)?;
        let content_start = source.pos();

        if ident == Ident::END_OF_CONTENTS
            && (!length.is_zero() || content_start != offset + 2)
        {
            return Err(DecodeError::malformed(
                "end-of-contents must be two zero octets", offset
            ))
        }
        if ident.tag() == Tag::END_OF_CONTENTS && ident.is_constructed() {
            return Err(DecodeError::malformed(
                "constructed end-of-contents", offset
            ))
        }

        match length {
            Length::Definite(len) => {
                if ident.is_constructed() && !mode.allow_definite_constructed()
                {
                    return Err(DecodeError::malformed(
                        "definite length constructed value in CER", offset
                    ))
                }
                let content = source.take_exact(len).map_err(|_| {
                    DecodeError::overrun(offset)
                })?;
                Ok((
                    Tlv { ident, length, start: offset, content_start, content },
                    source.pos()
                ))
            }
            Length::Indefinite => {
                if !ident.is_constructed() {
                    return Err(DecodeError::malformed(
                        "indefinite length primitive value", offset
                    ))
                }
                if !mode.allow_indefinite_constructed() {
                    return Err(DecodeError::malformed(
                        "indefinite length value in DER", offset
                    ))
                }
                Ok((
                    Tlv {
                        ident, length, start: offset, content_start,
                        content: source.remaining(),
                    },
                    content_start
                ))
            }
        }
    }

    /// Returns the identifier octets.
    pub fn ident(&self) -> Ident {
        self.ident
    }

    /// Returns the tag of the value.
    pub fn tag(&self) -> Tag {
        self.ident.tag()
    }

    /// Returns the class of the value’s tag.
    pub fn class(&self) -> Class {
        self.ident.class()
    }

    /// Returns the number of the value’s tag.
    pub fn number(&self) -> u32 {
        self.ident.number()
    }

    /// Returns whether the value is constructed.
    pub fn is_constructed(&self) -> bool {
        self.ident.is_constructed()
    }

    /// Returns the length octets of the value.
    pub fn length(&self) -> Length {
        self.length
    }

    /// Returns the offset of the value in the buffer.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the offset of the content in the buffer.
    pub fn content_start(&self) -> usize {
        self.content_start
    }

    /// Returns the content octets.
    ///
    /// For indefinite length values this includes everything up to the end
    /// of the buffer.
    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// Returns whether this is the end-of-contents marker.
    pub fn is_end_of_contents(&self) -> bool {
        self.ident == Ident::END_OF_CONTENTS
    }
}


//------------ read_tlv ------------------------------------------------------

/// Reads one value from `buf` starting at `offset` using BER rules.
///
/// This is a shortcut for [`Tlv::read`] in [`Mode::Ber`].
pub fn read_tlv(
    buf: &[u8], offset: usize
) -> Result<(Tlv, usize), DecodeError> {
    Tlv::read(buf, offset, Mode::Ber)
}


//------------ skip_indefinite -----------------------------------------------

/// Finds the end of an indefinite length value.
///
/// The content of the value starts at `content_start`. The function walks
/// the nested values until it finds the end-of-contents marker belonging to
/// the value and returns the offset right behind it. Nested indefinite
/// values are followed without recursion; more than `max_depth` of them
/// open at the same time results in a too-deep error.
pub fn skip_indefinite(
    buf: &[u8], content_start: usize, mode: Mode, max_depth: usize,
) -> Result<usize, DecodeError> {
    let mut depth = 1usize;
    let mut pos = content_start;
    loop {
        if pos >= buf.len() {
            return Err(DecodeError::malformed(
                "missing end-of-contents", pos
            ))
        }
        let (tlv, next) = Tlv::read(buf, pos, mode)?;
        if tlv.is_end_of_contents() {
            depth -= 1;
            if depth == 0 {
                return Ok(next)
            }
        }
        else if tlv.length() == Length::Indefinite {
            depth += 1;
            if depth > max_depth {
                return Err(DecodeError::too_deep(pos, max_depth))
            }
        }
        pos = next;
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn definite_value() {
        let data = b"\x04\x03foo\x05\x00";
        let (tlv, next) = read_tlv(data, 0).unwrap();
        assert_eq!(tlv.tag(), Tag::OCTET_STRING);
        assert!(!tlv.is_constructed());
        assert_eq!(tlv.content(), b"foo");
        assert_eq!(tlv.content_start(), 2);
        assert_eq!(next, 5);
        let (tlv, next) = read_tlv(data, next).unwrap();
        assert_eq!(tlv.tag(), Tag::NULL);
        assert_eq!(tlv.content(), b"");
        assert_eq!(next, data.len());
    }

    #[test]
    fn length_overrun() {
        // Declares five octets but only has three.
        let data = b"\x04\x05foo";
        assert_eq!(read_tlv(data, 0).unwrap_err(), DecodeError::overrun(0));

        // Long form announcing more length octets than remain.
        let data = b"\x30\x84\x00\x01";
        assert!(matches!(
            read_tlv(data, 0), Err(DecodeError::LengthOverrun { .. })
        ));

        // Offset beyond the buffer.
        assert!(matches!(
            read_tlv(b"\x05\x00", 3), Err(DecodeError::LengthOverrun { .. })
        ));
    }

    #[test]
    fn indefinite_value() {
        let data = b"\x30\x80\x04\x01a\x30\x80\x00\x00\x00\x00\x05\x00";
        let (tlv, next) = read_tlv(data, 0).unwrap();
        assert_eq!(tlv.length(), Length::Indefinite);
        assert_eq!(next, 2);
        let end = skip_indefinite(data, next, Mode::Ber, 8).unwrap();
        assert_eq!(end, 11);
        assert_eq!(read_tlv(data, end).unwrap().0.tag(), Tag::NULL);
    }

    #[test]
    fn indefinite_rules() {
        assert!(read_tlv(b"\x04\x80\x00\x00", 0).is_err());
        assert!(Tlv::read(b"\x30\x80\x00\x00", 0, Mode::Der).is_err());
        assert!(Tlv::read(b"\x30\x00", 0, Mode::Cer).is_err());
        assert!(skip_indefinite(b"\x30\x80\x04\x00", 2, Mode::Ber, 8).is_err());
    }

    #[test]
    fn end_of_contents_rules() {
        assert!(read_tlv(b"\x00\x00", 0).unwrap().0.is_end_of_contents());
        assert!(read_tlv(b"\x00\x01a", 0).is_err());
        assert!(read_tlv(b"\x00\x81\x00", 0).is_err());
        assert!(read_tlv(b"\x20\x00", 0).is_err());
    }

    #[test]
    fn indefinite_depth_bound() {
        let mut data = Vec::new();
        for _ in 0..10 {
            data.extend_from_slice(b"\x30\x80");
        }
        for _ in 0..10 {
            data.extend_from_slice(b"\x00\x00");
        }
        assert!(skip_indefinite(&data, 2, Mode::Ber, 10).is_ok());
        assert!(matches!(
            skip_indefinite(&data, 2, Mode::Ber, 5),
            Err(DecodeError::TooDeep { .. })
        ));
    }
}
