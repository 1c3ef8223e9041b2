//! The length octets.
//!
//! This is a private module. Its public items are re-exported by the parent.

use crate::decode::{DecodeError, SliceSource};
use crate::mode::Mode;


//------------ Length -------------------------------------------------------

/// The length octets of an encoded value.
///
/// A length value can either be definite, meaning it provides the actual
/// number of content octets in the value, or indefinite, in which case the
/// content is delimited by a special end-of-contents marker.
///
/// # BER Encoding
///
/// The length can be encoded in one of two basic ways. Which one is used is
/// determined by the most significant bit of the first octet. If it is not
/// set, the length octets is one octet long and the remaining bits of this
/// first octet provide the definite length. Thus, if the first octet is
/// less than 128, it provides the definite length already.
///
/// If the most significant bit is set, the remaining bits of the first
/// octet specify the number of octets that follow to encode the actual
/// length. If they specify that there are zero more octets, i.e., the
/// value of the first octet is 128, the length is indefinite. Otherwise,
/// those following octets give the big-endian encoding of the definite
/// length of the content octets.
///
/// Under both CER and DER rules, a definite length must be encoded in the
/// minimum number of octets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Length {
    /// A length value in definite form.
    ///
    /// Provides the actual length of the content in octets.
    Definite(usize),

    /// A length value in indefinite form.
    ///
    /// In this form, the end of a value is determined by a special tag.
    Indefinite,
}

impl Length {
    /// Returns the length if it is definite.
    pub fn definite(self) -> Option<usize> {
        match self {
            Length::Definite(len) => Some(len),
            Length::Indefinite => None,
        }
    }

    /// Returns whether the length is definite and zero.
    pub fn is_zero(self) -> bool {
        self == Length::Definite(0)
    }

    /// Takes a length from the beginning of a source.
    ///
    /// A long form whose count of length octets exceeds what is left in the
    /// source, or whose value doesn’t fit a `usize`, is a length overrun.
    /// Whether the length fits the remaining content is checked by the
    /// caller, which knows where the value starts.
    pub fn take_from(
        source: &mut SliceSource, mode: Mode
    ) -> Result<Self, DecodeError> {
        let start = source.pos();
        match source.take_u8()? {
            // Bit 7 clear: single.
            n if (n & 0x80) == 0 => Ok(Length::Definite(n as usize)),

            // 0x80: indefinite.
            0x80 => Ok(Length::Indefinite),

            // 0xFF: illegal.
            0xFF => {
                Err(DecodeError::malformed("illegal length octets", start))
            }

            // anything else: clear left bit, number of octets.
            n => {
                let octets = source.take_exact((n & 0x7F) as usize).map_err(
                    |_| DecodeError::overrun(start)
                )?;
                if mode.is_restricted() {
                    // The difference to the BER case is the first length
                    // octet can’t be zero and it can’t be less that 0x80 if
                    // it is the only octet. In both cases, there is a
                    // shorter encoding.
                    let minimal = match octets {
                        [first] => *first >= 0x80,
                        [first, ..] => *first != 0,
                        [] => true,
                    };
                    if !minimal {
                        return Err(DecodeError::malformed(
                            "illegal length in CER/DER", start
                        ))
                    }
                }
                let mut res = 0usize;
                for &octet in octets {
                    res = res.checked_mul(256).ok_or_else(|| {
                        DecodeError::overrun(start)
                    })? | usize::from(octet);
                }
                Ok(Length::Definite(res))
            }
        }
    }

    /// Returns the length of the encoded representation of the value.
    pub fn encoded_len(self) -> usize {
        match self {
            Length::Definite(len) if len > 0x7F => {
                1 + Self::value_octets(len)
            }
            _ => 1,
        }
    }

    /// Appends the encoded length to the end of `target`.
    pub fn append_encoded(self, target: &mut Vec<u8>) {
        match self {
            Length::Definite(len) if len > 0x7F => {
                let count = Self::value_octets(len);
                target.push(0x80 | count as u8);
                target.extend_from_slice(
                    &len.to_be_bytes()[(usize::BITS / 8) as usize - count..]
                );
            }
            Length::Definite(len) => target.push(len as u8),
            Length::Indefinite => target.push(0x80),
        }
    }

    /// Returns the number of octets needed for a long form length.
    fn value_octets(len: usize) -> usize {
        ((usize::BITS - len.leading_zeros()).div_ceil(8)) as usize
    }
}


//============ Tests =========================================================
