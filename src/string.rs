//! String-like values: bit strings, character strings and time values.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::{char, fmt, str};
use std::borrow::Cow;
use crate::schema::Kind;


//------------ BitString -----------------------------------------------------

/// A bit string value.
///
/// Bit strings are a sequence of bits. Unlike octet strings, they do not
/// need to contain a multiple of eight bits. The first content octet of the
/// encoded value gives the number of unused bits in the last octet, the
/// remaining octets contain the bits with the first bit in the most
/// significant bit of the first octet.
///
/// There are two types of methods for accessing the data in a bit string.
/// Methods starting with `bit` operate on the individual bits while those
/// prefixed with `octet` access entire octets and ignore the fact that there
/// may be unused bits in the final octet.
///
/// Only the primitive encoding is supported.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct BitString<'a> {
    /// The number of unused bits in the last byte.
    unused: u8,

    /// The bytes of the bit string.
    bits: &'a [u8],
}

impl<'a> BitString<'a> {
    /// Creates a bit string from the content octets of a value.
    ///
    /// Returns the reason if the content is malformed.
    pub fn from_content(content: &'a [u8]) -> Result<Self, &'static str> {
        match content {
            [] => Err("empty bit string"),
            [unused, ..] if *unused > 7 => {
                Err("invalid number of unused bits")
            }
            [unused] if *unused != 0 => {
                Err("unused bits in empty bit string")
            }
            [unused, bits @ ..] => Ok(BitString { unused: *unused, bits }),
        }
    }

    /// Returns the value of the given bit.
    pub fn bit(&self, bit: usize) -> bool {
        match self.bits.get(bit >> 3) {
            Some(octet) => octet & (0x80 >> (bit & 7)) != 0,
            None => false,
        }
    }

    /// Returns the number of bits in the bit string.
    pub fn bit_len(&self) -> usize {
        (self.bits.len() << 3).saturating_sub(usize::from(self.unused))
    }

    /// Returns the number of unused bits in the last octet.
    pub fn unused(&self) -> u8 {
        self.unused
    }

    /// Returns the octets of the bit string.
    pub fn octet_slice(&self) -> &'a [u8] {
        self.bits
    }
}

impl fmt::Debug for BitString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BitString({} bits)", self.bit_len())
    }
}


//------------ Time ----------------------------------------------------------

/// A UTCTime or GeneralizedTime value.
///
/// The value is kept in its textual form, e.g., `"240115103000Z"`. It is
/// only checked to be ASCII and to start with the date digits.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Time<'a> {
    generalized: bool,
    text: &'a str,
}

impl<'a> Time<'a> {
    /// Creates a time value from the content octets.
    pub fn from_content(
        content: &'a [u8], generalized: bool
    ) -> Result<Self, &'static str> {
        let min_len = if generalized { 10 } else { 11 };
        if content.len() < min_len
            || !content.is_ascii()
            || !content.iter().take(10).all(u8::is_ascii_digit)
        {
            return Err("invalid time value")
        }
        let text = str::from_utf8(content).map_err(|_| "invalid time value")?;
        Ok(Time { generalized, text })
    }

    /// Returns whether this is a GeneralizedTime value.
    pub fn is_generalized(&self) -> bool {
        self.generalized
    }

    /// Returns the textual form of the value.
    pub fn as_str(&self) -> &'a str {
        self.text
    }
}

impl fmt::Display for Time<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.text)
    }
}

impl fmt::Debug for Time<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Time({})", self.text)
    }
}


//------------ Character Strings ---------------------------------------------

/// Converts the octets of a character string into text.
///
/// UTF8String must be valid UTF-8. PrintableString and IA5String values are
/// only checked to be ASCII. BMPString is UTF-16 in big-endian and always
/// produces owned text.
pub(crate) fn decode_text<'a>(
    kind: Kind, octets: Cow<'a, [u8]>
) -> Result<Cow<'a, str>, &'static str> {
    match kind {
        Kind::Utf8String => match octets {
            Cow::Borrowed(octets) => {
                str::from_utf8(octets).map(Cow::Borrowed).map_err(|_| {
                    "invalid UTF-8 in UTF8String"
                })
            }
            Cow::Owned(octets) => {
                String::from_utf8(octets).map(Cow::Owned).map_err(|_| {
                    "invalid UTF-8 in UTF8String"
                })
            }
        },
        Kind::PrintableString | Kind::Ia5String => {
            if !octets.is_ascii() {
                return Err("non-ASCII character in string")
            }
            match octets {
                Cow::Borrowed(octets) => {
                    str::from_utf8(octets).map(Cow::Borrowed).map_err(|_| {
                        "non-ASCII character in string"
                    })
                }
                Cow::Owned(octets) => {
                    String::from_utf8(octets).map(Cow::Owned).map_err(|_| {
                        "non-ASCII character in string"
                    })
                }
            }
        }
        Kind::BmpString => {
            if octets.len() % 2 != 0 {
                return Err("odd length BMPString")
            }
            let units = octets.chunks_exact(2).map(|pair| {
                u16::from_be_bytes([pair[0], pair[1]])
            });
            char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .map(Cow::Owned)
                .map_err(|_| "invalid UTF-16 in BMPString")
        }
        _ => Err("not a character string"),
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bit_string() {
        let bits = BitString::from_content(b"\x04\xA0\x50").unwrap();
        assert_eq!(bits.bit_len(), 12);
        assert!(bits.bit(0));
        assert!(!bits.bit(1));
        assert!(bits.bit(2));
        assert!(bits.bit(9));
        assert!(!bits.bit(100));
        assert_eq!(bits.octet_slice(), b"\xA0\x50");

        assert!(BitString::from_content(b"").is_err());
        assert!(BitString::from_content(b"\x08\x00").is_err());
        assert!(BitString::from_content(b"\x01").is_err());
        assert!(BitString::from_content(b"\x00").is_ok());
    }

    #[test]
    fn time() {
        let utc = Time::from_content(b"240115103000Z", false).unwrap();
        assert!(!utc.is_generalized());
        assert_eq!(utc.as_str(), "240115103000Z");
        assert!(Time::from_content(b"20240115103000Z", true).is_ok());
        assert!(Time::from_content(b"2401", false).is_err());
        assert!(Time::from_content(b"24011510x0Z", false).is_err());
    }

    #[test]
    fn text() {
        assert_eq!(
            decode_text(Kind::Utf8String, Cow::Borrowed("Київ".as_bytes()))
                .unwrap(),
            "Київ"
        );
        assert!(
            decode_text(Kind::Utf8String, Cow::Borrowed(b"\xFF")).is_err()
        );
        assert!(
            decode_text(Kind::PrintableString, Cow::Borrowed(b"\xC0"))
                .is_err()
        );
        assert_eq!(
            decode_text(
                Kind::BmpString, Cow::Borrowed(b"\x04\x1a\x04\x38")
            ).unwrap(),
            "Ки"
        );
        assert!(
            decode_text(Kind::BmpString, Cow::Borrowed(b"\x04")).is_err()
        );
    }
}
