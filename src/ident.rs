//! The identifier octets of a BER encoded value.
//!
//! This is a private module. The relevant items are re-exported by the
//! parent.

use std::fmt;
use crate::decode::{DecodeError, SliceSource};
use crate::mode::Mode;


//------------ Tag -----------------------------------------------------------

/// The tag of a value.
///
/// In ASN.1, tags are used to identify the type of a value. Tags consist of
/// one of four classes, represented by the [`Class`] enum, and a number
/// within this class. The number is an unsigned integer.
///
/// In BER encoding, the tag becomes part of the identifier octets by
/// combining it with a bit indicating whether a value is primitive or
/// constructed. That combination is the [`Ident`] type.
///
/// # Limitations
///
/// We only support tag numbers that fit into a `u32`. Identifier octets
/// encoding larger numbers are rejected with a tag overflow error.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tag {
    class: Class,
    number: u32,
}

impl Tag {
    /// Creates a tag from a class and number.
    pub const fn new(class: Class, number: u32) -> Self {
        Tag { class, number }
    }

    /// Creates a new tag in the universal class with the given tag number.
    pub const fn universal(number: u32) -> Self {
        Self::new(Class::Universal, number)
    }

    /// Creates a new tag in the application class with the given tag number.
    pub const fn application(number: u32) -> Self {
        Self::new(Class::Application, number)
    }

    /// Creates a new tag in class “context specific” with the given number.
    pub const fn ctx(number: u32) -> Self {
        Self::new(Class::Context, number)
    }

    /// Creates a new tag in the private class with the given tag number.
    pub const fn private(number: u32) -> Self {
        Self::new(Class::Private, number)
    }

    /// Returns the class of the tag.
    pub const fn class(self) -> Class {
        self.class
    }

    /// Returns the number of the tag.
    pub const fn number(self) -> u32 {
        self.number
    }
}

/// # Constants for universal tags.
///
/// See clause 8.4 of ITU Recommendation X.690. Only the types that appear
/// in PKCS7 content are listed.
///
impl Tag {
    /// The tag marking the end-of-contents in an indefinite length value.
    ///
    /// This is UNIVERSAL 0.
    pub const END_OF_CONTENTS: Self = Self::universal(0);

    /// The tag for the BOOLEAN type, UNIVERSAL 1.
    pub const BOOLEAN: Self = Self::universal(1);

    /// The tag for the INTEGER type, UNIVERSAL 2.
    pub const INTEGER: Self = Self::universal(2);

    /// The tag for the BIT STRING type, UNIVERSAL 3.
    pub const BIT_STRING: Self = Self::universal(3);

    /// The tag for the OCTET STRING type, UNIVERSAL 4.
    pub const OCTET_STRING: Self = Self::universal(4);

    /// The tag for the NULL type, UNIVERSAL 5.
    pub const NULL: Self = Self::universal(5);

    /// The tag for the OBJECT IDENTIFIER type, UNIVERSAL 6.
    pub const OID: Self = Self::universal(6);

    /// The tag for the ENUMERATED type, UNIVERSAL 10.
    pub const ENUMERATED: Self = Self::universal(10);

    /// The tag for the UTF8String type, UNIVERSAL 12
    pub const UTF8_STRING: Self = Self::universal(12);

    /// The tag for the SEQUENCE and SEQUENCE OF types, UNIVERSAL 16.
    pub const SEQUENCE: Self = Self::universal(16);

    /// The tag for the SET and SET OF types, UNIVERSAL 17.
    pub const SET: Self = Self::universal(17);

    /// The tag for the PrintableString type, UNIVERSAL 19.
    pub const PRINTABLE_STRING: Self = Self::universal(19);

    /// The tag for the IA5String type, UNIVERSAL 22.
    pub const IA5_STRING: Self = Self::universal(22);

    /// The tag for the UTCTime type, UNIVERSAL 23.
    pub const UTC_TIME: Self = Self::universal(23);

    /// The tag for the GeneralizedType type, UNIVERSAL 24.
    pub const GENERALIZED_TIME: Self = Self::universal(24);

    /// The tag for the BMPString type, UNIVERSAL 30.
    pub const BMP_STRING: Self = Self::universal(30);
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Tag::END_OF_CONTENTS => write!(f, "end-of-contents"),
            Tag::BOOLEAN => write!(f, "BOOLEAN"),
            Tag::INTEGER => write!(f, "INTEGER"),
            Tag::BIT_STRING => write!(f, "BIT STRING"),
            Tag::OCTET_STRING => write!(f, "OCTET STRING"),
            Tag::NULL => write!(f, "NULL"),
            Tag::OID => write!(f, "OBJECT IDENTIFIER"),
            Tag::ENUMERATED => write!(f, "ENUMERATED"),
            Tag::UTF8_STRING => write!(f, "UTF8String"),
            Tag::SEQUENCE => write!(f, "SEQUENCE"),
            Tag::SET => write!(f, "SET"),
            Tag::PRINTABLE_STRING => write!(f, "PrintableString"),
            Tag::IA5_STRING => write!(f, "IA5String"),
            Tag::UTC_TIME => write!(f, "UTCTime"),
            Tag::GENERALIZED_TIME => write!(f, "GeneralizedTime"),
            Tag::BMP_STRING => write!(f, "BMPString"),
            tag => {
                match tag.class() {
                    Class::Universal => write!(f, "[UNIVERSAL ")?,
                    Class::Application => write!(f, "[APPLICATION ")?,
                    Class::Context => write!(f, "[")?,
                    Class::Private => write!(f, "[PRIVATE ")?,
                }
                write!(f, "{}]", tag.number())
            }
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}


//------------ Ident ---------------------------------------------------------

/// The identifier octets of a value: its tag and the constructed bit.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Ident {
    tag: Tag,
    constructed: bool,
}

impl Ident {
    /// The identifier of the end-of-contents marker.
    pub const END_OF_CONTENTS: Self = Self::new(Tag::END_OF_CONTENTS, false);

    /// The mask for the class bits of the first octet.
    const CLASS_MASK: u8 = 0xc0;

    /// The constructed bit of the first octet.
    const CONSTRUCTED_MASK: u8 = 0x20;

    /// The tag number bits of the first octet.
    ///
    /// If all of them are set, the number follows in subsequent octets.
    const SINGLEBYTE_DATA_MASK: u8 = 0x1f;

    /// The data bits of subsequent octets.
    const MULTIBYTE_DATA_MASK: u8 = 0x7f;

    /// The bit marking that more octets follow.
    const MORE_OCTETS_MASK: u8 = 0x80;

    /// Creates identifier octets from a tag.
    pub const fn new(tag: Tag, constructed: bool) -> Self {
        Ident { tag, constructed }
    }

    /// Returns the tag for the identifier octets.
    pub const fn tag(self) -> Tag {
        self.tag
    }

    /// Returns the class of the identifier octets.
    pub const fn class(self) -> Class {
        self.tag.class
    }

    /// Returns whether the value is a constructed value.
    pub const fn is_constructed(self) -> bool {
        self.constructed
    }

    /// Returns the number of the tag.
    pub const fn number(self) -> u32 {
        self.tag.number
    }

    /// Takes the identifier octets from the beginning of a source.
    ///
    /// High tag numbers are decoded from their base-128 form. If the number
    /// doesn’t fit into a `u32`, a tag overflow error is returned rather
    /// than a silently wrapped number. In CER and DER modes, the high tag
    /// number form must be minimal.
    pub fn take_from(
        source: &mut SliceSource, mode: Mode
    ) -> Result<Self, DecodeError> {
        let start = source.pos();
        let first = source.take_u8()?;
        let class = Class::from_u8(first & Self::CLASS_MASK);
        let constructed = first & Self::CONSTRUCTED_MASK != 0;

        if first & Self::SINGLEBYTE_DATA_MASK != Self::SINGLEBYTE_DATA_MASK {
            return Ok(Ident::new(
                Tag::new(class, u32::from(first & Self::SINGLEBYTE_DATA_MASK)),
                constructed
            ))
        }

        let mut number = 0u32;
        let mut octets = 0usize;
        loop {
            let octet = source.take_u8()?;
            if octets == 0 && octet == Self::MORE_OCTETS_MASK
                && mode.is_restricted()
            {
                return Err(DecodeError::malformed(
                    "non-minimal tag number", start
                ))
            }
            number = number.checked_mul(128).ok_or_else(|| {
                DecodeError::tag_overflow(start)
            })? | u32::from(octet & Self::MULTIBYTE_DATA_MASK);
            octets += 1;
            if octet & Self::MORE_OCTETS_MASK == 0 {
                break
            }
        }
        if number < u32::from(Self::SINGLEBYTE_DATA_MASK)
            && mode.is_restricted()
        {
            return Err(DecodeError::malformed(
                "high tag number form for low tag number", start
            ))
        }
        Ok(Ident::new(Tag::new(class, number), constructed))
    }

    /// Appends the encoded identifier octets to the end of `target`.
    pub fn append_encoded(self, target: &mut Vec<u8>) {
        let mut first = self.tag.class.into_u8();
        if self.constructed {
            first |= Self::CONSTRUCTED_MASK
        }
        let number = self.tag.number;
        if number < u32::from(Self::SINGLEBYTE_DATA_MASK) {
            target.push(first | number as u8);
            return
        }
        target.push(first | Self::SINGLEBYTE_DATA_MASK);

        // Seven bits at a time, most significant group first.
        let groups = (32 - number.leading_zeros()).div_ceil(7);
        for i in (0..groups).rev() {
            let mut octet = ((number >> (i * 7)) as u8) & Self::MULTIBYTE_DATA_MASK;
            if i != 0 {
                octet |= Self::MORE_OCTETS_MASK
            }
            target.push(octet)
        }
    }

    /// Returns the number of octets of the encoded form.
    pub fn encoded_len(self) -> usize {
        let number = self.tag.number;
        if number < u32::from(Self::SINGLEBYTE_DATA_MASK) {
            1
        }
        else {
            1 + (32 - number.leading_zeros()).div_ceil(7) as usize
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.constructed {
            write!(f, "{} (constructed)", self.tag)
        }
        else {
            write!(f, "{}", self.tag)
        }
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ident({})", self)
    }
}


//------------ Class ---------------------------------------------------------

/// The class of a tag.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Class {
    Universal,
    Application,
    Context,
    Private,
}

impl Class {
    const fn from_u8(octet: u8) -> Self {
        match octet {
            0x00..=0x3F => Self::Universal,
            0x40..=0x7F => Self::Application,
            0x80..=0xBF => Self::Context,
            _ => Self::Private
        }
    }

    const fn into_u8(self) -> u8 {
        match self {
            Self::Universal => 0x00,
            Self::Application => 0x40,
            Self::Context => 0x80,
            Self::Private => 0xC0,
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    const CLASSES: &[Class] = &[
        Class::Universal, Class::Application, Class::Context, Class::Private
    ];

    fn take(data: &[u8], mode: Mode) -> Result<Ident, DecodeError> {
        Ident::take_from(&mut SliceSource::new(data, 0), mode)
    }

    #[test]
    fn round_trip_edge_numbers() {
        let numbers = [
            0, 1, 0x1e, 0x1f, 0x7f, 0x80, 0x3fff, 0x4000, 0x1f_ffff,
            0x20_0000, u32::MAX
        ];
        for &class in CLASSES {
            for &number in &numbers {
                for &constructed in &[false, true] {
                    let ident = Ident::new(Tag::new(class, number), constructed);
                    let mut encoded = Vec::new();
                    ident.append_encoded(&mut encoded);
                    assert_eq!(encoded.len(), ident.encoded_len());
                    assert_eq!(take(&encoded, Mode::Der).unwrap(), ident);
                }
            }
        }
    }

    #[test]
    fn single_octet() {
        let ident = take(b"\xa0", Mode::Ber).unwrap();
        assert_eq!(ident.tag(), Tag::ctx(0));
        assert!(ident.is_constructed());
        assert_eq!(take(b"\x30", Mode::Ber).unwrap().tag(), Tag::SEQUENCE);
    }

    #[test]
    fn tag_overflow() {
        // 2^35 needs five groups with the top one exceeding four bits.
        let large = b"\x1f\xff\xff\xff\xff\x7f";
        assert!(matches!(
            take(large, Mode::Ber),
            Err(DecodeError::TagOverflow { .. })
        ));
        // An endless continuation runs out of data instead.
        assert!(matches!(
            take(b"\x1f\x81", Mode::Ber),
            Err(DecodeError::Malformed { .. })
        ));
    }

    #[test]
    fn restricted_rules() {
        // Leading zero group.
        assert!(take(b"\x1f\x80\x01", Mode::Ber).is_ok());
        assert!(take(b"\x1f\x80\x01", Mode::Der).is_err());
        // High form for a low number.
        assert!(take(b"\x1f\x05", Mode::Ber).is_ok());
        assert!(take(b"\x1f\x05", Mode::Der).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Tag::OID.to_string(), "OBJECT IDENTIFIER");
        assert_eq!(Tag::ctx(3).to_string(), "[3]");
        assert_eq!(Tag::application(7).to_string(), "[APPLICATION 7]");
    }
}
