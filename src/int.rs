//! BER encoded integers.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use crate::decode::DecodeError;
use crate::mode::Mode;


//------------ Macros for built-in integers ----------------------------------

macro_rules! signed_conv {
    ( $( $name:ident => $type:ident ),* ) => {
        $(
            /// Converts the integer into a built-in signed integer.
            ///
            /// Returns `None` if the value doesn’t fit.
            pub fn $name(&self) -> Option<$type> {
                const LEN: usize = ($type::BITS / 8) as usize;
                let octets = trimmed(self.0);
                if octets.len() > LEN {
                    return None
                }
                let mut buf = if self.is_negative() {
                    [0xFFu8; LEN]
                }
                else {
                    [0u8; LEN]
                };
                buf[LEN - octets.len()..].copy_from_slice(octets);
                Some($type::from_be_bytes(buf))
            }
        )*
    }
}

macro_rules! unsigned_conv {
    ( $( $name:ident => $type:ident ),* ) => {
        $(
            /// Converts the integer into a built-in unsigned integer.
            ///
            /// Returns `None` if the value is negative or doesn’t fit.
            pub fn $name(&self) -> Option<$type> {
                const LEN: usize = ($type::BITS / 8) as usize;
                if self.is_negative() {
                    return None
                }
                let octets = match trimmed(self.0) {
                    [0, rest @ ..] if !rest.is_empty() => rest,
                    octets => octets,
                };
                if octets.len() > LEN {
                    return None
                }
                let mut buf = [0u8; LEN];
                buf[LEN - octets.len()..].copy_from_slice(octets);
                Some($type::from_be_bytes(buf))
            }
        )*
    }
}


//------------ Integer -------------------------------------------------------

/// A BER encoded integer.
///
/// The value is kept as the content octets of the encoded value, a big-endian
/// two’s complement representation of arbitrary size. This is enough for
/// serial numbers of certificates which can be up to twenty octets long.
/// Conversion into the built-in types is available through the various
/// `to_` methods.
///
/// Under BER rules the encoding may contain redundant leading octets. Under
/// CER and DER they are rejected when decoding.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Integer<'a>(&'a [u8]);

impl<'a> Integer<'a> {
    /// Creates an integer from the content octets of a value.
    pub fn from_content(
        content: &'a [u8], mode: Mode, offset: usize
    ) -> Result<Self, DecodeError> {
        match content {
            [] => {
                Err(DecodeError::malformed("empty integer", offset))
            }
            [0, second, ..]
                if mode.is_restricted() && second & 0x80 == 0 =>
            {
                Err(DecodeError::malformed("non-minimal integer", offset))
            }
            [0xFF, second, ..]
                if mode.is_restricted() && second & 0x80 != 0 =>
            {
                Err(DecodeError::malformed("non-minimal integer", offset))
            }
            _ => Ok(Integer(content))
        }
    }

    /// Returns the content octets.
    pub fn as_slice(&self) -> &'a [u8] {
        self.0
    }

    /// Returns whether the value is negative.
    pub fn is_negative(&self) -> bool {
        self.0.first().is_some_and(|first| first & 0x80 != 0)
    }

    signed_conv!(to_i8 => i8, to_i16 => i16, to_i32 => i32, to_i64 => i64);
    unsigned_conv!(to_u8 => u8, to_u16 => u16, to_u32 => u32, to_u64 => u64);
}

/// Strips redundant leading sign octets.
fn trimmed(mut octets: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = octets {
        match rest.first() {
            Some(second)
                if (*first == 0 && second & 0x80 == 0)
                    || (*first == 0xFF && second & 0x80 != 0) =>
            {
                octets = rest
            }
            _ => break
        }
    }
    octets
}


//--- Display and Debug

impl fmt::Display for Integer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(value) = self.to_i64() {
            return write!(f, "{}", value)
        }
        f.write_str("0x")?;
        for octet in self.0 {
            write!(f, "{:02X}", octet)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Integer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Integer({})", self)
    }
}


//============ Tests =========================================================
