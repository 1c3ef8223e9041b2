//! ASN.1 Object Identifiers.
//!
//! This module contains the [`Oid`] type that implements object identifiers,
//! a construct used by ASN.1 to uniquely identify all sorts of things. The
//! type is also re-exported at the top-level. The module also contains
//! constants for the identifiers that show up in the documents we decode.

use std::{fmt, hash};
use crate::decode::DecodeError;


//------------ Oid -----------------------------------------------------------

/// An object identifer.
///
/// Object identifiers are globally unique, hierarchical values that are used
/// to identify objects or their type. When written, they are presented as a
/// sequence of integers separated by dots such as ‘1.2.840.113549.1.7.2’.
///
/// Values of this type keep a single object identifer in its BER encoding,
/// borrowed from wherever it was decoded. An `Oid` obtained from decoding has
/// been checked for a correct encoding, so iterating over its arcs and
/// displaying it can’t fail.
///
/// Known identifiers are defined as constants of type [`ConstOid`] via
/// [`Oid::from_static`]. Their correctness is checked by the tests of this
/// module.
#[derive(Clone, Copy)]
pub struct Oid<'a>(&'a [u8]);

/// A type alias for `Oid<'static>`.
///
/// This is useful when defining object identifier constants.
pub type ConstOid = Oid<'static>;

impl<'a> Oid<'a> {
    /// Creates an identifier from its encoding without checking it.
    ///
    /// This is intended for constants only.
    pub const fn from_static(encoded: &'static [u8]) -> ConstOid {
        Oid(encoded)
    }

    /// Creates an identifier from the content octets of a value.
    ///
    /// The content must be non-empty, every subidentifier must be encoded
    /// minimally, fit into a `u64`, and the last octet must not have its
    /// continuation bit set. Errors are reported at `offset`.
    pub fn from_content(
        content: &'a [u8], offset: usize
    ) -> Result<Self, DecodeError> {
        if content.is_empty() {
            return Err(DecodeError::malformed(
                "empty object identifier", offset
            ))
        }
        let mut start_of_sub = true;
        let mut bits = 0u32;
        for &octet in content {
            if start_of_sub && octet == 0x80 {
                return Err(DecodeError::malformed(
                    "non-minimal object identifier component", offset
                ))
            }
            if start_of_sub {
                bits = 8 - (octet & 0x7F).leading_zeros();
            }
            else {
                bits += 7;
            }
            if bits > 64 {
                return Err(DecodeError::malformed(
                    "object identifier component too large", offset
                ))
            }
            start_of_sub = octet & 0x80 == 0;
        }
        if !start_of_sub {
            return Err(DecodeError::malformed(
                "truncated object identifier", offset
            ))
        }
        Ok(Oid(content))
    }

    /// Encodes an identifier given in dotted notation.
    ///
    /// Returns `None` if the string isn’t a valid identifier, i.e., if it
    /// has less than two components, the first is larger than 2, or the
    /// second is 40 or larger under a first component of 0 or 1.
    pub fn encode_dotted(dotted: &str) -> Option<Vec<u8>> {
        let mut arcs = dotted.split('.').map(|arc| arc.parse::<u64>().ok());
        let first = arcs.next()??;
        let second = arcs.next()??;
        if first > 2 || (first < 2 && second >= 40) {
            return None
        }
        let mut res = Vec::new();
        append_subidentifier(first.checked_mul(40)?.checked_add(second)?, &mut res);
        for arc in arcs {
            append_subidentifier(arc?, &mut res);
        }
        Some(res)
    }

    /// Returns the encoded octets of the identifier.
    pub fn as_slice(&self) -> &'a [u8] {
        self.0
    }

    /// Returns an iterator over the arcs of this object identifier.
    pub fn arcs(&self) -> Arcs<'a> {
        Arcs { slice: self.0, position: Position::First, second: None }
    }
}

/// Appends a single subidentifier in base-128 form.
fn append_subidentifier(value: u64, target: &mut Vec<u8>) {
    let groups = (64 - value.leading_zeros()).div_ceil(7).max(1);
    for i in (0..groups).rev() {
        let mut octet = ((value >> (i * 7)) & 0x7F) as u8;
        if i != 0 {
            octet |= 0x80
        }
        target.push(octet)
    }
}


//--- AsRef

impl AsRef<[u8]> for Oid<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0
    }
}


//--- PartialEq and Eq

impl PartialEq<Oid<'_>> for Oid<'_> {
    fn eq(&self, other: &Oid) -> bool {
        self.0 == other.0
    }
}

impl Eq for Oid<'_> { }

impl PartialEq<str> for Oid<'_> {
    fn eq(&self, other: &str) -> bool {
        let mut dotted = other.split('.');
        for arc in self.arcs() {
            match dotted.next().and_then(|s| s.parse::<u64>().ok()) {
                Some(value) if value == arc => { }
                _ => return false
            }
        }
        dotted.next().is_none()
    }
}

impl PartialEq<&str> for Oid<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.eq(*other)
    }
}


//--- Hash

impl hash::Hash for Oid<'_> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}


//--- Display and Debug

impl fmt::Display for Oid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut arcs = self.arcs();
        if let Some(first) = arcs.next() {
            write!(f, "{}", first)?;
        }
        for arc in arcs {
            write!(f, ".{}", arc)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Oid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}


//------------ Arcs ----------------------------------------------------------

/// The position of the next arc in the object identifier.
///
/// As the first two arcs of the object identifer are encoded in the
/// first subidentifier of the encoded value, we have three different cases.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Position {
    First,
    Second,
    Other,
}

/// An iterator over the arcs of an object identifier.
#[derive(Clone, Debug)]
pub struct Arcs<'a> {
    /// The remainder of the object identifier’s encoded octets.
    slice: &'a [u8],

    /// The position of the next arc.
    position: Position,

    /// The value of the second arc once the first one has been produced.
    second: Option<u64>,
}

impl Arcs<'_> {
    /// Takes the next subidentifier.
    ///
    /// Values that don’t fit into a `u64` are saturated. This can only
    /// happen for unchecked constants.
    fn take_subidentifier(&mut self) -> Option<u64> {
        if self.slice.is_empty() {
            return None
        }
        let mut res = 0u64;
        let mut used = 0;
        for &octet in self.slice {
            used += 1;
            res = res.saturating_mul(128) | u64::from(octet & 0x7F);
            if octet & 0x80 == 0 {
                break
            }
        }
        self.slice = self.slice.get(used..).unwrap_or_default();
        Some(res)
    }
}

impl Iterator for Arcs<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match self.position {
            Position::First => {
                let sub = self.take_subidentifier()?;
                let (first, second) = match sub {
                    0..=39 => (0, sub),
                    40..=79 => (1, sub - 40),
                    _ => (2, sub - 80),
                };
                self.second = Some(second);
                self.position = Position::Second;
                Some(first)
            }
            Position::Second => {
                self.position = Position::Other;
                self.second.take()
            }
            Position::Other => self.take_subidentifier(),
        }
    }
}


//------------ Known Identifiers ---------------------------------------------

/// PKCS #7 data, 1.2.840.113549.1.7.1.
pub const PKCS7_DATA: ConstOid = Oid::from_static(
    &[42, 134, 72, 134, 247, 13, 1, 7, 1]
);

/// PKCS #7 signedData, 1.2.840.113549.1.7.2.
pub const PKCS7_SIGNED_DATA: ConstOid = Oid::from_static(
    &[42, 134, 72, 134, 247, 13, 1, 7, 2]
);

/// PKCS #7 envelopedData, 1.2.840.113549.1.7.3.
pub const PKCS7_ENVELOPED_DATA: ConstOid = Oid::from_static(
    &[42, 134, 72, 134, 247, 13, 1, 7, 3]
);

/// PKCS #7 digestedData, 1.2.840.113549.1.7.5.
pub const PKCS7_DIGESTED_DATA: ConstOid = Oid::from_static(
    &[42, 134, 72, 134, 247, 13, 1, 7, 5]
);

/// PKCS #7 encryptedData, 1.2.840.113549.1.7.6.
pub const PKCS7_ENCRYPTED_DATA: ConstOid = Oid::from_static(
    &[42, 134, 72, 134, 247, 13, 1, 7, 6]
);

/// PKCS #9 contentType attribute, 1.2.840.113549.1.9.3.
pub const PKCS9_CONTENT_TYPE: ConstOid = Oid::from_static(
    &[42, 134, 72, 134, 247, 13, 1, 9, 3]
);

/// PKCS #9 messageDigest attribute, 1.2.840.113549.1.9.4.
pub const PKCS9_MESSAGE_DIGEST: ConstOid = Oid::from_static(
    &[42, 134, 72, 134, 247, 13, 1, 9, 4]
);

/// PKCS #9 signingTime attribute, 1.2.840.113549.1.9.5.
pub const PKCS9_SIGNING_TIME: ConstOid = Oid::from_static(
    &[42, 134, 72, 134, 247, 13, 1, 9, 5]
);

/// GOST 34.311-95 hash, 1.2.804.2.1.1.1.1.2.1.
pub const GOST_34311: ConstOid = Oid::from_static(
    &[42, 134, 36, 2, 1, 1, 1, 1, 2, 1]
);

/// GOST 28147-89 in CFB mode, 1.2.804.2.1.1.1.1.1.1.3.
pub const GOST_28147_CFB: ConstOid = Oid::from_static(
    &[42, 134, 36, 2, 1, 1, 1, 1, 1, 1, 3]
);

/// DSTU 4145 signatures with GOST 34.311, 1.2.804.2.1.1.1.1.3.1.1.
pub const DSTU_4145_LE: ConstOid = Oid::from_static(
    &[42, 134, 36, 2, 1, 1, 1, 1, 3, 1, 1]
);


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn constants_match_dotted() {
        let known = [
            (PKCS7_DATA, "1.2.840.113549.1.7.1"),
            (PKCS7_SIGNED_DATA, "1.2.840.113549.1.7.2"),
            (PKCS7_ENVELOPED_DATA, "1.2.840.113549.1.7.3"),
            (PKCS7_DIGESTED_DATA, "1.2.840.113549.1.7.5"),
            (PKCS7_ENCRYPTED_DATA, "1.2.840.113549.1.7.6"),
            (PKCS9_CONTENT_TYPE, "1.2.840.113549.1.9.3"),
            (PKCS9_MESSAGE_DIGEST, "1.2.840.113549.1.9.4"),
            (PKCS9_SIGNING_TIME, "1.2.840.113549.1.9.5"),
            (GOST_34311, "1.2.804.2.1.1.1.1.2.1"),
            (GOST_28147_CFB, "1.2.804.2.1.1.1.1.1.1.3"),
            (DSTU_4145_LE, "1.2.804.2.1.1.1.1.3.1.1"),
        ];
        for (oid, dotted) in known {
            assert_eq!(
                Oid::encode_dotted(dotted).unwrap(), oid.as_slice(), "{dotted}"
            );
            assert!(Oid::from_content(oid.as_slice(), 0).is_ok());
            assert_eq!(oid.to_string(), dotted);
            assert_eq!(oid, dotted);
        }
    }

    #[test]
    fn first_arcs() {
        let two = Oid::encode_dotted("2.999.3").unwrap();
        assert_eq!(two, b"\x88\x37\x03");
        let oid = Oid::from_content(&two, 0).unwrap();
        assert_eq!(oid.arcs().collect::<Vec<_>>(), [2, 999, 3]);
        assert_eq!(oid.to_string(), "2.999.3");
    }

    #[test]
    fn compare_with_str() {
        assert!(PKCS7_DATA == "1.2.840.113549.1.7.1");
        assert!(PKCS7_DATA != "1.2.840.113549.1.7");
        assert!(PKCS7_DATA != "1.2.840.113549.1.7.1.0");
        assert!(PKCS7_DATA != "1.2.840.113549.1.7.x");
    }

    #[test]
    fn bad_encodings() {
        assert!(Oid::from_content(b"", 0).is_err());
        assert!(Oid::from_content(b"\x2a\x86", 0).is_err());
        assert!(Oid::from_content(b"\x2a\x80\x01", 0).is_err());
        let mut huge = vec![0x2a];
        huge.extend_from_slice(&[0xFF; 10]);
        huge.push(0x7F);
        assert!(Oid::from_content(&huge, 0).is_err());
        // Exactly 64 bits is fine.
        let mut max = vec![0x2a, 0x81];
        max.extend_from_slice(&[0xFF; 8]);
        max.push(0x7F);
        let oid = Oid::from_content(&max, 0).unwrap();
        assert_eq!(oid.arcs().last(), Some(u64::MAX));
    }

    #[test]
    fn bad_dotted() {
        assert!(Oid::encode_dotted("1").is_none());
        assert!(Oid::encode_dotted("3.1").is_none());
        assert!(Oid::encode_dotted("1.40").is_none());
        assert!(Oid::encode_dotted("1.2.x").is_none());
    }
}
