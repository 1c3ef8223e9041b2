//! Encoding data in Basic Encoding Rules.
//!
//! This module provides the [`Values`] trait for types that know how to
//! encode themselves as a sequence of BER values, together with value
//! encoders for single primitive and constructed values. It is used to
//! build documents for tests and round trips, not to produce canonical DER.
//!
//! The functions [`prim`], [`dcons`] and [`icons`] create the value
//! encoders. Tuples, slices, vecs and options of value encoders are value
//! encoders themselves, so a complete structure can be written as nested
//! function calls:
//!
//! ```
//! use zozol::encode::{dcons, prim, Values};
//! use zozol::Tag;
//!
//! let encoded = dcons(Tag::SEQUENCE, (
//!     prim(Tag::INTEGER, b"\x01"),
//!     prim(Tag::OCTET_STRING, b"foo"),
//! )).to_vec();
//! assert_eq!(encoded, b"\x30\x08\x02\x01\x01\x04\x03foo");
//! ```

use crate::captured::Captured;
use crate::ident::{Ident, Tag};
use crate::length::Length;
use crate::oid::Oid;


//------------ Values --------------------------------------------------------

/// A type that is a value encoder.
///
/// A type implementing this trait encodes itself into zero or more BER
/// values. That is, the type becomes the content or part of the content of
/// a constructed value.
pub trait Values {
    /// Returns the length of the encoded values.
    fn encoded_len(&self) -> usize;

    /// Appends the encoded values to `target`.
    fn write_encoded(&self, target: &mut Vec<u8>);


    //--- Provided methods

    /// Converts the encoder into one with an explicit tag.
    fn explicit(self, tag: Tag) -> Constructed<Self>
    where Self: Sized {
        dcons(tag, self)
    }

    /// Returns the encoded values in a new vec.
    fn to_vec(&self) -> Vec<u8> {
        let mut target = Vec::with_capacity(self.encoded_len());
        self.write_encoded(&mut target);
        target
    }
}


//--- Blanket impls

impl<V: Values + ?Sized> Values for &'_ V {
    fn encoded_len(&self) -> usize {
        (*self).encoded_len()
    }

    fn write_encoded(&self, target: &mut Vec<u8>) {
        (*self).write_encoded(target)
    }
}


//--- Impls for Tuples

/// Macro for implementing `Values` for tuples.
///
/// The `Tx`s are the type parameters of the elements of the tuple, the
/// numbers are the tuple element numbers, both provided backwards ending
/// in 0. The `tuple` bit does the actual impl and invokes itself with one
/// less tuple element. The `write` bit writes the elements starting with
/// the smallest number.
macro_rules! tupl_impl {
    // Termination: empty lists, do nothing.
    ( tuple > ) => { };

    ( tuple $t:ident $( $ttail:ident )* > $i:tt $( $itail:tt )* ) => {
        impl<$t: Values, $( $ttail: Values ),*> Values
                for ($t, $( $ttail ),*) {
            fn encoded_len(&self) -> usize {
                self.$i.encoded_len()
                $(
                    + self.$itail.encoded_len()
                )*
            }

            fn write_encoded(&self, target: &mut Vec<u8>) {
                tupl_impl!( write self, target, $i $( $itail )* );
            }
        }

        tupl_impl!(
             tuple $($ttail)* > $($itail)*
        );
    };

    // Termination: empty lists, do nothing.
    ( write $self:expr, $target:expr, ) => { };

    ( write $self:expr, $target:expr, $i:tt $($itail:tt)*) => {
        tupl_impl!( write $self, $target, $($itail)* );
        $self.$i.write_encoded($target);
    }
}

tupl_impl!(
    tuple T11 T10 T9 T8 T7 T6 T5 T4 T3 T2 T1 T0 > 11 10 9 8 7 6 5 4 3 2 1 0
);

/// Encoding of empty content.
impl Values for () {
    fn encoded_len(&self) -> usize {
        0
    }

    fn write_encoded(&self, _target: &mut Vec<u8>) { }
}


//--- Impl for Option

/// Encoding of an optional value.
///
/// `None` is encoded as nothing, i.e., as an absent OPTIONAL.
impl<V: Values> Values for Option<V> {
    fn encoded_len(&self) -> usize {
        match self {
            Some(v) => v.encoded_len(),
            None => 0,
        }
    }

    fn write_encoded(&self, target: &mut Vec<u8>) {
        if let Some(v) = self {
            v.write_encoded(target)
        }
    }
}


//--- Impl for slice and Vec

impl<V: Values> Values for [V] {
    fn encoded_len(&self) -> usize {
        self.iter().map(Values::encoded_len).sum()
    }

    fn write_encoded(&self, target: &mut Vec<u8>) {
        self.iter().for_each(|v| v.write_encoded(target))
    }
}

impl<V: Values> Values for Vec<V> {
    fn encoded_len(&self) -> usize {
        self.as_slice().encoded_len()
    }

    fn write_encoded(&self, target: &mut Vec<u8>) {
        self.as_slice().write_encoded(target)
    }
}


//--- Impls for decoded types

impl Values for Oid<'_> {
    fn encoded_len(&self) -> usize {
        prim(Tag::OID, self.as_slice()).encoded_len()
    }

    fn write_encoded(&self, target: &mut Vec<u8>) {
        prim(Tag::OID, self.as_slice()).write_encoded(target)
    }
}

impl Values for Captured<'_> {
    fn encoded_len(&self) -> usize {
        self.as_slice().len()
    }

    fn write_encoded(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(self.as_slice())
    }
}


//------------ Primitive -----------------------------------------------------

/// A value encoder for a single primitive value.
#[derive(Clone, Debug)]
pub struct Primitive<C> {
    tag: Tag,
    content: C,
}

/// Creates an encoder for a primitive value with the given content.
pub fn prim<C: AsRef<[u8]>>(tag: Tag, content: C) -> Primitive<C> {
    Primitive { tag, content }
}

impl<C: AsRef<[u8]>> Values for Primitive<C> {
    fn encoded_len(&self) -> usize {
        let len = self.content.as_ref().len();
        Ident::new(self.tag, false).encoded_len()
            + Length::Definite(len).encoded_len()
            + len
    }

    fn write_encoded(&self, target: &mut Vec<u8>) {
        let content = self.content.as_ref();
        Ident::new(self.tag, false).append_encoded(target);
        Length::Definite(content.len()).append_encoded(target);
        target.extend_from_slice(content);
    }
}


//------------ Constructed ---------------------------------------------------

/// A value encoder for a single constructed value.
#[derive(Clone, Debug)]
pub struct Constructed<V> {
    /// The tag of the value.
    tag: Tag,

    /// Whether to use the indefinite length form.
    indefinite: bool,

    /// A value encoder for the content of the value.
    inner: V,
}

/// Creates an encoder for a constructed value of definite length.
pub fn dcons<V: Values>(tag: Tag, inner: V) -> Constructed<V> {
    Constructed { tag, indefinite: false, inner }
}

/// Creates an encoder for a constructed value of indefinite length.
pub fn icons<V: Values>(tag: Tag, inner: V) -> Constructed<V> {
    Constructed { tag, indefinite: true, inner }
}

impl<V: Values> Values for Constructed<V> {
    fn encoded_len(&self) -> usize {
        let inner = self.inner.encoded_len();
        let ident = Ident::new(self.tag, true).encoded_len();
        if self.indefinite {
            ident + 1 + inner + 2
        }
        else {
            ident + Length::Definite(inner).encoded_len() + inner
        }
    }

    fn write_encoded(&self, target: &mut Vec<u8>) {
        Ident::new(self.tag, true).append_encoded(target);
        if self.indefinite {
            Length::Indefinite.append_encoded(target);
            self.inner.write_encoded(target);
            target.extend_from_slice(&[0, 0]);
        }
        else {
            Length::Definite(self.inner.encoded_len()).append_encoded(target);
            self.inner.write_encoded(target);
        }
    }
}


//------------ Helpers -------------------------------------------------------

/// Creates an encoder for an INTEGER in minimal two’s complement form.
pub fn integer(value: i64) -> Primitive<Vec<u8>> {
    let octets = value.to_be_bytes();
    let mut start = 0;
    while start < octets.len() - 1 {
        let redundant = match (octets[start], octets[start + 1] & 0x80) {
            (0, 0) => true,
            (0xFF, 0x80) => true,
            _ => false
        };
        if !redundant {
            break
        }
        start += 1;
    }
    prim(Tag::INTEGER, octets[start..].to_vec())
}

/// Creates an encoder for an OCTET STRING.
pub fn octet_string<C: AsRef<[u8]>>(content: C) -> Primitive<C> {
    prim(Tag::OCTET_STRING, content)
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nested_values() {
        let value = dcons(Tag::SEQUENCE, (
            integer(5),
            Some(octet_string(b"ab")),
            None::<Primitive<&[u8]>>,
            vec![prim(Tag::NULL, b""), prim(Tag::NULL, b"")],
        ));
        let encoded = value.to_vec();
        assert_eq!(
            encoded, b"\x30\x0b\x02\x01\x05\x04\x02ab\x05\x00\x05\x00"
        );
        assert_eq!(value.encoded_len(), encoded.len());
    }

    #[test]
    fn indefinite_and_explicit() {
        let value = icons(Tag::SEQUENCE, integer(-1).explicit(Tag::ctx(0)));
        let encoded = value.to_vec();
        assert_eq!(encoded, b"\x30\x80\xa0\x03\x02\x01\xff\x00\x00");
        assert_eq!(value.encoded_len(), encoded.len());
    }

    #[test]
    fn integers() {
        assert_eq!(integer(0).to_vec(), b"\x02\x01\x00");
        assert_eq!(integer(127).to_vec(), b"\x02\x01\x7f");
        assert_eq!(integer(128).to_vec(), b"\x02\x02\x00\x80");
        assert_eq!(integer(-128).to_vec(), b"\x02\x01\x80");
        assert_eq!(integer(-129).to_vec(), b"\x02\x02\xff\x7f");
    }

    #[test]
    fn long_length() {
        let encoded = octet_string(vec![0u8; 200]).to_vec();
        assert_eq!(&encoded[..3], b"\x04\x81\xc8");
        assert_eq!(encoded.len(), 203);
    }
}
