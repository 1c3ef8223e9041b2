//! Decoding data in Basic Encoding Rules.
//!
//! This module contains the machinery for turning BER encoded data into a
//! [`Node`][crate::node::Node] tree. The lowest layer is [`Tlv`] which
//! reads one tag-length-value triple from a slice. On top of it,
//! [`BerDecoder`] walks the encoded data driven by a
//! [`Schema`][crate::schema::Schema].
//!
//! Most of the time, the [`decode_ber`] and [`decode`] functions are all you
//! need. They use BER and the default nesting bound. For other encoding
//! rules or a different bound, create a [`BerDecoder`].
//!
//! All errors are reported via [`DecodeError`] which carries the offset
//! into the data and, where applicable, the path of the schema field being
//! decoded.

pub use self::decoder::{decode, decode_ber, BerDecoder, DEFAULT_MAX_DEPTH};
pub use self::error::{DecodeError, FieldPath};
pub use self::source::{Pos, SliceSource};
pub use self::tlv::{read_tlv, skip_indefinite, Tlv};

mod decoder;
mod error;
mod source;
mod tlv;
