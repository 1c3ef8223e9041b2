//! Decoding signed and enveloped transport documents.
//!
//! Documents exchanged with Ukrainian tax and certification services come
//! in layers. The outermost layer is a simple transport format consisting
//! of a header block and labelled segments. The body of a segment is a
//! PKCS #7 structure in Basic Encoding Rules, usually SignedData or
//! EnvelopedData, whose content can be another transport document.
//!
//! This crate decodes both layers. The [`transport`] module splits
//! transport documents into [`Document`]s and peels off nested layers. The
//! [`decode`] module turns BER data into a [`Node`] tree driven by a
//! [`Schema`]. Schemas for the PKCS #7 structures are in [`pkcs7`].
//!
//! A typical run looks like this:
//!
//! ```no_run
//! use zozol::{decode_ber, decode_transport, pkcs7};
//!
//! # fn main() -> Result<(), zozol::DecodeError> {
//! # let data = Vec::new();
//! let doc = decode_transport(&data)?;
//! let (info, _) = decode_ber(&doc.body, &pkcs7::CONTENT_INFO, doc.body.len())?;
//! if let Ok(inner) = info.get("content.contentInfo.content.value") {
//!     if let Some(inner) = inner.as_bytes() {
//!         let inner = decode_transport(inner)?;
//!         println!("{}: {:?}", inner.label, inner.header("CERT_PEM"));
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Nothing in here verifies signatures or decrypts anything. Decoding is
//! purely structural. All input is treated as untrusted: every length and
//! every nesting level is checked and problems are reported as a
//! [`DecodeError`].

pub use self::captured::Captured;
pub use self::decode::{decode, decode_ber, BerDecoder, DecodeError, FieldPath};
pub use self::ident::{Class, Ident, Tag};
pub use self::int::Integer;
pub use self::length::Length;
pub use self::mode::Mode;
pub use self::node::{Node, PathError, Value};
pub use self::oid::{ConstOid, Oid};
pub use self::schema::Schema;
pub use self::string::{BitString, Time};
pub use self::transport::{
    decode_transport, unwrap_layers, Document, TransportDecoder,
};

pub mod decode;
pub mod encode;
pub mod oid;
pub mod pkcs7;
pub mod schema;
pub mod transport;

mod captured;
mod ident;
mod int;
mod length;
mod mode;
mod node;
mod string;
