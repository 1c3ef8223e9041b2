//! Captured encoded data.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use crate::ident::{Ident, Tag};


//------------ Captured ------------------------------------------------------

/// A value kept in its encoded form.
///
/// This is what a schema accepting any value produces. It keeps the
/// identifier of the value, the content octets and the complete encoding
/// including the identifier and length octets, all borrowed from the
/// decoded buffer. Opaque payloads, e.g., certificates or a nested transport
/// document, flow through the decoder this way without being interpreted.
///
/// For a value of indefinite length, the content does not include the
/// end-of-contents marker while the encoding does.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Captured<'a> {
    /// The identifier octets of the value.
    ident: Ident,

    /// The content octets.
    content: &'a [u8],

    /// The complete encoding.
    encoding: &'a [u8],
}

impl<'a> Captured<'a> {
    pub(crate) fn new(
        ident: Ident, content: &'a [u8], encoding: &'a [u8]
    ) -> Self {
        Captured { ident, content, encoding }
    }

    /// Returns the identifier of the captured value.
    pub fn ident(&self) -> Ident {
        self.ident
    }

    /// Returns the tag of the captured value.
    pub fn tag(&self) -> Tag {
        self.ident.tag()
    }

    /// Returns whether the captured value is constructed.
    pub fn is_constructed(&self) -> bool {
        self.ident.is_constructed()
    }

    /// Returns the content octets.
    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// Returns the complete encoding of the value.
    pub fn as_slice(&self) -> &'a [u8] {
        self.encoding
    }
}


//--- AsRef

impl AsRef<[u8]> for Captured<'_> {
    fn as_ref(&self) -> &[u8] {
        self.encoding
    }
}


//--- Debug

impl fmt::Debug for Captured<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Captured({}, {} octets)", self.ident, self.content.len())
    }
}
