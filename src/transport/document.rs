//! Decoded transport documents.
//!
//! This is a private module. Its public items are re-exported by the parent.

use bytes::Bytes;
use crate::decode::{decode_ber, DecodeError};
use crate::node::Node;
use crate::oid;
use crate::pkcs7::CONTENT_INFO;
use super::encode::encode_transport;
use super::header::{Headers, HeaderWarning};
use super::repair::Quirk;


//------------ Document ------------------------------------------------------

/// A decoded transport document.
///
/// The document keeps all its segments. For convenience, the label and
/// body of the primary segment are available directly. This is the first
/// `UA1_SIGN` or `UA1_CRYPT` segment or, if there is none, the first
/// segment.
///
/// All octet sequences are slices of the data the document was decoded
/// from, so they are cheap to clone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Document {
    /// The label of the primary segment.
    pub label: String,

    /// The headers of the document.
    pub headers: Headers,

    /// The body of the primary segment.
    pub body: Bytes,

    /// All segments in the order they appeared in.
    pub segments: Vec<Segment>,

    /// Problems with header lines encountered during decoding.
    pub warnings: Vec<HeaderWarning>,

    /// Defects of the data that were repaired during decoding.
    pub repairs: Vec<Quirk>,
}

impl Document {
    /// Creates a new document with a single segment and no headers.
    pub fn new(label: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let label = label.into();
        let body = body.into();
        Document {
            segments: vec![Segment { label: label.clone(), body: body.clone() }],
            label,
            headers: Headers::new(),
            body,
            warnings: Vec::new(),
            repairs: Vec::new(),
        }
    }

    /// Returns the first segment with the given label.
    pub fn segment(&self, label: &str) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.label == label)
    }

    /// Returns the value of a header.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Decodes the body as a PKCS #7 ContentInfo.
    ///
    /// Data following the ContentInfo is ignored.
    pub fn content_info(&self) -> Result<Node, DecodeError> {
        decode_ber(&self.body, &CONTENT_INFO, self.body.len()).map(|x| x.0)
    }

    /// Returns the content signed by a SignedData body.
    ///
    /// Returns `Ok(None)` if the body isn’t SignedData or if the signature
    /// is detached. The returned bytes share the body’s memory unless the
    /// content was encoded in segments.
    pub fn signed_content(&self) -> Result<Option<Bytes>, DecodeError> {
        let info = self.content_info()?;
        let is_signed = info.field("contentType").and_then(Node::as_oid)
            == Some(oid::PKCS7_SIGNED_DATA);
        if !is_signed {
            return Ok(None)
        }
        let content = match info.get("content.contentInfo.content.value") {
            Ok(content) => content,
            Err(_) => return Ok(None),
        };
        if let Some(octets) = content.as_borrowed_bytes() {
            return Ok(Some(self.body.slice_ref(octets)))
        }
        Ok(content.as_bytes().map(Bytes::copy_from_slice))
    }

    /// Encodes the document.
    ///
    /// See [`encode_transport`] for details.
    pub fn to_bytes(&self) -> Bytes {
        encode_transport(self)
    }
}


//------------ Segment -------------------------------------------------------

/// A labelled part of a transport document.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Segment {
    pub label: String,
    pub body: Bytes,
}

impl Segment {
    pub fn new(label: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Segment { label: label.into(), body: body.into() }
    }
}


//============ Tests =========================================================
