//! Transport documents.
//!
//! Signed and encrypted documents exchanged with Ukrainian tax and
//! certification services are wrapped in a simple transport format. A
//! document consists of an optional header block introduced by the magic
//! `TRANSPORTABLE` and one or more labelled segments. The body of a
//! `UA1_SIGN` segment is a PKCS #7 SignedData, the body of a `UA1_CRYPT`
//! segment a PKCS #7 EnvelopedData. The signed content is often another
//! transport document, so documents nest.
//!
//! The [`TransportDecoder`] decodes a single layer into a [`Document`].
//! The function [`decode_transport`] does the same with the default
//! settings. Use [`unwrap_layers`] to peel off all nested layers at once.
//!
//! Known defects of documents produced by older software are repaired
//! before decoding. The repairs are logged and recorded in the document.

pub use self::document::{Document, Segment};
pub use self::encode::encode_transport;
pub use self::envelope::{CERTCRYPT, MAGIC, MAX_LABEL_LEN, UA1_CRYPT, UA1_SIGN};
pub use self::header::{HeaderEncoding, Headers, HeaderWarning, WarningKind};
pub use self::repair::{repair, Quirk};

use bytes::Bytes;
use tracing::{debug, warn};
use crate::decode::DecodeError;
use self::envelope::Envelope;

mod document;
mod encode;
mod envelope;
mod header;
mod repair;

#[cfg(test)]
mod test;


//------------ TransportDecoder ----------------------------------------------

/// The default maximum number of segments of a document.
pub const DEFAULT_MAX_SEGMENTS: usize = 64;

/// A decoder for transport documents.
///
/// The decoder is created with default settings via [`new`][Self::new]
/// and then adjusted with the builder methods.
#[derive(Clone, Debug)]
pub struct TransportDecoder {
    /// How header values are decoded.
    header_encoding: HeaderEncoding,

    /// The maximum number of segments accepted.
    max_segments: usize,

    /// Whether known defects are repaired.
    repair: bool,
}

impl Default for TransportDecoder {
    fn default() -> Self {
        TransportDecoder {
            header_encoding: HeaderEncoding::default(),
            max_segments: DEFAULT_MAX_SEGMENTS,
            repair: true,
        }
    }
}

impl TransportDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how header values are decoded.
    pub fn header_encoding(mut self, encoding: HeaderEncoding) -> Self {
        self.header_encoding = encoding;
        self
    }

    /// Sets the maximum number of segments.
    ///
    /// Documents with more segments are rejected. At least one segment is
    /// always allowed.
    pub fn max_segments(mut self, max_segments: usize) -> Self {
        self.max_segments = max_segments.max(1);
        self
    }

    /// Sets whether known defects are repaired before decoding.
    pub fn repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }

    /// Decodes a single transport layer.
    ///
    /// Offsets in errors refer to `data` as given, even if leading padding
    /// was removed.
    pub fn decode(&self, data: Bytes) -> Result<Document, DecodeError> {
        let (data, repairs, lead) = if self.repair {
            let (data, repairs) = repair(data);
            let lead = repairs.iter().find_map(|quirk| match *quirk {
                Quirk::LeadingPadding(len) => Some(len),
                _ => None,
            }).unwrap_or(0);
            for quirk in &repairs {
                warn!(%quirk, "repaired transport document");
            }
            (data, repairs, lead)
        }
        else {
            (data, Vec::new(), 0)
        };

        let envelope = Envelope::parse(&data, self).map_err(|err| {
            err.shifted(lead)
        })?;
        let primary = envelope.segments.iter().find(|segment| {
            segment.label == UA1_SIGN || segment.label == UA1_CRYPT
        }).or_else(|| envelope.segments.first()).cloned().ok_or_else(|| {
            DecodeError::unrecognized("document without segments", lead)
        })?;
        debug!(
            label = %primary.label, body_len = primary.body.len(),
            segments = envelope.segments.len(),
            headers = envelope.headers.len(),
            "decoded transport document"
        );
        Ok(Document {
            label: primary.label,
            headers: envelope.headers,
            body: primary.body,
            segments: envelope.segments,
            warnings: envelope.warnings,
            repairs,
        })
    }
}


//------------ decode_transport and unwrap_layers ----------------------------

/// Decodes a single transport layer with the default settings.
///
/// The data is copied once. Use [`TransportDecoder::decode`] with
/// [`Bytes`] to avoid that.
pub fn decode_transport(bytes: &[u8]) -> Result<Document, DecodeError> {
    TransportDecoder::new().decode(Bytes::copy_from_slice(bytes))
}

/// Decodes all nested transport layers.
///
/// Starting with `data`, each layer is decoded. If a layer is a `UA1_SIGN`
/// document whose signed content is itself a transport document, that
/// content is decoded next. At most `max_layers` layers are decoded.
///
/// Returns the layers from the outside in. Decoding errors of any layer
/// are returned as is.
pub fn unwrap_layers(
    data: Bytes, max_layers: usize
) -> Result<Vec<Document>, DecodeError> {
    let decoder = TransportDecoder::new();
    let mut res = Vec::new();
    let mut next = Some(data);
    while let Some(data) = next.take() {
        if res.len() >= max_layers {
            break
        }
        let doc = decoder.decode(data)?;
        if doc.label == UA1_SIGN {
            if let Some(content) = doc.signed_content()? {
                if envelope::recognizes(&content) {
                    next = Some(content)
                }
            }
        }
        debug!(layer = res.len(), label = %doc.label, "unwrapped layer");
        res.push(doc);
    }
    Ok(res)
}
