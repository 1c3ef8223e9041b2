//! Encoding transport documents.
//!
//! This is a private module. Its public items are re-exported by the parent.

use bytes::{BufMut, Bytes, BytesMut};
use super::document::Document;
use super::envelope::MAGIC;
use super::header::compose_block;


/// Encodes a transport document.
///
/// The document always starts with the magic and a header block, even if
/// there are no headers. The header values are written in Windows-1251.
/// Then all segments follow in order. If the document has no segments, its
/// label and body are written as the only segment.
///
/// Lengths are written as 32 bit values. Parts longer than that can’t be
/// represented and are truncated.
pub fn encode_transport(doc: &Document) -> Bytes {
    let block = compose_block(&doc.headers);
    let mut res = BytesMut::with_capacity(
        MAGIC.len() + 4 + block.len()
        + doc.segments.iter().map(|segment| {
            segment.label.len() + 5 + segment.body.len()
        }).sum::<usize>()
    );
    res.put_slice(MAGIC);
    put_part(&mut res, &block);
    if doc.segments.is_empty() {
        put_segment(&mut res, &doc.label, &doc.body);
    }
    else {
        for segment in &doc.segments {
            put_segment(&mut res, &segment.label, &segment.body);
        }
    }
    res.freeze()
}

fn put_segment(target: &mut BytesMut, label: &str, body: &[u8]) {
    target.put_slice(label.as_bytes());
    target.put_u8(0);
    put_part(target, body);
}

fn put_part(target: &mut BytesMut, part: &[u8]) {
    let len = u32::try_from(part.len()).unwrap_or(u32::MAX);
    target.put_u32_le(len);
    target.put_slice(&part[..len as usize]);
}
