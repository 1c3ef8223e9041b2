//! Repairing known defects of transport documents.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use bytes::Bytes;
use super::envelope::{read_label, read_len, MAGIC};


//------------ Quirk ---------------------------------------------------------

/// A defect of a transport document that is corrected before parsing.
///
/// Each of these has been seen in documents produced by some version of the
/// signing software.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Quirk {
    /// The given number of octets of padding preceded the document.
    ///
    /// Padding is a UTF-8 byte order mark, NUL octets, and ASCII white
    /// space.
    LeadingPadding(usize),

    /// The given number of NUL octets followed the last segment.
    TrailingPadding(usize),

    /// The header block length didn’t include the block’s terminating NUL.
    UnterminatedHeaderBlock,

    /// The last segment declared one octet more than was available.
    SegmentLengthOffByOne,
}

impl fmt::Display for Quirk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Quirk::LeadingPadding(len) => {
                write!(f, "removed {} octets of leading padding", len)
            }
            Quirk::TrailingPadding(len) => {
                write!(f, "removed {} octets of trailing padding", len)
            }
            Quirk::UnterminatedHeaderBlock => {
                f.write_str("included terminating NUL in header block")
            }
            Quirk::SegmentLengthOffByOne => {
                f.write_str("shortened last segment by one octet")
            }
        }
    }
}


//------------ repair --------------------------------------------------------

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Corrects all known quirks of a transport document.
///
/// Returns the repaired data and the quirks that were corrected in the
/// order they were found. The data is only copied if a length field needs
/// to be changed.
///
/// Data that can’t be parsed far enough to look for a quirk is returned
/// with only the repairs applied so far. Parsing it will fail later with a
/// proper error.
pub fn repair(data: Bytes) -> (Bytes, Vec<Quirk>) {
    let mut quirks = Vec::new();
    let mut data = Patch::new(strip_leading(data, &mut quirks));

    let mut pos = 0;
    if data.as_slice().starts_with(MAGIC) {
        let len_pos = MAGIC.len();
        let len = match read_len(data.as_slice(), len_pos) {
            Some(len) => len,
            None => return (data.finish(), quirks),
        };
        pos = match (len_pos + 4).checked_add(len) {
            Some(end) if end <= data.len() => end,
            _ => return (data.finish(), quirks),
        };
        let block_terminated = len > 0
            && data.as_slice().get(pos - 1) == Some(&0);
        if !block_terminated && data.as_slice().get(pos) == Some(&0) {
            data.set_len_field(len_pos, len + 1);
            quirks.push(Quirk::UnterminatedHeaderBlock);
            pos += 1;
        }
    }

    while pos < data.len() {
        let rest = data.as_slice().get(pos..).unwrap_or_default();
        if rest.iter().all(|&ch| ch == 0) {
            quirks.push(Quirk::TrailingPadding(rest.len()));
            data.truncate(pos);
            break
        }
        let len_pos = match read_label(data.as_slice(), pos) {
            Some((_, len_pos)) => len_pos,
            None => break,
        };
        let len = match read_len(data.as_slice(), len_pos) {
            Some(len) => len,
            None => break,
        };
        let start = len_pos + 4;
        match start.checked_add(len) {
            Some(end) if end <= data.len() => pos = end,
            Some(end) if end == data.len() + 1 => {
                data.set_len_field(len_pos, len - 1);
                quirks.push(Quirk::SegmentLengthOffByOne);
                break
            }
            _ => break,
        }
    }
    (data.finish(), quirks)
}

/// Removes leading padding.
///
/// Everything is left alone if the data consists of padding only.
fn strip_leading(data: Bytes, quirks: &mut Vec<Quirk>) -> Bytes {
    let mut lead = 0;
    if data.starts_with(BOM) {
        lead = BOM.len();
    }
    lead += data.get(lead..).unwrap_or_default().iter().take_while(|&&ch| {
        ch == 0 || ch.is_ascii_whitespace()
    }).count();
    if lead == 0 || lead >= data.len() {
        return data
    }
    quirks.push(Quirk::LeadingPadding(lead));
    data.slice(lead..)
}


//------------ Patch ---------------------------------------------------------

/// Data that is copied on the first change.
struct Patch {
    data: Bytes,
    copy: Option<Vec<u8>>,
}

impl Patch {
    fn new(data: Bytes) -> Self {
        Patch { data, copy: None }
    }

    fn as_slice(&self) -> &[u8] {
        match self.copy {
            Some(ref copy) => copy.as_slice(),
            None => self.data.as_ref(),
        }
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Overwrites the 32 bit length field at `pos`.
    ///
    /// Lengths have been read from the field, so they fit.
    fn set_len_field(&mut self, pos: usize, len: usize) {
        let data = &self.data;
        let copy = self.copy.get_or_insert_with(|| data.to_vec());
        let value = u32::try_from(len).unwrap_or(u32::MAX).to_le_bytes();
        if let Some(field) = copy.get_mut(pos..pos + 4) {
            field.copy_from_slice(&value);
        }
    }

    fn truncate(&mut self, len: usize) {
        match self.copy {
            Some(ref mut copy) => copy.truncate(len),
            None => self.data.truncate(len),
        }
    }

    fn finish(self) -> Bytes {
        match self.copy {
            Some(copy) => Bytes::from(copy),
            None => self.data,
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn repaired(data: &'static [u8]) -> (Bytes, Vec<Quirk>) {
        repair(Bytes::from_static(data))
    }

    #[test]
    fn clean_document() {
        let data = b"TRANSPORTABLE\0\x04\x00\x00\x00A=1\0UA1_SIGN\0\x01\x00\x00\x00x";
        let (res, quirks) = repaired(data);
        assert!(quirks.is_empty());
        assert_eq!(res, &data[..]);
    }

    #[test]
    fn leading_padding() {
        let (res, quirks) = repaired(b"\xEF\xBB\xBF\r\n\0UA1_SIGN\0\x00\x00\x00\x00");
        assert_eq!(quirks, [Quirk::LeadingPadding(6)]);
        assert_eq!(res, &b"UA1_SIGN\0\x00\x00\x00\x00"[..]);

        let (res, quirks) = repaired(b"\0\0\0");
        assert!(quirks.is_empty());
        assert_eq!(res.len(), 3);
    }

    #[test]
    fn trailing_padding() {
        let (res, quirks) = repaired(b"UA1_SIGN\0\x01\x00\x00\x00x\0\0\0");
        assert_eq!(quirks, [Quirk::TrailingPadding(3)]);
        assert_eq!(res, &b"UA1_SIGN\0\x01\x00\x00\x00x"[..]);
    }

    #[test]
    fn unterminated_header_block() {
        let (res, quirks) = repaired(
            b"TRANSPORTABLE\0\x03\x00\x00\x00A=1\0UA1_SIGN\0\x01\x00\x00\x00x"
        );
        assert_eq!(quirks, [Quirk::UnterminatedHeaderBlock]);
        assert_eq!(
            res,
            &b"TRANSPORTABLE\0\x04\x00\x00\x00A=1\0UA1_SIGN\0\x01\x00\x00\x00x"[..]
        );
    }

    #[test]
    fn segment_length_off_by_one() {
        let (res, quirks) = repaired(
            b"UA1_SIGN\0\x01\x00\x00\x00xUA1_CRYPT\0\x04\x00\x00\x00abc"
        );
        assert_eq!(quirks, [Quirk::SegmentLengthOffByOne]);
        assert_eq!(
            res, &b"UA1_SIGN\0\x01\x00\x00\x00xUA1_CRYPT\0\x03\x00\x00\x00abc"[..]
        );

        // Two octets short is an error left for the parser.
        let (_, quirks) = repaired(b"UA1_SIGN\0\x05\x00\x00\x00abc");
        assert!(quirks.is_empty());
    }

    #[test]
    fn several_quirks() {
        let (res, quirks) = repaired(
            b"  TRANSPORTABLE\0\x03\x00\x00\x00A=1\0UA1_SIGN\0\x01\x00\x00\x00x\0"
        );
        assert_eq!(
            quirks,
            [
                Quirk::LeadingPadding(2),
                Quirk::UnterminatedHeaderBlock,
                Quirk::TrailingPadding(1),
            ]
        );
        assert_eq!(
            res,
            &b"TRANSPORTABLE\0\x04\x00\x00\x00A=1\0UA1_SIGN\0\x01\x00\x00\x00x"[..]
        );
    }
}
