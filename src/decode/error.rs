//! Error Handling.
//!
//! This is a private module. Its public content is being re-exported by the
//! parent module.

use std::fmt;
use smallvec::SmallVec;
use thiserror::Error;
use super::source::Pos;


//------------ DecodeError ---------------------------------------------------

/// An error happened while decoding a document.
///
/// Every variant except [`UnrecognizedTransport`][Self::UnrecognizedTransport]
/// carries the dotted path of the schema field that was being decoded, so
/// a failure can be diagnosed without dumping the document into a log.
/// Errors that happen below the schema layer, e.g., in the TLV reader,
/// start out with an empty path that is filled in on the way out.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DecodeError {
    /// The data does not start with a known transport envelope.
    #[error("unrecognized transport envelope at offset {offset}: {reason}")]
    UnrecognizedTransport {
        offset: Pos,
        reason: &'static str,
    },

    /// A length points beyond the end of the available data.
    #[error("length at offset {offset} overruns the available data in {field}")]
    LengthOverrun {
        offset: Pos,
        field: FieldPath,
    },

    /// A tag number does not fit into 32 bits.
    #[error("tag number at offset {offset} overflows in {field}")]
    TagOverflow {
        offset: Pos,
        field: FieldPath,
    },

    /// Values are nested deeper than the decoder allows.
    #[error("values nested deeper than {limit} at offset {offset} in {field}")]
    TooDeep {
        offset: Pos,
        field: FieldPath,
        limit: usize,
    },

    /// The data is well-formed BER but doesn’t have the expected shape.
    #[error(
        "schema mismatch in {field} at offset {offset}: \
         expected {expected}, found {found}"
    )]
    SchemaMismatch {
        field: FieldPath,
        offset: Pos,
        expected: String,
        found: String,
    },

    /// The data violates the encoding rules.
    #[error("malformed data at offset {offset} in {field}: {reason}")]
    Malformed {
        offset: Pos,
        field: FieldPath,
        reason: &'static str,
    },
}

impl DecodeError {
    pub(crate) fn unrecognized(
        reason: &'static str, offset: impl Into<Pos>
    ) -> Self {
        DecodeError::UnrecognizedTransport { offset: offset.into(), reason }
    }

    pub(crate) fn overrun(offset: impl Into<Pos>) -> Self {
        DecodeError::LengthOverrun {
            offset: offset.into(), field: FieldPath::new()
        }
    }

    pub(crate) fn tag_overflow(offset: impl Into<Pos>) -> Self {
        DecodeError::TagOverflow {
            offset: offset.into(), field: FieldPath::new()
        }
    }

    pub(crate) fn too_deep(offset: impl Into<Pos>, limit: usize) -> Self {
        DecodeError::TooDeep {
            offset: offset.into(), field: FieldPath::new(), limit
        }
    }

    pub(crate) fn malformed(
        reason: &'static str, offset: impl Into<Pos>
    ) -> Self {
        DecodeError::Malformed {
            offset: offset.into(), field: FieldPath::new(), reason
        }
    }

    pub(crate) fn mismatch(
        field: &FieldPath,
        offset: impl Into<Pos>,
        expected: impl fmt::Display,
        found: impl fmt::Display,
    ) -> Self {
        DecodeError::SchemaMismatch {
            field: field.clone(),
            offset: offset.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Returns the position in the input where the error happened.
    pub fn offset(&self) -> Pos {
        match *self {
            DecodeError::UnrecognizedTransport { offset, .. } => offset,
            DecodeError::LengthOverrun { offset, .. } => offset,
            DecodeError::TagOverflow { offset, .. } => offset,
            DecodeError::TooDeep { offset, .. } => offset,
            DecodeError::SchemaMismatch { offset, .. } => offset,
            DecodeError::Malformed { offset, .. } => offset,
        }
    }

    /// Returns the field path of the error if there is one.
    pub fn field(&self) -> Option<&FieldPath> {
        match self {
            DecodeError::UnrecognizedTransport { .. } => None,
            DecodeError::LengthOverrun { field, .. } => Some(field),
            DecodeError::TagOverflow { field, .. } => Some(field),
            DecodeError::TooDeep { field, .. } => Some(field),
            DecodeError::SchemaMismatch { field, .. } => Some(field),
            DecodeError::Malformed { field, .. } => Some(field),
        }
    }

    /// Fills in the field path if the error doesn’t have one yet.
    pub(crate) fn in_field(mut self, path: &FieldPath) -> Self {
        let field = match &mut self {
            DecodeError::UnrecognizedTransport { .. } => return self,
            DecodeError::LengthOverrun { field, .. } => field,
            DecodeError::TagOverflow { field, .. } => field,
            DecodeError::TooDeep { field, .. } => field,
            DecodeError::SchemaMismatch { field, .. } => field,
            DecodeError::Malformed { field, .. } => field,
        };
        if field.is_empty() {
            *field = path.clone();
        }
        self
    }

    /// Moves the position of the error by `base` octets.
    ///
    /// This is used when data was decoded from a slice that started
    /// somewhere within a larger buffer.
    pub(crate) fn shifted(mut self, base: usize) -> Self {
        let offset = match &mut self {
            DecodeError::UnrecognizedTransport { offset, .. } => offset,
            DecodeError::LengthOverrun { offset, .. } => offset,
            DecodeError::TagOverflow { offset, .. } => offset,
            DecodeError::TooDeep { offset, .. } => offset,
            DecodeError::SchemaMismatch { offset, .. } => offset,
            DecodeError::Malformed { offset, .. } => offset,
        };
        *offset = *offset + Pos::from(base);
        self
    }
}


//------------ FieldPath -----------------------------------------------------

/// The path of schema field names leading to a value.
///
/// Field names come from static schema definitions, so the path only
/// keeps references to them. It is displayed in dotted notation, e.g.,
/// `content.contentInfo.contentType`.
#[derive(Clone, Default, Eq, Hash, PartialEq)]
pub struct FieldPath(SmallVec<[&'static str; 8]>);

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }

    pub(crate) fn push(&mut self, name: &'static str) {
        self.0.push(name)
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl FromIterator<&'static str> for FieldPath {
    fn from_iter<T: IntoIterator<Item = &'static str>>(iter: T) -> Self {
        FieldPath(iter.into_iter().collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names = self.0.iter();
        match names.next() {
            Some(first) => f.write_str(first)?,
            None => return f.write_str("<root>"),
        }
        for name in names {
            write!(f, ".{}", name)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FieldPath({})", self)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn field_path_display() {
        assert_eq!(FieldPath::new().to_string(), "<root>");
        let path: FieldPath = ["content", "contentInfo"].into_iter().collect();
        assert_eq!(path.to_string(), "content.contentInfo");
    }

    #[test]
    fn in_field_keeps_inner_path() {
        let outer: FieldPath = ["content"].into_iter().collect();
        let inner: FieldPath = ["content", "version"].into_iter().collect();
        let err = DecodeError::malformed("bad", 3).in_field(&inner);
        assert_eq!(err.in_field(&outer).field(), Some(&inner));
    }

    #[test]
    fn shifted_moves_offset() {
        let err = DecodeError::overrun(4).shifted(10);
        assert_eq!(err.offset(), Pos::from(14));
    }
}
