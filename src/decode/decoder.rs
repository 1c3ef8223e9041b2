//! The schema-driven decoder.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::borrow::Cow;
use tracing::{debug, trace};
use crate::captured::Captured;
use crate::ident::{Ident, Tag};
use crate::int::Integer;
use crate::length::Length;
use crate::mode::Mode;
use crate::node::{Node, Value};
use crate::oid::Oid;
use crate::schema::{Expected, Field, Kind, Schema, Tagging};
use crate::string::{decode_text, BitString, Time};
use super::error::{DecodeError, FieldPath};
use super::tlv::{skip_indefinite, Tlv};


//------------ Constants -----------------------------------------------------

/// The default bound on how deeply values may be nested.
pub const DEFAULT_MAX_DEPTH: usize = 64;


//------------ BerDecoder ----------------------------------------------------

/// A decoder turning encoded data into a [`Node`] tree.
///
/// The decoder is driven by a [`Schema`] describing the expected value. It
/// walks the encoded data with recursive descent and borrows all octets it
/// can from the input, so the resulting node lives as long as the input.
///
/// Decoding is all-or-nothing: if anything doesn’t fit the schema or breaks
/// the encoding rules of the decoder’s [`Mode`], an error with the offset
/// and the path of the schema field is returned. Nesting is bounded by the
/// maximum depth which defaults to [`DEFAULT_MAX_DEPTH`].
///
/// A value that should have an explicit tag but arrives in primitive form
/// is tolerated: its content is taken as an octet string. Some producers
/// encode `[0] EXPLICIT OCTET STRING` as `[0] IMPLICIT OCTET STRING`.
#[derive(Clone, Copy, Debug)]
pub struct BerDecoder {
    mode: Mode,
    max_depth: usize,
}

impl Default for BerDecoder {
    fn default() -> Self {
        Self::new(Mode::Ber)
    }
}

impl BerDecoder {
    /// Creates a new decoder for the given mode.
    pub fn new(mode: Mode) -> Self {
        BerDecoder { mode, max_depth: DEFAULT_MAX_DEPTH }
    }

    /// Changes the maximum nesting depth.
    ///
    /// A depth of zero is treated as one.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Returns the encoding rules the decoder enforces.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the maximum nesting depth.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Decodes a value that must fill all of `buf`.
    pub fn decode<'a>(
        &self, schema: &Schema, buf: &'a [u8]
    ) -> Result<Node<'a>, DecodeError> {
        let (node, consumed) = self.decode_stream(schema, buf, buf.len())?;
        if consumed < buf.len() {
            return Err(DecodeError::malformed("trailing data", consumed))
        }
        Ok(node)
    }

    /// Decodes the value at the start of `buf`.
    ///
    /// At most the first `max_len` octets of `buf` are looked at. Anything
    /// following the value is left alone. Returns the node and the number
    /// of octets the value occupied.
    pub fn decode_stream<'a>(
        &self, schema: &Schema, buf: &'a [u8], max_len: usize
    ) -> Result<(Node<'a>, usize), DecodeError> {
        let buf = &buf[..max_len.min(buf.len())];
        let mut walker = Walker {
            mode: self.mode,
            max_depth: self.max_depth,
            buf,
            path: FieldPath::new(),
        };
        let elem = walker.element(0, buf.len(), 1)?;
        let node = walker.decode_value(schema, elem, false, 1, &[])?;
        debug!(consumed = elem.end, mode = ?self.mode, "decoded value");
        Ok((node, elem.end))
    }
}


//------------ decode_ber and decode -----------------------------------------

/// Decodes the value at the start of `bytes` using BER.
///
/// This is [`BerDecoder::decode_stream`] with the default decoder.
pub fn decode_ber<'a>(
    bytes: &'a [u8], schema: &Schema, max_len: usize
) -> Result<(Node<'a>, usize), DecodeError> {
    BerDecoder::default().decode_stream(schema, bytes, max_len)
}

/// Decodes a value filling all of `bytes` using BER.
pub fn decode<'a>(
    schema: &Schema, bytes: &'a [u8]
) -> Result<Node<'a>, DecodeError> {
    BerDecoder::default().decode(schema, bytes)
}


//------------ Element -------------------------------------------------------

/// A value together with where it ends.
#[derive(Clone, Copy, Debug)]
struct Element<'a> {
    tlv: Tlv<'a>,

    /// The content octets without any end-of-contents marker.
    content: &'a [u8],

    /// The offset of the end of the content.
    content_end: usize,

    /// The offset of the end of the value.
    end: usize,
}

impl Element<'_> {
    fn ident(&self) -> Ident {
        self.tlv.ident()
    }

    fn tag(&self) -> Tag {
        self.tlv.tag()
    }

    fn start(&self) -> usize {
        self.tlv.start()
    }

    fn content_start(&self) -> usize {
        self.tlv.content_start()
    }
}


//------------ Walker --------------------------------------------------------

/// The state of a single decoding run.
struct Walker<'a> {
    mode: Mode,
    max_depth: usize,
    buf: &'a [u8],

    /// The path of the field currently being decoded.
    path: FieldPath,
}

impl<'a> Walker<'a> {
    /// Reads the value at `pos` which must end before `limit`.
    fn element(
        &self, pos: usize, limit: usize, depth: usize
    ) -> Result<Element<'a>, DecodeError> {
        let buf = self.buf.get(..limit).ok_or_else(|| {
            DecodeError::overrun(pos)
        })?;
        let (tlv, next) = Tlv::read(buf, pos, self.mode)?;
        if tlv.is_end_of_contents() {
            return Err(DecodeError::malformed(
                "unexpected end-of-contents", pos
            ))
        }
        match tlv.length() {
            Length::Definite(_) => {
                Ok(Element {
                    tlv, content: tlv.content(), content_end: next, end: next
                })
            }
            Length::Indefinite => {
                let bound = self.max_depth.saturating_sub(depth) + 1;
                let end = skip_indefinite(buf, next, self.mode, bound)?;
                let content_end = end.saturating_sub(2);
                Ok(Element {
                    tlv,
                    content: buf.get(next..content_end).unwrap_or_default(),
                    content_end,
                    end
                })
            }
        }
    }

    /// Decodes a value according to `schema`.
    ///
    /// If `implicit` is true, the tag of the value has already been checked
    /// against an implicit tag override. `siblings` are the fields of the
    /// enclosing sequence decoded so far.
    fn decode_value(
        &mut self,
        schema: &Schema,
        elem: Element<'a>,
        implicit: bool,
        depth: usize,
        siblings: &[(&'static str, Node<'a>)],
    ) -> Result<Node<'a>, DecodeError> {
        if depth > self.max_depth {
            return Err(DecodeError::too_deep(elem.start(), self.max_depth))
        }
        match *schema {
            Schema::Sequence(fields) => {
                self.check_tag(schema, elem, implicit, Tag::SEQUENCE)?;
                self.check_constructed(schema, elem)?;
                self.decode_sequence(fields, elem, depth)
            }
            Schema::SequenceOf(inner) => {
                self.check_tag(schema, elem, implicit, Tag::SEQUENCE)?;
                self.check_constructed(schema, elem)?;
                self.decode_list(inner, elem, depth)
            }
            Schema::SetOf(inner) => {
                self.check_tag(schema, elem, implicit, Tag::SET)?;
                self.check_constructed(schema, elem)?;
                self.decode_list(inner, elem, depth)
            }
            Schema::Choice(alternatives) => {
                let alt = alternatives.iter().find(|alt| {
                    alt.matches(elem.ident())
                }).ok_or_else(|| {
                    DecodeError::mismatch(
                        &self.path, elem.start(), schema.expected(),
                        elem.ident()
                    )
                })?;
                trace!(field = %self.path, alternative = alt.name, "choice");
                let node = self.decode_tagged(
                    alt.tagging, alt.schema, elem, depth + 1, siblings
                )?;
                Ok(Node::Choice(alt.name, Box::new(node)))
            }
            Schema::Primitive(kind) => {
                if !implicit && elem.tag() != kind.tag() {
                    return Err(DecodeError::mismatch(
                        &self.path, elem.start(), kind.tag(), elem.ident()
                    ))
                }
                self.decode_primitive(kind, elem, depth).map(Node::Value)
            }
            Schema::Any => {
                let encoding = self.buf.get(
                    elem.start()..elem.end
                ).unwrap_or_default();
                Ok(Node::Value(Value::Any(
                    Captured::new(elem.ident(), elem.content, encoding)
                )))
            }
            Schema::DefinedBy { key, table, fallback } => {
                let oid = siblings.iter().find(|(name, _)| {
                    *name == key
                }).and_then(|(_, node)| node.as_oid());
                let definition = oid.and_then(|oid| {
                    table.iter().find(|definition| definition.oid == oid)
                });
                match definition {
                    Some(definition) => {
                        trace!(
                            field = %self.path, definition = definition.name,
                            "defined by {}", key
                        );
                        let node = self.decode_value(
                            definition.schema, elem, implicit, depth + 1, &[]
                        )?;
                        Ok(Node::Choice(definition.name, Box::new(node)))
                    }
                    None => {
                        self.decode_value(
                            fallback, elem, implicit, depth + 1, &[]
                        )
                    }
                }
            }
        }
    }

    /// Decodes a value that may have a tag override.
    ///
    /// The tag of the value has already been checked by the caller.
    fn decode_tagged(
        &mut self,
        tagging: Option<Tagging>,
        schema: &Schema,
        elem: Element<'a>,
        depth: usize,
        siblings: &[(&'static str, Node<'a>)],
    ) -> Result<Node<'a>, DecodeError> {
        match tagging {
            None => self.decode_value(schema, elem, false, depth, siblings),
            Some(Tagging::Implicit(_)) => {
                self.decode_value(schema, elem, true, depth, siblings)
            }
            Some(Tagging::Explicit(_)) => {
                if !elem.tlv.is_constructed() {
                    debug!(
                        field = %self.path, offset = elem.start(),
                        "explicit tag in primitive form, \
                         taking content as octet string"
                    );
                    return Ok(Node::Value(
                        Value::OctetString(Cow::Borrowed(elem.content))
                    ))
                }
                let inner = self.element(
                    elem.content_start(), elem.content_end, depth + 1
                )?;
                if inner.end != elem.content_end {
                    return Err(DecodeError::mismatch(
                        &self.path, inner.end, Expected::EndOfValue,
                        "additional value"
                    ))
                }
                self.decode_value(schema, inner, false, depth + 1, siblings)
            }
        }
    }

    fn decode_sequence(
        &mut self,
        fields: &[Field],
        elem: Element<'a>,
        depth: usize,
    ) -> Result<Node<'a>, DecodeError> {
        let mut res = Vec::with_capacity(fields.len());
        let mut pos = elem.content_start();
        let mut pending: Option<Element<'a>> = None;
        for field in fields {
            if pending.is_none() && pos < elem.content_end {
                let child = self.element(
                    pos, elem.content_end, depth + 1
                ).map_err(|err| err.in_field(&self.path))?;
                pos = child.end;
                pending = Some(child);
            }
            let child = match pending.take() {
                Some(child) if field.matches(child.ident()) => child,
                other => {
                    pending = other;
                    if field.optional {
                        trace!(
                            field = %self.path, skipped = field.name,
                            "optional field absent"
                        );
                        continue
                    }
                    return Err(self.missing_field(
                        field, other, elem.content_end
                    ))
                }
            };
            self.path.push(field.name);
            trace!(field = %self.path, offset = child.start(), "field");
            let node = self.decode_tagged(
                field.tagging, field.schema, child, depth + 1, &res
            ).map_err(|err| err.in_field(&self.path));
            self.path.pop();
            res.push((field.name, node?));
        }
        let trailing = match pending {
            Some(child) => Some(child),
            None if pos < elem.content_end => {
                Some(self.element(pos, elem.content_end, depth + 1)?)
            }
            None => None,
        };
        if let Some(child) = trailing {
            return Err(DecodeError::mismatch(
                &self.path, child.start(), Expected::EndOfValue, child.ident()
            ))
        }
        Ok(Node::Sequence(res))
    }

    fn decode_list(
        &mut self,
        inner: &Schema,
        elem: Element<'a>,
        depth: usize,
    ) -> Result<Node<'a>, DecodeError> {
        let mut res = Vec::new();
        let mut pos = elem.content_start();
        while pos < elem.content_end {
            let child = self.element(pos, elem.content_end, depth + 1)?;
            pos = child.end;
            res.push(self.decode_value(inner, child, false, depth + 1, &[])?);
        }
        Ok(Node::List(res))
    }

    fn decode_primitive(
        &self, kind: Kind, elem: Element<'a>, depth: usize
    ) -> Result<Value<'a>, DecodeError> {
        let offset = elem.start();
        if elem.tlv.is_constructed() {
            if !kind.is_string() {
                return Err(DecodeError::malformed(
                    "constructed encoding of a primitive type", offset
                ))
            }
            if self.mode == Mode::Der {
                return Err(DecodeError::malformed(
                    "constructed string in DER", offset
                ))
            }
            let mut octets = Vec::new();
            self.collect_segments(elem, depth, &mut octets)?;
            return Self::string_value(kind, Cow::Owned(octets), offset)
        }

        let content = elem.content;
        match kind {
            Kind::Boolean => match content {
                [0] => Ok(Value::Bool(false)),
                [0xFF] => Ok(Value::Bool(true)),
                [_] if !self.mode.is_restricted() => Ok(Value::Bool(true)),
                _ => Err(DecodeError::malformed("invalid boolean", offset)),
            }
            Kind::Integer | Kind::Enumerated => {
                Integer::from_content(
                    content, self.mode, offset
                ).map(Value::Integer)
            }
            Kind::BitString => {
                BitString::from_content(content).map(Value::BitString)
                    .map_err(|reason| DecodeError::malformed(reason, offset))
            }
            Kind::Null => {
                if content.is_empty() {
                    Ok(Value::Null)
                }
                else {
                    Err(DecodeError::malformed("NULL with content", offset))
                }
            }
            Kind::Oid => Oid::from_content(content, offset).map(Value::Oid),
            Kind::UtcTime | Kind::GeneralizedTime => {
                Time::from_content(content, kind == Kind::GeneralizedTime)
                    .map(Value::Time)
                    .map_err(|reason| DecodeError::malformed(reason, offset))
            }
            _ => Self::string_value(kind, Cow::Borrowed(content), offset)
        }
    }

    /// Appends the content of the segments of a constructed string.
    fn collect_segments(
        &self, elem: Element<'a>, depth: usize, target: &mut Vec<u8>
    ) -> Result<(), DecodeError> {
        if depth > self.max_depth {
            return Err(DecodeError::too_deep(elem.start(), self.max_depth))
        }
        let mut pos = elem.content_start();
        while pos < elem.content_end {
            let child = self.element(pos, elem.content_end, depth + 1)?;
            pos = child.end;
            if child.tag() != Tag::OCTET_STRING && child.tag() != elem.tag() {
                return Err(DecodeError::mismatch(
                    &self.path, child.start(), Tag::OCTET_STRING,
                    child.ident()
                ))
            }
            if child.tlv.is_constructed() {
                self.collect_segments(child, depth + 1, target)?;
            }
            else {
                target.extend_from_slice(child.content);
            }
        }
        Ok(())
    }

    fn string_value(
        kind: Kind, octets: Cow<'a, [u8]>, offset: usize
    ) -> Result<Value<'a>, DecodeError> {
        if kind == Kind::OctetString {
            return Ok(Value::OctetString(octets))
        }
        decode_text(kind, octets).map(Value::String).map_err(|reason| {
            DecodeError::malformed(reason, offset)
        })
    }

    fn check_tag(
        &self, schema: &Schema, elem: Element, implicit: bool, tag: Tag
    ) -> Result<(), DecodeError> {
        if implicit || elem.tag() == tag {
            Ok(())
        }
        else {
            Err(DecodeError::mismatch(
                &self.path, elem.start(), schema.expected(), elem.ident()
            ))
        }
    }

    fn check_constructed(
        &self, schema: &Schema, elem: Element
    ) -> Result<(), DecodeError> {
        if elem.tlv.is_constructed() {
            Ok(())
        }
        else {
            Err(DecodeError::mismatch(
                &self.path, elem.start(),
                format_args!("constructed {}", schema.expected()),
                elem.ident()
            ))
        }
    }

    fn missing_field(
        &self, field: &Field, found: Option<Element>, end: usize
    ) -> DecodeError {
        let mut path = self.path.clone();
        path.push(field.name);
        match found {
            Some(child) => {
                DecodeError::mismatch(
                    &path, child.start(), field.expected(), child.ident()
                )
            }
            None => {
                DecodeError::mismatch(
                    &path, end, field.expected(), "end of value"
                )
            }
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{INTEGER, OCTET_STRING};

    static PAIR_FIELDS: [Field; 2] = [
        Field::new("first", &INTEGER),
        Field::implicit("second", 1, &INTEGER).optional(),
    ];
    static PAIR: Schema = Schema::Sequence(&PAIR_FIELDS);

    #[test]
    fn decode_sequence_with_optional() {
        let node = decode(&PAIR, b"\x30\x03\x02\x01\x05").unwrap();
        assert_eq!(node.get("first").unwrap().as_integer().unwrap().to_i8(),
                   Some(5));
        assert!(node.get("second").is_err());

        let node = decode(&PAIR, b"\x30\x06\x02\x01\x05\x81\x01\x07").unwrap();
        assert_eq!(
            node.get("second").unwrap().as_integer().unwrap().to_i8(),
            Some(7)
        );
    }

    #[test]
    fn missing_and_leftover_fields() {
        let err = decode(&PAIR, b"\x30\x00").unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { .. }));
        assert_eq!(err.field().unwrap().to_string(), "first");

        let err = decode(
            &PAIR, b"\x30\x06\x02\x01\x05\x05\x01\x00"
        ).unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { .. }));
        assert_eq!(err.offset().value(), 5);
    }

    #[test]
    fn trailing_data() {
        assert!(decode(&INTEGER, b"\x02\x01\x01\x00").is_err());
        let (node, len) = decode_ber(
            b"\x02\x01\x01\x00", &INTEGER, usize::MAX
        ).unwrap();
        assert_eq!(node.as_integer().unwrap().to_u8(), Some(1));
        assert_eq!(len, 3);
    }

    #[test]
    fn max_len_limits_input() {
        assert!(matches!(
            decode_ber(b"\x04\x03abc", &OCTET_STRING, 4),
            Err(DecodeError::LengthOverrun { .. })
        ));
    }

    #[test]
    fn constructed_octet_string() {
        let data = b"\x24\x80\x04\x02ab\x24\x03\x04\x01c\x00\x00";
        let node = decode(&OCTET_STRING, data).unwrap();
        assert_eq!(node.as_bytes(), Some(&b"abc"[..]));
        assert!(node.as_borrowed_bytes().is_none());
        assert!(BerDecoder::new(Mode::Der).decode(&OCTET_STRING, data).is_err());
    }

    #[test]
    fn depth_bound() {
        static NESTED: Schema = Schema::SequenceOf(&NESTED);
        let mut data = Vec::new();
        for _ in 0..10 {
            data.extend_from_slice(b"\x30\x80");
        }
        for _ in 0..10 {
            data.extend_from_slice(b"\x00\x00");
        }
        assert!(BerDecoder::default().decode(&NESTED, &data).is_ok());
        assert!(matches!(
            BerDecoder::default().with_max_depth(4).decode(&NESTED, &data),
            Err(DecodeError::TooDeep { limit: 4, .. })
        ));
    }
}
