//! Declarative descriptions of the ASN.1 types we decode.
//!
//! A [`Schema`] describes the shape of an expected value. Schemas are plain
//! data: they are defined as `static` items, reference each other through
//! `&'static` references, and are interpreted by the
//! [`BerDecoder`][crate::decode::BerDecoder]. Since there is no interior
//! mutability anywhere, a schema can be shared freely between threads.
//!
//! Because a static can’t borrow a temporary, every nested schema and every
//! list of fields is defined as a static of its own. The module provides
//! statics for all primitive kinds, e.g., [`INTEGER`] or [`OCTET_STRING`],
//! as well as [`ANY`].

use std::fmt;
use crate::ident::{Ident, Tag};
use crate::oid::ConstOid;


//------------ Schema --------------------------------------------------------

/// The description of an ASN.1 type.
///
/// Schemas can be recursive, so the `Debug` implementation only shows the
/// outermost level.
#[derive(Clone, Copy)]
pub enum Schema {
    /// A SEQUENCE with named fields in a fixed order.
    Sequence(&'static [Field]),

    /// A SEQUENCE OF values of the same type.
    SequenceOf(&'static Schema),

    /// A SET OF values of the same type.
    ///
    /// The order of the elements is kept as encoded.
    SetOf(&'static Schema),

    /// A CHOICE between alternatives distinguished by their tags.
    Choice(&'static [Alternative]),

    /// A value of a primitive type.
    Primitive(Kind),

    /// Any value at all, kept in its encoded form.
    Any,

    /// A value whose type is determined by an earlier OID field.
    ///
    /// The already decoded sibling field named `key` must contain an object
    /// identifier. If it is found in `table`, the value is decoded with the
    /// schema given there. Otherwise, `fallback` is used.
    DefinedBy {
        key: &'static str,
        table: &'static [Definition],
        fallback: &'static Schema,
    },
}

impl Schema {
    /// Returns whether a value with the given identifier could be decoded.
    ///
    /// This only considers the tag, not whether the value is constructed.
    pub fn matches(&self, ident: Ident) -> bool {
        let tag = ident.tag();
        match *self {
            Schema::Sequence(_) | Schema::SequenceOf(_) => {
                tag == Tag::SEQUENCE
            }
            Schema::SetOf(_) => tag == Tag::SET,
            Schema::Choice(alternatives) => {
                alternatives.iter().any(|alt| alt.matches(ident))
            }
            Schema::Primitive(kind) => tag == kind.tag(),
            Schema::Any | Schema::DefinedBy { .. } => true,
        }
    }

    /// Returns a description of what the schema expects.
    pub fn expected(&self) -> Expected {
        Expected::Schema(*self)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Schema::Sequence(fields) => {
                f.write_str("Schema(SEQUENCE {")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}", field.name)?;
                }
                f.write_str(" })")
            }
            _ => write!(f, "Schema({})", self.expected())
        }
    }
}


//------------ Field ---------------------------------------------------------

/// A named field of a SEQUENCE.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    /// The name of the field.
    pub name: &'static str,

    /// The tag override, if any.
    pub tagging: Option<Tagging>,

    /// The schema of the field’s value.
    pub schema: &'static Schema,

    /// Whether the field may be absent.
    pub optional: bool,
}

impl Field {
    /// Creates a mandatory field using the schema’s natural tag.
    pub const fn new(name: &'static str, schema: &'static Schema) -> Self {
        Field { name, tagging: None, schema, optional: false }
    }

    /// Creates a field with an implicit context specific tag.
    pub const fn implicit(
        name: &'static str, number: u32, schema: &'static Schema
    ) -> Self {
        Field {
            name,
            tagging: Some(Tagging::Implicit(Tag::ctx(number))),
            schema,
            optional: false
        }
    }

    /// Creates a field with an explicit context specific tag.
    pub const fn explicit(
        name: &'static str, number: u32, schema: &'static Schema
    ) -> Self {
        Field {
            name,
            tagging: Some(Tagging::Explicit(Tag::ctx(number))),
            schema,
            optional: false
        }
    }

    /// Marks the field as optional.
    pub const fn optional(self) -> Self {
        Field { optional: true, ..self }
    }

    /// Returns whether a value with the given identifier belongs here.
    pub fn matches(&self, ident: Ident) -> bool {
        match self.tagging {
            Some(tagging) => ident.tag() == tagging.tag(),
            None => self.schema.matches(ident),
        }
    }

    /// Returns a description of what the field expects.
    pub fn expected(&self) -> Expected {
        match self.tagging {
            Some(tagging) => Expected::Tag(tagging.tag()),
            None => self.schema.expected(),
        }
    }
}


//------------ Alternative ---------------------------------------------------

/// A named alternative of a CHOICE.
#[derive(Clone, Copy, Debug)]
pub struct Alternative {
    /// The name of the alternative.
    pub name: &'static str,

    /// The tag override, if any.
    pub tagging: Option<Tagging>,

    /// The schema of the alternative’s value.
    pub schema: &'static Schema,
}

impl Alternative {
    pub const fn new(name: &'static str, schema: &'static Schema) -> Self {
        Alternative { name, tagging: None, schema }
    }

    pub const fn implicit(
        name: &'static str, number: u32, schema: &'static Schema
    ) -> Self {
        Alternative {
            name, tagging: Some(Tagging::Implicit(Tag::ctx(number))), schema
        }
    }

    pub const fn explicit(
        name: &'static str, number: u32, schema: &'static Schema
    ) -> Self {
        Alternative {
            name, tagging: Some(Tagging::Explicit(Tag::ctx(number))), schema
        }
    }

    pub fn matches(&self, ident: Ident) -> bool {
        match self.tagging {
            Some(tagging) => ident.tag() == tagging.tag(),
            None => self.schema.matches(ident),
        }
    }
}


//------------ Definition ----------------------------------------------------

/// An entry in the table of a [`Schema::DefinedBy`].
#[derive(Clone, Copy, Debug)]
pub struct Definition {
    /// The object identifier selecting this entry.
    pub oid: ConstOid,

    /// The name of the choice node produced for the entry.
    pub name: &'static str,

    /// The schema to decode the value with.
    pub schema: &'static Schema,
}

impl Definition {
    pub const fn new(
        oid: ConstOid, name: &'static str, schema: &'static Schema
    ) -> Self {
        Definition { oid, name, schema }
    }
}


//------------ Tagging -------------------------------------------------------

/// A tag override of a field or alternative.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tagging {
    /// The tag replaces the natural tag of the value.
    Implicit(Tag),

    /// The value is wrapped into a constructed value with the tag.
    Explicit(Tag),
}

impl Tagging {
    pub fn tag(self) -> Tag {
        match self {
            Tagging::Implicit(tag) | Tagging::Explicit(tag) => tag,
        }
    }
}


//------------ Kind ----------------------------------------------------------

/// The primitive types understood by the decoder.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Boolean,
    Integer,
    Enumerated,
    BitString,
    OctetString,
    Null,
    Oid,
    Utf8String,
    PrintableString,
    Ia5String,
    BmpString,
    UtcTime,
    GeneralizedTime,
}

impl Kind {
    /// Returns the natural tag of a value of this kind.
    pub fn tag(self) -> Tag {
        match self {
            Kind::Boolean => Tag::BOOLEAN,
            Kind::Integer => Tag::INTEGER,
            Kind::Enumerated => Tag::ENUMERATED,
            Kind::BitString => Tag::BIT_STRING,
            Kind::OctetString => Tag::OCTET_STRING,
            Kind::Null => Tag::NULL,
            Kind::Oid => Tag::OID,
            Kind::Utf8String => Tag::UTF8_STRING,
            Kind::PrintableString => Tag::PRINTABLE_STRING,
            Kind::Ia5String => Tag::IA5_STRING,
            Kind::BmpString => Tag::BMP_STRING,
            Kind::UtcTime => Tag::UTC_TIME,
            Kind::GeneralizedTime => Tag::GENERALIZED_TIME,
        }
    }

    /// Returns whether the kind may use the constructed form in BER.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            Kind::OctetString | Kind::Utf8String | Kind::PrintableString
            | Kind::Ia5String | Kind::BmpString
        )
    }
}


//------------ Expected ------------------------------------------------------

/// A description of what a schema expected for error messages.
#[derive(Clone, Copy, Debug)]
pub enum Expected {
    Tag(Tag),
    Schema(Schema),
    EndOfValue,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Expected::Tag(tag) => fmt::Display::fmt(&tag, f),
            Expected::Schema(Schema::Sequence(_)) => f.write_str("SEQUENCE"),
            Expected::Schema(Schema::SequenceOf(_)) => {
                f.write_str("SEQUENCE OF")
            }
            Expected::Schema(Schema::SetOf(_)) => f.write_str("SET OF"),
            Expected::Schema(Schema::Choice(alternatives)) => {
                f.write_str("one of ")?;
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match alt.tagging {
                        Some(tagging) => write!(f, "{}", tagging.tag())?,
                        None => {
                            write!(f, "{}", Expected::Schema(*alt.schema))?
                        }
                    }
                }
                Ok(())
            }
            Expected::Schema(Schema::Primitive(kind)) => {
                write!(f, "{}", kind.tag())
            }
            Expected::Schema(Schema::Any) => f.write_str("any value"),
            Expected::Schema(Schema::DefinedBy { key, .. }) => {
                write!(f, "value defined by {}", key)
            }
            Expected::EndOfValue => f.write_str("end of value"),
        }
    }
}


//------------ Schemas for Primitive Kinds -----------------------------------

pub static BOOLEAN: Schema = Schema::Primitive(Kind::Boolean);
pub static INTEGER: Schema = Schema::Primitive(Kind::Integer);
pub static ENUMERATED: Schema = Schema::Primitive(Kind::Enumerated);
pub static BIT_STRING: Schema = Schema::Primitive(Kind::BitString);
pub static OCTET_STRING: Schema = Schema::Primitive(Kind::OctetString);
pub static NULL: Schema = Schema::Primitive(Kind::Null);
pub static OID: Schema = Schema::Primitive(Kind::Oid);
pub static UTF8_STRING: Schema = Schema::Primitive(Kind::Utf8String);
pub static PRINTABLE_STRING: Schema = Schema::Primitive(Kind::PrintableString);
pub static IA5_STRING: Schema = Schema::Primitive(Kind::Ia5String);
pub static BMP_STRING: Schema = Schema::Primitive(Kind::BmpString);
pub static UTC_TIME: Schema = Schema::Primitive(Kind::UtcTime);
pub static GENERALIZED_TIME: Schema = Schema::Primitive(Kind::GeneralizedTime);
pub static ANY: Schema = Schema::Any;


//============ Tests =========================================================
