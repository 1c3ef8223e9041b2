//! The decoded tree.
//!
//! Decoding a value with a [`Schema`][crate::schema::Schema] produces a
//! [`Node`] mirroring the shape of the schema. Nodes borrow from the buffer
//! they were decoded from wherever possible.
//!
//! Nested values are reached via dotted paths, e.g.,
//! `content.contentInfo.content.value`. Choice nodes are transparent to
//! paths and a final `value` segment selects a value node itself. Numeric
//! segments index into lists.

use std::fmt;
use std::borrow::Cow;
use thiserror::Error;
use crate::captured::Captured;
use crate::int::Integer;
use crate::oid::Oid;
use crate::string::{BitString, Time};


//------------ Node ----------------------------------------------------------

/// A decoded value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node<'a> {
    /// A SEQUENCE with its fields in schema order.
    ///
    /// Optional fields that were absent are not included.
    Sequence(Vec<(&'static str, Node<'a>)>),

    /// The elements of a SEQUENCE OF or SET OF.
    List(Vec<Node<'a>>),

    /// The chosen alternative of a CHOICE or an OID-selected definition.
    Choice(&'static str, Box<Node<'a>>),

    /// A primitive or captured value.
    Value(Value<'a>),
}

impl<'a> Node<'a> {
    /// Follows choice nodes to the first node that isn’t one.
    pub fn resolve(&self) -> &Self {
        let mut node = self;
        while let Node::Choice(_, inner) = node {
            node = inner
        }
        node
    }

    /// Returns the field with the given name of a sequence.
    ///
    /// Choice nodes are looked through.
    pub fn field(&self, name: &str) -> Option<&Self> {
        match self.resolve() {
            Node::Sequence(fields) => {
                fields.iter().find(|(field, _)| *field == name).map(|x| &x.1)
            }
            _ => None
        }
    }

    /// Returns the node at the given dotted path.
    pub fn get(&self, path: &str) -> Result<&Self, PathError> {
        let mut node = self;
        let mut segments = path.split('.').enumerate().peekable();
        while let Some((idx, segment)) = segments.next() {
            let last = segments.peek().is_none();
            node = match node.resolve() {
                Node::Sequence(fields) => {
                    match fields.iter().find(|(name, _)| *name == segment) {
                        Some((_, child)) => child,
                        None => {
                            return Err(PathError::missing(path, idx))
                        }
                    }
                }
                Node::List(items) => {
                    match segment.parse::<usize>().ok().and_then(|i| {
                        items.get(i)
                    }) {
                        Some(child) => child,
                        None => {
                            return Err(PathError::missing(path, idx))
                        }
                    }
                }
                Node::Value(_) if last && segment == "value" => node,
                _ => return Err(PathError::not_a_container(path, idx)),
            };
        }
        Ok(node)
    }

    /// Returns the value of a value node.
    pub fn as_value(&self) -> Option<&Value<'a>> {
        match self.resolve() {
            Node::Value(value) => Some(value),
            _ => None
        }
    }

    /// Returns the object identifier of an OID value.
    pub fn as_oid(&self) -> Option<Oid<'a>> {
        match self.as_value()? {
            Value::Oid(oid) => Some(*oid),
            _ => None
        }
    }

    /// Returns the octets of an octet string or captured value.
    ///
    /// For captured values, these are the content octets.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self.as_value()? {
            Value::OctetString(octets) => Some(octets.as_ref()),
            Value::Any(captured) => Some(captured.content()),
            _ => None
        }
    }

    /// Returns the octets of the value if they are borrowed from the input.
    ///
    /// This is the case for all primitive octet strings and captured
    /// values but not for constructed octet strings.
    pub fn as_borrowed_bytes(&self) -> Option<&'a [u8]> {
        match self.as_value()? {
            Value::OctetString(Cow::Borrowed(octets)) => Some(*octets),
            Value::Any(captured) => Some(captured.content()),
            _ => None
        }
    }

    /// Returns an integer value.
    pub fn as_integer(&self) -> Option<Integer<'a>> {
        match self.as_value()? {
            Value::Integer(int) => Some(*int),
            _ => None
        }
    }

    /// Returns the text of a character string value.
    pub fn as_str(&self) -> Option<&str> {
        match self.as_value()? {
            Value::String(text) => Some(text.as_ref()),
            Value::Time(time) => Some(time.as_str()),
            _ => None
        }
    }

    /// Returns the elements of a list node.
    pub fn as_list(&self) -> Option<&[Node<'a>]> {
        match self.resolve() {
            Node::List(items) => Some(items),
            _ => None
        }
    }

    /// Returns the fields of a sequence node.
    pub fn as_sequence(&self) -> Option<&[(&'static str, Node<'a>)]> {
        match self.resolve() {
            Node::Sequence(fields) => Some(fields),
            _ => None
        }
    }

    /// Returns the name and content of a choice node.
    ///
    /// Unlike the other accessors, this does not look through the node.
    pub fn choice(&self) -> Option<(&'static str, &Self)> {
        match self {
            Node::Choice(name, inner) => Some((*name, inner.as_ref())),
            _ => None
        }
    }
}


//------------ Value ---------------------------------------------------------

/// A decoded primitive or captured value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    Integer(Integer<'a>),
    BitString(BitString<'a>),

    /// An octet string.
    ///
    /// This is borrowed unless it was assembled from the segments of a
    /// constructed encoding.
    OctetString(Cow<'a, [u8]>),

    Null,
    Oid(Oid<'a>),
    String(Cow<'a, str>),
    Time(Time<'a>),

    /// Any value kept in its encoded form.
    Any(Captured<'a>),
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(value) => fmt::Display::fmt(value, f),
            Value::Integer(value) => fmt::Display::fmt(value, f),
            Value::BitString(value) => {
                write!(f, "BIT STRING ({} bits)", value.bit_len())
            }
            Value::OctetString(value) => {
                write!(f, "OCTET STRING ({} octets)", value.len())
            }
            Value::Null => f.write_str("NULL"),
            Value::Oid(value) => fmt::Display::fmt(value, f),
            Value::String(value) => fmt::Display::fmt(value, f),
            Value::Time(value) => fmt::Display::fmt(value, f),
            Value::Any(value) => {
                write!(
                    f, "{} ({} octets)", value.ident(), value.content().len()
                )
            }
        }
    }
}


//------------ PathError -----------------------------------------------------

/// A dotted path didn’t lead to a node.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PathError {
    /// There is no node with the given name or index.
    #[error("no node {segment} at {prefix}")]
    Missing {
        prefix: String,
        segment: String,
    },

    /// A path segment was applied to a value.
    #[error("{prefix} has no member {segment}")]
    NotAContainer {
        prefix: String,
        segment: String,
    },
}

impl PathError {
    fn parts(path: &str, idx: usize) -> (String, String) {
        let mut segments = path.split('.');
        let prefix = segments.by_ref().take(idx).collect::<Vec<_>>().join(".");
        let segment = segments.next().unwrap_or_default().to_string();
        if prefix.is_empty() {
            ("<root>".into(), segment)
        }
        else {
            (prefix, segment)
        }
    }

    fn missing(path: &str, idx: usize) -> Self {
        let (prefix, segment) = Self::parts(path, idx);
        PathError::Missing { prefix, segment }
    }

    fn not_a_container(path: &str, idx: usize) -> Self {
        let (prefix, segment) = Self::parts(path, idx);
        PathError::NotAContainer { prefix, segment }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn tree() -> Node<'static> {
        Node::Sequence(vec![
            ("contentType", Node::Value(Value::Oid(crate::oid::PKCS7_DATA))),
            ("content", Node::Choice("data", Box::new(
                Node::Value(Value::OctetString(Cow::Borrowed(b"hello")))
            ))),
            ("items", Node::List(vec![
                Node::Value(Value::Null),
                Node::Sequence(vec![
                    ("name", Node::Value(Value::String("x".into())))
                ]),
            ])),
        ])
    }

    #[test]
    fn paths() {
        let tree = tree();
        assert_eq!(
            tree.get("contentType").unwrap().as_oid().unwrap(),
            "1.2.840.113549.1.7.1"
        );
        assert_eq!(
            tree.get("content.value").unwrap().as_bytes(), Some(&b"hello"[..])
        );
        assert_eq!(tree.get("content").unwrap().choice().unwrap().0, "data");
        assert_eq!(tree.get("items.1.name").unwrap().as_str(), Some("x"));
        assert_eq!(tree.get("items.0").unwrap().as_value(), Some(&Value::Null));
    }

    #[test]
    fn bad_paths() {
        let tree = tree();
        assert_eq!(
            tree.get("signerInfos").unwrap_err(),
            PathError::Missing {
                prefix: "<root>".into(), segment: "signerInfos".into()
            }
        );
        assert_eq!(
            tree.get("items.7").unwrap_err(),
            PathError::Missing { prefix: "items".into(), segment: "7".into() }
        );
        assert_eq!(
            tree.get("content.value.x").unwrap_err(),
            PathError::NotAContainer {
                prefix: "content".into(), segment: "value".into()
            }
        );
        assert!(tree.get("contentType.other").is_err());
    }

    #[test]
    fn accessors_look_through_choices() {
        let tree = tree();
        let content = tree.field("content").unwrap();
        assert!(content.choice().is_some());
        assert_eq!(content.as_borrowed_bytes(), Some(&b"hello"[..]));
        assert!(content.as_sequence().is_none());
        assert_eq!(tree.field("items").unwrap().as_list().unwrap().len(), 2);
    }
}
