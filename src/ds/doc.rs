use super::*;
use crate::fmt::{WriteError, Writer};
use crate::parse::{ParseError, Reader, ReaderConfig, Token};
use indexmap::IndexMap;
use std::ops::Index;
use thiserror::Error;

static NULL: Doc = Doc::Null;

/// A boxed, dynamically typed JSON document.
///
/// `Doc` can represent any JSON shape and is the fallback target when a decoded value has no
/// better typed home: a polymorphic slot receiving an array or object without a type hint, or the
/// intermediate form handed to a registered `Doc` importer.
///
/// Objects keep their insertion order.
///
/// # Example
/// ```rust
/// # use jsonmap::*;
/// let doc = Doc::parse(r#"{ "name": "Ferris", "legs": [1, 2, 3, 4, 5, 6] }"#).unwrap();
///
/// assert_eq!(doc.kind(), DocKind::Obj);
/// assert_eq!(doc["name"].as_str(), Some("Ferris"));
/// assert_eq!(doc["legs"][5].as_i32(), Some(6));
/// // missing entries index to null
/// assert!(doc["wings"][0].is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Doc {
    /// `null`.
    #[default]
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A number.
    Num(Number),
    /// A string.
    Str(String),
    /// An ordered sequence.
    Seq(Vec<Doc>),
    /// A string keyed object, in insertion order.
    Obj(IndexMap<String, Doc>),
}

/// The current representation of a [`Doc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DocKind {
    Null,
    Bool,
    Num,
    Str,
    Seq,
    Obj,
}

/// Mutation of a [`Doc`] that does not fit its representation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocError {
    /// The document is not of the kind the operation needs.
    #[error("expected a {expected} document, found {found}")]
    Kind {
        /// Required kind.
        expected: DocKind,
        /// Actual kind.
        found: DocKind,
    },
    /// Sequence index past the end.
    #[error("index {index} is out of bounds for a sequence of length {len}")]
    OutOfBounds {
        /// The index used.
        index: usize,
        /// The sequence length.
        len: usize,
    },
}

impl std::fmt::Display for DocKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocKind::Null => "null",
            DocKind::Bool => "boolean",
            DocKind::Num => "number",
            DocKind::Str => "string",
            DocKind::Seq => "sequence",
            DocKind::Obj => "object",
        };
        f.write_str(s)
    }
}

/// Nesting allowed by [`Doc::parse`] and [`Doc::read`].
pub const MAX_DEPTH: usize = 100;

/// Fail once the container just opened sits deeper than `max_depth`. The top-level value is at
/// depth zero.
fn check_depth(reader: &Reader, max_depth: usize) -> Result<(), ParseError> {
    if reader.depth().saturating_sub(1) > max_depth {
        Err(reader.error(&format!("nesting is deeper than {} levels", max_depth)))
    } else {
        Ok(())
    }
}

impl Doc {
    /// Parse a single JSON text into a `Doc` using the default [`ReaderConfig`].
    ///
    /// Containers may nest [`MAX_DEPTH`] levels deep.
    pub fn parse(json: &str) -> Result<Self, ParseError> {
        Doc::parse_within(json, MAX_DEPTH)
    }

    /// As [`parse`](Self::parse) with a custom nesting limit.
    pub fn parse_within(json: &str, max_depth: usize) -> Result<Self, ParseError> {
        let mut reader = Reader::with_config(json, ReaderConfig::default());
        let doc = Doc::read_within(&mut reader, max_depth)?;
        match reader.next_token()? {
            Token::End => Ok(doc),
            _ => Err(reader.error("trailing characters after the document")),
        }
    }

    /// Read the next complete value from `reader`.
    pub fn read(reader: &mut Reader) -> Result<Self, ParseError> {
        Doc::read_within(reader, MAX_DEPTH)
    }

    /// Read the next complete value from `reader`, failing on containers nested deeper than
    /// `max_depth`. Depth counts from the reader's top level.
    pub fn read_within(reader: &mut Reader, max_depth: usize) -> Result<Self, ParseError> {
        let token = reader.next_token()?;
        Doc::from_token(token, reader, max_depth)
    }

    /// Build a `Doc` whose first token has already been pulled from the reader.
    pub(crate) fn from_token(
        token: Token,
        reader: &mut Reader,
        max_depth: usize,
    ) -> Result<Self, ParseError> {
        let doc = match token {
            Token::Null => Doc::Null,
            Token::Boolean(b) => Doc::Bool(b),
            Token::Int(x) => Doc::Num(x.into()),
            Token::Long(x) => Doc::Num(x.into()),
            Token::ULong(x) => Doc::Num(x.into()),
            Token::Double(x) => Doc::Num(x.into()),
            Token::String(s) => Doc::Str(s),
            Token::ArrayStart => {
                check_depth(reader, max_depth)?;
                let mut seq = Vec::new();
                loop {
                    match reader.next_token()? {
                        Token::ArrayEnd => break,
                        t => seq.push(Doc::from_token(t, reader, max_depth)?),
                    }
                }
                Doc::Seq(seq)
            }
            Token::ObjectStart => {
                check_depth(reader, max_depth)?;
                let mut map = IndexMap::new();
                loop {
                    match reader.next_token()? {
                        Token::ObjectEnd => break,
                        Token::PropertyName(key) => {
                            let value = Doc::read_within(reader, max_depth)?;
                            map.insert(key, value);
                        }
                        _ => return Err(reader.error("expected a property name")),
                    }
                }
                Doc::Obj(map)
            }
            Token::End => return Err(reader.error("unexpected end of input")),
            Token::ArrayEnd | Token::ObjectEnd | Token::PropertyName(_) => {
                return Err(reader.error("expected a value"))
            }
        };

        Ok(doc)
    }

    /// Write the document into `writer`.
    pub fn write_to(&self, writer: &mut Writer) -> Result<(), WriteError> {
        match self {
            Doc::Null => writer.write_null(),
            Doc::Bool(b) => writer.write_bool(*b),
            Doc::Num(Number::Int(x)) => writer.write_i64(*x),
            Doc::Num(Number::Uint(x)) => writer.write_u64(*x),
            Doc::Num(Number::Float(x)) => writer.write_f64(*x),
            Doc::Str(s) => writer.write_str(s),
            Doc::Seq(seq) => {
                writer.write_array_start()?;
                for item in seq {
                    item.write_to(writer)?;
                }
                writer.write_array_end()
            }
            Doc::Obj(map) => {
                writer.write_object_start()?;
                for (k, v) in map {
                    writer.write_property_name(k)?;
                    v.write_to(writer)?;
                }
                writer.write_object_end()
            }
        }
    }

    /// Compact JSON text of the document.
    ///
    /// # Example
    /// ```rust
    /// # use jsonmap::*;
    /// let doc = Doc::from(vec![Doc::from(1), Doc::from("two"), Doc::Null]);
    /// assert_eq!(doc.to_json().unwrap(), r#"[1,"two",null]"#);
    /// ```
    pub fn to_json(&self) -> Result<String, WriteError> {
        let mut writer = Writer::new();
        self.write_to(&mut writer)?;
        Ok(writer.into_string())
    }

    /// The current representation.
    pub fn kind(&self) -> DocKind {
        match self {
            Doc::Null => DocKind::Null,
            Doc::Bool(_) => DocKind::Bool,
            Doc::Num(_) => DocKind::Num,
            Doc::Str(_) => DocKind::Str,
            Doc::Seq(_) => DocKind::Seq,
            Doc::Obj(_) => DocKind::Obj,
        }
    }

    /// Is the document `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Doc::Null)
    }

    /// Is the document a boolean, number, or string.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Doc::Bool(_) | Doc::Num(_) | Doc::Str(_))
    }

    /// Is the document a sequence.
    pub fn is_seq(&self) -> bool {
        matches!(self, Doc::Seq(_))
    }

    /// Is the document an object.
    pub fn is_obj(&self) -> bool {
        matches!(self, Doc::Obj(_))
    }

    /// The boolean value, if a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Doc::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if a number.
    pub fn as_num(&self) -> Option<Number> {
        match self {
            Doc::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as an `i32`, if an integral number in range.
    pub fn as_i32(&self) -> Option<i32> {
        self.as_num().and_then(|n| n.to_int().ok())
    }

    /// The value as an `i64`, if an integral number in range.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_num().and_then(|n| n.to_int().ok())
    }

    /// The value as a `u64`, if an integral number in range.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_num().and_then(|n| n.to_int().ok())
    }

    /// The value as an `f64`, if any number.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_num().map(|n| n.as_f64())
    }

    /// The string, if a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Doc::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The elements, if a sequence.
    pub fn as_seq(&self) -> Option<&[Doc]> {
        match self {
            Doc::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// The entries, if an object.
    pub fn as_obj(&self) -> Option<&IndexMap<String, Doc>> {
        match self {
            Doc::Obj(m) => Some(m),
            _ => None,
        }
    }

    /// Number of elements or entries. Scalars and `null` have no length.
    pub fn len(&self) -> usize {
        match self {
            Doc::Seq(s) => s.len(),
            Doc::Obj(m) => m.len(),
            _ => 0,
        }
    }

    /// See [`len`](Doc::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Property lookup, if an object.
    pub fn get(&self, key: &str) -> Option<&Doc> {
        self.as_obj().and_then(|m| m.get(key))
    }

    /// Mutable property lookup, if an object.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Doc> {
        match self {
            Doc::Obj(m) => m.get_mut(key),
            _ => None,
        }
    }

    /// Set a property. A `null` document becomes an empty object first.
    ///
    /// # Example
    /// ```rust
    /// # use jsonmap::*;
    /// let mut doc = Doc::Null;
    /// doc.insert("a", 1.into()).unwrap();
    /// assert_eq!(doc["a"].as_i32(), Some(1));
    ///
    /// assert!(Doc::from(true).insert("a", Doc::Null).is_err());
    /// ```
    pub fn insert<K: Into<String>>(&mut self, key: K, value: Doc) -> Result<Option<Doc>, DocError> {
        if self.is_null() {
            *self = Doc::Obj(IndexMap::new());
        }
        match self {
            Doc::Obj(m) => Ok(m.insert(key.into(), value)),
            x => Err(DocError::Kind {
                expected: DocKind::Obj,
                found: x.kind(),
            }),
        }
    }

    /// Element lookup, if a sequence.
    pub fn at(&self, index: usize) -> Option<&Doc> {
        self.as_seq().and_then(|s| s.get(index))
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn set_index(&mut self, index: usize, value: Doc) -> Result<Doc, DocError> {
        match self {
            Doc::Seq(s) => {
                let len = s.len();
                s.get_mut(index)
                    .map(|slot| std::mem::replace(slot, value))
                    .ok_or(DocError::OutOfBounds { index, len })
            }
            x => Err(DocError::Kind {
                expected: DocKind::Seq,
                found: x.kind(),
            }),
        }
    }

    /// Append an element. A `null` document becomes an empty sequence first.
    pub fn push(&mut self, value: Doc) -> Result<(), DocError> {
        if self.is_null() {
            *self = Doc::Seq(Vec::new());
        }
        match self {
            Doc::Seq(s) => {
                s.push(value);
                Ok(())
            }
            x => Err(DocError::Kind {
                expected: DocKind::Seq,
                found: x.kind(),
            }),
        }
    }
}

impl Index<&str> for Doc {
    type Output = Doc;

    fn index(&self, key: &str) -> &Doc {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Doc {
    type Output = Doc;

    fn index(&self, index: usize) -> &Doc {
        self.at(index).unwrap_or(&NULL)
    }
}

macro_rules! from_num {
    ( $( $t:ty ),* ) => {
	$(
	impl From<$t> for Doc {
	    fn from(x: $t) -> Self {
		Doc::Num(Number::from(x))
	    }
	}
	)*
    };
}

from_num!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl From<bool> for Doc {
    fn from(b: bool) -> Self {
        Doc::Bool(b)
    }
}

impl From<&str> for Doc {
    fn from(s: &str) -> Self {
        Doc::Str(s.to_string())
    }
}

impl From<String> for Doc {
    fn from(s: String) -> Self {
        Doc::Str(s)
    }
}

impl From<Vec<Doc>> for Doc {
    fn from(seq: Vec<Doc>) -> Self {
        Doc::Seq(seq)
    }
}

impl<K: Into<String>> FromIterator<(K, Doc)> for Doc {
    fn from_iter<I: IntoIterator<Item = (K, Doc)>>(iter: I) -> Self {
        Doc::Obj(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested() {
        let doc = Doc::parse(r#"[1, -2, 3000000000, 1.5, "x", true, null, {"a": {}}]"#).unwrap();
        let seq = doc.as_seq().unwrap();
        assert_eq!(seq[0], Doc::Num(Number::Int(1)));
        assert_eq!(seq[1].as_i32(), Some(-2));
        assert_eq!(seq[2].as_i64(), Some(3_000_000_000));
        assert_eq!(seq[2].as_i32(), None);
        assert_eq!(seq[3].as_f64(), Some(1.5));
        assert_eq!(seq[4].as_str(), Some("x"));
        assert_eq!(seq[5].as_bool(), Some(true));
        assert!(seq[6].is_null());
        assert_eq!(seq[7]["a"].kind(), DocKind::Obj);
    }

    #[test]
    fn nesting_limit() {
        assert!(Doc::parse_within(r#"{"a":[1]}"#, 1).is_ok());
        assert!(Doc::parse_within("[]", 0).is_ok());
        assert!(Doc::parse_within("7", 0).is_ok());

        let err = Doc::parse_within(r#"{"a":[[1]]}"#, 1).unwrap_err();
        assert_eq!(err.msg, "nesting is deeper than 1 levels");
        assert_eq!(err.col, 8);
    }

    #[test]
    fn parse_rejects_trailing() {
        assert!(Doc::parse("1 2").is_err());
        assert!(Doc::parse("").is_err());
    }

    #[test]
    fn obj_keeps_order() {
        let doc = Doc::parse(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<_> = doc.as_obj().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(doc.to_json().unwrap(), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn mutation() {
        let mut doc = Doc::Null;
        doc.push(1.into()).unwrap();
        doc.push(2.into()).unwrap();
        assert_eq!(doc.set_index(0, "x".into()), Ok(Doc::from(1)));
        assert_eq!(
            doc.set_index(5, Doc::Null),
            Err(DocError::OutOfBounds { index: 5, len: 2 })
        );
        assert_eq!(
            doc.insert("k", Doc::Null),
            Err(DocError::Kind {
                expected: DocKind::Obj,
                found: DocKind::Seq
            })
        );
        assert_eq!(doc.to_json().unwrap(), r#"["x",2]"#);
    }
}
