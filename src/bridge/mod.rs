//! Conversions between [`Doc`] and any `serde` data type.
//!
//! Requires the _serde_ feature.
//!
//! Types which already implement [`Serialize`] or [`Deserialize`] can pass through a [`Doc`]
//! without a [`Typed`](crate::Typed) declaration. This pairs well with a registered `Doc`
//! importer: decode the document, then hand it to serde.
//!
//! The encoding follows the usual JSON conventions. Unit and `None` are `null`, tuples and byte
//! buffers are sequences, and enums are externally tagged.
//!
//! # Examples
//! ```rust
//! # use jsonmap::*;
//! let data = (100, "Hello, world!", 3.5);
//! let doc = Doc::enc(&data).unwrap();
//! assert_eq!(doc.to_json().unwrap(), r#"[100,"Hello, world!",3.5]"#);
//!
//! let back = doc.decode::<(u32, String, f32)>().unwrap();
//! assert_eq!(back, (100, "Hello, world!".to_string(), 3.5));
//! ```
//!
//! [`Deserialize`]: serde::Deserialize
//! [`Serialize`]: serde::Serialize
use crate::ds::Number;
use crate::Doc;
use serde::de::{self, DeserializeOwned};
use serde::ser::{self, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

mod decoder;
mod encoder;

pub use self::decoder::Decoder;
pub use self::encoder::Encoder;

/// Failure converting between a [`Doc`] and a serde data type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A map value was serialized before its key.
    #[error("no key was available when trying to serialize map value")]
    NoKeyAvailable,
    /// A map key serialized to something which can't be an object key.
    #[error("map keys must be strings, numbers, or booleans, found a {0}")]
    KeyNotScalar(crate::DocKind),
    /// Raised by a `Serialize` or `Deserialize` implementation.
    #[error("{0}")]
    Message(String),
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Doc {
    /// Encode `data` into a `Doc`.
    ///
    /// Requires the _serde_ feature.
    pub fn enc<T: Serialize + ?Sized>(data: &T) -> Result<Self, Error> {
        data.serialize(Encoder)
    }

    /// Decode the document into `T`.
    ///
    /// Requires the _serde_ feature.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, Error> {
        T::deserialize(Decoder(self))
    }
}

impl Serialize for Doc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Doc::Null => serializer.serialize_unit(),
            Doc::Bool(b) => serializer.serialize_bool(*b),
            Doc::Num(Number::Int(n)) => serializer.serialize_i64(*n),
            Doc::Num(Number::Uint(n)) => serializer.serialize_u64(*n),
            Doc::Num(Number::Float(n)) => serializer.serialize_f64(*n),
            Doc::Str(s) => serializer.serialize_str(s),
            Doc::Seq(v) => serializer.collect_seq(v),
            Doc::Obj(m) => serializer.collect_map(m),
        }
    }
}
