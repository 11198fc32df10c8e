//! Map JSON text onto typed Rust object graphs, and back again.
//!
//! `jsonmap` converts between JSON and native types using _type descriptors_ rather than
//! per-type serialization code. A type declares its shape once (through [`Typed`]), and a
//! [`Mapper`] builds, caches, and walks descriptors of that shape for decoding and encoding.
//! The declaration surface carries the customization directives: ignore rules, aliases, include
//! opt-ins, and inherited ignore sets.
//!
//! Beyond plain structured objects the mapper handles:
//!
//! - sequences (`Vec`, `VecDeque`, fixed arrays) and string keyed maps,
//! - nullable slots through `Option`,
//! - C-like and flags enumerations, encoded as their underlying integral value,
//! - polymorphic [`Dynamic`] slots, round tripped through _type-hint envelopes_,
//! - custom exporters, importers, factories, and implicit conversions registered on the mapper,
//! - a boxed [`Doc`] fallback which can hold any JSON shape.
//!
//! # Example
//! ```rust
//! use jsonmap::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Typed for Point {
//!     fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
//!         decl.constructor(Point::default)
//!             .field("x", |p| &p.x, |p| &mut p.x)
//!             .field("y", |p| &p.y, |p| &mut p.y)
//!     }
//! }
//!
//! let mapper = Mapper::new();
//!
//! let json = mapper.to_json(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(json, r#"{"x":1,"y":2}"#);
//!
//! let point: Point = mapper.from_json(&json).unwrap();
//! assert_eq!(point, Point { x: 1, y: 2 });
//! ```
#![warn(missing_docs)]

#[cfg(feature = "serde")]
pub mod bridge;
pub mod ds;
mod error;
pub mod fmt;
pub mod mapper;
pub mod parse;
pub mod reflect;

pub use self::ds::{Doc, DocKind, Number};
pub use self::error::{MapError, Result, TypeMismatch};
pub use self::fmt::{Writer, WriterConfig};
pub use self::mapper::{Mapper, MapperConfig};
pub use self::parse::{Reader, ReaderConfig, Token};
pub use self::reflect::{
    Alias, Dynamic, IgnoreWhen, ObjectDecl, Reflect, ReflectRef, StringMap, TypeInfo, TypeKey,
    TypeRef, Typed,
};
