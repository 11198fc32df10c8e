//! Runtime type information, declared rather than discovered.
//!
//! A type takes part in mapping by implementing [`Typed`]. The implementation states what the
//! type _is_ to the mapper ([`TypeInfo`]: a native scalar, a sequence, a map, a structured
//! object, ...) and how to look at a value of it ([`ReflectRef`]). Structured objects list their
//! members and customization directives through an [`ObjectDecl`] builder.
//!
//! Values travel through the mapper type erased as [`Reflect`] trait objects, which every
//! `Typed` type implements.
//!
//! # Example
//! ```rust
//! use jsonmap::*;
//!
//! #[derive(Default)]
//! struct Account {
//!     id: u64,
//!     password: String,
//!     nick: Option<String>,
//! }
//!
//! impl Typed for Account {
//!     fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
//!         decl.constructor(Account::default)
//!             .field("id", |a| &a.id, |a| &mut a.id)
//!             .field("password", |a| &a.password, |a| &mut a.password)
//!             .ignore_when(IgnoreWhen::SERIALIZE)
//!             .field("nick", |a| &a.nick, |a| &mut a.nick)
//!             .alias("n", true)
//!     }
//! }
//!
//! let mapper = Mapper::new();
//! let acc = Account { id: 7, password: "hunter2".into(), nick: None };
//! assert_eq!(mapper.to_json(&acc).unwrap(), r#"{"id":7,"n":null}"#);
//!
//! let acc: Account = mapper.from_json(r#"{"id":8,"password":"x","nick":"ferris"}"#).unwrap();
//! assert_eq!(acc.password, "x");
//! assert_eq!(acc.nick.as_deref(), Some("ferris"));
//! ```
use crate::error::TypeMismatch;
use crate::Doc;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

mod decl;
mod impls;
mod macros;

pub use self::decl::{Alias, IgnoreWhen, MemberDecl, ObjectDecl, Slot, TypeDecl};
pub(crate) use self::decl::{Constructor, ExtrasDecl, Getter, Setter};
pub use self::impls::{Dynamic, StringMap};

/// Identity of a concrete type: its `TypeId` and its name.
///
/// Equality and hashing use the `TypeId` only. The name is what type-hint envelopes carry.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// The key of `T`.
    pub fn of<T: Any>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type name, as given by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A handle to a [`Typed`] type: its key plus a way to obtain its [`TypeInfo`].
///
/// This is how declared types are referred to (member types, element types) without a value
/// at hand.
#[derive(Clone, Copy)]
pub struct TypeRef {
    key: TypeKey,
    info: fn() -> TypeInfo,
}

impl TypeRef {
    /// The handle of `T`.
    pub fn of<T: Typed>() -> Self {
        TypeRef {
            key: T::type_key(),
            info: T::type_info,
        }
    }

    /// The type's key.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The type's `TypeId`.
    pub fn id(&self) -> TypeId {
        self.key.id
    }

    /// The type's name.
    pub fn name(&self) -> &'static str {
        self.key.name
    }

    /// What the type is to the mapper.
    pub fn info(&self) -> TypeInfo {
        (self.info)()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeRef {}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.key.name)
    }
}

/// Native value kinds which map one to one onto reader tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `i32`
    Int,
    /// `i64`
    Long,
    /// `u64`
    ULong,
    /// `f64`
    Double,
    /// `String`
    String,
}

/// What a type is to the mapper.
#[derive(Clone)]
pub enum TypeInfo {
    /// A native scalar, decoded verbatim from the matching token.
    Scalar(ScalarKind),
    /// Another primitive, handled through the built-in coercion tables.
    Primitive,
    /// A C-like or flags enumeration over an integral representation.
    Enum(EnumInfo),
    /// A slot which may be absent.
    Nullable(NullableInfo),
    /// An ordered, integer indexed container.
    Seq(SeqInfo),
    /// A string keyed, dynamically sized container.
    Map(MapInfo),
    /// A structured object with declared members.
    Object(ObjectInfo),
    /// The boxed [`Doc`] document.
    Doc,
    /// A polymorphic slot, see [`Dynamic`].
    Dynamic,
}

/// Enumeration details.
#[derive(Clone, Copy)]
pub struct EnumInfo {
    /// Is the underlying representation unsigned.
    pub unsigned: bool,
    /// Build a value from its integral representation, `None` if no value matches.
    pub from_bits: fn(i128) -> Option<Box<dyn Reflect>>,
}

/// Nullable slot details.
#[derive(Clone, Copy)]
pub struct NullableInfo {
    /// The type held when present.
    pub inner: TypeRef,
    /// The absent value.
    pub none: fn() -> Box<dyn Reflect>,
}

/// Sequence details.
#[derive(Clone, Copy)]
pub struct SeqInfo {
    /// The element type.
    pub element: TypeRef,
    /// `Some` for fixed size arrays.
    pub fixed_len: Option<usize>,
    /// Materialize the container from decoded elements.
    pub from_items: fn(Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, TypeMismatch>,
}

/// Map details.
#[derive(Clone, Copy)]
pub struct MapInfo {
    /// The value type.
    pub value: TypeRef,
    /// Materialize the container from decoded entries.
    pub from_entries: fn(Vec<(String, Box<dyn Reflect>)>) -> Result<Box<dyn Reflect>, TypeMismatch>,
}

/// Structured object details.
#[derive(Clone, Copy)]
pub struct ObjectInfo {
    /// Produce the type's declaration.
    pub declare: fn() -> TypeDecl,
}

impl ObjectInfo {
    /// Object info from `T`'s [`Typed::declare`].
    pub fn of<T: Typed>() -> Self {
        ObjectInfo {
            declare: declaration_of::<T>,
        }
    }
}

fn declaration_of<T: Typed>() -> TypeDecl {
    T::declare(ObjectDecl::new()).into_decl()
}

/// A native scalar value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub enum Scalar<'a> {
    Bool(bool),
    Int(i32),
    Long(i64),
    ULong(u64),
    Double(f64),
    Str(&'a str),
}

impl<'a> fmt::Display for Scalar<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(x) => write!(f, "{}", x),
            Scalar::Int(x) => write!(f, "{}", x),
            Scalar::Long(x) => write!(f, "{}", x),
            Scalar::ULong(x) => write!(f, "{}", x),
            Scalar::Double(x) => write!(f, "{}", x),
            Scalar::Str(x) => f.write_str(x),
        }
    }
}

/// A borrowed view of a value, as the encoder walks it.
pub enum ReflectRef<'a> {
    /// A native scalar.
    Scalar(Scalar<'a>),
    /// A primitive written through an exporter.
    Primitive,
    /// An enumeration's integral value.
    Enum {
        /// The value, widened.
        bits: i128,
        /// Write through the unsigned path.
        unsigned: bool,
    },
    /// A nullable slot.
    Nullable(Option<&'a dyn Reflect>),
    /// A wrapper whose contents are the real value.
    Indirect(&'a dyn Reflect),
    /// A boxed document, which writes itself.
    Doc(&'a Doc),
    /// Sequence elements in order.
    Seq(Box<dyn Iterator<Item = &'a dyn Reflect> + 'a>),
    /// Map entries.
    Map(Box<dyn Iterator<Item = (&'a str, &'a dyn Reflect)> + 'a>),
    /// A structured object; members are reached through its descriptor.
    Object,
}

/// The static side of a mapped type.
///
/// Only [`declare`](Typed::declare) is usually written by hand, for structured objects. The
/// crate implements `Typed` for the native scalars, other primitives, the std collections,
/// `Option`, [`Doc`], and [`Dynamic`]; enumerations use [`typed_enum!`](crate::typed_enum) and
/// [`typed_flags!`](crate::typed_flags).
pub trait Typed: Any + Send + Sync + Sized {
    /// What the type is to the mapper. Defaults to a structured object.
    fn type_info() -> TypeInfo {
        TypeInfo::Object(ObjectInfo::of::<Self>())
    }

    /// The type's identity.
    fn type_key() -> TypeKey {
        TypeKey::of::<Self>()
    }

    /// View a value for encoding. Defaults to a structured object.
    fn view(&self) -> ReflectRef<'_> {
        ReflectRef::Object
    }

    /// Declare members and directives of a structured object.
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl
    }

    /// Take a decoded value into this type.
    fn from_reflect(value: Box<dyn Reflect>) -> Result<Self, TypeMismatch> {
        downcast(value)
    }
}

/// The object safe side of a mapped value. Implemented for every [`Typed`] type.
pub trait Reflect: Any + Send + Sync {
    /// The runtime type's identity.
    fn reflect_key(&self) -> TypeKey;

    /// The runtime type's handle.
    fn reflect_type(&self) -> TypeRef;

    /// Borrow as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as `Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert into `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// View the value for encoding.
    fn reflect_ref(&self) -> ReflectRef<'_>;
}

impl<T: Typed> Reflect for T {
    fn reflect_key(&self) -> TypeKey {
        T::type_key()
    }

    fn reflect_type(&self) -> TypeRef {
        TypeRef::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        self.view()
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reflect({})", self.reflect_key())
    }
}

/// Move a boxed value out as `T`.
pub fn downcast<T: Any>(value: Box<dyn Reflect>) -> Result<T, TypeMismatch> {
    let found = value.reflect_key().name();
    value
        .into_any()
        .downcast::<T>()
        .map(|b| *b)
        .map_err(|_| TypeMismatch::Slot {
            found: found.to_string(),
            target: std::any::type_name::<T>().to_string(),
        })
}

/// Integral representations usable for [`typed_enum!`](crate::typed_enum) and
/// [`typed_flags!`](crate::typed_flags).
pub trait EnumRepr {
    /// Is the value written through the unsigned path. Only the 32 and 64 bit unsigned
    /// representations are; narrower ones widen losslessly into the signed path.
    const UNSIGNED: bool;
}

macro_rules! enum_repr {
    ($unsigned:literal: $( $t:ty ),*) => {
	$(
	impl EnumRepr for $t {
	    const UNSIGNED: bool = $unsigned;
	}
	)*
    };
}

enum_repr!(false: i8, i16, i32, i64, isize, u8, u16);
enum_repr!(true: u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_identity() {
        assert_eq!(TypeKey::of::<i32>(), TypeKey::of::<i32>());
        assert_ne!(TypeKey::of::<i32>(), TypeKey::of::<i64>());
        assert_eq!(TypeKey::of::<String>().name(), "alloc::string::String");
        assert_eq!(TypeRef::of::<Vec<u8>>().key(), TypeKey::of::<Vec<u8>>());
    }

    #[test]
    fn enum_repr_paths() {
        assert!(!<u8 as EnumRepr>::UNSIGNED);
        assert!(!<u16 as EnumRepr>::UNSIGNED);
        assert!(!<i64 as EnumRepr>::UNSIGNED);
        assert!(<u32 as EnumRepr>::UNSIGNED);
        assert!(<u64 as EnumRepr>::UNSIGNED);
        assert!(<usize as EnumRepr>::UNSIGNED);
    }

    #[test]
    fn downcasting() {
        let b: Box<dyn Reflect> = Box::new(5i32);
        assert_eq!(b.reflect_key(), TypeKey::of::<i32>());
        assert_eq!(downcast::<i32>(b), Ok(5));

        let b: Box<dyn Reflect> = Box::new(5i32);
        assert_eq!(
            downcast::<u8>(b),
            Err(TypeMismatch::Slot {
                found: "i32".into(),
                target: "u8".into()
            })
        );
    }
}
