//! The mapper: decoding JSON into typed values and encoding them back.
//!
//! A [`Mapper`] owns everything the two algorithms consult: the [`DescriptorCache`], the
//! [`ConversionRegistry`], and the registry of type names used by type-hint envelopes.
//! Separate mappers share nothing, so tests and subsystems can configure theirs in isolation.
//!
//! # Type hinting
//! With hinting enabled on both the [`Writer`] and the [`Reader`], a value whose runtime type
//! differs from its slot's declared type (most usefully a [`Dynamic`](crate::Dynamic) slot) is
//! written as `{"__type__": "<type name>", "__value__": <value>}` and read back as that type.
//!
//! ```rust
//! # use jsonmap::*;
//! struct Slot {
//!     value: Dynamic,
//! }
//!
//! impl Typed for Slot {
//!     fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
//!         decl.constructor(|| Slot { value: Dynamic::new(Doc::Null) })
//!             .field("value", |s| &s.value, |s| &mut s.value)
//!     }
//! }
//!
//! let mapper = Mapper::new();
//! let json = mapper
//!     .to_json_with(
//!         &Slot { value: Dynamic::new(7u8) },
//!         WriterConfig { type_hinting: true, ..Default::default() },
//!     )
//!     .unwrap();
//! assert_eq!(json, r#"{"value":{"__type__":"u8","__value__":7}}"#);
//!
//! let back: Slot = mapper
//!     .from_json_with(&json, ReaderConfig { type_hinting: true, ..Default::default() })
//!     .unwrap();
//! assert_eq!(back.value.downcast_ref::<u8>(), Some(&7));
//! ```
use crate::error::{MapError, Result};
use crate::fmt::{Writer, WriterConfig};
use crate::parse::{ParseError, Reader, ReaderConfig, Token};
use crate::reflect::{Reflect, TypeInfo, TypeRef, Typed};
use crate::Doc;
use chrono::NaiveDateTime;
use log::{trace, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

mod attrs;
mod base;
mod cache;
mod decoder;
mod descriptor;
mod encoder;
mod registry;

pub use self::cache::DescriptorCache;
pub use self::descriptor::{
    MemberDescriptor, ObjectDescriptor, PropertyList, SequenceDescriptor,
};
pub use self::registry::{ConversionRegistry, ImportSource, SourceKind};

use self::decoder::Decoder;
use self::encoder::Encoder;

/// Switches for the [`Mapper`].
///
/// ```rust
/// # use jsonmap::*;
/// let mapper = Mapper::with_config(MapperConfig {
///     max_depth: 8,
///     ..Default::default()
/// });
/// assert_eq!(mapper.config().max_depth, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    /// The deepest nesting the encoder descends to, and the deepest container the decoder
    /// accepts. A value at exactly this depth is mapped.
    pub max_depth: usize,
    /// `chrono` format of the built-in date-time exporter, and the first format the date-time
    /// importer tries.
    pub date_format: String,
}

impl Default for MapperConfig {
    fn default() -> Self {
        MapperConfig {
            max_depth: 100,
            date_format: String::from("%m/%d/%Y %H:%M:%S"),
        }
    }
}

/// Decodes and encodes typed values.
///
/// A mapper is `Send + Sync`; descriptors and registrations are shared between threads.
pub struct Mapper {
    config: MapperConfig,
    registry: ConversionRegistry,
    cache: DescriptorCache,
    types: RwLock<HashMap<String, TypeRef>>,
    shared: Mutex<Writer>,
}

impl Default for Mapper {
    fn default() -> Self {
        Mapper::with_config(MapperConfig::default())
    }
}

impl Mapper {
    /// A mapper with the default configuration.
    pub fn new() -> Self {
        Mapper::default()
    }

    /// A mapper with the given configuration.
    pub fn with_config(config: MapperConfig) -> Self {
        let mapper = Mapper {
            registry: ConversionRegistry::new(&config.date_format),
            config,
            cache: DescriptorCache::new(),
            types: RwLock::default(),
            shared: Mutex::default(),
        };

        macro_rules! register {
            ($( $t:ty ),*) => {
		$( mapper.register_type::<$t>(); )*
            };
        }
        register!(bool, i32, i64, u64, f64, String, u8, i8, i16, u16, u32, usize, isize, f32, char);
        register!(NaiveDateTime, Doc);

        mapper
    }

    /// The configuration.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The conversion registry.
    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    /// The descriptor cache.
    pub fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    // ###### TYPE NAMES ######################################################

    /// Make `T` resolvable from its name in type-hint envelopes.
    pub fn register_type<T: Typed>(&self) {
        self.register_type_ref(TypeRef::of::<T>())
    }

    /// Make `ty` resolvable from its name in type-hint envelopes.
    pub fn register_type_ref(&self, ty: TypeRef) {
        if let Some(known) = self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ty.name())
        {
            if *known == ty {
                return;
            }
        }

        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        match types.insert(ty.name().to_string(), ty) {
            Some(prev) if prev != ty => warn!("type name {} now refers to another type", ty.name()),
            Some(_) => (),
            None => trace!("registered type name {}", ty.name()),
        }
    }

    /// The type registered under `name`.
    pub fn resolve_type(&self, name: &str) -> Option<TypeRef> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    // ###### REGISTRY ########################################################

    /// See [`ConversionRegistry::register_exporter`].
    pub fn register_exporter<T, F>(&self, f: F)
    where
        T: Typed,
        F: Fn(&T, &mut Writer) -> Result<()> + Send + Sync + 'static,
    {
        self.registry.register_exporter(f)
    }

    /// See [`ConversionRegistry::register_importer`].
    pub fn register_importer<S, T, F>(&self, f: F)
    where
        S: ImportSource,
        T: Typed,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        self.registry.register_importer(f)
    }

    /// See [`ConversionRegistry::register_factory`].
    pub fn register_factory<T, F>(&self, f: F)
    where
        T: Typed,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.registry.register_factory(f)
    }

    /// See [`ConversionRegistry::register_conversion`].
    pub fn register_conversion<S, T, F>(&self, f: F)
    where
        S: ImportSource,
        T: Typed,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        self.registry.register_conversion(f)
    }

    /// Drop all custom exporters.
    pub fn unregister_exporters(&self) {
        self.registry.unregister_exporters()
    }

    /// Drop all custom importers.
    pub fn unregister_importers(&self) {
        self.registry.unregister_importers()
    }

    // ###### DESCRIPTORS #####################################################

    /// The sequence descriptor of `ty`.
    pub fn sequence_descriptor(&self, ty: TypeRef) -> Arc<SequenceDescriptor> {
        self.cache.sequence(ty)
    }

    /// The object descriptor of `ty`. Member types are registered by name whenever it is
    /// built, before the descriptor is published.
    pub fn object_descriptor(&self, ty: TypeRef) -> Result<Arc<ObjectDescriptor>> {
        self.cache.object_with(ty, |desc| {
            self.register_type_ref(ty);
            for (_, m) in desc.members() {
                let mut declared = m.declared();
                while let TypeInfo::Nullable(n) = declared.info() {
                    declared = n.inner;
                }
                if !matches!(declared.info(), TypeInfo::Dynamic) {
                    self.register_type_ref(declared);
                }
            }
        })
    }

    pub(crate) fn property_list(&self, ty: TypeRef) -> Result<Arc<PropertyList>> {
        let object = self.object_descriptor(ty)?;
        Ok(self.cache.properties(ty, &object))
    }

    // ###### ENCODING ########################################################

    /// Encode `value` as compact JSON.
    ///
    /// Calls share one output buffer and are serialized by a lock; use
    /// [`write`](Self::write) with your own [`Writer`] to avoid it.
    pub fn to_json(&self, value: &dyn Reflect) -> Result<String> {
        let mut writer = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        writer.reset();
        self.write(value, &mut writer)?;
        Ok(writer.as_str().to_string())
    }

    /// Encode `value` with the given writer configuration.
    pub fn to_json_with(&self, value: &dyn Reflect, config: WriterConfig) -> Result<String> {
        let mut writer = Writer::with_config(config);
        self.write(value, &mut writer)?;
        Ok(writer.into_string())
    }

    /// Encode `value` into `writer`.
    pub fn write(&self, value: &dyn Reflect, writer: &mut Writer) -> Result<()> {
        Encoder::new(self, writer).encode(value, 0)
    }

    // ###### DECODING ########################################################

    /// Decode a `T` from JSON text. Anything but whitespace or comments after the value is an
    /// error.
    pub fn from_json<T: Typed>(&self, json: &str) -> Result<T> {
        self.from_json_with(json, ReaderConfig::default())
    }

    /// Decode a `T` from JSON text with the given reader configuration.
    pub fn from_json_with<T: Typed>(&self, json: &str, config: ReaderConfig) -> Result<T> {
        let mut reader = Reader::with_config(json, config);
        let value = self.read::<T>(&mut reader)?;
        match reader.next_token()? {
            Token::End => Ok(value),
            _ => Err(MapError::Syntax(reader.error("unexpected trailing characters"))),
        }
    }

    /// Decode the next value of `reader` as a `T`.
    pub fn read<T: Typed>(&self, reader: &mut Reader) -> Result<T> {
        let value = self.read_type(TypeRef::of::<T>(), reader)?;
        Ok(T::from_reflect(value)?)
    }

    /// Decode the next value of `reader` as `ty`.
    ///
    /// The result is a `ty`, unless a type-hint envelope named another type.
    pub fn read_type(&self, ty: TypeRef, reader: &mut Reader) -> Result<Box<dyn Reflect>> {
        let mut decoder = Decoder::new(self, reader);
        match decoder.decode(ty)? {
            Some(v) => Ok(v),
            None => Err(MapError::Syntax(reader.error("expected a value, found ']'"))),
        }
    }

    /// Parse JSON text into a [`Doc`], nesting at most `max_depth` levels.
    pub fn to_doc(&self, json: &str) -> Result<Doc> {
        let mut reader = Reader::new(json);
        let doc = self.read_doc(&mut reader)?;
        match reader.next_token()? {
            Token::End => Ok(doc),
            _ => Err(MapError::Syntax(reader.error("unexpected trailing characters"))),
        }
    }

    /// Read the next value of `reader` into a [`Doc`], nesting at most `max_depth` levels.
    pub fn read_doc(&self, reader: &mut Reader) -> Result<Doc> {
        match Doc::read_within(reader, self.config.max_depth) {
            Ok(doc) => Ok(doc),
            Err(e) => Err(self.doc_error(e, reader, TypeRef::of::<Doc>())),
        }
    }

    /// Has the container just opened by `reader` passed the depth limit.
    pub(crate) fn too_deep(&self, reader: &Reader) -> bool {
        reader.depth().saturating_sub(1) > self.config.max_depth
    }

    pub(crate) fn depth_error(&self, ty: TypeRef) -> MapError {
        MapError::DepthExceeded {
            ty: ty.name().to_string(),
            max: self.config.max_depth,
        }
    }

    /// A document read that stopped past the depth limit failed on depth, not syntax.
    pub(crate) fn doc_error(&self, err: ParseError, reader: &Reader, ty: TypeRef) -> MapError {
        if self.too_deep(reader) {
            self.depth_error(ty)
        } else {
            MapError::Syntax(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Dynamic, ObjectDecl};

    #[derive(Default)]
    struct Holder {
        inner: Option<Vec<u8>>,
        any: Option<Dynamic>,
    }

    impl Typed for Holder {
        fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
            decl.constructor(Holder::default)
                .field("inner", |h| &h.inner, |h| &mut h.inner)
                .field("any", |h| &h.any, |h| &mut h.any)
        }
    }

    #[test]
    fn builtin_names_resolve() {
        let m = Mapper::new();
        assert_eq!(m.resolve_type("u8"), Some(TypeRef::of::<u8>()));
        assert_eq!(
            m.resolve_type(std::any::type_name::<Doc>()),
            Some(TypeRef::of::<Doc>())
        );
        assert_eq!(m.resolve_type("nope"), None);
    }

    #[test]
    fn member_types_register_on_first_build() {
        let m = Mapper::new();
        let name = std::any::type_name::<Vec<u8>>();
        assert!(m.resolve_type(name).is_none());
        m.object_descriptor(TypeRef::of::<Holder>()).unwrap();
        assert_eq!(m.resolve_type(name), Some(TypeRef::of::<Vec<u8>>()));
        assert!(m.resolve_type(std::any::type_name::<Holder>()).is_some());
        assert!(m.resolve_type(std::any::type_name::<Dynamic>()).is_none());
    }

    #[test]
    fn member_types_register_on_every_build() {
        let m = Mapper::new();
        let name = std::any::type_name::<Vec<u8>>();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        m.object_descriptor(TypeRef::of::<Holder>()).unwrap();
                        m.resolve_type(name).is_some()
                    })
                })
                .collect();
            assert!(handles.into_iter().all(|h| h.join().unwrap()));
        });
        assert_eq!(m.cache().len(), 1);

        let config = ReaderConfig {
            type_hinting: true,
            ..Default::default()
        };
        let json = format!(r#"{{"__type__":"{}","__value__":[1]}}"#, name);
        let any: Dynamic = m.from_json_with(&json, config).unwrap();
        assert_eq!(any.downcast_ref::<Vec<u8>>(), Some(&vec![1u8]));
    }

    #[test]
    fn trailing_input_is_rejected() {
        let m = Mapper::new();
        assert_eq!(m.from_json::<i32>(" 5 // five"), Ok(5));
        assert!(matches!(
            m.from_json::<i32>("5 6"),
            Err(MapError::Syntax(_))
        ));
    }

    #[test]
    fn shared_buffer_recovers_after_errors() {
        let m = Mapper::new();
        assert!(m.to_json(&f64::NAN).is_err());
        assert_eq!(m.to_json(&vec![1i32, 2]).unwrap(), "[1,2]");
    }
}
