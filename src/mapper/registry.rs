//! Tables of exporters, importers, factories, and implicit conversions.
use super::base;
use crate::error::{Result, TypeMismatch};
use crate::reflect::{Reflect, Typed};
use crate::{Doc, Writer};
use log::trace;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// The native kind of a decoded value, which importers are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// `bool`
    Boolean,
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
    /// A whole array or object, as a [`Doc`].
    Doc,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Boolean => "bool",
            SourceKind::Int => "i32",
            SourceKind::Long => "i64",
            SourceKind::ULong => "u64",
            SourceKind::Double => "f64",
            SourceKind::String => "String",
            SourceKind::Doc => "Doc",
        };
        f.write_str(s)
    }
}

/// Types an importer can take as input.
pub trait ImportSource: Typed {
    /// The kind this type is decoded as.
    const KIND: SourceKind;
}

macro_rules! import_source {
    ($( $t:ty => $kind:ident ),*) => {
	$(
	impl ImportSource for $t {
	    const KIND: SourceKind = SourceKind::$kind;
	}
	)*
    };
}

import_source!(
    bool => Boolean,
    i32 => Int,
    i64 => Long,
    u64 => ULong,
    f64 => Double,
    String => String,
    Doc => Doc
);

pub(crate) type ExporterFn = Arc<dyn Fn(&dyn Reflect, &mut Writer) -> Result<()> + Send + Sync>;
pub(crate) type ImporterFn = Arc<dyn Fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>> + Send + Sync>;
pub(crate) type FactoryFn = Arc<dyn Fn() -> Box<dyn Reflect> + Send + Sync>;

type Key = (SourceKind, TypeId);

pub(crate) fn exporter<T, F>(f: F) -> ExporterFn
where
    T: Typed,
    F: Fn(&T, &mut Writer) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |value: &dyn Reflect, writer: &mut Writer| -> Result<()> {
        match value.as_any().downcast_ref::<T>() {
            Some(v) => f(v, writer),
            None => Err(TypeMismatch::Slot {
                found: value.reflect_key().name().to_string(),
                target: type_name::<T>().to_string(),
            }
            .into()),
        }
    })
}

pub(crate) fn importer<S, T, F>(f: F) -> ImporterFn
where
    S: ImportSource,
    T: Typed,
    F: Fn(S) -> std::result::Result<T, TypeMismatch> + Send + Sync + 'static,
{
    Arc::new(move |value: Box<dyn Reflect>| -> Result<Box<dyn Reflect>> {
        let source = S::from_reflect(value)?;
        Ok(Box::new(f(source)?))
    })
}

fn read<K: Copy + Eq + std::hash::Hash, V: Clone>(
    table: &RwLock<HashMap<K, V>>,
    key: K,
) -> Option<V> {
    table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
        .cloned()
}

fn write<K: Eq + std::hash::Hash, V>(table: &RwLock<HashMap<K, V>>, key: K, value: V) {
    table
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, value);
}

/// Custom and built-in coercions.
///
/// Custom entries overwrite earlier custom entries for the same key and are consulted before
/// the built-in tables, which never change after construction.
pub struct ConversionRegistry {
    base_exporters: HashMap<TypeId, ExporterFn>,
    base_importers: HashMap<Key, ImporterFn>,
    exporters: RwLock<HashMap<TypeId, ExporterFn>>,
    importers: RwLock<HashMap<Key, ImporterFn>>,
    factories: RwLock<HashMap<TypeId, FactoryFn>>,
    conversions: RwLock<HashMap<Key, ImporterFn>>,
}

impl ConversionRegistry {
    /// A registry with the built-in tables, formatting date-times with `date_format`.
    pub fn new(date_format: &str) -> Self {
        ConversionRegistry {
            base_exporters: base::exporters(date_format),
            base_importers: base::importers(date_format),
            exporters: RwLock::default(),
            importers: RwLock::default(),
            factories: RwLock::default(),
            conversions: RwLock::default(),
        }
    }

    /// Write values of `T` with `f` rather than the general algorithm.
    pub fn register_exporter<T, F>(&self, f: F)
    where
        T: Typed,
        F: Fn(&T, &mut Writer) -> Result<()> + Send + Sync + 'static,
    {
        trace!("registered exporter for {}", type_name::<T>());
        write(&self.exporters, TypeId::of::<T>(), exporter(f));
    }

    /// Build a `T` from a decoded `S` with `f`.
    ///
    /// With `S` = [`Doc`] the importer receives whole arrays and objects.
    pub fn register_importer<S, T, F>(&self, f: F)
    where
        S: ImportSource,
        T: Typed,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        trace!("registered importer {} -> {}", S::KIND, type_name::<T>());
        write(
            &self.importers,
            (S::KIND, TypeId::of::<T>()),
            importer(move |s: S| Ok::<T, TypeMismatch>(f(s))),
        );
    }

    /// Create instances of `T` with `f` before members are assigned.
    pub fn register_factory<T, F>(&self, f: F)
    where
        T: Typed,
        F: Fn() -> T + Send + Sync + 'static,
    {
        trace!("registered factory for {}", type_name::<T>());
        let factory: FactoryFn = Arc::new(move || Box::new(f()) as Box<dyn Reflect>);
        write(&self.factories, TypeId::of::<T>(), factory);
    }

    /// An implicit conversion from `S` to `T`, tried after enum interpretation.
    pub fn register_conversion<S, T, F>(&self, f: F)
    where
        S: ImportSource,
        T: Typed,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        trace!("registered conversion {} -> {}", S::KIND, type_name::<T>());
        write(
            &self.conversions,
            (S::KIND, TypeId::of::<T>()),
            importer(move |s: S| Ok::<T, TypeMismatch>(f(s))),
        );
    }

    /// Drop all custom exporters. Built-in exporters remain.
    pub fn unregister_exporters(&self) {
        trace!("cleared custom exporters");
        self.exporters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Drop all custom importers. Built-in importers remain.
    pub fn unregister_importers(&self) {
        trace!("cleared custom importers");
        self.importers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Custom exporter first, then built-in.
    pub(crate) fn exporter(&self, id: TypeId) -> Option<ExporterFn> {
        read(&self.exporters, id).or_else(|| self.base_exporters.get(&id).cloned())
    }

    pub(crate) fn custom_importer(&self, kind: SourceKind, id: TypeId) -> Option<ImporterFn> {
        read(&self.importers, (kind, id))
    }

    pub(crate) fn base_importer(&self, kind: SourceKind, id: TypeId) -> Option<ImporterFn> {
        self.base_importers.get(&(kind, id)).cloned()
    }

    pub(crate) fn conversion(&self, kind: SourceKind, id: TypeId) -> Option<ImporterFn> {
        read(&self.conversions, (kind, id))
    }

    pub(crate) fn factory(&self, id: TypeId) -> Option<FactoryFn> {
        read(&self.factories, id)
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("base_exporters", &self.base_exporters.len())
            .field("base_importers", &self.base_importers.len())
            .finish()
    }
}
