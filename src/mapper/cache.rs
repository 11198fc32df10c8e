//! Build-once, grow-only tables of descriptors.
use super::descriptor::{ObjectDescriptor, PropertyList, SequenceDescriptor};
use crate::error::Result;
use crate::reflect::TypeRef;
use log::debug;
use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

type Table<V> = RwLock<HashMap<TypeId, Arc<V>>>;

/// Memoized descriptors, one per concrete type.
///
/// Descriptors are built outside of any lock and then published. When two threads build the
/// same descriptor concurrently, the first to publish wins and the other's copy is dropped;
/// either is equivalent. A published descriptor is never replaced.
#[derive(Default)]
pub struct DescriptorCache {
    sequences: Table<SequenceDescriptor>,
    objects: Table<ObjectDescriptor>,
    properties: Table<PropertyList>,
}

fn cached<V>(table: &Table<V>, id: TypeId) -> Option<Arc<V>> {
    table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned()
}

/// Returns the published value and whether this call published it.
fn publish<V>(table: &Table<V>, ty: TypeRef, built: V, what: &str) -> (Arc<V>, bool) {
    let mut table = table.write().unwrap_or_else(PoisonError::into_inner);
    match table.entry(ty.id()) {
        Entry::Occupied(e) => {
            debug!("{} descriptor for {} was published concurrently", what, ty.name());
            (e.get().clone(), false)
        }
        Entry::Vacant(e) => {
            debug!("published {} descriptor for {}", what, ty.name());
            (e.insert(Arc::new(built)).clone(), true)
        }
    }
}

impl DescriptorCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The sequence descriptor of `ty`.
    pub(crate) fn sequence(&self, ty: TypeRef) -> Arc<SequenceDescriptor> {
        if let Some(d) = cached(&self.sequences, ty.id()) {
            return d;
        }
        publish(&self.sequences, ty, SequenceDescriptor::build(ty), "sequence").0
    }

    /// The object descriptor of `ty`, calling `on_build` on every fresh build before it is
    /// published.
    ///
    /// A concurrent build which loses the race still runs `on_build`, so its effects are visible
    /// to any caller holding the descriptor. Fails with a configuration error if two members
    /// share a wire name; nothing is cached in that case.
    pub(crate) fn object_with<F>(&self, ty: TypeRef, on_build: F) -> Result<Arc<ObjectDescriptor>>
    where
        F: FnOnce(&ObjectDescriptor),
    {
        if let Some(d) = cached(&self.objects, ty.id()) {
            return Ok(d);
        }
        let built = ObjectDescriptor::build(ty)?;
        on_build(&built);
        Ok(publish(&self.objects, ty, built, "object").0)
    }

    /// The output ordered member list of `ty`, derived from its object descriptor.
    pub(crate) fn properties(&self, ty: TypeRef, object: &ObjectDescriptor) -> Arc<PropertyList> {
        if let Some(p) = cached(&self.properties, ty.id()) {
            return p;
        }
        publish(&self.properties, ty, PropertyList::from_object(object), "property").0
    }

    /// Number of object descriptors published.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Is the cache empty of object descriptors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use crate::reflect::{ObjectDecl, Typed};
    use std::thread;

    #[derive(Default)]
    struct Pair {
        a: i32,
        b: i32,
    }

    impl Typed for Pair {
        fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
            decl.field("a", |p| &p.a, |p| &mut p.a)
                .field("b", |p| &p.b, |p| &mut p.b)
        }
    }

    #[derive(Default)]
    struct Clash {
        a: i32,
        b: i32,
    }

    impl Typed for Clash {
        fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
            decl.field("a", |p| &p.a, |p| &mut p.a)
                .field("b", |p| &p.b, |p| &mut p.b)
                .alias("a", false)
        }
    }

    #[test]
    fn built_once() {
        let cache = DescriptorCache::new();
        let ty = TypeRef::of::<Pair>();
        let mut built = 0;
        let a = cache.object_with(ty, |_| built += 1).unwrap();
        let b = cache.object_with(ty, |_| built += 1).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(built, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_first_use() {
        let cache = Arc::new(DescriptorCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.object_with(TypeRef::of::<Pair>(), |_| ()).unwrap())
            })
            .collect();
        let descs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(descs.iter().all(|d| Arc::ptr_eq(d, &descs[0])));
    }

    #[test]
    fn collisions_are_not_cached() {
        let cache = DescriptorCache::new();
        let mut built = false;
        let err = cache
            .object_with(TypeRef::of::<Clash>(), |_| built = true)
            .unwrap_err();
        assert!(matches!(err, MapError::Configuration { name, .. } if name == "a"));
        assert!(!built);
        assert!(cache.is_empty());
    }
}
