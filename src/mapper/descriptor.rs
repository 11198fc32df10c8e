//! Cached structural metadata of mapped types.
use super::attrs;
use crate::error::{MapError, Result, TypeMismatch};
use crate::reflect::{
    Alias, Constructor, ExtrasDecl, Getter, IgnoreWhen, MapInfo, Reflect, Setter, TypeDecl,
    TypeInfo, TypeKey, TypeRef,
};
use crate::Doc;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type FromItems = fn(Vec<Box<dyn Reflect>>) -> std::result::Result<Box<dyn Reflect>, TypeMismatch>;

/// How a type behaves when given a JSON array.
#[derive(Clone)]
pub struct SequenceDescriptor {
    key: TypeKey,
    element: TypeRef,
    fixed_len: Option<usize>,
    from_items: Option<FromItems>,
}

impl SequenceDescriptor {
    pub(crate) fn build(ty: TypeRef) -> Self {
        match ty.info() {
            TypeInfo::Seq(info) => SequenceDescriptor {
                key: ty.key(),
                element: info.element,
                fixed_len: info.fixed_len,
                from_items: Some(info.from_items),
            },
            _ => SequenceDescriptor {
                key: ty.key(),
                element: TypeRef::of::<Doc>(),
                fixed_len: None,
                from_items: None,
            },
        }
    }

    /// The described type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The element type; [`Doc`] when the type isn't a sequence.
    pub fn element(&self) -> TypeRef {
        self.element
    }

    /// Fixed size, exact length storage.
    pub fn is_array(&self) -> bool {
        self.from_items.is_some() && self.fixed_len.is_some()
    }

    /// Growable storage.
    pub fn is_list(&self) -> bool {
        self.from_items.is_some() && self.fixed_len.is_none()
    }

    /// The required length of a fixed size array.
    pub fn fixed_len(&self) -> Option<usize> {
        self.fixed_len
    }

    pub(crate) fn materialize(&self, items: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>> {
        match self.from_items {
            Some(f) => Ok(f(items)?),
            None => Err(TypeMismatch::NotSequence {
                target: self.key.name().to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Debug for SequenceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceDescriptor")
            .field("key", &self.key)
            .field("element", &self.element)
            .field("is_array", &self.is_array())
            .field("is_list", &self.is_list())
            .finish()
    }
}

/// A member as the decoder and encoder see it.
pub struct MemberDescriptor {
    name: String,
    wire_name: String,
    is_field: bool,
    declared: TypeRef,
    ignore: IgnoreWhen,
    alias: Option<Alias>,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

impl MemberDescriptor {
    /// The declared identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name used on the wire: the alias if declared, else the identifier.
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    /// Fields are storage; properties are accessor pairs.
    pub fn is_field(&self) -> bool {
        self.is_field
    }

    /// The statically declared type.
    pub fn declared(&self) -> TypeRef {
        self.declared
    }

    /// Directions the member is left out in.
    pub fn ignore(&self) -> IgnoreWhen {
        self.ignore
    }

    /// The alias directive.
    pub fn alias(&self) -> Option<&Alias> {
        self.alias.as_ref()
    }

    /// Can the member be read for encoding.
    pub fn can_read(&self) -> bool {
        self.getter.is_some()
    }

    /// Can the member be assigned when decoding.
    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("is_field", &self.is_field)
            .field("declared", &self.declared)
            .field("ignore", &self.ignore)
            .field("alias", &self.alias)
            .finish()
    }
}

pub(crate) enum Shape {
    Map(MapInfo),
    Object {
        constructor: Option<Constructor>,
        extras: Option<ExtrasDecl>,
    },
    Opaque,
}

/// How a type behaves when given a JSON object.
pub struct ObjectDescriptor {
    key: TypeKey,
    members: IndexMap<String, Arc<MemberDescriptor>>,
    originals: HashMap<String, Arc<MemberDescriptor>>,
    pub(crate) shape: Shape,
}

impl ObjectDescriptor {
    pub(crate) fn build(ty: TypeRef) -> Result<Self> {
        let shape = match ty.info() {
            TypeInfo::Map(info) => Shape::Map(info),
            TypeInfo::Object(info) => return Self::from_decl((info.declare)()),
            _ => Shape::Opaque,
        };
        Ok(ObjectDescriptor {
            key: ty.key(),
            members: IndexMap::new(),
            originals: HashMap::new(),
            shape,
        })
    }

    fn from_decl(decl: TypeDecl) -> Result<Self> {
        let ignore_set = attrs::ignore_set(&decl);
        let collision = |name: &str| MapError::Configuration {
            ty: decl.key().name().to_string(),
            name: name.to_string(),
        };

        let mut members = IndexMap::new();
        let mut soft = Vec::new();
        for m in decl.members().iter().filter(|m| attrs::is_included(m)) {
            let alias = attrs::alias(m).cloned();
            if let Some(a) = &alias {
                if a.name == m.name() {
                    return Err(collision(&a.name));
                }
            }
            let wire_name = alias
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_else(|| m.name().to_string());
            if members.contains_key(&wire_name) {
                return Err(collision(&wire_name));
            }

            let desc = Arc::new(MemberDescriptor {
                name: m.name().to_string(),
                wire_name: wire_name.clone(),
                is_field: m.is_field(),
                declared: m.declared(),
                ignore: attrs::ignore_scope(m, &ignore_set),
                alias,
                getter: m.getter.clone(),
                setter: m.setter.clone(),
            });
            if desc.alias.as_ref().map_or(false, |a| a.accept_original) {
                soft.push(desc.clone());
            }
            members.insert(wire_name, desc);
        }

        let mut originals = HashMap::new();
        for desc in soft {
            if members.contains_key(desc.name()) || originals.contains_key(desc.name()) {
                return Err(collision(desc.name()));
            }
            originals.insert(desc.name().to_string(), desc);
        }

        Ok(ObjectDescriptor {
            key: decl.key(),
            members,
            originals,
            shape: Shape::Object {
                constructor: decl.constructor.clone(),
                extras: decl.extras.clone(),
            },
        })
    }

    /// The described type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Is the type a string keyed map, or an object which stores unknown keys.
    pub fn is_map(&self) -> bool {
        match &self.shape {
            Shape::Map(_) => true,
            Shape::Object { extras, .. } => extras.is_some(),
            Shape::Opaque => false,
        }
    }

    /// The value type of map-like types.
    pub fn value_type(&self) -> Option<TypeRef> {
        match &self.shape {
            Shape::Map(info) => Some(info.value),
            Shape::Object {
                extras: Some(extras),
                ..
            } => Some(extras.value),
            _ => None,
        }
    }

    /// Is the type a structured object with declared members.
    pub fn is_object(&self) -> bool {
        matches!(self.shape, Shape::Object { .. })
    }

    /// Members keyed by wire name, in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &MemberDescriptor)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Find the member an object key refers to: by wire name, or by original name for soft
    /// aliases.
    pub fn lookup(&self, key: &str) -> Option<&Arc<MemberDescriptor>> {
        self.members.get(key).or_else(|| self.originals.get(key))
    }
}

impl fmt::Debug for ObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDescriptor")
            .field("key", &self.key)
            .field("is_map", &self.is_map())
            .field("value_type", &self.value_type())
            .field("members", &self.members)
            .finish()
    }
}

/// Members in output order, for encoding.
pub struct PropertyList {
    members: Vec<Arc<MemberDescriptor>>,
    pub(crate) extras: Option<ExtrasDecl>,
}

impl PropertyList {
    pub(crate) fn from_object(desc: &ObjectDescriptor) -> Self {
        let mut members: Vec<Arc<MemberDescriptor>> = Vec::with_capacity(desc.members.len());
        for m in desc.members.values() {
            if !members.iter().any(|x| Arc::ptr_eq(x, m)) {
                members.push(m.clone());
            }
        }
        let extras = match &desc.shape {
            Shape::Object { extras, .. } => extras.clone(),
            _ => None,
        };
        PropertyList { members, extras }
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[Arc<MemberDescriptor>] {
        &self.members
    }
}
