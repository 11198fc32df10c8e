use super::{Reflect, StringMap, TypeKey, TypeRef, Typed};
use crate::error::TypeMismatch;
use bitflags::bitflags;
use std::any::{type_name, Any};
use std::marker::PhantomData;
use std::sync::Arc;

bitflags! {
    /// Directions in which a member is left out.
    pub struct IgnoreWhen: u8 {
	/// Not written when encoding.
	const SERIALIZE = 0b01;
	/// Skipped when decoding.
	const DESERIALIZE = 0b10;
	/// Both directions.
	const ALWAYS = Self::SERIALIZE.bits | Self::DESERIALIZE.bits;
    }
}

/// An alternative wire name for a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// The wire name.
    pub name: String,
    /// Also accept the member's own name when decoding.
    pub accept_original: bool,
}

/// A member value handed out by a getter.
pub enum Slot<'a> {
    /// A field, borrowed in place.
    Borrowed(&'a dyn Reflect),
    /// A computed property value.
    Owned(Box<dyn Reflect>),
}

impl<'a> Slot<'a> {
    /// The value.
    pub fn get(&self) -> &dyn Reflect {
        match self {
            Slot::Borrowed(r) => *r,
            Slot::Owned(b) => b.as_ref(),
        }
    }
}

pub(crate) type Getter = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<Slot<'a>> + Send + Sync>;
pub(crate) type Setter =
    Arc<dyn Fn(&mut dyn Any, Box<dyn Reflect>) -> Result<(), TypeMismatch> + Send + Sync>;
pub(crate) type Constructor = Arc<dyn Fn() -> Box<dyn Reflect> + Send + Sync>;
type Inserter =
    Arc<dyn Fn(&mut dyn Any, String, Box<dyn Reflect>) -> Result<(), TypeMismatch> + Send + Sync>;

// Forces the higher ranked signature onto getter closures.
fn getter<F>(f: F) -> Getter
where
    F: for<'a> Fn(&'a dyn Any) -> Option<Slot<'a>> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn setter<F>(f: F) -> Setter
where
    F: Fn(&mut dyn Any, Box<dyn Reflect>) -> Result<(), TypeMismatch> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn host_mut<T: Any>(obj: &mut dyn Any) -> Result<&mut T, TypeMismatch> {
    obj.downcast_mut::<T>().ok_or_else(|| TypeMismatch::Slot {
        found: String::from("an unrelated host"),
        target: type_name::<T>().to_string(),
    })
}

/// A declared member of a structured object, before directives are resolved.
#[derive(Clone)]
pub struct MemberDecl {
    pub(crate) name: String,
    pub(crate) is_field: bool,
    pub(crate) declared: TypeRef,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
    pub(crate) visible: bool,
    pub(crate) include: bool,
    pub(crate) ignore: Option<IgnoreWhen>,
    pub(crate) alias: Option<Alias>,
}

impl MemberDecl {
    /// The member's own name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields are storage; properties are accessor pairs.
    pub fn is_field(&self) -> bool {
        self.is_field
    }

    /// The declared type.
    pub fn declared(&self) -> TypeRef {
        self.declared
    }

    /// Publicly visible members are candidates without an include directive.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The explicit ignore directive, if any.
    pub fn ignore(&self) -> Option<IgnoreWhen> {
        self.ignore
    }

    /// The alias directive, if any.
    pub fn alias(&self) -> Option<&Alias> {
        self.alias.as_ref()
    }

    /// Rebase accessors declared on `B` onto `T`, which embeds a `B`.
    fn lift<T: Typed, B: Typed>(
        self,
        up: fn(&T) -> &B,
        up_mut: fn(&mut T) -> &mut B,
    ) -> MemberDecl {
        let get = self.getter.map(|g| {
            getter(move |obj: &dyn Any| {
                obj.downcast_ref::<T>()
                    .and_then(|t| g(up(t) as &dyn Any))
            })
        });
        let set = self.setter.map(|s| {
            setter(move |obj: &mut dyn Any, v: Box<dyn Reflect>| {
                let host = host_mut::<T>(obj)?;
                s(up_mut(host) as &mut dyn Any, v)
            })
        });

        MemberDecl {
            getter: get,
            setter: set,
            ..self
        }
    }
}

#[derive(Clone)]
pub(crate) struct ExtrasDecl {
    pub(crate) value: TypeRef,
    pub(crate) get: Getter,
    pub(crate) insert: Inserter,
}

/// The declaration of a structured object: its members in order, directives, and ancestry.
#[derive(Clone)]
pub struct TypeDecl {
    pub(crate) key: TypeKey,
    pub(crate) members: Vec<MemberDecl>,
    pub(crate) ignore_members: Vec<String>,
    pub(crate) ancestors: Vec<TypeKey>,
    pub(crate) constructor: Option<Constructor>,
    pub(crate) extras: Option<ExtrasDecl>,
}

impl TypeDecl {
    /// The declared type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Members in declaration order, embedded ancestors' members included.
    pub fn members(&self) -> &[MemberDecl] {
        &self.members
    }

    /// Embedded ancestors, nearest first.
    pub fn ancestors(&self) -> &[TypeKey] {
        &self.ancestors
    }

    /// Member names given to `ignore_members` on this type and its ancestors.
    pub fn ignore_members(&self) -> &[String] {
        &self.ignore_members
    }
}

/// Builder for a structured object's declaration, passed to [`Typed::declare`].
///
/// Directive methods ([`alias`](ObjectDecl::alias), [`ignore`](ObjectDecl::ignore), ...) apply
/// to the most recently declared member.
pub struct ObjectDecl<T> {
    decl: TypeDecl,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Typed> ObjectDecl<T> {
    pub(crate) fn new() -> Self {
        ObjectDecl {
            decl: TypeDecl {
                key: TypeKey::of::<T>(),
                members: Vec::new(),
                ignore_members: Vec::new(),
                ancestors: Vec::new(),
                constructor: None,
                extras: None,
            },
            _marker: PhantomData,
        }
    }

    pub(crate) fn into_decl(self) -> TypeDecl {
        self.decl
    }

    fn push(mut self, member: MemberDecl) -> Self {
        self.decl.members.push(member);
        self
    }

    fn last(mut self, f: impl FnOnce(&mut MemberDecl)) -> Self {
        if let Some(m) = self.decl.members.last_mut() {
            f(m);
        }
        self
    }

    /// Declare a field, read and written in place.
    pub fn field<F: Typed>(
        self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        let g = getter(move |obj: &dyn Any| {
            obj.downcast_ref::<T>()
                .map(|t| Slot::Borrowed(get(t) as &dyn Reflect))
        });
        let s = setter(move |obj: &mut dyn Any, v: Box<dyn Reflect>| {
            let host = host_mut::<T>(obj)?;
            *get_mut(host) = F::from_reflect(v)?;
            Ok(())
        });
        self.push(MemberDecl {
            name: name.to_string(),
            is_field: true,
            declared: TypeRef::of::<F>(),
            getter: Some(g),
            setter: Some(s),
            visible: true,
            include: false,
            ignore: None,
            alias: None,
        })
    }

    /// Declare a property with a getter and a setter.
    pub fn property<F: Typed>(self, name: &str, get: fn(&T) -> F, set: fn(&mut T, F)) -> Self {
        self.accessors(name, Some(get), Some(set))
    }

    /// Declare a property with only a getter. It is written but never read.
    pub fn read_only<F: Typed>(self, name: &str, get: fn(&T) -> F) -> Self {
        self.accessors(name, Some(get), None)
    }

    /// Declare a property with only a setter. It is read but never written.
    pub fn write_only<F: Typed>(self, name: &str, set: fn(&mut T, F)) -> Self {
        self.accessors::<F>(name, None, Some(set))
    }

    fn accessors<F: Typed>(
        self,
        name: &str,
        get: Option<fn(&T) -> F>,
        set: Option<fn(&mut T, F)>,
    ) -> Self {
        let g = get.map(|get| {
            getter(move |obj: &dyn Any| {
                obj.downcast_ref::<T>()
                    .map(|t| Slot::Owned(Box::new(get(t)) as Box<dyn Reflect>))
            })
        });
        let s = set.map(|set| {
            setter(move |obj: &mut dyn Any, v: Box<dyn Reflect>| {
                let host = host_mut::<T>(obj)?;
                set(host, F::from_reflect(v)?);
                Ok(())
            })
        });
        self.push(MemberDecl {
            name: name.to_string(),
            is_field: false,
            declared: TypeRef::of::<F>(),
            getter: g,
            setter: s,
            visible: true,
            include: false,
            ignore: None,
            alias: None,
        })
    }

    /// Mark the last member as not publicly visible. It is left out unless also given
    /// [`include`](ObjectDecl::include).
    pub fn hidden(self) -> Self {
        self.last(|m| m.visible = false)
    }

    /// Take part in mapping regardless of visibility.
    pub fn include(self) -> Self {
        self.last(|m| m.include = true)
    }

    /// Leave the last member out in both directions.
    pub fn ignore(self) -> Self {
        self.ignore_when(IgnoreWhen::ALWAYS)
    }

    /// Leave the last member out in the given directions.
    ///
    /// This overrides any [`ignore_members`](ObjectDecl::ignore_members) entry for the member.
    pub fn ignore_when(self, when: IgnoreWhen) -> Self {
        self.last(|m| m.ignore = Some(when))
    }

    /// Use `name` on the wire for the last member. With `accept_original` the member's own
    /// name is also accepted when decoding.
    pub fn alias(self, name: &str, accept_original: bool) -> Self {
        self.last(|m| {
            m.alias = Some(Alias {
                name: name.to_string(),
                accept_original,
            })
        })
    }

    /// Ignore members by name, in both directions. Inherited by types which embed this one.
    pub fn ignore_members<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decl
            .ignore_members
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Embed `B`'s declaration: its members, ignore names, and ancestry.
    pub fn extends<B: Typed>(mut self, up: fn(&T) -> &B, up_mut: fn(&mut T) -> &mut B) -> Self {
        let base = B::declare(ObjectDecl::<B>::new()).into_decl();
        self.decl.ancestors.push(base.key);
        self.decl.ancestors.extend(base.ancestors);
        self.decl.ignore_members.extend(base.ignore_members);
        self.decl
            .members
            .extend(base.members.into_iter().map(|m| m.lift(up, up_mut)));
        self
    }

    /// How to create an instance before its members are assigned.
    pub fn constructor(mut self, ctor: fn() -> T) -> Self {
        self.decl.constructor = Some(Arc::new(move || Box::new(ctor()) as Box<dyn Reflect>));
        self
    }

    /// Make the object map-like: keys which match no member are stored in, and written from,
    /// the given map.
    pub fn extras<M: StringMap>(mut self, get: fn(&T) -> &M, get_mut: fn(&mut T) -> &mut M) -> Self {
        let g = getter(move |obj: &dyn Any| {
            obj.downcast_ref::<T>()
                .map(|t| Slot::Borrowed(get(t) as &dyn Reflect))
        });
        let insert: Inserter = Arc::new(
            move |obj: &mut dyn Any, key: String, v: Box<dyn Reflect>| {
                let host = host_mut::<T>(obj)?;
                get_mut(host).insert_entry(key, M::Value::from_reflect(v)?);
                Ok(())
            },
        );
        self.decl.extras = Some(ExtrasDecl {
            value: TypeRef::of::<M::Value>(),
            get: g,
            insert,
        });
        self
    }
}
