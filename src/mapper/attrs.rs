//! Resolution of declared directives into the values descriptors carry.
use crate::reflect::{Alias, IgnoreWhen, MemberDecl, TypeDecl};
use std::collections::BTreeSet;

/// Union of the type-level ignore names of a declaration and its ancestors.
pub fn ignore_set(decl: &TypeDecl) -> BTreeSet<&str> {
    decl.ignore_members().iter().map(String::as_str).collect()
}

/// The directions a member is left out in.
///
/// An explicit directive on the member wins; otherwise a member named in the ignore set is
/// left out both ways.
pub fn ignore_scope(member: &MemberDecl, ignore_set: &BTreeSet<&str>) -> IgnoreWhen {
    match member.ignore() {
        Some(when) => when,
        None if ignore_set.contains(member.name()) => IgnoreWhen::ALWAYS,
        None => IgnoreWhen::empty(),
    }
}

/// The member's alias directive.
pub fn alias(member: &MemberDecl) -> Option<&Alias> {
    member.alias()
}

/// Does the member take part in mapping at all.
pub fn is_included(member: &MemberDecl) -> bool {
    member.is_visible() || member.include
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{ObjectDecl, Typed};

    #[derive(Default)]
    struct Root {
        a: i32,
        b: i32,
    }

    impl Typed for Root {
        fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
            decl.ignore_members(["a"])
                .field("a", |r| &r.a, |r| &mut r.a)
                .field("b", |r| &r.b, |r| &mut r.b)
                .hidden()
        }
    }

    #[derive(Default)]
    struct Leaf {
        root: Root,
        c: i32,
        d: i32,
    }

    impl Typed for Leaf {
        fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
            decl.extends(|l| &l.root, |l| &mut l.root)
                .ignore_members(["c"])
                .field("c", |l| &l.c, |l| &mut l.c)
                .ignore_when(IgnoreWhen::SERIALIZE)
                .field("d", |l| &l.d, |l| &mut l.d)
                .hidden()
                .include()
                .alias("dee", true)
        }
    }

    fn decl<T: Typed>() -> TypeDecl {
        match T::type_info() {
            crate::reflect::TypeInfo::Object(info) => (info.declare)(),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn ignore_sets_are_inherited() {
        let d = decl::<Leaf>();
        let set = ignore_set(&d);
        assert!(set.contains("a"));
        assert!(set.contains("c"));

        let scopes: Vec<_> = d.members().iter().map(|m| ignore_scope(m, &set)).collect();
        // explicit directive on `c` overrides the ignore set
        assert_eq!(
            scopes,
            vec![
                IgnoreWhen::ALWAYS,
                IgnoreWhen::empty(),
                IgnoreWhen::SERIALIZE,
                IgnoreWhen::empty()
            ]
        );
    }

    #[test]
    fn inclusion_and_alias() {
        let d = decl::<Leaf>();
        let included: Vec<_> = d.members().iter().map(is_included).collect();
        assert_eq!(included, vec![true, false, true, true]);
        assert_eq!(
            alias(&d.members()[3]),
            Some(&Alias {
                name: "dee".into(),
                accept_original: true
            })
        );
    }
}
