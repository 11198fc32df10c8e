use jsonmap::*;

fn strict() -> ReaderConfig {
    ReaderConfig {
        skip_non_members: false,
        ..Default::default()
    }
}

#[derive(Debug, Default, PartialEq)]
struct Hard {
    value: i32,
    other: i32,
}

impl Typed for Hard {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(Hard::default)
            .field("value", |h| &h.value, |h| &mut h.value)
            .alias("v", false)
            .field("other", |h| &h.other, |h| &mut h.other)
    }
}

#[derive(Debug, Default, PartialEq)]
struct Soft {
    value: i32,
}

impl Typed for Soft {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(Soft::default)
            .field("value", |s| &s.value, |s| &mut s.value)
            .alias("v", true)
    }
}

#[test]
fn aliases_are_written() {
    let mapper = Mapper::new();
    assert_eq!(
        mapper.to_json(&Hard { value: 1, other: 2 }).unwrap(),
        r#"{"v":1,"other":2}"#
    );
    assert_eq!(mapper.to_json(&Soft { value: 3 }).unwrap(), r#"{"v":3}"#);
}

#[test]
fn hard_alias_rejects_the_original_name() {
    let mapper = Mapper::new();
    assert_eq!(
        mapper.from_json_with::<Hard>(r#"{"v":5,"other":6}"#, strict()),
        Ok(Hard { value: 5, other: 6 })
    );

    match mapper.from_json_with::<Hard>(r#"{"value":5}"#, strict()) {
        Err(MapError::UnknownMember { key, .. }) => assert_eq!(key, "value"),
        x => panic!("expected an unknown member, got {:?}", x),
    }

    // tolerated, but still not assigned
    assert_eq!(
        mapper.from_json::<Hard>(r#"{"value":5}"#),
        Ok(Hard::default())
    );
}

#[test]
fn soft_alias_accepts_both_names() {
    let mapper = Mapper::new();
    assert_eq!(
        mapper.from_json_with::<Soft>(r#"{"v":7}"#, strict()),
        Ok(Soft { value: 7 })
    );
    assert_eq!(
        mapper.from_json_with::<Soft>(r#"{"value":8}"#, strict()),
        Ok(Soft { value: 8 })
    );
    // the later key wins
    assert_eq!(
        mapper.from_json::<Soft>(r#"{"v":1,"value":2}"#),
        Ok(Soft { value: 2 })
    );

    let desc = mapper.object_descriptor(TypeRef::of::<Soft>()).unwrap();
    assert_eq!(desc.members().count(), 1);
    let by_alias = desc.lookup("v").unwrap();
    let by_name = desc.lookup("value").unwrap();
    assert!(std::sync::Arc::ptr_eq(by_alias, by_name));
    assert_eq!(by_name.wire_name(), "v");
    assert_eq!(
        by_name.alias(),
        Some(&Alias {
            name: "v".into(),
            accept_original: true
        })
    );
}

// ###### COLLISIONS ##########################################################

#[derive(Default)]
struct SameAliasTwice {
    a: i32,
    b: i32,
}

impl Typed for SameAliasTwice {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(SameAliasTwice::default)
            .field("a", |s| &s.a, |s| &mut s.a)
            .alias("x", false)
            .field("b", |s| &s.b, |s| &mut s.b)
            .alias("x", false)
    }
}

#[derive(Default)]
struct AliasShadowsMember {
    a: i32,
    b: i32,
}

impl Typed for AliasShadowsMember {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(AliasShadowsMember::default)
            .field("a", |s| &s.a, |s| &mut s.a)
            .field("b", |s| &s.b, |s| &mut s.b)
            .alias("a", false)
    }
}

#[derive(Default)]
struct AliasIsOwnName {
    a: i32,
}

impl Typed for AliasIsOwnName {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(AliasIsOwnName::default)
            .field("a", |s| &s.a, |s| &mut s.a)
            .alias("a", true)
    }
}

#[derive(Default)]
struct SoftOriginalShadowsAlias {
    a: i32,
    c: i32,
}

impl Typed for SoftOriginalShadowsAlias {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(SoftOriginalShadowsAlias::default)
            .field("a", |s| &s.a, |s| &mut s.a)
            .alias("b", true)
            .field("c", |s| &s.c, |s| &mut s.c)
            .alias("a", false)
    }
}

#[derive(Default)]
struct Base {
    id: i32,
}

impl Typed for Base {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(Base::default)
            .field("id", |b| &b.id, |b| &mut b.id)
    }
}

#[derive(Default)]
struct InheritedCollision {
    base: Base,
    key: i32,
}

impl Typed for InheritedCollision {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(InheritedCollision::default)
            .extends(|d| &d.base, |d| &mut d.base)
            .field("key", |d| &d.key, |d| &mut d.key)
            .alias("id", false)
    }
}

#[derive(Default)]
struct IgnoredStillCollides {
    a: i32,
    b: i32,
}

impl Typed for IgnoredStillCollides {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(IgnoredStillCollides::default)
            .field("a", |s| &s.a, |s| &mut s.a)
            .ignore()
            .field("b", |s| &s.b, |s| &mut s.b)
            .alias("a", false)
    }
}

fn assert_collision<T: Typed>(mapper: &Mapper, value: &T, name: &str) {
    for _ in 0..2 {
        match mapper.to_json(value) {
            Err(MapError::Configuration { ty, name: n }) => {
                assert_eq!(ty, std::any::type_name::<T>());
                assert_eq!(n, name);
            }
            x => panic!("expected a configuration error, got {:?}", x),
        }
        assert!(matches!(
            mapper.from_json::<T>("{}"),
            Err(MapError::Configuration { .. })
        ));
    }
}

#[test]
fn colliding_wire_names_fail_on_first_use() {
    let mapper = Mapper::new();
    assert_collision(&mapper, &SameAliasTwice::default(), "x");
    assert_collision(&mapper, &AliasShadowsMember::default(), "a");
    assert_collision(&mapper, &AliasIsOwnName::default(), "a");
    assert_collision(&mapper, &SoftOriginalShadowsAlias::default(), "a");
    assert_collision(&mapper, &InheritedCollision::default(), "id");
    assert_collision(&mapper, &IgnoredStillCollides::default(), "a");
    assert!(mapper.cache().is_empty());

    // a broken type doesn't affect others
    assert_eq!(mapper.to_json(&Soft { value: 1 }).unwrap(), r#"{"v":1}"#);
    assert_eq!(mapper.cache().len(), 1);
}
