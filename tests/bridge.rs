#![cfg(feature = "serde")]

use jsonmap::*;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct UnitStruct;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct TupleStruct(u8, String, f32);

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct EmptyStruct();

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct EmptyStruct2 {}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum Shape {
    Empty,
    Circle(f64),
    Rect(u32, u32),
    Named { label: String, sides: Option<u8> },
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Settings {
    name: String,
    retries: u16,
    verbose: bool,
    limits: BTreeMap<String, i64>,
    shapes: Vec<Shape>,
}

fn json<T: serde::Serialize>(data: &T) -> String {
    Doc::enc(data).unwrap().to_json().unwrap()
}

#[test]
fn units_and_empties() {
    assert_eq!(json(&()), "null");
    assert_eq!(Doc::enc(&UnitStruct).unwrap().decode::<UnitStruct>(), Ok(UnitStruct));

    assert_eq!(json(&EmptyStruct()), "[]");
    assert_eq!(Doc::enc(&EmptyStruct()).unwrap().decode::<EmptyStruct>(), Ok(EmptyStruct()));

    assert_eq!(json(&EmptyStruct2 {}), "{}");
    assert_eq!(
        Doc::enc(&EmptyStruct2 {}).unwrap().decode::<EmptyStruct2>(),
        Ok(EmptyStruct2 {})
    );
}

#[test]
fn tuple_structs() {
    let t = TupleStruct(100, "Hello".into(), 0.5);
    let doc = Doc::enc(&t).unwrap();
    assert_eq!(doc.to_json().unwrap(), r#"[100,"Hello",0.5]"#);
    assert_eq!(doc.decode::<TupleStruct>(), Ok(t));
}

#[test]
fn enums_are_externally_tagged() {
    let shapes = vec![
        Shape::Empty,
        Shape::Circle(1.5),
        Shape::Rect(2, 3),
        Shape::Named {
            label: "tri".into(),
            sides: Some(3),
        },
    ];
    let doc = Doc::enc(&shapes).unwrap();
    assert_eq!(
        doc.to_json().unwrap(),
        r#"["Empty",{"Circle":1.5},{"Rect":[2,3]},{"Named":{"label":"tri","sides":3}}]"#
    );
    assert_eq!(doc.decode::<Vec<Shape>>(), Ok(shapes));

    assert!(Doc::from("Square").decode::<Shape>().is_err());
    assert!(Doc::parse(r#"{"Circle":1,"Rect":[1,1]}"#)
        .unwrap()
        .decode::<Shape>()
        .is_err());
}

#[test]
fn structs_round_trip() {
    let mut limits = BTreeMap::new();
    limits.insert("cpu".to_string(), 4);
    limits.insert("mem".to_string(), -1);
    let settings = Settings {
        name: "svc".into(),
        retries: 3,
        verbose: true,
        limits,
        shapes: vec![Shape::Circle(2.0)],
    };

    let doc = Doc::enc(&settings).unwrap();
    assert_eq!(doc["limits"]["mem"].as_i64(), Some(-1));
    assert_eq!(doc["shapes"][0]["Circle"].as_f64(), Some(2.0));
    assert_eq!(doc.decode::<Settings>(), Ok(settings));
}

#[test]
fn decode_errors() {
    let doc = Doc::parse(r#"{"name":"x","retries":70000}"#).unwrap();
    let err = doc.decode::<Settings>().unwrap_err();
    assert!(matches!(err, bridge::Error::Message(_)));

    let doc = Doc::parse(r#"{"name":"x"}"#).unwrap();
    assert_eq!(
        doc.decode::<Settings>(),
        Err(bridge::Error::Message("missing field `retries`".into()))
    );
}

#[derive(Debug, PartialEq)]
struct Wrapped(Settings);

impl Typed for Wrapped {}

#[derive(Default)]
struct Service {
    id: u32,
    settings: Option<Wrapped>,
}

impl Typed for Service {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(Service::default)
            .field("id", |s| &s.id, |s| &mut s.id)
            .field("settings", |s| &s.settings, |s| &mut s.settings)
    }
}

#[test]
fn serde_types_inside_mapped_objects() {
    let mapper = Mapper::new();
    mapper.register_importer::<Doc, Wrapped, _>(|doc| Wrapped(doc.decode().unwrap_or_default()));
    mapper.register_exporter::<Wrapped, _>(|w, out| {
        let doc = Doc::enc(&w.0).map_err(|_| TypeMismatch::NoExporter {
            target: std::any::type_name::<Settings>().to_string(),
        })?;
        Ok(doc.write_to(out)?)
    });

    let json = r#"{"id":1,"settings":{"name":"svc","retries":2,"verbose":false,"limits":{},"shapes":["Empty"]}}"#;
    let service: Service = mapper.from_json(json).unwrap();
    let settings = &service.settings.as_ref().unwrap().0;
    assert_eq!(settings.retries, 2);
    assert_eq!(settings.shapes, vec![Shape::Empty]);

    assert_eq!(mapper.to_json(&service).unwrap(), json);
}
