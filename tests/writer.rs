use jsonmap::*;
use std::collections::BTreeMap;

#[derive(Default)]
struct Folder {
    name: String,
    files: Vec<String>,
    meta: BTreeMap<String, Doc>,
    parent: Option<Box<Folder>>,
}

impl Typed for Folder {
    fn declare(decl: ObjectDecl<Self>) -> ObjectDecl<Self> {
        decl.constructor(Folder::default)
            .field("name", |f| &f.name, |f| &mut f.name)
            .field("files", |f| &f.files, |f| &mut f.files)
            .field("meta", |f| &f.meta, |f| &mut f.meta)
            .read_only("depth", |f| {
                let mut depth = 0u32;
                let mut at = f.parent.as_deref();
                while let Some(p) = at {
                    depth += 1;
                    at = p.parent.as_deref();
                }
                depth
            })
    }
}

#[test]
fn mapped_values_embed_in_open_writers() {
    let mapper = Mapper::new();
    let mut w = Writer::new();
    w.write_object_start().unwrap();
    w.write_property_name("items").unwrap();
    w.write_array_start().unwrap();
    mapper.write(&vec![1u16, 2], &mut w).unwrap();
    mapper.write(&Some("x".to_string()), &mut w).unwrap();
    mapper.write(&Option::<bool>::None, &mut w).unwrap();
    w.write_array_end().unwrap();
    w.write_object_end().unwrap();
    assert_eq!(w.as_str(), r#"{"items":[[1,2],"x",null]}"#);
}

#[test]
fn writes_into_a_misplaced_slot_fail() {
    let mapper = Mapper::new();
    let mut w = Writer::new();
    w.write_object_start().unwrap();
    assert_eq!(
        mapper.write(&1i32, &mut w),
        Err(MapError::Write(fmt::WriteError::ExpectedName))
    );
}

#[test]
fn pretty_printed_objects() {
    let mapper = Mapper::new();
    let mut meta = BTreeMap::new();
    meta.insert("owner".to_string(), Doc::from("root"));
    meta.insert("tags".to_string(), Doc::Seq(Vec::new()));
    let folder = Folder {
        name: "src".into(),
        files: vec!["lib.rs".into(), "main.rs".into()],
        meta,
        parent: Some(Box::new(Folder::default())),
    };

    let config = WriterConfig {
        pretty_print: true,
        indent: 2,
        ..Default::default()
    };
    let expected = r#"{
  "name": "src",
  "files": [
    "lib.rs",
    "main.rs"
  ],
  "meta": {
    "owner": "root",
    "tags": []
  },
  "depth": 1
}"#;
    assert_eq!(mapper.to_json_with(&folder, config).unwrap(), expected);

    let empty = WriterConfig {
        pretty_print: true,
        ..Default::default()
    };
    assert_eq!(
        mapper.to_json_with(&Folder::default(), empty).unwrap(),
        "{\n    \"name\": \"\",\n    \"files\": [],\n    \"meta\": {},\n    \"depth\": 0\n}"
    );
}

#[test]
fn text_is_escaped() {
    let mapper = Mapper::new();
    let folder = Folder {
        name: "tab\there \"quoted\" \\ \u{7}".into(),
        ..Default::default()
    };
    let json = mapper.to_json(&folder).unwrap();
    assert!(json.starts_with(r#"{"name":"tab\there \"quoted\" \\ \u0007","#));

    let back: Folder = mapper.from_json(&json).unwrap();
    assert_eq!(back.name, folder.name);
}

#[test]
fn floats_read_back_as_doubles() {
    let mapper = Mapper::new();
    assert_eq!(mapper.to_json(&3.0f64).unwrap(), "3.0");
    assert_eq!(mapper.to_json(&-0.5f32).unwrap(), "-0.5");

    let doc = mapper.to_doc(&mapper.to_json(&vec![2.0f64, 2.5]).unwrap()).unwrap();
    assert!(doc.as_seq().unwrap().iter().all(|d| d.as_num().map_or(false, |n| n.is_float())));

    assert_eq!(
        mapper.to_json(&vec![1.0f64, f64::NEG_INFINITY]),
        Err(MapError::Write(fmt::WriteError::NonFinite(f64::NEG_INFINITY)))
    );
}
