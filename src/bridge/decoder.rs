use super::*;
use indexmap::IndexMap;
use serde::de::{
    value::{MapDeserializer, SeqDeserializer},
    Deserialize, Deserializer, IntoDeserializer, MapAccess, SeqAccess, Unexpected, Visitor,
};

type Res<T> = Result<T, Error>;

/// Deserializer over a [`Doc`], consuming it.
///
/// Since the document is owned, only types which own their data can be decoded; [`Doc::decode`]
/// is a shorthand.
///
/// ```rust
/// # use jsonmap::*;
/// use jsonmap::bridge::Decoder;
/// use serde::Deserialize;
///
/// let doc = Doc::parse(r#"{"a":[1,2],"b":[3]}"#).unwrap();
/// let map = std::collections::BTreeMap::<String, Vec<u8>>::deserialize(Decoder(doc)).unwrap();
/// assert_eq!(map["a"], vec![1, 2]);
/// ```
pub struct Decoder(pub Doc);

fn visit_seq<'de, V: Visitor<'de>>(items: Vec<Doc>, visitor: V) -> Res<V::Value> {
    let mut seq = SeqDeserializer::new(items.into_iter());
    let value = visitor.visit_seq(&mut seq)?;
    seq.end()?;
    Ok(value)
}

fn visit_map<'de, V: Visitor<'de>>(map: IndexMap<String, Doc>, visitor: V) -> Res<V::Value> {
    let mut map = MapDeserializer::new(map.into_iter());
    let value = visitor.visit_map(&mut map)?;
    map.end()?;
    Ok(value)
}

impl<'de> Deserializer<'de> for Decoder {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Res<V::Value> {
        match self.0 {
            Doc::Null => visitor.visit_unit(),
            Doc::Bool(v) => visitor.visit_bool(v),
            Doc::Num(Number::Int(v)) => visitor.visit_i64(v),
            Doc::Num(Number::Uint(v)) => visitor.visit_u64(v),
            Doc::Num(Number::Float(v)) => visitor.visit_f64(v),
            Doc::Str(v) => visitor.visit_string(v),
            Doc::Seq(v) => visit_seq(v, visitor),
            Doc::Obj(v) => visit_map(v, visitor),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Res<V::Value> {
        match self.0 {
            Doc::Null => visitor.visit_none(),
            doc => visitor.visit_some(Decoder(doc)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Res<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Res<V::Value> {
        match self.0 {
            Doc::Str(variant) => visitor.visit_enum(variant.into_deserializer()),
            Doc::Obj(map) if map.len() == 1 => match map.into_iter().next() {
                Some((variant, value)) => visitor.visit_enum(Tagged { variant, value }),
                None => Err(Error::Message(String::from("enum object is empty"))),
            },
            x => Err(de::Error::invalid_type(unexpected(&x), &"an externally tagged enum")),
        }
    }
}

impl<'de> IntoDeserializer<'de, Error> for Doc {
    type Deserializer = Decoder;
    fn into_deserializer(self) -> Decoder {
        Decoder(self)
    }
}

/// A variant name and its content.
struct Tagged {
    variant: String,
    value: Doc,
}

impl<'de> de::EnumAccess<'de> for Tagged {
    type Error = Error;
    type Variant = Decoder;

    fn variant_seed<V>(self, seed: V) -> Res<(V::Value, Decoder)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let value = self.value;
        seed.deserialize(self.variant.into_deserializer())
            .map(|v| (v, Decoder(value)))
    }
}

impl<'de> de::VariantAccess<'de> for Decoder {
    type Error = Error;

    fn unit_variant(self) -> Res<()> {
        match self.0 {
            Doc::Null => Ok(()),
            x => Err(de::Error::invalid_type(unexpected(&x), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Res<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Res<V::Value> {
        match self.0 {
            Doc::Seq(v) if v.len() == len => visit_seq(v, visitor),
            Doc::Seq(v) => {
                let msg = format!("a sequence with {} element(s)", len);
                Err(de::Error::invalid_length(v.len(), &msg.as_str()))
            }
            x => Err(de::Error::invalid_type(unexpected(&x), &"tuple variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Res<V::Value> {
        match self.0 {
            Doc::Obj(map) => visit_map(map, visitor),
            x => Err(de::Error::invalid_type(unexpected(&x), &"struct variant")),
        }
    }
}

fn unexpected(doc: &Doc) -> Unexpected<'_> {
    match doc {
        Doc::Null => Unexpected::Unit,
        Doc::Bool(v) => Unexpected::Bool(*v),
        Doc::Num(Number::Int(n)) => Unexpected::Signed(*n),
        Doc::Num(Number::Uint(n)) => Unexpected::Unsigned(*n),
        Doc::Num(Number::Float(n)) => Unexpected::Float(*n),
        Doc::Str(v) => Unexpected::Str(v),
        Doc::Seq(_) => Unexpected::Seq,
        Doc::Obj(_) => Unexpected::Map,
    }
}

////// DOC ///////////////////////////////////////////////////////////////////////

struct DocVisitor;

impl<'de> Visitor<'de> for DocVisitor {
    type Value = Doc;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Doc, E> {
        Ok(Doc::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Doc, E> {
        Ok(Doc::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Doc, D::Error> {
        Doc::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Doc, E> {
        Ok(Doc::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Doc, E> {
        Ok(Doc::Num(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Doc, E> {
        Ok(Doc::Num(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Doc, E> {
        Ok(Doc::Num(v.into()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Doc, E> {
        Ok(Doc::Str(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Doc, E> {
        Ok(Doc::Str(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Doc, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Doc::Seq(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Doc, A::Error> {
        let mut obj = IndexMap::with_capacity(map.size_hint().unwrap_or_default());
        while let Some((k, v)) = map.next_entry::<String, Doc>()? {
            obj.insert(k, v);
        }
        Ok(Doc::Obj(obj))
    }
}

impl<'de> Deserialize<'de> for Doc {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(DocVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoImplementVisitor;
    impl<'de> Visitor<'de> for NoImplementVisitor {
        type Value = ();

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            write!(formatter, "")
        }
    }

    #[test]
    fn options() {
        assert_eq!(Doc::Null.decode::<Option<u8>>(), Ok(None));
        assert_eq!(Doc::Num(3.into()).decode::<Option<u8>>(), Ok(Some(3)));
    }

    #[test]
    fn chars() {
        assert_eq!(Doc::Str("x".into()).decode::<char>(), Ok('x'));
        assert!(Doc::Str("xy".into()).decode::<char>().is_err());
    }

    #[test]
    fn variant_shapes() {
        use de::VariantAccess;

        assert_eq!(Decoder(Doc::Null).unit_variant(), Ok(()));
        assert_eq!(
            Decoder(Doc::Num(3.into()))
                .unit_variant()
                .map_err(|e| e.to_string()),
            Err("invalid type: integer `3`, expected unit variant".into())
        );

        let pair = Doc::Seq(vec![Doc::Null, Doc::Null]);
        assert_eq!(
            Decoder(pair)
                .tuple_variant(1, NoImplementVisitor)
                .map_err(|e| e.to_string()),
            Err("invalid length 2, expected a sequence with 1 element(s)".into())
        );

        assert_eq!(
            Decoder(Doc::Str("s".into()))
                .struct_variant(&[], NoImplementVisitor)
                .map_err(|e| e.to_string()),
            Err("invalid type: string \"s\", expected struct variant".into())
        );
    }

    #[test]
    fn extra_elements_are_rejected() {
        let doc = Doc::parse("[1,2,3]").unwrap();
        assert!(doc.decode::<(u8, u8)>().is_err());
    }
}
