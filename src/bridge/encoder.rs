use super::*;
use indexmap::IndexMap;

type Res = Result<Doc, Error>;

/// Serializer producing a [`Doc`].
///
/// There is no state in the `Encoder`; it is passed by value to [`Serialize::serialize`].
/// [`Doc::enc`] is a shorthand.
///
/// ```rust
/// # use jsonmap::*;
/// use jsonmap::bridge::Encoder;
/// use serde::Serialize;
///
/// let doc = ("Hello!", Some(3.5), None::<u8>).serialize(Encoder).unwrap();
/// assert_eq!(doc.to_json().unwrap(), r#"["Hello!",3.5,null]"#);
/// ```
pub struct Encoder;

/// Externally tag `doc` with `variant`.
fn tagged(variant: &'static str, doc: Doc) -> Doc {
    let mut map = IndexMap::with_capacity(1);
    map.insert(variant.to_string(), doc);
    Doc::Obj(map)
}

impl ser::Serializer for Encoder {
    type Ok = Doc;
    type Error = Error;
    type SerializeSeq = SeqLike;
    type SerializeTuple = SeqLike;
    type SerializeTupleStruct = SeqLike;
    type SerializeTupleVariant = SeqLike;
    type SerializeMap = MapLike;
    type SerializeStruct = CntrLike;
    type SerializeStructVariant = CntrLike;

    fn serialize_bool(self, v: bool) -> Res {
        Ok(Doc::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_i128(self, v: i128) -> Res {
        i64::try_from(v)
            .map(|n| Doc::Num(n.into()))
            .or_else(|_| u64::try_from(v).map(|n| Doc::Num(n.into())))
            .map_err(|_| Error::Message(format!("{} doesn't fit a 64 bit integer", v)))
    }

    fn serialize_u8(self, v: u8) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Res {
        u64::try_from(v)
            .map(|n| Doc::Num(n.into()))
            .map_err(|_| Error::Message(format!("{} doesn't fit a 64 bit integer", v)))
    }

    fn serialize_f32(self, v: f32) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Res {
        Ok(Doc::Num(v.into()))
    }

    fn serialize_char(self, v: char) -> Res {
        Ok(Doc::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Res {
        Ok(Doc::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Res {
        Ok(Doc::Seq(v.iter().map(|b| Doc::Num((*b).into())).collect()))
    }

    fn serialize_none(self) -> Res {
        Ok(Doc::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, v: &T) -> Res {
        v.serialize(self)
    }

    fn serialize_unit(self) -> Res {
        Ok(Doc::Null)
    }

    fn serialize_unit_struct(self, _: &'static str) -> Res {
        Ok(Doc::Null)
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, variant: &'static str) -> Res {
        Ok(Doc::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _: &'static str, value: &T) -> Res {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        value: &T,
    ) -> Res {
        Ok(tagged(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqLike, Error> {
        Ok(SeqLike {
            variant: None,
            items: Vec::with_capacity(len.unwrap_or_default()),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqLike, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _: &'static str, len: usize) -> Result<SeqLike, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqLike, Error> {
        Ok(SeqLike {
            variant: Some(variant),
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapLike, Error> {
        Ok(MapLike {
            key: None,
            map: IndexMap::with_capacity(len.unwrap_or_default()),
        })
    }

    fn serialize_struct(self, _: &'static str, len: usize) -> Result<CntrLike, Error> {
        Ok(CntrLike {
            variant: None,
            map: IndexMap::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<CntrLike, Error> {
        Ok(CntrLike {
            variant: Some(variant),
            map: IndexMap::with_capacity(len),
        })
    }

    fn collect_str<T: ?Sized + fmt::Display>(self, value: &T) -> Res {
        Ok(Doc::Str(value.to_string()))
    }
}

/// Sequences, tuples, and tuple variants.
pub struct SeqLike {
    variant: Option<&'static str>,
    items: Vec<Doc>,
}

impl SeqLike {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.items.push(value.serialize(Encoder)?);
        Ok(())
    }

    fn finish(self) -> Res {
        let seq = Doc::Seq(self.items);
        Ok(match self.variant {
            Some(variant) => tagged(variant, seq),
            None => seq,
        })
    }
}

impl ser::SerializeSeq for SeqLike {
    type Ok = Doc;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl ser::SerializeTuple for SeqLike {
    type Ok = Doc;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SeqLike {
    type Ok = Doc;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for SeqLike {
    type Ok = Doc;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

/// Object keys are strings; numbers and booleans are written as their text.
fn key_string(key: Doc) -> Result<String, Error> {
    match key {
        Doc::Str(s) => Ok(s),
        Doc::Num(n) => Ok(n.to_string()),
        Doc::Bool(b) => Ok(b.to_string()),
        x => Err(Error::KeyNotScalar(x.kind())),
    }
}

/// Maps.
pub struct MapLike {
    key: Option<String>,
    map: IndexMap<String, Doc>,
}

impl ser::SerializeMap for MapLike {
    type Ok = Doc;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Error> {
        self.key = Some(key_string(key.serialize(Encoder)?)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        let key = self.key.take().ok_or(Error::NoKeyAvailable)?;
        self.map.insert(key, value.serialize(Encoder)?);
        Ok(())
    }

    fn end(self) -> Res {
        Ok(Doc::Obj(self.map))
    }
}

/// Structs and struct variants.
pub struct CntrLike {
    variant: Option<&'static str>,
    map: IndexMap<String, Doc>,
}

impl CntrLike {
    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), Error> {
        self.map.insert(key.to_string(), value.serialize(Encoder)?);
        Ok(())
    }

    fn finish(self) -> Res {
        let obj = Doc::Obj(self.map);
        Ok(match self.variant {
            Some(variant) => tagged(variant, obj),
            None => obj,
        })
    }
}

impl ser::SerializeStruct for CntrLike {
    type Ok = Doc;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.field(key, value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}

impl ser::SerializeStructVariant for CntrLike {
    type Ok = Doc;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.field(key, value)
    }

    fn end(self) -> Res {
        self.finish()
    }
}
