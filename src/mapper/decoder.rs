//! Recursive descent from tokens to typed values.
use super::descriptor::Shape;
use super::registry::SourceKind;
use super::Mapper;
use crate::error::{MapError, Result, TypeMismatch};
use crate::parse::{Reader, Token};
use crate::reflect::{
    EnumInfo, IgnoreWhen, Reflect, ReflectRef, Scalar, ScalarKind, TypeInfo, TypeRef,
};
use crate::Doc;
use indexmap::IndexMap;

impl From<ScalarKind> for SourceKind {
    fn from(k: ScalarKind) -> Self {
        match k {
            ScalarKind::Bool => SourceKind::Boolean,
            ScalarKind::Int => SourceKind::Int,
            ScalarKind::Long => SourceKind::Long,
            ScalarKind::ULong => SourceKind::ULong,
            ScalarKind::Double => SourceKind::Double,
            ScalarKind::String => SourceKind::String,
        }
    }
}

fn scalar_value(token: Token) -> Option<(SourceKind, Box<dyn Reflect>)> {
    let v: (SourceKind, Box<dyn Reflect>) = match token {
        Token::Int(x) => (SourceKind::Int, Box::new(x)),
        Token::Long(x) => (SourceKind::Long, Box::new(x)),
        Token::ULong(x) => (SourceKind::ULong, Box::new(x)),
        Token::Double(x) => (SourceKind::Double, Box::new(x)),
        Token::String(x) => (SourceKind::String, Box::new(x)),
        Token::Boolean(x) => (SourceKind::Boolean, Box::new(x)),
        _ => return None,
    };
    Some(v)
}

fn literal(value: &dyn Reflect) -> String {
    match value.reflect_ref() {
        ReflectRef::Scalar(s) => s.to_string(),
        _ => String::new(),
    }
}

fn integral(value: &dyn Reflect) -> Option<i128> {
    match value.reflect_ref() {
        ReflectRef::Scalar(Scalar::Int(x)) => Some(x.into()),
        ReflectRef::Scalar(Scalar::Long(x)) => Some(x.into()),
        ReflectRef::Scalar(Scalar::ULong(x)) => Some(x.into()),
        _ => None,
    }
}

pub(crate) struct Decoder<'m, 'r, 'a> {
    mapper: &'m Mapper,
    reader: &'r mut Reader<'a>,
}

impl<'m, 'r, 'a> Decoder<'m, 'r, 'a> {
    pub fn new(mapper: &'m Mapper, reader: &'r mut Reader<'a>) -> Self {
        Decoder { mapper, reader }
    }

    fn syntax(&self, msg: &str) -> MapError {
        MapError::Syntax(self.reader.error(msg))
    }

    /// Decode the next value as `ty`. `None` signals the end of the enclosing array.
    pub fn decode(&mut self, ty: TypeRef) -> Result<Option<Box<dyn Reflect>>> {
        let token = self.reader.next_token()?;
        if token == Token::ArrayEnd {
            return Ok(None);
        }

        // nested nullables share the outermost absent value
        let (mut ty, mut none) = (ty, None);
        while let TypeInfo::Nullable(n) = ty.info() {
            none = none.or(Some(n.none));
            ty = n.inner;
        }
        let info = ty.info();

        let opens = matches!(token, Token::ArrayStart | Token::ObjectStart);
        if opens && self.mapper.too_deep(self.reader) {
            return Err(self.mapper.depth_error(ty));
        }

        let value: Box<dyn Reflect> = match token {
            Token::Null => match (none, &info) {
                (Some(none), _) => none(),
                (None, TypeInfo::Doc) | (None, TypeInfo::Dynamic) => Box::new(Doc::Null),
                _ => {
                    return Err(TypeMismatch::Null {
                        target: ty.name().to_string(),
                    }
                    .into())
                }
            },
            Token::ArrayStart => self.sequence(ty, info)?,
            Token::ObjectStart => self.object(ty, info)?,
            token if token.is_scalar() => match info {
                TypeInfo::Doc => Box::new(self.doc(ty, token)?),
                info => self.scalar(ty, info, token)?,
            },
            _ => return Err(self.syntax("expected a value")),
        };
        Ok(Some(value))
    }

    /// Decode a value which must be present.
    fn decode_value(&mut self, ty: TypeRef) -> Result<Box<dyn Reflect>> {
        match self.decode(ty)? {
            Some(v) => Ok(v),
            None => Err(self.syntax("expected a value, found ']'")),
        }
    }

    /// Build a document from `token`, held to the mapper's depth limit.
    fn doc(&mut self, ty: TypeRef, token: Token) -> Result<Doc> {
        match Doc::from_token(token, self.reader, self.mapper.config.max_depth) {
            Ok(doc) => Ok(doc),
            Err(e) => Err(self.mapper.doc_error(e, self.reader, ty)),
        }
    }

    fn scalar(&mut self, ty: TypeRef, info: TypeInfo, token: Token) -> Result<Box<dyn Reflect>> {
        let (kind, value) = match scalar_value(token) {
            Some(x) => x,
            None => return Err(self.syntax("expected a scalar")),
        };

        match info {
            TypeInfo::Scalar(k) if SourceKind::from(k) == kind => return Ok(value),
            TypeInfo::Dynamic => return Ok(value),
            _ => (),
        }

        let registry = &self.mapper.registry;
        let id = ty.id();
        if let Some(f) = registry.custom_importer(kind, id) {
            return f(value);
        }
        if let Some(f) = registry.base_importer(kind, id) {
            return f(value);
        }
        if let TypeInfo::Enum(EnumInfo { from_bits, .. }) = info {
            if let Some(v) = integral(value.as_ref()).and_then(from_bits) {
                return Ok(v);
            }
        }
        if let Some(f) = registry.conversion(kind, id) {
            return f(value);
        }

        Err(TypeMismatch::Scalar {
            literal: literal(value.as_ref()),
            kind: kind.to_string(),
            target: ty.name().to_string(),
        }
        .into())
    }

    fn sequence(&mut self, ty: TypeRef, info: TypeInfo) -> Result<Box<dyn Reflect>> {
        if let Some(f) = self.mapper.registry.custom_importer(SourceKind::Doc, ty.id()) {
            let doc = self.doc(ty, Token::ArrayStart)?;
            return f(Box::new(doc));
        }
        if let TypeInfo::Doc | TypeInfo::Dynamic = info {
            return Ok(Box::new(self.doc(ty, Token::ArrayStart)?));
        }

        let desc = self.mapper.sequence_descriptor(ty);
        if !desc.is_array() && !desc.is_list() {
            return Err(TypeMismatch::NotSequence {
                target: ty.name().to_string(),
            }
            .into());
        }

        let mut items = Vec::new();
        while let Some(item) = self.decode(desc.element())? {
            items.push(item);
        }
        desc.materialize(items)
    }

    fn next_key(&mut self) -> Result<Option<String>> {
        match self.reader.next_token()? {
            Token::PropertyName(k) => Ok(Some(k)),
            Token::ObjectEnd => Ok(None),
            _ => Err(self.syntax("expected a property name")),
        }
    }

    /// Collect the rest of an object, starting at `key`, into a document.
    fn object_doc(&mut self, ty: TypeRef, mut key: Option<String>) -> Result<Doc> {
        let mut map = IndexMap::new();
        while let Some(k) = key {
            let token = self.reader.next_token()?;
            map.insert(k, self.doc(ty, token)?);
            key = self.next_key()?;
        }
        Ok(Doc::Obj(map))
    }

    fn object(&mut self, ty: TypeRef, info: TypeInfo) -> Result<Box<dyn Reflect>> {
        let first = self.next_key()?;

        if self.reader.type_hinting() {
            if let Some(k) = &first {
                if k == &self.reader.config().hint_type_name {
                    return self.envelope();
                }
            }
        }

        if let Some(f) = self.mapper.registry.custom_importer(SourceKind::Doc, ty.id()) {
            let doc = self.object_doc(ty, first)?;
            return f(Box::new(doc));
        }
        if let TypeInfo::Doc | TypeInfo::Dynamic = info {
            return Ok(Box::new(self.object_doc(ty, first)?));
        }

        let desc = self.mapper.object_descriptor(ty)?;
        match &desc.shape {
            Shape::Opaque => Err(TypeMismatch::NotObject {
                target: ty.name().to_string(),
            }
            .into()),
            Shape::Map(info) => {
                let mut entries = Vec::new();
                let mut key = first;
                while let Some(k) = key {
                    let v = self.decode_value(info.value)?;
                    entries.push((k, v));
                    key = self.next_key()?;
                }
                Ok((info.from_entries)(entries)?)
            }
            Shape::Object {
                constructor,
                extras,
            } => {
                let mut instance = match self.mapper.registry.factory(ty.id()) {
                    Some(f) => f(),
                    None => match constructor {
                        Some(c) => c(),
                        None => {
                            return Err(TypeMismatch::NoConstructor {
                                target: ty.name().to_string(),
                            }
                            .into())
                        }
                    },
                };

                let mut key = first;
                while let Some(k) = key {
                    match desc.lookup(&k) {
                        Some(m) if m.ignore().contains(IgnoreWhen::DESERIALIZE) => {
                            self.skip()?
                        }
                        Some(m) => {
                            let v = self.decode_value(m.declared())?;
                            if let Some(set) = &m.setter {
                                set(instance.as_any_mut(), v)?;
                            }
                        }
                        None => match extras {
                            Some(extras) => {
                                let v = self.decode_value(extras.value)?;
                                (extras.insert)(instance.as_any_mut(), k, v)?;
                            }
                            None if self.reader.skip_non_members() => self.skip()?,
                            None => {
                                return Err(MapError::UnknownMember {
                                    ty: ty.name().to_string(),
                                    key: k,
                                })
                            }
                        },
                    }
                    key = self.next_key()?;
                }
                Ok(instance)
            }
        }
    }

    /// The rest of a type-hint envelope, after its type key.
    fn envelope(&mut self) -> Result<Box<dyn Reflect>> {
        let name = match self.reader.next_token()? {
            Token::String(s) => s,
            _ => {
                return Err(MapError::MalformedEnvelope(String::from(
                    "the type name must be a string",
                )))
            }
        };

        let value_key = self.reader.config().hint_value_name.clone();
        match self.next_key()? {
            Some(k) if k == value_key => (),
            Some(k) => {
                return Err(MapError::MalformedEnvelope(format!(
                    "expected the '{}' property, found '{}'",
                    value_key, k
                )))
            }
            None => {
                return Err(MapError::MalformedEnvelope(format!(
                    "missing the '{}' property",
                    value_key
                )))
            }
        }

        let ty = self
            .mapper
            .resolve_type(&name)
            .ok_or(MapError::UnregisteredType(name))?;
        let value = self.decode_value(ty)?;

        match self.next_key()? {
            None => Ok(value),
            Some(k) => Err(MapError::MalformedEnvelope(format!(
                "unexpected property '{}'",
                k
            ))),
        }
    }

    /// Consume one complete value.
    fn skip(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.reader.next_token()? {
                Token::ArrayStart | Token::ObjectStart => depth += 1,
                Token::ArrayEnd | Token::ObjectEnd => depth = depth.saturating_sub(1),
                Token::PropertyName(_) => continue,
                Token::End => return Err(self.syntax("unexpected end of input")),
                _ => (),
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }
}
