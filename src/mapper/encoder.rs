//! Recursive walk from typed values to JSON text.
use super::Mapper;
use crate::error::{MapError, Result, TypeMismatch};
use crate::reflect::{IgnoreWhen, Reflect, ReflectRef, Scalar, TypeInfo, TypeKey, TypeRef};
use crate::Writer;

/// Follow wrappers and present nullables to the value inside. `None` is null.
fn peel(mut value: &dyn Reflect) -> Option<&dyn Reflect> {
    loop {
        match value.reflect_ref() {
            ReflectRef::Indirect(inner) | ReflectRef::Nullable(Some(inner)) => value = inner,
            ReflectRef::Nullable(None) => return None,
            _ => return Some(value),
        }
    }
}

/// The declared type with nullability removed.
fn peel_declared(mut ty: TypeRef) -> TypeKey {
    while let TypeInfo::Nullable(n) = ty.info() {
        ty = n.inner;
    }
    ty.key()
}

fn element_type(value: &dyn Reflect) -> Option<TypeRef> {
    match value.reflect_type().info() {
        TypeInfo::Seq(info) => Some(info.element),
        TypeInfo::Map(info) => Some(info.value),
        _ => None,
    }
}

pub(crate) struct Encoder<'m, 'w> {
    mapper: &'m Mapper,
    writer: &'w mut Writer,
}

impl<'m, 'w> Encoder<'m, 'w> {
    pub fn new(mapper: &'m Mapper, writer: &'w mut Writer) -> Self {
        Encoder { mapper, writer }
    }

    pub fn encode(&mut self, value: &dyn Reflect, depth: usize) -> Result<()> {
        let max = self.mapper.config.max_depth;
        if depth > max {
            return Err(MapError::DepthExceeded {
                ty: value.reflect_key().name().to_string(),
                max,
            });
        }

        let value = match peel(value) {
            Some(v) => v,
            None => return Ok(self.writer.write_null()?),
        };

        match value.reflect_ref() {
            ReflectRef::Doc(doc) => Ok(doc.write_to(&mut *self.writer)?),
            ReflectRef::Scalar(s) => Ok(match s {
                Scalar::Bool(x) => self.writer.write_bool(x),
                Scalar::Int(x) => self.writer.write_i32(x),
                Scalar::Long(x) => self.writer.write_i64(x),
                Scalar::ULong(x) => self.writer.write_u64(x),
                Scalar::Double(x) => self.writer.write_f64(x),
                Scalar::Str(x) => self.writer.write_str(x),
            }?),
            ReflectRef::Seq(items) => {
                let declared = element_type(value);
                self.writer.write_array_start()?;
                for item in items {
                    self.slot(item, declared, depth + 1)?;
                }
                Ok(self.writer.write_array_end()?)
            }
            ReflectRef::Map(entries) => {
                let declared = element_type(value);
                self.writer.write_object_start()?;
                for (k, v) in entries {
                    self.writer.write_property_name(k)?;
                    self.slot(v, declared, depth + 1)?;
                }
                Ok(self.writer.write_object_end()?)
            }
            view => {
                if let Some(export) = self.mapper.registry.exporter(value.reflect_key().id()) {
                    return export(value, &mut *self.writer);
                }
                match view {
                    ReflectRef::Enum { bits, unsigned } => self.enumeration(value, bits, unsigned),
                    ReflectRef::Object => self.object(value, depth),
                    _ => Err(TypeMismatch::NoExporter {
                        target: value.reflect_key().name().to_string(),
                    }
                    .into()),
                }
            }
        }
    }

    fn enumeration(&mut self, value: &dyn Reflect, bits: i128, unsigned: bool) -> Result<()> {
        let out_of_range = || TypeMismatch::Overflow {
            literal: bits.to_string(),
            target: value.reflect_key().name().to_string(),
        };
        if unsigned {
            let n = u64::try_from(bits).map_err(|_| out_of_range())?;
            Ok(self.writer.write_u64(n)?)
        } else {
            let n = i64::try_from(bits).map_err(|_| out_of_range())?;
            Ok(self.writer.write_i64(n)?)
        }
    }

    /// Encode a value held in a slot of type `declared`, inside a type-hint envelope when its
    /// runtime type differs.
    fn slot(
        &mut self,
        value: &dyn Reflect,
        declared: Option<TypeRef>,
        depth: usize,
    ) -> Result<()> {
        if self.writer.type_hinting() {
            if let (Some(runtime), Some(declared)) = (peel(value), declared) {
                if runtime.reflect_key() != peel_declared(declared) {
                    return self.envelope(runtime, depth);
                }
            }
        }
        self.encode(value, depth)
    }

    fn envelope(&mut self, value: &dyn Reflect, depth: usize) -> Result<()> {
        let ty = value.reflect_type();
        self.mapper.register_type_ref(ty);

        let config = self.writer.config();
        let type_key = config.hint_type_name.clone();
        let value_key = config.hint_value_name.clone();
        self.writer.write_object_start()?;
        self.writer.write_property_name(&type_key)?;
        self.writer.write_str(ty.name())?;
        self.writer.write_property_name(&value_key)?;
        self.encode(value, depth)?;
        Ok(self.writer.write_object_end()?)
    }

    fn object(&mut self, value: &dyn Reflect, depth: usize) -> Result<()> {
        let props = self.mapper.property_list(value.reflect_type())?;
        let host = value.as_any();

        self.writer.write_object_start()?;
        for m in props.members() {
            if m.ignore().contains(IgnoreWhen::SERIALIZE) {
                continue;
            }
            let get = match &m.getter {
                Some(get) => get,
                None => continue,
            };
            let slot = get(host).ok_or_else(|| TypeMismatch::Slot {
                found: value.reflect_key().name().to_string(),
                target: m.name().to_string(),
            })?;
            self.writer.write_property_name(m.wire_name())?;
            self.slot(slot.get(), Some(m.declared()), depth + 1)?;
        }

        if let Some(extras) = &props.extras {
            let desc = self.mapper.object_descriptor(value.reflect_type())?;
            if let Some(slot) = (extras.get)(host) {
                if let ReflectRef::Map(entries) = slot.get().reflect_ref() {
                    for (k, v) in entries {
                        // a key naming a member would be read back into that member
                        if desc.lookup(k).is_some() {
                            continue;
                        }
                        self.writer.write_property_name(k)?;
                        self.slot(v, Some(extras.value), depth + 1)?;
                    }
                }
            }
        }

        Ok(self.writer.write_object_end()?)
    }
}
