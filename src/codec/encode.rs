//! Encoding: value tree → main buffer + reference table.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::buffer::{Branch, Buffer};
use crate::error::{CodecError, Result};
use crate::reference::{NULL_REF, ReferenceWriter};
use crate::registry::TypeRegistry;
use crate::types::{FieldType, StructSchema, StructValue, TypeId, Value};

/// Which buffer the cursor of the current write lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Main,
    Refs,
}

/// One encode pass over borrowed codec state.
///
/// Scalars go into the active sink at its cursor. Variable-length values
/// reserve a blob in the reference table, fill it through the same write
/// path with the table's cursor moved into the blob, and leave a 2-byte
/// id at the caller's cursor.
pub(crate) struct Encoder<'c> {
    registry: &'c mut TypeRegistry,
    main: &'c mut Buffer,
    refs: &'c mut ReferenceWriter,
    used: &'c mut BTreeSet<TypeId>,
}

impl<'c> Encoder<'c> {
    pub(crate) fn new(
        registry: &'c mut TypeRegistry,
        main: &'c mut Buffer,
        refs: &'c mut ReferenceWriter,
        used: &'c mut BTreeSet<TypeId>,
    ) -> Self {
        Self {
            registry,
            main,
            refs,
            used,
        }
    }

    /// Writes `[u16 rootTypeId][payload]` into the main buffer.
    pub(crate) fn encode_root(&mut self, ty: &FieldType, value: &Value) -> Result<TypeId> {
        let root = self.type_id(ty)?;
        let slot = self.main.branch(2);
        self.write(Sink::Main, ty, value)?;
        self.main.with_branch(slot, |b| b.put_u16(root.raw()));
        Ok(root)
    }

    fn buf(&mut self, sink: Sink) -> &mut Buffer {
        match sink {
            Sink::Main => &mut *self.main,
            Sink::Refs => self.refs.buffer_mut(),
        }
    }

    /// Resolves `ty` to its wire id and records every struct type it
    /// reaches as used.
    fn type_id(&mut self, ty: &FieldType) -> Result<TypeId> {
        let id = self.registry.type_id_of(ty)?;
        self.mark_used(ty)?;
        Ok(id)
    }

    fn mark_used(&mut self, ty: &FieldType) -> Result<()> {
        match ty {
            FieldType::Struct(schema) => {
                let id = self.registry.get_or_register(schema)?.id;
                if self.used.insert(id) {
                    for field in schema.fields() {
                        self.mark_used(&field.ty)?;
                    }
                }
            }
            FieldType::Slice(elem) => self.mark_used(elem)?,
            FieldType::Map { key, elem } => {
                self.mark_used(key)?;
                self.mark_used(elem)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Runs `f` with the reference table's cursor at the start of `region`.
    fn fill(&mut self, region: Branch, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.refs.buffer_mut().push_state(region.start());
        let result = f(self);
        self.refs.buffer_mut().pop_state();
        result
    }

    fn write(&mut self, sink: Sink, ty: &FieldType, value: &Value) -> Result<()> {
        match (ty, value) {
            (FieldType::Bool, Value::Bool(v)) => self.buf(sink).write_byte(u8::from(*v)),
            (FieldType::Int, Value::Int(v)) => {
                let v = i32::try_from(*v).map_err(|_| CodecError::IntegerOverflow(*v as i128))?;
                self.buf(sink).put_i32(v);
            }
            (FieldType::Int8, Value::Int8(v)) => self.buf(sink).write_byte(*v as u8),
            (FieldType::Int16, Value::Int16(v)) => self.buf(sink).put_i16(*v),
            (FieldType::Int32, Value::Int32(v)) => self.buf(sink).put_i32(*v),
            (FieldType::Int64, Value::Int64(v)) => self.buf(sink).put_i64(*v),
            (FieldType::Uint, Value::Uint(v)) => {
                let v = u32::try_from(*v).map_err(|_| CodecError::IntegerOverflow(*v as i128))?;
                self.buf(sink).put_u32(v);
            }
            (FieldType::Uint8, Value::Uint8(v)) => self.buf(sink).write_byte(*v),
            (FieldType::Uint16, Value::Uint16(v)) => self.buf(sink).put_u16(*v),
            (FieldType::Uint32, Value::Uint32(v)) => self.buf(sink).put_u32(*v),
            (FieldType::Uint64, Value::Uint64(v)) => self.buf(sink).put_u64(*v),
            (FieldType::Float32, Value::Float32(v)) => self.buf(sink).put_f32(*v),
            (FieldType::Float64, Value::Float64(v)) => self.buf(sink).put_f64(*v),
            (FieldType::String, Value::String(s)) => {
                let id = self.refs.put(s.as_bytes())?;
                self.buf(sink).put_u16(id);
            }
            (FieldType::Struct(schema), Value::Struct(s)) => self.write_struct(sink, schema, s)?,
            (FieldType::Slice(elem), Value::List(items)) => self.write_slice(sink, elem, items)?,
            (FieldType::Map { key, elem }, Value::Map(pairs)) => {
                self.write_map(sink, key, elem, pairs)?
            }
            (FieldType::Any, value) => self.write_any(sink, value)?,
            (ty, value) => return Err(CodecError::mismatch(ty, value.type_name())),
        }
        Ok(())
    }

    /// Writes the fields of `value` inline. Once the type name matches, the
    /// value's own schema is used: for a header-only type it may have
    /// narrower map fields than the declared one.
    fn write_struct(
        &mut self,
        sink: Sink,
        declared: &Arc<StructSchema>,
        value: &StructValue,
    ) -> Result<()> {
        let schema = value.schema();
        if !Arc::ptr_eq(schema, declared) && !narrows(declared, schema) {
            return Err(CodecError::mismatch(declared.name(), schema.name()));
        }
        if value.fields().len() != schema.len() {
            return Err(CodecError::mismatch(declared.name(), schema.name()));
        }
        self.type_id(&FieldType::Struct(Arc::clone(schema)))?;
        for (field, v) in schema.fields().iter().zip(value.fields()) {
            self.write(sink, &field.ty, v)?;
        }
        Ok(())
    }

    fn write_slice(&mut self, sink: Sink, elem: &FieldType, items: &[Value]) -> Result<()> {
        let elem_id = self.type_id(elem)?;
        if elem_id.is_array() {
            return Err(CodecError::UnsupportedKind(format!("slice of slices ([]{elem})")));
        }
        let elem_size = self.registry.type_size(elem_id)?;

        let (id, region) = self.refs.reserve(items.len() * elem_size)?;
        self.fill(region, |enc| {
            for item in items {
                enc.write(Sink::Refs, elem, item)?;
            }
            Ok(())
        })?;
        self.buf(sink).put_u16(id);
        Ok(())
    }

    /// Map slot: `[u16 elemType][u16 keyType][u16 refId]`; the blob holds
    /// the packed key/value pairs.
    fn write_map(
        &mut self,
        sink: Sink,
        key: &FieldType,
        elem: &FieldType,
        pairs: &[(Value, Value)],
    ) -> Result<()> {
        let key_id = self.type_id(key)?;
        let elem_id = self.type_id(elem)?;
        let pair_size = self.registry.type_size(key_id)? + self.registry.type_size(elem_id)?;

        let buf = self.buf(sink);
        buf.put_u16(elem_id.raw());
        buf.put_u16(key_id.raw());

        let (id, region) = self.refs.reserve(pairs.len() * pair_size)?;
        self.fill(region, |enc| {
            for (k, v) in pairs {
                enc.write(Sink::Refs, key, k)?;
                enc.write(Sink::Refs, elem, v)?;
            }
            Ok(())
        })?;
        self.buf(sink).put_u16(id);
        Ok(())
    }

    /// Polymorphic slot: a reference to `[u16 concreteTypeId][payload]`, or
    /// id 0 for null.
    fn write_any(&mut self, sink: Sink, value: &Value) -> Result<()> {
        if value.is_null() {
            self.buf(sink).put_u16(NULL_REF);
            return Ok(());
        }
        let ty = value.infer_type();
        let concrete = self.type_id(&ty)?;
        let size = self.registry.type_size(concrete)?;

        let (id, region) = self.refs.reserve(2 + size)?;
        self.fill(region, |enc| {
            enc.refs.buffer_mut().put_u16(concrete.raw());
            enc.write(Sink::Refs, &ty, value)
        })?;
        self.buf(sink).put_u16(id);
        Ok(())
    }
}

/// True when `schema` is `declared`, or `declared` with some `map[any]any`
/// fields given concrete key and element types.
fn narrows(declared: &StructSchema, schema: &StructSchema) -> bool {
    if schema.name() != declared.name() || schema.len() != declared.len() {
        return false;
    }
    let untyped = FieldType::map(FieldType::Any, FieldType::Any);
    declared.fields().iter().zip(schema.fields()).all(|(d, s)| {
        d.name == s.name
            && (d.ty == s.ty || (d.ty == untyped && matches!(s.ty, FieldType::Map { .. })))
    })
}
