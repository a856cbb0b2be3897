//! Type registry: stable ids and cached field layouts for struct types.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{CodecError, Result};
use crate::types::{
    ARRAY_FLAG, FIRST_STRUCT_ID, FieldType, Kind, MAX_NAME_LEN, StructSchema, TypeId,
    truncate_name,
};

/// Name prefix given to struct types known only from a wire header.
pub const WIRE_TYPE_PREFIX: &str = "wire.Type";

/// One field of a registered struct, as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// At most 255 bytes.
    pub name: String,
    pub type_id: TypeId,
    /// Bytes the field occupies inline; reference kinds count their id slot.
    pub size: usize,
}

/// Cached layout of one struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDescriptor {
    pub id: TypeId,
    pub fields: Vec<FieldDescriptor>,
    /// Sum of the field sizes.
    pub size: usize,
}

/// Assigns ids to struct types and caches their descriptors.
///
/// Descriptors are immutable once inserted and live as long as the
/// registry, so every message that mentions a type sees the same field
/// order and ids. They arrive either from a local [`StructSchema`] (keyed
/// by its name) or from a decoded schema header (keyed by id only). The
/// schema synthesized for a header type may have its map fields narrowed
/// once, the first time a decoded value shows their key and element types.
#[derive(Debug)]
pub struct TypeRegistry {
    types: HashMap<TypeId, Arc<StructDescriptor>>,
    schemas: HashMap<TypeId, Arc<StructSchema>>,
    by_name: HashMap<String, TypeId>,
    /// Ids whose schema was synthesized from a header.
    synthesized: HashSet<TypeId>,
    next_id: u16,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            schemas: HashMap::new(),
            by_name: HashMap::new(),
            synthesized: HashSet::new(),
            next_id: FIRST_STRUCT_ID,
        }
    }

    /// Number of registered struct types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.types.contains_key(&id)
    }

    pub fn get(&self, id: TypeId) -> Option<&Arc<StructDescriptor>> {
        self.types.get(&id)
    }

    /// Descriptor for `id`, or `UnknownType`.
    pub fn descriptor(&self, id: TypeId) -> Result<&Arc<StructDescriptor>> {
        self.types.get(&id).ok_or(CodecError::UnknownType(id))
    }

    /// Schema for `id`: the local one, or the one synthesized from a header.
    pub fn schema(&self, id: TypeId) -> Result<&Arc<StructSchema>> {
        self.schemas.get(&id).ok_or(CodecError::UnknownType(id))
    }

    /// Id registered under a fully-qualified type name.
    pub fn id_of(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Returns the cached descriptor for `schema`'s name, or builds and
    /// registers one. Nested struct fields are registered first-seen after
    /// their parent, so a parent always has the smaller id.
    ///
    /// The whole tree of new struct types is checked before the first id is
    /// allocated, so a rejected schema leaves no gap in the id sequence.
    pub fn get_or_register(
        &mut self,
        schema: &Arc<StructSchema>,
    ) -> Result<Arc<StructDescriptor>> {
        if let Some(id) = self.by_name.get(schema.name()) {
            return self.descriptor(*id).cloned();
        }

        let mut new = HashSet::new();
        self.collect_new(schema, &mut new)?;
        if usize::from(self.next_id) + new.len() > usize::from(ARRAY_FLAG) {
            return Err(CodecError::TypeSpaceExhausted);
        }
        let id = TypeId::new(self.next_id);
        self.next_id += 1;

        let mut fields = Vec::with_capacity(schema.len());
        let mut size = 0;
        for field in schema.fields() {
            let type_id = self.type_id_of(&field.ty)?;
            let field_size = self.type_size(type_id)?;
            size += field_size;
            fields.push(FieldDescriptor {
                name: wire_name(&field.name),
                type_id,
                size: field_size,
            });
        }

        let descriptor = Arc::new(StructDescriptor { id, fields, size });
        self.types.insert(id, Arc::clone(&descriptor));
        self.schemas.insert(id, Arc::clone(schema));
        self.by_name.insert(schema.name().to_owned(), id);
        tracing::debug!(type_id = %id, name = schema.name(), size, "registered struct type");
        Ok(descriptor)
    }

    /// Gathers the names of unregistered structs reachable from `schema`,
    /// failing on anything `get_or_register` would reject.
    fn collect_new<'s>(&self, schema: &'s StructSchema, new: &mut HashSet<&'s str>) -> Result<()> {
        if self.by_name.contains_key(schema.name()) || !new.insert(schema.name()) {
            return Ok(());
        }
        if schema.len() > u8::MAX as usize {
            return Err(CodecError::TooManyFields {
                name: schema.name().to_owned(),
                count: schema.len(),
            });
        }
        for field in schema.fields() {
            self.collect_field(&field.ty, new)?;
        }
        Ok(())
    }

    fn collect_field<'s>(&self, ty: &'s FieldType, new: &mut HashSet<&'s str>) -> Result<()> {
        match ty {
            FieldType::Struct(schema) => self.collect_new(schema, new),
            FieldType::Slice(elem) => {
                if matches!(**elem, FieldType::Slice(_)) {
                    return Err(CodecError::UnsupportedKind(format!(
                        "slice of slices ({ty})"
                    )));
                }
                self.collect_field(elem, new)
            }
            _ => Ok(()),
        }
    }

    /// Wire id for a declared field type, registering struct types on the way.
    pub fn type_id_of(&mut self, ty: &FieldType) -> Result<TypeId> {
        match ty {
            FieldType::Struct(schema) => Ok(self.get_or_register(schema)?.id),
            FieldType::Slice(elem) => {
                let elem_id = self.type_id_of(elem)?;
                if elem_id.is_array() {
                    return Err(CodecError::UnsupportedKind(format!(
                        "slice of slices ({ty})"
                    )));
                }
                Ok(elem_id.with_array_flag())
            }
            other => Ok(TypeId::from(other.kind())),
        }
    }

    /// Bytes a value of type `id` occupies in a fixed-size slot.
    pub fn type_size(&self, id: TypeId) -> Result<usize> {
        if id.is_array() {
            return Ok(2);
        }
        if id.is_struct() {
            return Ok(self.descriptor(id)?.size);
        }
        id.kind()
            .and_then(Kind::slot_size)
            .ok_or(CodecError::UnknownType(id))
    }

    /// Inserts struct descriptors read from a schema header.
    ///
    /// Field sizes are resolved once every type of the header is known, so
    /// the order of types within a header does not matter. Ids already
    /// cached are ignored. A type whose nested struct is neither cached nor
    /// part of `incoming` fails with `UnknownType`.
    pub fn insert_wire_types(&mut self, incoming: Vec<StructDescriptor>) -> Result<()> {
        let mut pending = Vec::with_capacity(incoming.len());
        for descriptor in incoming {
            if self.types.contains_key(&descriptor.id) {
                tracing::debug!(type_id = %descriptor.id, "header type already cached, skipping");
            } else {
                pending.push(descriptor);
            }
        }

        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();
            for descriptor in pending {
                if self.types.contains_key(&descriptor.id) {
                    continue;
                }
                match self.missing_dependency(&descriptor) {
                    None => self.insert_wire_type(descriptor)?,
                    Some(_) => waiting.push(descriptor),
                }
            }
            if !waiting.is_empty() && waiting.len() == before {
                let missing = waiting
                    .iter()
                    .find_map(|d| self.missing_dependency(d))
                    .unwrap_or(TypeId::INVALID);
                return Err(CodecError::UnknownType(missing));
            }
            pending = waiting;
        }
        Ok(())
    }

    /// First struct field, or struct slice element, not registered yet.
    fn missing_dependency(&self, descriptor: &StructDescriptor) -> Option<TypeId> {
        descriptor
            .fields
            .iter()
            .map(|f| f.type_id.element_type())
            .find(|t| t.is_struct() && !self.types.contains_key(t))
    }

    fn insert_wire_type(&mut self, mut descriptor: StructDescriptor) -> Result<()> {
        let mut size = 0;
        for field in &mut descriptor.fields {
            field.size = self.type_size(field.type_id)?;
            size += field.size;
        }
        descriptor.size = size;

        let id = descriptor.id;
        let schema = Arc::new(self.synthesize_schema(&descriptor)?);
        self.by_name.insert(schema.name().to_owned(), id);
        self.schemas.insert(id, schema);
        self.synthesized.insert(id);
        self.types.insert(id, Arc::new(descriptor));
        if id.raw() >= self.next_id {
            self.next_id = id.raw().saturating_add(1);
        }
        tracing::debug!(type_id = %id, size, "registered struct type from header");
        Ok(())
    }

    /// Builds a schema for a header-only type. Map fields start out as
    /// `map[any]any` since their key and element types travel with each
    /// value; see [`narrow_map_fields`](Self::narrow_map_fields).
    fn synthesize_schema(&self, descriptor: &StructDescriptor) -> Result<StructSchema> {
        let name = format!("{WIRE_TYPE_PREFIX}{}", descriptor.id.raw());
        let mut builder = StructSchema::builder(name);
        for field in &descriptor.fields {
            let ty = self.field_type_of(field.type_id)?;
            builder = builder.field(field.name.clone(), ty);
        }
        Ok(builder.build())
    }

    /// Narrows the `map[any]any` fields of a header-only type to the key and
    /// element ids read from their slots, given as `(field index, key,
    /// elem)`. Local schemas and fields narrowed before are left alone.
    /// Returns the current schema for `id`.
    pub fn narrow_map_fields(
        &mut self,
        id: TypeId,
        slots: &[(usize, TypeId, TypeId)],
    ) -> Result<Arc<StructSchema>> {
        let current = Arc::clone(self.schema(id)?);
        if !self.synthesized.contains(&id) {
            return Ok(current);
        }

        let untyped = FieldType::map(FieldType::Any, FieldType::Any);
        let mut fields = current.fields().to_vec();
        let mut narrowed = false;
        for &(index, key, elem) in slots {
            let Some(field) = fields.get_mut(index) else {
                continue;
            };
            if field.ty != untyped {
                continue;
            }
            let ty = FieldType::map(self.field_type_of(key)?, self.field_type_of(elem)?);
            if ty != untyped {
                field.ty = ty;
                narrowed = true;
            }
        }
        if !narrowed {
            return Ok(current);
        }

        let mut builder = StructSchema::builder(current.name());
        for field in fields {
            builder = builder.field(field.name, field.ty);
        }
        let schema = Arc::new(builder.build());
        self.schemas.insert(id, Arc::clone(&schema));
        tracing::debug!(type_id = %id, "narrowed map fields of header type");
        Ok(schema)
    }

    /// Best declared type for a wire id.
    pub fn field_type_of(&self, id: TypeId) -> Result<FieldType> {
        if id.is_array() {
            return Ok(FieldType::slice(self.field_type_of(id.element_type())?));
        }
        if id.is_struct() {
            return Ok(FieldType::Struct(Arc::clone(self.schema(id)?)));
        }
        match id.kind() {
            Some(Kind::Map) => Ok(FieldType::map(FieldType::Any, FieldType::Any)),
            Some(kind) => FieldType::scalar(kind)
                .ok_or_else(|| CodecError::UnsupportedKind(format!("bare {kind} type id"))),
            None => Err(CodecError::UnsupportedKind(format!("type id {id}"))),
        }
    }
}

/// Field name as stored on the wire; longer names are cut with a warning.
fn wire_name(name: &str) -> String {
    let cut = truncate_name(name);
    if cut.len() < name.len() {
        let warning = CodecError::FieldNameTooLong {
            name: name.to_owned(),
            len: name.len(),
        };
        tracing::warn!(max = MAX_NAME_LEN, "{warning}; decoding may not match the field");
    }
    cut.to_owned()
}
