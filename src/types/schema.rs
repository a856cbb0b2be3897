//! Explicit schema descriptions for record types.

use std::fmt;
use std::sync::Arc;

use super::Kind;

/// Longest field name the wire header can carry.
pub const MAX_NAME_LEN: usize = 255;

/// Declared type of a struct field, slice element, map key or map value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Bool,
    /// Platform-width signed integer, carried in a 4-byte slot.
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Platform-width unsigned integer, carried in a 4-byte slot.
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Slice(Box<FieldType>),
    Map {
        key: Box<FieldType>,
        elem: Box<FieldType>,
    },
    /// Polymorphic value; the concrete type travels with the payload.
    Any,
    Struct(Arc<StructSchema>),
}

impl FieldType {
    pub fn slice(elem: FieldType) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn map(key: FieldType, elem: FieldType) -> Self {
        Self::Map {
            key: Box::new(key),
            elem: Box::new(elem),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool => Kind::Bool,
            Self::Int => Kind::Int,
            Self::Int8 => Kind::Int8,
            Self::Int16 => Kind::Int16,
            Self::Int32 => Kind::Int32,
            Self::Int64 => Kind::Int64,
            Self::Uint => Kind::Uint,
            Self::Uint8 => Kind::Uint8,
            Self::Uint16 => Kind::Uint16,
            Self::Uint32 => Kind::Uint32,
            Self::Uint64 => Kind::Uint64,
            Self::Float32 => Kind::Float32,
            Self::Float64 => Kind::Float64,
            Self::String => Kind::String,
            Self::Slice(_) => Kind::Slice,
            Self::Map { .. } => Kind::Map,
            Self::Any => Kind::Interface,
            Self::Struct(_) => Kind::Struct,
        }
    }

    /// The field type of a scalar kind. Composite kinds need more than a
    /// code to describe them and return `None`.
    pub fn scalar(kind: Kind) -> Option<Self> {
        let ty = match kind {
            Kind::Bool => Self::Bool,
            Kind::Int => Self::Int,
            Kind::Int8 => Self::Int8,
            Kind::Int16 => Self::Int16,
            Kind::Int32 => Self::Int32,
            Kind::Int64 => Self::Int64,
            Kind::Uint => Self::Uint,
            Kind::Uint8 => Self::Uint8,
            Kind::Uint16 => Self::Uint16,
            Kind::Uint32 => Self::Uint32,
            Kind::Uint64 => Self::Uint64,
            Kind::Float32 => Self::Float32,
            Kind::Float64 => Self::Float64,
            Kind::String => Self::String,
            Kind::Interface => Self::Any,
            Kind::Map | Kind::Slice | Kind::Struct => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slice(elem) => write!(f, "[]{elem}"),
            Self::Map { key, elem } => write!(f, "map[{key}]{elem}"),
            Self::Struct(schema) => f.write_str(schema.name()),
            other => f.write_str(other.kind().name()),
        }
    }
}

/// One named field of a [`StructSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub ty: FieldType,
}

/// Ordered field layout of a struct type, keyed by its fully-qualified name.
#[derive(Debug, Clone, PartialEq)]
pub struct StructSchema {
    name: String,
    fields: Vec<SchemaField>,
}

impl StructSchema {
    /// Starts a builder for the struct named `name`.
    pub fn builder(name: impl Into<String>) -> StructSchemaBuilder {
        StructSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the field called `name`, comparing names the way the
    /// wire header stores them (truncated to [`MAX_NAME_LEN`] bytes).
    pub fn field_index(&self, name: &str) -> Option<usize> {
        let wanted = truncate_name(name);
        self.fields
            .iter()
            .position(|f| truncate_name(&f.name) == wanted)
    }
}

/// Fluent builder for [`StructSchema`].
#[derive(Debug)]
pub struct StructSchemaBuilder {
    name: String,
    fields: Vec<SchemaField>,
}

impl StructSchemaBuilder {
    /// Appends a field; fields keep declaration order.
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            ty,
        });
        self
    }

    /// Appends a nested struct field.
    pub fn nested(self, name: impl Into<String>, schema: Arc<StructSchema>) -> Self {
        self.field(name, FieldType::Struct(schema))
    }

    pub fn build(self) -> StructSchema {
        StructSchema {
            name: self.name,
            fields: self.fields,
        }
    }
}

/// Cuts `name` to at most [`MAX_NAME_LEN`] bytes on a char boundary.
pub(crate) fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
