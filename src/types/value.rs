//! Dynamic value tree walked by the encoder and produced by the decoder.

use std::fmt;
use std::sync::Arc;

use super::{FieldType, StructSchema};

/// A value of any type the codec can carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent polymorphic value; only meaningful in an `Any` position.
    #[default]
    Null,
    Bool(bool),
    Int(isize),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint(usize),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    List(Vec<Value>),
    /// Ordered key/value pairs; keys need not be hashable.
    Map(Vec<(Value, Value)>),
    Struct(StructValue),
}

impl Value {
    /// Short name of the variant, used in mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Int8(_) => "int8",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Uint(_) => "uint",
            Self::Uint8(_) => "uint8",
            Self::Uint16(_) => "uint16",
            Self::Uint32(_) => "uint32",
            Self::Uint64(_) => "uint64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::List(_) => "slice",
            Self::Map(_) => "map",
            Self::Struct(_) => "struct",
        }
    }

    /// The concrete type carried when this value sits in an `Any` slot.
    ///
    /// Lists and maps take the common type of their elements; mixed, empty
    /// or null-containing collections fall back to `Any` elements. A list
    /// of lists also uses `Any` elements since one array flag cannot
    /// express nesting.
    pub fn infer_type(&self) -> FieldType {
        match self {
            Self::Null => FieldType::Any,
            Self::Bool(_) => FieldType::Bool,
            Self::Int(_) => FieldType::Int,
            Self::Int8(_) => FieldType::Int8,
            Self::Int16(_) => FieldType::Int16,
            Self::Int32(_) => FieldType::Int32,
            Self::Int64(_) => FieldType::Int64,
            Self::Uint(_) => FieldType::Uint,
            Self::Uint8(_) => FieldType::Uint8,
            Self::Uint16(_) => FieldType::Uint16,
            Self::Uint32(_) => FieldType::Uint32,
            Self::Uint64(_) => FieldType::Uint64,
            Self::Float32(_) => FieldType::Float32,
            Self::Float64(_) => FieldType::Float64,
            Self::String(_) => FieldType::String,
            Self::List(items) => FieldType::slice(common_type(items.iter(), false)),
            Self::Map(pairs) => FieldType::map(
                common_type(pairs.iter().map(|(k, _)| k), true),
                common_type(pairs.iter().map(|(_, v)| v), true),
            ),
            Self::Struct(s) => FieldType::Struct(Arc::clone(&s.schema)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up `key` in a map value by equality.
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Map(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

fn common_type<'a>(mut values: impl Iterator<Item = &'a Value>, allow_slice: bool) -> FieldType {
    let Some(first) = values.next() else {
        return FieldType::Any;
    };
    let ty = first.infer_type();
    if matches!(ty, FieldType::Any) || (!allow_slice && matches!(ty, FieldType::Slice(_))) {
        return FieldType::Any;
    }
    if values.all(|v| v.infer_type() == ty) {
        ty
    } else {
        FieldType::Any
    }
}

/// Field values of one struct, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    schema: Arc<StructSchema>,
    fields: Vec<Value>,
}

impl StructValue {
    pub fn new(schema: Arc<StructSchema>, fields: Vec<Value>) -> Self {
        Self { schema, fields }
    }

    pub fn schema(&self) -> &Arc<StructSchema> {
        &self.schema
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }

    /// Field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.field_index(name).and_then(|i| self.fields.get(i))
    }

    /// Iterates `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.fields.iter())
    }
}

// -- Convenience conversions --

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float32(f)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Self::Struct(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Int8(i) => write!(f, "{i}"),
            Self::Int16(i) => write!(f, "{i}"),
            Self::Int32(i) => write!(f, "{i}"),
            Self::Int64(i) => write!(f, "{i}"),
            Self::Uint(u) => write!(f, "{u}"),
            Self::Uint8(u) => write!(f, "{u}"),
            Self::Uint16(u) => write!(f, "{u}"),
            Self::Uint32(u) => write!(f, "{u}"),
            Self::Uint64(u) => write!(f, "{u}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Struct(s) => {
                write!(f, "{} {{", s.schema.name())?;
                for (i, (name, value)) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {name}: {value}")?;
                }
                write!(f, " }}")
            }
        }
    }
}
