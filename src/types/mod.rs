//! Type ids, schema descriptions and the dynamic value tree.

mod kind;
mod schema;
mod value;

pub use kind::{ARRAY_FLAG, FIRST_STRUCT_ID, Kind, PRIMITIVE_MAX, TypeId};
pub use schema::{FieldType, MAX_NAME_LEN, SchemaField, StructSchema, StructSchemaBuilder};
pub use value::{StructValue, Value};

pub(crate) use schema::truncate_name;
