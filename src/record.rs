//! Typed records: Rust structs that describe their own schema.
//!
//! A [`Record`] hands the codec an explicit [`StructSchema`] and indexed
//! field accessors in schema order, so encoding and decoding never inspect
//! memory layout. The [`record!`](crate::record!) macro writes both for a
//! plain struct declaration.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::{CodecError, Result};
use crate::types::{FieldType, StructSchema, StructValue, Value};

/// A struct type with a fixed, named field layout.
pub trait Record {
    /// The schema shared by every value of this type.
    fn schema() -> Arc<StructSchema>
    where
        Self: Sized;

    /// Value of the field at `index` (schema order).
    fn field(&self, index: usize) -> Option<Value>;

    /// Replaces the field at `index` (schema order).
    fn set_field(&mut self, index: usize, value: Value) -> Result<()>;
}

/// A Rust type that can sit in a record field.
pub trait FieldValue: Sized {
    fn field_type() -> FieldType;
    fn to_value(&self) -> Value;
    fn from_value(value: Value) -> Result<Self>;
}

/// Snapshot of `record` as a dynamic struct value.
pub fn to_struct_value<T: Record>(record: &T) -> StructValue {
    let schema = T::schema();
    let fields = (0..schema.len())
        .map(|i| record.field(i).unwrap_or(Value::Null))
        .collect();
    StructValue::new(schema, fields)
}

/// Copies the fields of `value` into `out`, matching them by name.
///
/// Every field of `value` must exist in `T`; fields of `T` missing from
/// `value` keep their current contents.
pub fn fill_record<T: Record>(out: &mut T, value: StructValue) -> Result<()> {
    let target = T::schema();
    let source = Arc::clone(value.schema());
    for (field, v) in source.fields().iter().zip(value.into_fields()) {
        let index = target.field_index(&field.name).ok_or_else(|| {
            CodecError::FieldNotFound(format!("{}.{}", target.name(), field.name))
        })?;
        out.set_field(index, v)?;
    }
    Ok(())
}

/// Builds a record from a struct value, starting from `T::default()`.
pub fn record_from_value<T: Record + Default>(value: Value) -> Result<T> {
    match value {
        Value::Struct(s) => {
            let mut out = T::default();
            fill_record(&mut out, s)?;
            Ok(out)
        }
        other => Err(CodecError::mismatch(T::schema().name(), other.type_name())),
    }
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn field_type() -> FieldType {
                    FieldType::$variant
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(CodecError::mismatch(Self::field_type(), other.type_name())),
                    }
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    usize => Uint,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
}

impl FieldValue for String {
    fn field_type() -> FieldType {
        FieldType::String
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(CodecError::mismatch("string", other.type_name())),
        }
    }
}

/// Stored as `any`: the concrete type travels with the payload.
impl FieldValue for Value {
    fn field_type() -> FieldType {
        FieldType::Any
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::slice(T::field_type())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(CodecError::mismatch(Self::field_type(), other.type_name())),
        }
    }
}

impl<K, V> FieldValue for HashMap<K, V>
where
    K: FieldValue + Eq + Hash,
    V: FieldValue,
{
    fn field_type() -> FieldType {
        FieldType::map(K::field_type(), V::field_type())
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(pairs) => pairs
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(CodecError::mismatch(Self::field_type(), other.type_name())),
        }
    }
}

/// Declares a struct together with its [`Record`] and [`FieldValue`] impls.
///
/// The string after `as` is the fully-qualified type name the registry
/// caches the schema under. A field may be given a wire name with
/// `=> "Name"`; otherwise the Rust field name is used. The struct must
/// implement `Default` to be decoded into a fresh value or nested in
/// another record.
///
/// ```
/// use transbin::record;
///
/// record! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Point as "geo.Point" {
///         pub x: i32 => "X",
///         pub y: i32 => "Y",
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident as $type_name:literal {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> $wire:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::record::Record for $name {
            fn schema() -> ::std::sync::Arc<$crate::types::StructSchema> {
                type Schema = ::std::sync::Arc<$crate::types::StructSchema>;
                static SCHEMA: ::std::sync::OnceLock<Schema> = ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(SCHEMA.get_or_init(|| {
                    ::std::sync::Arc::new(
                        $crate::types::StructSchema::builder($type_name)
                            $(
                                .field(
                                    $crate::__record_field_name!($field $(, $wire)?),
                                    <$ty as $crate::record::FieldValue>::field_type(),
                                )
                            )*
                            .build(),
                    )
                }))
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field(&self, index: usize) -> ::std::option::Option<$crate::types::Value> {
                let mut i = 0usize;
                $(
                    if index == i {
                        return ::std::option::Option::Some(
                            $crate::record::FieldValue::to_value(&self.$field),
                        );
                    }
                    i += 1;
                )*
                ::std::option::Option::None
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn set_field(
                &mut self,
                index: usize,
                value: $crate::types::Value,
            ) -> $crate::error::Result<()> {
                let mut i = 0usize;
                $(
                    if index == i {
                        self.$field = $crate::record::FieldValue::from_value(value)?;
                        return ::std::result::Result::Ok(());
                    }
                    i += 1;
                )*
                let _ = value;
                ::std::result::Result::Err($crate::error::CodecError::FieldNotFound(
                    ::std::format!("{}[{}]", $type_name, index),
                ))
            }
        }

        impl $crate::record::FieldValue for $name {
            fn field_type() -> $crate::types::FieldType {
                $crate::types::FieldType::Struct(<Self as $crate::record::Record>::schema())
            }

            fn to_value(&self) -> $crate::types::Value {
                $crate::types::Value::Struct($crate::record::to_struct_value(self))
            }

            fn from_value(value: $crate::types::Value) -> $crate::error::Result<Self> {
                $crate::record::record_from_value(value)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_field_name {
    ($field:ident) => {
        ::std::stringify!($field)
    };
    ($field:ident, $wire:literal) => {
        $wire
    };
}
