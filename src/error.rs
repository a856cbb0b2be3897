//! Error types for the codec.

use crate::types::TypeId;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while registering, encoding or decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unsupported kind: {0}")]
    UnsupportedKind(String),

    #[error("unknown type id {0}")]
    UnknownType(TypeId),

    #[error("reference payload of {0} bytes exceeds 65535")]
    LengthOverflow(usize),

    #[error("reference id space of {width} bits exhausted")]
    AddressOverflow { width: u8 },

    #[error("out of bounds: need {needed} bytes but only {remaining} remaining")]
    OutOfBounds { needed: usize, remaining: usize },

    #[error("output is not addressable: {0}")]
    NotAddressable(String),

    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// Never returned: reported through `tracing` when a name is truncated.
    #[error("field name `{name}` is {len} bytes long, truncated to 255")]
    FieldNameTooLong { name: String, len: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("invalid reference id {0}")]
    InvalidReference(u16),

    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,

    #[error("struct type id space exhausted")]
    TypeSpaceExhausted,

    #[error("struct `{name}` has {count} fields, at most 255 are supported")]
    TooManyFields { name: String, count: usize },

    #[error("{0} struct types in one message, at most 255 are supported")]
    TooManyTypes(usize),

    #[error("integer {0} does not fit a 32-bit slot")]
    IntegerOverflow(i128),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CodecError {
    /// Builds a type mismatch from anything displayable.
    pub fn mismatch(expected: impl std::fmt::Display, found: impl std::fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Returns `true` for errors caused by reading past the end of the input.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}
