//! Primitive kind codes and the 16-bit type id space.

use std::fmt;

/// Highest code reserved for primitive kinds.
pub const PRIMITIVE_MAX: u16 = 26;

/// First id handed out to a registered struct type.
pub const FIRST_STRUCT_ID: u16 = PRIMITIVE_MAX + 1;

/// Bit 15 marks "array of the type named by the low 15 bits".
pub const ARRAY_FLAG: u16 = 1 << 15;

/// Primitive kinds with a wire encoding.
///
/// Codes are part of the wire format. Gaps are reserved kinds with no
/// encoding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Kind {
    Bool = 1,
    Int = 2,
    Int8 = 3,
    Int16 = 4,
    Int32 = 5,
    Int64 = 6,
    Uint = 7,
    Uint8 = 8,
    Uint16 = 9,
    Uint32 = 10,
    Uint64 = 11,
    Float32 = 13,
    Float64 = 14,
    Interface = 20,
    Map = 21,
    Slice = 23,
    String = 24,
    Struct = 25,
}

impl Kind {
    /// Maps a raw code back to a kind with a wire rule.
    pub fn from_code(code: u16) -> Option<Self> {
        let kind = match code {
            1 => Self::Bool,
            2 => Self::Int,
            3 => Self::Int8,
            4 => Self::Int16,
            5 => Self::Int32,
            6 => Self::Int64,
            7 => Self::Uint,
            8 => Self::Uint8,
            9 => Self::Uint16,
            10 => Self::Uint32,
            11 => Self::Uint64,
            13 => Self::Float32,
            14 => Self::Float64,
            20 => Self::Interface,
            21 => Self::Map,
            23 => Self::Slice,
            24 => Self::String,
            25 => Self::Struct,
            _ => return None,
        };
        Some(kind)
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Bytes the kind occupies in a fixed-size slot.
    ///
    /// Reference kinds (string, slice, interface) hold a 2-byte id; a map
    /// slot additionally carries its element and key type ids. `Struct` has
    /// no size of its own, registered structs are sized by the registry.
    pub fn slot_size(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Int8 | Self::Uint8 => Some(1),
            Self::Int16 | Self::Uint16 => Some(2),
            Self::String | Self::Slice | Self::Interface => Some(2),
            Self::Map => Some(6),
            Self::Int | Self::Int32 | Self::Uint | Self::Uint32 | Self::Float32 => Some(4),
            Self::Int64 | Self::Uint64 | Self::Float64 => Some(8),
            Self::Struct => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Interface => "any",
            Self::Map => "map",
            Self::Slice => "slice",
            Self::String => "string",
            Self::Struct => "struct",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 16-bit wire type id: a primitive kind code, a registered struct id,
/// or either of those with [`ARRAY_FLAG`] set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u16);

impl TypeId {
    /// Id 0 never names a type; a null `any` carries it.
    pub const INVALID: TypeId = TypeId(0);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn is_array(self) -> bool {
        self.0 & ARRAY_FLAG != 0
    }

    /// Sets the array flag. `self` must not already be an array id.
    pub const fn with_array_flag(self) -> Self {
        Self(self.0 | ARRAY_FLAG)
    }

    /// Strips the array flag, yielding the element type.
    pub const fn element_type(self) -> Self {
        Self(self.0 & !ARRAY_FLAG)
    }

    /// Registered struct ids live above the primitive range.
    pub const fn is_struct(self) -> bool {
        !self.is_array() && self.0 > PRIMITIVE_MAX
    }

    /// The primitive kind, for non-array ids in the primitive range.
    pub fn kind(self) -> Option<Kind> {
        if self.is_array() || self.0 > PRIMITIVE_MAX {
            None
        } else {
            Kind::from_code(self.0)
        }
    }
}

impl From<Kind> for TypeId {
    fn from(kind: Kind) -> Self {
        Self(kind.code())
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array() {
            write!(f, "[]{}", self.element_type())
        } else if self.is_struct() {
            write!(f, "struct#{}", self.0)
        } else {
            match self.kind() {
                Some(kind) => write!(f, "{kind}"),
                None => write!(f, "kind#{}", self.0),
            }
        }
    }
}
