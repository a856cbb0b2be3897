//! Growable byte buffers with a cursor, a fixed byte order, and a stack of
//! saved positions for writing into reserved regions.

pub mod reader;
pub mod writer;

pub use reader::ReadBuffer;
pub use writer::{Branch, Buffer};

/// Byte order of every multi-byte number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}
