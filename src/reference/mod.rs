//! Out-of-band reference table: 2-byte length-prefixed blobs addressed by
//! sequential ids.
//!
//! Ids are positional. The writer hands out 1, 2, 3… in the order blobs are
//! laid down and the reader rebuilds the same numbering with one forward
//! pass; id 0 is never allocated.

pub mod reader;
pub mod writer;

pub use reader::ReferenceReader;
pub use writer::ReferenceWriter;

/// Maximum blob size (2-byte unsigned length = 65535).
pub const MAX_REFERENCE_LEN: usize = 65535;

/// Reference ids travel in a 2-byte slot.
pub type RefId = u16;

/// Id that never names a blob.
pub const NULL_REF: RefId = 0;
