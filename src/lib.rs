//! Transbin: a compact, self-describing binary codec for structured records.
//!
//! Records (structs with scalars, nested structs, strings, slices, maps and
//! polymorphic `any` fields) are written as a dense fixed-layout body plus
//! an out-of-band table of variable-length blobs. A message can carry the
//! struct descriptors it needs, so a fresh codec decodes it without any
//! prior schema.
//!
//! # Architecture
//!
//! - **`types`**: Type ids, schema descriptions, the dynamic `Value` tree
//! - **`buffer`**: Byte buffers with a cursor and saved-state stack
//! - **`reference`**: Reference table of length-prefixed blobs
//! - **`registry`**: Struct type ids and cached field layouts
//! - **`record`**: `Record` trait and `record!` macro for typed structs
//! - **`codec`**: Encoder, decoder, schema header and the `Codec` facade
//!
//! # Example
//!
//! ```
//! use transbin::{ByteOrder, Codec, record};
//!
//! record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Reading as "sensor.Reading" {
//!         pub id: i32 => "Id",
//!         pub value: f32 => "Value",
//!         pub tags: Vec<String> => "Tags",
//!     }
//! }
//!
//! let reading = Reading { id: 49, value: 32720.2383, tags: vec!["north".into()] };
//!
//! let mut sender = Codec::new(ByteOrder::Big);
//! let bytes = sender.encode_full(&reading)?;
//!
//! let mut receiver = Codec::new(ByteOrder::Big);
//! let mut out = Reading::default();
//! receiver.decode(&mut out, &bytes)?;
//! assert_eq!(out, reading);
//! # Ok::<(), transbin::CodecError>(())
//! ```

pub mod buffer;
pub mod codec;
pub mod error;
pub mod record;
pub mod reference;
pub mod registry;
pub mod types;

pub use buffer::ByteOrder;
pub use codec::{Codec, CodecBuilder};
pub use error::{CodecError, Result};
pub use record::{FieldValue, Record};
pub use registry::TypeRegistry;
pub use types::{FieldType, StructSchema, StructValue, TypeId, Value};
