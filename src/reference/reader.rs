//! Indexes the reference table of a decoded message.

use super::RefId;
use crate::buffer::{ByteOrder, ReadBuffer};
use crate::error::{CodecError, Result};

/// Reader half of the reference table.
///
/// [`init`](Self::init) walks the blobs once and records where each one
/// starts; [`get`](Self::get) re-reads the length prefix and returns a view
/// into the input without copying.
#[derive(Debug)]
pub struct ReferenceReader<'a> {
    buf: ReadBuffer<'a>,
    offsets: Vec<usize>,
}

impl<'a> ReferenceReader<'a> {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            buf: ReadBuffer::new(&[], order),
            offsets: Vec::new(),
        }
    }

    /// Indexes `data`, which must consist of whole `[u16 len][len bytes]`
    /// blobs.
    pub fn init(&mut self, data: &'a [u8]) -> Result<()> {
        self.buf.init(data);
        self.offsets.clear();
        while self.buf.remaining() > 0 {
            self.offsets.push(self.buf.position());
            let len = self.buf.read_u16()? as usize;
            self.buf.next(len)?;
        }
        Ok(())
    }

    /// Number of indexed blobs.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Payload of blob `id`.
    pub fn get(&mut self, id: RefId) -> Result<&'a [u8]> {
        let offset = match (id as usize).checked_sub(1) {
            Some(index) if index < self.offsets.len() => self.offsets[index],
            _ => return Err(CodecError::InvalidReference(id)),
        };
        self.buf.goto_pos(offset)?;
        let len = self.buf.read_u16()? as usize;
        self.buf.read_bytes(len)
    }
}
