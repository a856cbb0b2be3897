//! Appends length-prefixed blobs and hands out their ids.

use super::{MAX_REFERENCE_LEN, RefId};
use crate::buffer::{Branch, Buffer, ByteOrder};
use crate::error::{CodecError, Result};

/// Writer half of the reference table.
///
/// An id and its blob slot are allocated together by [`reserve`], so the
/// writer can never promise an id whose bytes land out of order. The
/// payload may be filled after further blobs were appended, which is how a
/// blob holding nested reference ids is written.
///
/// [`reserve`]: ReferenceWriter::reserve
#[derive(Debug)]
pub struct ReferenceWriter {
    buf: Buffer,
    next_id: u32,
    width: u8,
    limit: u32,
}

impl ReferenceWriter {
    /// Creates a writer whose ids are `address_width` bits wide.
    ///
    /// The width must be a multiple of 8 and fit the 2-byte id slot.
    pub fn new(address_width: u8, capacity: usize, order: ByteOrder) -> Result<Self> {
        if address_width == 0 || address_width % 8 != 0 || address_width > 16 {
            return Err(CodecError::InvalidConfig(format!(
                "reference address width must be 8 or 16 bits, got {address_width}"
            )));
        }
        Ok(Self::with_width(address_width, capacity, order))
    }

    /// Creates a writer with 16-bit ids.
    pub fn with_capacity(capacity: usize, order: ByteOrder) -> Self {
        Self::with_width(16, capacity, order)
    }

    fn with_width(width: u8, capacity: usize, order: ByteOrder) -> Self {
        Self {
            buf: Buffer::with_capacity(capacity, order),
            next_id: 1,
            width,
            limit: (1u32 << width) - 1,
        }
    }

    /// Forgets every blob; the next id is 1 again.
    pub fn reset(&mut self) {
        self.buf.reset();
        self.next_id = 1;
    }

    /// The id the next reservation will receive.
    pub fn peek_id(&self) -> RefId {
        self.next_id as RefId
    }

    /// Number of blobs written since the last reset.
    pub fn count(&self) -> usize {
        (self.next_id - 1) as usize
    }

    pub fn address_width(&self) -> u8 {
        self.width
    }

    /// Allocates the next id and a zeroed `len`-byte blob at the end of the
    /// table, preserving the buffer cursor.
    pub fn reserve(&mut self, len: usize) -> Result<(RefId, Branch)> {
        if len > MAX_REFERENCE_LEN {
            return Err(CodecError::LengthOverflow(len));
        }
        if self.next_id >= self.limit {
            return Err(CodecError::AddressOverflow { width: self.width });
        }
        let id = self.next_id as RefId;
        self.next_id += 1;
        let region = self.buf.append_with(|b| {
            b.put_u16(len as u16);
            b.branch(len)
        });
        Ok((id, region))
    }

    /// Appends a complete blob.
    pub fn put(&mut self, data: &[u8]) -> Result<RefId> {
        let (id, region) = self.reserve(data.len())?;
        self.buf.with_branch(region, |b| b.write_bytes(data));
        Ok(id)
    }

    /// Buffer the blobs live in, for filling reserved regions.
    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buf
    }

    pub fn bytes(&self) -> &[u8] {
        self.buf.bytes()
    }
}
