//! Read side: a bounds-checked cursor over borrowed bytes.

use bytes::Buf;

use super::ByteOrder;
use crate::error::{CodecError, Result};

/// Cursor over an input slice.
///
/// `push_state` redirects the cursor to another slice (usually a reference
/// blob borrowed from the same input) and `pop_state` returns to the saved
/// slice and position. Every read fails with `OutOfBounds` instead of
/// running past the end.
#[derive(Debug)]
pub struct ReadBuffer<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
    states: Vec<(&'a [u8], usize)>,
}

macro_rules! read_number {
    ($name:ident, $ty:ty, $be:ident, $le:ident) => {
        pub fn $name(&mut self) -> Result<$ty> {
            let order = self.order;
            let mut src = self.take(std::mem::size_of::<$ty>())?;
            Ok(match order {
                ByteOrder::Big => src.$be(),
                ByteOrder::Little => src.$le(),
            })
        }
    };
}

impl<'a> ReadBuffer<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            pos: 0,
            order,
            states: Vec::new(),
        }
    }

    /// Points the buffer at fresh input, dropping saved states.
    pub fn init(&mut self, data: &'a [u8]) {
        self.data = data;
        self.pos = 0;
        self.states.clear();
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    fn ensure_remaining(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if remaining < needed {
            Err(CodecError::OutOfBounds { needed, remaining })
        } else {
            Ok(())
        }
    }

    /// Borrows the next `n` bytes and moves past them.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure_remaining(n)?;
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..start + n])
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    read_number!(read_u16, u16, get_u16, get_u16_le);
    read_number!(read_i16, i16, get_i16, get_i16_le);
    read_number!(read_u32, u32, get_u32, get_u32_le);
    read_number!(read_i32, i32, get_i32, get_i32_le);
    read_number!(read_u64, u64, get_u64, get_u64_le);
    read_number!(read_i64, i64, get_i64, get_i64_le);
    read_number!(read_f32, f32, get_f32, get_f32_le);
    read_number!(read_f64, f64, get_f64, get_f64_le);

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_byte()? as i8)
    }

    /// Skips `n` bytes.
    pub fn next(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Seeks to an absolute position; the end of the input is allowed.
    pub fn goto_pos(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(CodecError::OutOfBounds {
                needed: pos,
                remaining: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Saves the current slice and cursor, then reads `data` from `at`.
    pub fn push_state(&mut self, data: &'a [u8], at: usize) {
        self.states.push((self.data, self.pos));
        self.data = data;
        self.pos = at.min(data.len());
    }

    /// Restores the slice and cursor saved by the matching `push_state`.
    pub fn pop_state(&mut self) {
        match self.states.pop() {
            Some((data, pos)) => {
                self.data = data;
                self.pos = pos;
            }
            None => tracing::warn!("pop_state without a pushed state"),
        }
    }

    pub fn in_pushed_state(&self) -> bool {
        !self.states.is_empty()
    }
}
