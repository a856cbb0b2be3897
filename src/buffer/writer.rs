//! Write side: a cursor over a growable `BytesMut`.

use bytes::{BufMut, BytesMut};

use super::ByteOrder;

/// A region reserved by [`Buffer::branch`], to be filled later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    start: usize,
    len: usize,
}

impl Branch {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Growable write buffer.
///
/// Writes land at the cursor, overwriting reserved bytes or extending the
/// buffer. `push_state`/`pop_state` save and restore the cursor so a nested
/// writer can fill a reserved region (or append at the end) and hand the
/// buffer back positioned where its caller left it.
#[derive(Debug)]
pub struct Buffer {
    data: BytesMut,
    pos: usize,
    order: ByteOrder,
    states: Vec<usize>,
}

macro_rules! put_number {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $be:ident, $le:ident) => {
        $(#[$meta])*
        pub fn $name(&mut self, value: $ty) {
            let order = self.order;
            let mut slot = self.slot(std::mem::size_of::<$ty>());
            match order {
                ByteOrder::Big => slot.$be(value),
                ByteOrder::Little => slot.$le(value),
            }
        }
    };
}

impl Buffer {
    pub fn new(order: ByteOrder) -> Self {
        Self::with_capacity(0, order)
    }

    pub fn with_capacity(capacity: usize, order: ByteOrder) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            pos: 0,
            order,
            states: Vec::new(),
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Current cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of valid bytes, including reserved regions.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Valid written bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Drops all content and saved states, keeping the allocation.
    pub fn reset(&mut self) {
        self.data.clear();
        self.pos = 0;
        self.states.clear();
    }

    /// Makes `n` bytes available at the cursor, growing at least twofold
    /// when the allocation is too small.
    fn ensure(&mut self, n: usize) {
        let end = self.pos + n;
        if end <= self.data.len() {
            return;
        }
        if end > self.data.capacity() {
            let grow = self.data.capacity().max(end - self.data.len());
            self.data.reserve(grow);
        }
        self.data.resize(end, 0);
    }

    /// Returns the next `n` bytes as a writable slot and moves past them.
    fn slot(&mut self, n: usize) -> &mut [u8] {
        self.ensure(n);
        let start = self.pos;
        self.pos += n;
        &mut self.data[start..start + n]
    }

    pub fn write_bytes(&mut self, src: &[u8]) {
        self.slot(src.len()).copy_from_slice(src);
    }

    pub fn write_byte(&mut self, value: u8) {
        self.slot(1)[0] = value;
    }

    put_number!(put_u16, u16, put_u16, put_u16_le);
    put_number!(put_i16, i16, put_i16, put_i16_le);
    put_number!(put_u32, u32, put_u32, put_u32_le);
    put_number!(put_i32, i32, put_i32, put_i32_le);
    put_number!(put_u64, u64, put_u64, put_u64_le);
    put_number!(put_i64, i64, put_i64, put_i64_le);
    put_number!(put_f32, f32, put_f32, put_f32_le);
    put_number!(put_f64, f64, put_f64, put_f64_le);

    /// Reserves `n` zeroed bytes at the cursor and moves past them.
    pub fn branch(&mut self, n: usize) -> Branch {
        let start = self.pos;
        self.ensure(n);
        self.pos += n;
        Branch { start, len: n }
    }

    /// Skips `n` bytes, zero-filling any that did not exist yet.
    pub fn next(&mut self, n: usize) {
        self.ensure(n);
        self.pos += n;
    }

    /// Saves the cursor and moves it to `at`, which must not lie past the
    /// end of the buffer.
    pub fn push_state(&mut self, at: usize) {
        debug_assert!(at <= self.data.len(), "push_state past end of buffer");
        self.states.push(self.pos);
        self.pos = at;
    }

    /// Restores the cursor saved by the matching `push_state`.
    pub fn pop_state(&mut self) {
        match self.states.pop() {
            Some(pos) => self.pos = pos,
            None => tracing::warn!("pop_state without a pushed state"),
        }
    }

    pub fn in_pushed_state(&self) -> bool {
        !self.states.is_empty()
    }

    /// Runs `f` with the cursor at the start of `branch`, then restores it.
    pub fn with_branch<R>(&mut self, branch: Branch, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_state(branch.start);
        let result = f(self);
        debug_assert!(self.pos <= branch.end(), "branch overrun");
        self.pop_state();
        result
    }

    /// Runs `f` with the cursor at the end of the buffer, then restores it.
    pub fn append_with<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_state(self.data.len());
        let result = f(self);
        self.pop_state();
        result
    }
}
