//! Growable byte staging buffer for one tick's worth of wire output.
//!
//! Ported from `encode_buffer_alloc/append/reset/free` in
//! `examples/original_source/src/lorinterface/encode.c`. The C version
//! manages its own `realloc`-doubled heap block; here that's just a `Vec<u8>`
//! that never shrinks during a run and is cleared (not deallocated) between
//! ticks.

const GROW_SCALE: usize = 2;
const INITIAL_CAPACITY: usize = 256;

/// Append-only byte buffer for one tick's encoded wire messages.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Ensure room for `additional` more bytes without reallocating mid-write,
    /// growing geometrically like the C buffer's `ENCODE_BUFFER_LENGTH_GROW_SCALE`.
    pub fn reserve(&mut self, additional: usize) {
        if self.bytes.capacity() - self.bytes.len() >= additional {
            return;
        }
        let needed = self.bytes.len() + additional;
        let mut new_cap = self.bytes.capacity().max(INITIAL_CAPACITY);
        while new_cap < needed {
            new_cap *= GROW_SCALE;
        }
        self.bytes.reserve(new_cap - self.bytes.len());
    }

    /// Append `data`, growing the backing store first if needed.
    pub fn append(&mut self, data: &[u8]) {
        self.reserve(data.len());
        self.bytes.extend_from_slice(data);
    }

    /// Clear contents for the next tick. Capacity is retained.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Release the backing allocation entirely, for use between sequences
    /// so one oversized show entry doesn't keep capacity pinned.
    pub fn free(&mut self) {
        self.bytes = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_accumulates_bytes_in_order() {
        let mut buf = OutputBuffer::new();
        buf.append(&[1, 2, 3]);
        buf.append(&[4, 5]);
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn reset_clears_but_keeps_capacity() {
        let mut buf = OutputBuffer::new();
        buf.append(&[1; 1000]);
        let cap_before = buf.bytes.capacity();
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.bytes.capacity(), cap_before);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut buf = OutputBuffer::new();
        buf.append(&vec![0u8; 10_000]);
        assert_eq!(buf.len(), 10_000);
    }
}
