//! Bounded pool of RGBA8 scratch buffers for per-layer intermediates.
//!
//! Keyed by byte length. Borrow/release happens once per layer per frame,
//! never per pixel, so hash lookup cost is irrelevant here.

use std::collections::HashMap;

const MAX_BUFFERS_PER_BUCKET: usize = 8;

#[derive(Default)]
pub(crate) struct BufferPool {
    buckets: HashMap<usize, Vec<Vec<u8>>>,
}

impl BufferPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A zeroed buffer of exactly `len` bytes, reused when one is pooled.
    pub(crate) fn borrow(&mut self, len: usize) -> Vec<u8> {
        if let Some(mut buf) = self.buckets.get_mut(&len).and_then(|bucket| bucket.pop()) {
            buf.fill(0);
            return buf;
        }
        vec![0u8; len]
    }

    /// Return a buffer for reuse. Buffers beyond the bucket cap are dropped.
    pub(crate) fn release(&mut self, buf: Vec<u8>) {
        let bucket = self.buckets.entry(buf.len()).or_default();
        if bucket.len() < MAX_BUFFERS_PER_BUCKET {
            bucket.push(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrow_returns_zeroed_reused_buffer() {
        let mut pool = BufferPool::new();
        let mut a = pool.borrow(16);
        a.fill(0xAB);
        pool.release(a);

        let b = pool.borrow(16);
        assert_eq!(b.len(), 16);
        assert!(b.iter().all(|&x| x == 0));
    }

    #[test]
    fn buckets_are_keyed_by_length() {
        let mut pool = BufferPool::new();
        pool.release(vec![1u8; 8]);
        let b = pool.borrow(16);
        assert_eq!(b.len(), 16);
    }

    #[test]
    fn bucket_cap_bounds_retention() {
        let mut pool = BufferPool::new();
        for _ in 0..(MAX_BUFFERS_PER_BUCKET + 4) {
            pool.release(vec![0u8; 8]);
        }
        assert_eq!(pool.buckets[&8].len(), MAX_BUFFERS_PER_BUCKET);
    }
}
