//! Bounded display history with drop-oldest eviction.

use heapless::HistoryBuf as HistoryBuffer;

/// Default number of points kept for display.
pub const DEFAULT_HISTORY_LEN: usize = 250;

/// Fixed-capacity ring of the most recent `N` values.
///
/// Pushing into a full history silently evicts the oldest entry; it never
/// blocks or allocates.
pub struct History<T: Copy, const N: usize = DEFAULT_HISTORY_LEN> {
    buf: HistoryBuffer<T, N>,
    evicted: u64,
}

impl<T: Copy, const N: usize> Default for History<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> History<T, N> {
    pub fn new() -> Self {
        Self {
            buf: HistoryBuffer::new(),
            evicted: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.buf.is_full() {
            self.evicted += 1;
        }
        self.buf.write(value);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// Most recently pushed value.
    pub fn latest(&self) -> Option<&T> {
        self.buf.recent()
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.oldest_ordered()
    }

    /// Total entries evicted since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut h: History<u32, 4> = History::new();
        for i in 0..3 {
            h.push(i);
        }
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(h.latest(), Some(&2));
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut h: History<u32, 4> = History::new();
        for i in 0..10 {
            h.push(i);
        }
        assert_eq!(h.len(), 4);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![6, 7, 8, 9]);
        assert_eq!(h.evicted(), 6);
    }

    #[test]
    fn default_capacity() {
        let h: History<f32> = History::new();
        assert_eq!(h.capacity(), 250);
        assert!(h.is_empty());
        assert_eq!(h.latest(), None);
    }
}
