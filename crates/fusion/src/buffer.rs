//! Per-source slot-indexed window buffer.
//!
//! A fixed-capacity array of `Option<T>` addressed by slot index relative to
//! a start slot the coordinator shares across all sibling buffers. The buffer
//! itself never decides when to shift; the coordinator shifts every sibling
//! by the same amount so all buffers keep one slot index space.

/// Fixed-capacity slotted buffer.
#[derive(Debug, Clone)]
pub struct SlottedWindowBuffer<T> {
    slots: Vec<Option<T>>,
    filled: usize,
    last_filled: Option<usize>,
}

impl<T> SlottedWindowBuffer<T> {
    /// Create an empty buffer with the given slot capacity.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            filled: 0,
            last_filled: None,
        }
    }

    /// Slot capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Store a value at a relative slot index.
    ///
    /// The index must be below capacity; the coordinator shifts the global
    /// window before storing when it is not. Storing into an occupied slot
    /// replaces the value.
    pub fn store(&mut self, index: usize, value: T) {
        debug_assert!(index < self.slots.len());
        if self.slots[index].is_none() {
            self.filled += 1;
        }
        self.slots[index] = Some(value);
        self.last_filled = Some(self.last_filled.map_or(index, |last| last.max(index)));
    }

    /// Value at a relative slot index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    /// Shift the window left by `k` slots, zero-filling the vacated tail.
    ///
    /// Retained values keep their relative order; shifting by at least the
    /// capacity clears the buffer entirely.
    pub fn shift_left(&mut self, k: usize) {
        if k == 0 {
            return;
        }
        if k >= self.slots.len() {
            self.clear();
            return;
        }

        self.slots.rotate_left(k);
        let tail_start = self.slots.len() - k;
        for slot in &mut self.slots[tail_start..] {
            if slot.take().is_some() {
                self.filled -= 1;
            }
        }
        self.last_filled = self.scan_last_filled();
    }

    /// Drop all values.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.filled = 0;
        self.last_filled = None;
    }

    /// Last slot index holding a value, if any.
    #[inline]
    pub fn last_filled(&self) -> Option<usize> {
        self.last_filled
    }

    /// Number of filled slots.
    #[inline]
    pub fn filled_count(&self) -> usize {
        self.filled
    }

    /// Fraction of the retained window holding real data:
    /// `filled / (last_filled + 1)`. Diagnostics only.
    pub fn sparsity(&self) -> f64 {
        match self.last_filled {
            Some(last) => self.filled as f64 / (last + 1) as f64,
            None => 0.0,
        }
    }

    fn scan_last_filled(&self) -> Option<usize> {
        self.slots.iter().rposition(|slot| slot.is_some())
    }
}

impl<T: Clone> SlottedWindowBuffer<T> {
    /// Clone the slot prefix `[0..len]` for snapshot publication.
    pub fn prefix(&self, len: usize) -> Vec<Option<T>> {
        self.slots[..len.min(self.slots.len())].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_get() {
        let mut buffer: SlottedWindowBuffer<u32> = SlottedWindowBuffer::new(8);
        buffer.store(3, 30);
        buffer.store(1, 10);

        assert_eq!(buffer.get(1), Some(&10));
        assert_eq!(buffer.get(3), Some(&30));
        assert_eq!(buffer.get(2), None);
        assert_eq!(buffer.last_filled(), Some(3));
        assert_eq!(buffer.filled_count(), 2);
    }

    #[test]
    fn store_replaces_without_double_count() {
        let mut buffer: SlottedWindowBuffer<u32> = SlottedWindowBuffer::new(4);
        buffer.store(2, 1);
        buffer.store(2, 2);
        assert_eq!(buffer.filled_count(), 1);
        assert_eq!(buffer.get(2), Some(&2));
    }

    #[test]
    fn shift_preserves_relative_order() {
        let mut buffer: SlottedWindowBuffer<u32> = SlottedWindowBuffer::new(6);
        for i in 0..6 {
            buffer.store(i, i as u32);
        }

        buffer.shift_left(2);

        // 0 and 1 fell off; 2..=5 moved to indices 0..=3.
        assert_eq!(buffer.get(0), Some(&2));
        assert_eq!(buffer.get(3), Some(&5));
        assert_eq!(buffer.get(4), None);
        assert_eq!(buffer.get(5), None);
        assert_eq!(buffer.last_filled(), Some(3));
        assert_eq!(buffer.filled_count(), 4);
    }

    #[test]
    fn shift_leaves_exactly_k_empty_tail_slots() {
        let mut buffer: SlottedWindowBuffer<u32> = SlottedWindowBuffer::new(5);
        for i in 0..5 {
            buffer.store(i, i as u32);
        }
        buffer.shift_left(3);
        assert_eq!(buffer.filled_count(), 2);
        for i in 2..5 {
            assert_eq!(buffer.get(i), None);
        }
    }

    #[test]
    fn shift_by_capacity_clears() {
        let mut buffer: SlottedWindowBuffer<u32> = SlottedWindowBuffer::new(4);
        buffer.store(0, 1);
        buffer.store(3, 2);

        buffer.shift_left(4);
        assert_eq!(buffer.filled_count(), 0);
        assert_eq!(buffer.last_filled(), None);

        buffer.store(1, 9);
        buffer.shift_left(100);
        assert_eq!(buffer.filled_count(), 0);
    }

    #[test]
    fn sparsity_over_retained_window() {
        let mut buffer: SlottedWindowBuffer<u32> = SlottedWindowBuffer::new(10);
        assert_eq!(buffer.sparsity(), 0.0);

        buffer.store(0, 1);
        buffer.store(3, 2);
        // 2 filled of 4 retained slots
        assert!((buffer.sparsity() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn prefix_clones_leading_slots() {
        let mut buffer: SlottedWindowBuffer<u32> = SlottedWindowBuffer::new(4);
        buffer.store(0, 7);
        buffer.store(2, 8);

        let prefix = buffer.prefix(3);
        assert_eq!(prefix, vec![Some(7), None, Some(8)]);
    }
}
