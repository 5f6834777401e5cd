//! Symmetric matrix of per-pair axis-overlap counters.

/// Largest counter value: the pair overlaps on all three axes.
pub const FULL_OVERLAP: u8 = 3;

/// Position of the unordered pair `(row, column)` in triangular storage.
///
/// The larger index is used as row. `row == column` has no slot.
#[inline]
pub fn triangular_index(row: usize, column: usize) -> usize {
    let (row, column) = if row < column {
        (column, row)
    } else {
        (row, column)
    };
    debug_assert!(row != column, "the diagonal has no counter");
    row * (row - 1) / 2 + column
}

/// Saturating counters in `[0, 3]` for every unordered pair of body slots
/// below `capacity`.
#[derive(Debug, Clone, Default)]
pub struct TriangularBitMatrix {
    counters: Vec<u8>,
    capacity: usize,
}

impl TriangularBitMatrix {
    /// Create a new matrix with every counter at zero.
    pub fn new(capacity: usize) -> Self {
        let mut matrix = Self::default();
        matrix.set_capacity(capacity);
        matrix
    }

    fn storage_len(capacity: usize) -> usize {
        capacity * capacity.saturating_sub(1) / 2
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resize to hold `capacity` slots. Counters of pairs below both the old
    /// and new capacity are kept, new ones start at zero.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.counters.resize(Self::storage_len(capacity), 0);
        self.capacity = capacity;
    }

    pub fn zero_all(&mut self) {
        self.counters.fill(0);
    }

    /// Counter of the pair; argument order does not matter.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> u8 {
        self.counters[triangular_index(row, column)]
    }

    /// Overwrite the counter of the pair, saturating at [`FULL_OVERLAP`].
    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: u8) {
        self.counters[triangular_index(row, column)] = value.min(FULL_OVERLAP);
    }

    /// Add one axis overlap and return the new count.
    #[inline]
    pub fn increment(&mut self, row: usize, column: usize) -> u8 {
        let counter = &mut self.counters[triangular_index(row, column)];
        *counter = (*counter + 1).min(FULL_OVERLAP);
        *counter
    }

    /// Remove one axis overlap and return the new count.
    #[inline]
    pub fn decrement(&mut self, row: usize, column: usize) -> u8 {
        let counter = &mut self.counters[triangular_index(row, column)];
        *counter = counter.saturating_sub(1);
        *counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangular_index_is_dense_and_symmetric() {
        let mut seen = std::collections::HashSet::new();
        for row in 1..20 {
            for column in 0..row {
                let index = triangular_index(row, column);
                assert_eq!(index, triangular_index(column, row));
                assert!(seen.insert(index), "duplicate index {index}");
            }
        }
        assert_eq!(seen.len(), 20 * 19 / 2);
        assert_eq!(*seen.iter().max().unwrap(), 20 * 19 / 2 - 1);
    }

    #[test]
    fn test_counter_saturates() {
        let mut m = TriangularBitMatrix::new(4);
        assert_eq!(m.increment(1, 3), 1);
        assert_eq!(m.increment(3, 1), 2);
        assert_eq!(m.increment(1, 3), 3);
        assert_eq!(m.increment(1, 3), 3);
        assert_eq!(m.decrement(3, 1), 2);
        assert_eq!(m.decrement(3, 1), 1);
        assert_eq!(m.decrement(3, 1), 0);
        assert_eq!(m.decrement(3, 1), 0);
    }

    #[test]
    fn test_pairs_are_independent() {
        let mut m = TriangularBitMatrix::new(5);
        m.increment(0, 1);
        m.increment(2, 4);
        m.increment(2, 4);
        assert_eq!(m.get(1, 0), 1);
        assert_eq!(m.get(4, 2), 2);
        assert_eq!(m.get(3, 2), 0);
    }

    #[test]
    fn test_resize_keeps_existing_counters() {
        let mut m = TriangularBitMatrix::new(3);
        m.set(2, 1, 3);
        m.set(1, 0, 2);
        m.set_capacity(10);
        assert_eq!(m.capacity(), 10);
        assert_eq!(m.get(2, 1), 3);
        assert_eq!(m.get(1, 0), 2);
        assert_eq!(m.get(9, 8), 0);

        m.set_capacity(3);
        assert_eq!(m.get(2, 1), 3);
    }

    #[test]
    fn test_zero_all() {
        let mut m = TriangularBitMatrix::new(4);
        m.set(3, 0, 3);
        m.zero_all();
        assert_eq!(m.get(0, 3), 0);
    }

    #[test]
    fn test_set_clamps() {
        let mut m = TriangularBitMatrix::new(2);
        m.set(0, 1, 9);
        assert_eq!(m.get(1, 0), 3);
    }
}
