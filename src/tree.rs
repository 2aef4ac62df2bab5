//! Prefix-sum tree over a fixed vector of nonnegative rates.
//!
//! Backbone of the fixed-direct sampler: point update, batch update,
//! total and inverse-CDF lookup all run in O(log N) or better.

/// Complete binary segment tree holding `len` nonnegative leaf weights.
/// Each internal node stores the sum of its children; the root is the
/// total weight.
#[derive(Clone, Debug)]
pub struct RateTree {
    len: usize,
    leaf_count: usize,
    data: Vec<f64>,
}

impl RateTree {
    /// Allocate a tree over `len` leaves, all zero.
    pub fn new(len: usize) -> Self {
        let base = len.max(1);
        let leaf_count = base.next_power_of_two();
        Self {
            len,
            leaf_count,
            data: vec![0.0; leaf_count * 2],
        }
    }

    /// Number of leaves the tree was allocated for.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of all leaf weights.
    pub fn total(&self) -> f64 {
        self.data[1]
    }

    /// Set leaf `idx` to `weight` and repair its ancestors.
    ///
    /// Repair sums children exactly, so `update(i, 0)` followed by
    /// `update(i, w)` restores the previous totals bitwise.
    pub fn update(&mut self, idx: usize, weight: f64) {
        assert!(idx < self.len, "leaf index {} out of range {}", idx, self.len);
        assert!(weight >= 0.0, "leaf weight must be nonnegative");
        let mut pos = self.leaf_count + idx;
        self.data[pos] = weight;
        while pos > 1 {
            pos >>= 1;
            self.data[pos] = self.data[pos << 1] + self.data[pos << 1 | 1];
        }
    }

    /// Write a batch of leaf weights, repairing the interior once.
    pub fn bulk_update(&mut self, updates: &[(usize, f64)]) {
        for &(idx, weight) in updates {
            assert!(idx < self.len, "leaf index {} out of range {}", idx, self.len);
            assert!(weight >= 0.0, "leaf weight must be nonnegative");
            self.data[self.leaf_count + idx] = weight;
        }
        for idx in (1..self.leaf_count).rev() {
            self.data[idx] = self.data[idx << 1] + self.data[idx << 1 | 1];
        }
    }

    /// Return the leaf `(idx, weight)` whose prefix interval contains
    /// `target`, with `0 <= target <= total()`. Zero-weight leaves are
    /// skipped left to right; the `target == total()` edge lands in the
    /// last nonzero leaf. Undefined when `total() == 0`.
    pub fn choose(&self, mut target: f64) -> (usize, f64) {
        debug_assert!(self.len > 0);
        debug_assert!(target >= 0.0);
        let mut node = 1usize;
        while node < self.leaf_count {
            let left = self.data[node << 1];
            if left > 0.0 && target <= left {
                node <<= 1;
            } else {
                target -= left;
                node = (node << 1) | 1;
            }
        }
        let idx = (node - self.leaf_count).min(self.len - 1);
        (idx, self.data[self.leaf_count + idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_repairs_ancestors() {
        let mut tree = RateTree::new(3);
        tree.update(0, 1.0);
        tree.update(1, 3.0);
        tree.update(2, 6.0);
        assert_eq!(tree.total(), 10.0);
        assert_eq!(tree.choose(0.5), (0, 1.0));
        assert_eq!(tree.choose(2.0), (1, 3.0));
        assert_eq!(tree.choose(9.5), (2, 6.0));
    }

    #[test]
    fn bulk_update_matches_point_updates() {
        let mut point = RateTree::new(5);
        let mut batch = RateTree::new(5);
        let writes = [(0, 0.5), (2, 2.5), (4, 1.0)];
        for &(idx, w) in &writes {
            point.update(idx, w);
        }
        batch.bulk_update(&writes);
        assert_eq!(point.total(), batch.total());
        assert_eq!(point.choose(2.9), batch.choose(2.9));
    }

    #[test]
    fn choose_skips_zero_leaves() {
        let mut tree = RateTree::new(4);
        tree.bulk_update(&[(1, 2.0), (3, 5.0)]);
        assert_eq!(tree.choose(0.0).0, 1);
        assert_eq!(tree.choose(1.9).0, 1);
        assert_eq!(tree.choose(2.5).0, 3);
        assert_eq!(tree.choose(7.0).0, 3);
    }

    #[test]
    fn fixed_slot_layout_tracks_disable() {
        // Slots {0: 1.0, 2: 3.0}; disabling slot 2 leaves total 1.0.
        let mut tree = RateTree::new(4);
        tree.bulk_update(&[(0, 1.0), (2, 3.0)]);
        assert_eq!(tree.total(), 4.0);
        assert_eq!(tree.choose(2.5).0, 2);
        tree.update(2, 0.0);
        assert_eq!(tree.total(), 1.0);
        assert_eq!(tree.choose(0.5).0, 0);
    }

    #[test]
    fn zero_then_restore_round_trips_bitwise() {
        let mut tree = RateTree::new(4);
        tree.bulk_update(&[(0, 0.1), (1, 0.2), (2, 0.3), (3, 0.4)]);
        let total = tree.total();
        let chosen = tree.choose(0.55);
        tree.update(2, 0.0);
        tree.update(2, 0.3);
        assert_eq!(tree.total(), total);
        assert_eq!(tree.choose(0.55), chosen);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn update_rejects_out_of_range_leaf() {
        let mut tree = RateTree::new(2);
        tree.update(2, 1.0);
    }
}
