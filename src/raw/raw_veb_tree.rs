use alloc::collections::TryReserveError;
use core::fmt;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Branches, LEAF_EXPONENT, Node, split_exponent};

/// The core van Emde Boas tree backing `VebSet`.
///
/// Every node of the recursive shape is allocated up front in one arena. A
/// node refers to its clusters and summary by handle, and the clusters of one
/// node occupy consecutive slots so cluster `high` is `first_cluster + high`.
///
/// Values passed to the `*_at` helpers must lie inside that node's universe;
/// the public entry points check the root universe once and trust the split
/// arithmetic below it.
#[derive(Clone)]
pub(crate) struct RawVebTree {
    /// Arena storing every node of the shape.
    nodes: Arena<Node>,
    /// Handle to the root node.
    root: Handle,
    /// Number of values stored in the tree.
    len: usize,
}

impl RawVebTree {
    /// Returns the number of nodes a tree of `exponent` allocates, or `None` if
    /// that count does not fit in a `usize`.
    pub(crate) fn shape_len(exponent: u8) -> Option<usize> {
        if exponent <= LEAF_EXPONENT {
            return Some(1);
        }

        let (cluster_exponent, summary_exponent) = split_exponent(exponent);
        let clusters = 1usize.checked_shl(u32::from(summary_exponent))?;
        clusters
            .checked_mul(Self::shape_len(cluster_exponent)?)?
            .checked_add(Self::shape_len(summary_exponent)?)?
            .checked_add(1)
    }

    /// Returns `true` if a tree of `exponent` can be addressed by arena handles.
    pub(crate) fn fits(exponent: u8) -> bool {
        Self::shape_len(exponent).is_some_and(|len| len <= Handle::MAX + 1)
    }

    /// Builds an empty tree over `[0, 2^exponent)`.
    ///
    /// Callers must check [`fits`](Self::fits) first. Fails if the allocator
    /// cannot reserve the whole shape.
    pub(crate) fn new(exponent: u8) -> Result<Self, TryReserveError> {
        let capacity = Self::shape_len(exponent).unwrap_or(0);
        let mut nodes = Arena::try_with_capacity(capacity)?;
        let root = Self::build(&mut nodes, exponent);
        debug_assert_eq!(nodes.len(), capacity, "`RawVebTree::new()` - shape size mismatch!");

        Ok(Self {
            nodes,
            root,
            len: 0,
        })
    }

    fn build(nodes: &mut Arena<Node>, exponent: u8) -> Handle {
        let handle = nodes.alloc(Node::new(exponent));
        Self::grow(nodes, handle);
        handle
    }

    /// Allocates the clusters and summary below `handle`.
    fn grow(nodes: &mut Arena<Node>, handle: Handle) {
        let exponent = nodes.get(handle).exponent();
        if exponent <= LEAF_EXPONENT {
            return;
        }

        let (cluster_exponent, summary_exponent) = split_exponent(exponent);
        let count = 1usize << summary_exponent;

        // Reserve every cluster slot before growing any of them so they stay adjacent.
        let first_cluster = nodes.alloc(Node::new(cluster_exponent));
        for _ in 1..count {
            nodes.alloc(Node::new(cluster_exponent));
        }
        for high in 0..count {
            Self::grow(nodes, first_cluster.offset(high));
        }

        let summary = Self::build(nodes, summary_exponent);
        nodes.get_mut(handle).attach(Branches {
            first_cluster,
            summary,
        });
    }

    pub(crate) fn exponent(&self) -> u8 {
        self.nodes.get(self.root).exponent()
    }

    pub(crate) fn universe_size(&self) -> u64 {
        self.nodes.get(self.root).universe_size()
    }

    /// Returns the number of values in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree contains no values.
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of nodes in the tree's shape.
    pub(crate) const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn first(&self) -> Option<u64> {
        let root = self.nodes.get(self.root);
        (!root.is_empty()).then_some(root.min())
    }

    pub(crate) fn last(&self) -> Option<u64> {
        let root = self.nodes.get(self.root);
        (!root.is_empty()).then_some(root.max())
    }

    pub(crate) fn contains(&self, value: u64) -> bool {
        value < self.universe_size() && self.contains_at(self.root, value)
    }

    /// Returns the smallest value strictly greater than `value`.
    pub(crate) fn successor(&self, value: u64) -> Option<u64> {
        if value >= self.universe_size() {
            return None;
        }
        self.successor_at(self.root, value)
    }

    /// Returns the largest value strictly less than `value`.
    pub(crate) fn predecessor(&self, value: u64) -> Option<u64> {
        if value >= self.universe_size() {
            return self.last();
        }
        self.predecessor_at(self.root, value)
    }

    /// Inserts `value`, returning whether it was newly added.
    pub(crate) fn insert(&mut self, value: u64) -> bool {
        debug_assert!(value < self.universe_size(), "`RawVebTree::insert()` - `value` outside the universe!");
        let inserted = self.insert_at(self.root, value);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Removes `value`, returning whether it was present.
    pub(crate) fn remove(&mut self, value: u64) -> bool {
        if value >= self.universe_size() {
            return false;
        }
        let removed = self.remove_at(self.root, value);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Empties the tree, visiting only the non-empty part of the shape.
    pub(crate) fn clear(&mut self) {
        self.clear_at(self.root);
        self.len = 0;
    }

    fn contains_at(&self, handle: Handle, value: u64) -> bool {
        let node = self.nodes.get(handle);
        if node.is_empty() {
            return false;
        }
        if value == node.min() || value == node.max() {
            return true;
        }
        if node.is_leaf() {
            return false;
        }

        let (high, low) = node.split(value);
        self.contains_at(node.cluster(high), low)
    }

    fn successor_at(&self, handle: Handle, value: u64) -> Option<u64> {
        let node = self.nodes.get(handle);
        if node.is_empty() {
            return None;
        }
        if value < node.min() {
            return Some(node.min());
        }
        if node.is_leaf() {
            return (value < node.max()).then_some(node.max());
        }

        let (high, low) = node.split(value);
        let cluster = self.nodes.get(node.cluster(high));
        if !cluster.is_empty() && low < cluster.max() {
            let offset = self.successor_at(node.cluster(high), low)?;
            return Some(node.join(high, offset));
        }

        let next = self.successor_at(node.summary(), high)?;
        Some(node.join(next, self.nodes.get(node.cluster(next)).min()))
    }

    fn predecessor_at(&self, handle: Handle, value: u64) -> Option<u64> {
        let node = self.nodes.get(handle);
        if node.is_empty() {
            return None;
        }
        if value > node.max() {
            return Some(node.max());
        }
        if node.is_leaf() {
            return (value > node.min()).then_some(node.min());
        }

        let (high, low) = node.split(value);
        let cluster = self.nodes.get(node.cluster(high));
        if !cluster.is_empty() && low > cluster.min() {
            let offset = self.predecessor_at(node.cluster(high), low)?;
            return Some(node.join(high, offset));
        }

        match self.predecessor_at(node.summary(), high) {
            Some(prev) => Some(node.join(prev, self.nodes.get(node.cluster(prev)).max())),
            // The cached minimum is not stored in any cluster.
            None => (value > node.min()).then_some(node.min()),
        }
    }

    fn insert_at(&mut self, handle: Handle, value: u64) -> bool {
        let node = self.nodes.get_mut(handle);
        if node.is_empty() {
            node.set_singleton(value);
            return true;
        }
        if value == node.min() {
            return false;
        }

        // A smaller value takes over `min` and the old minimum is pushed down instead.
        let mut value = value;
        let displaced = value < node.min();
        if displaced {
            let old_min = node.min();
            node.set_min(value);
            value = old_min;
        }

        let node = *node;
        let inserted = if node.is_leaf() {
            displaced || value != node.max()
        } else {
            let (high, low) = node.split(value);
            let cluster = node.cluster(high);
            if self.nodes.get(cluster).is_empty() {
                self.insert_at(node.summary(), high);
            }
            self.insert_at(cluster, low) || displaced
        };

        if value > node.max() {
            self.nodes.get_mut(handle).set_max(value);
        }
        inserted
    }

    fn remove_at(&mut self, handle: Handle, value: u64) -> bool {
        let node = *self.nodes.get(handle);
        if node.is_empty() {
            return false;
        }

        if node.min() == node.max() {
            if value != node.min() {
                return false;
            }
            self.nodes.get_mut(handle).reset();
            return true;
        }

        if node.is_leaf() {
            // A leaf holding two values holds exactly `min` and `max`.
            let node = self.nodes.get_mut(handle);
            if value == node.min() {
                node.set_min(node.max());
            } else if value == node.max() {
                node.set_max(node.min());
            } else {
                return false;
            }
            return true;
        }

        let mut value = value;
        if value == node.min() {
            // Promote the smallest clustered value to `min`, then remove it from its cluster.
            let first = self.nodes.get(node.summary()).min();
            let promoted = node.join(first, self.nodes.get(node.cluster(first)).min());
            self.nodes.get_mut(handle).set_min(promoted);
            value = promoted;
        }

        let (high, low) = node.split(value);
        let cluster = node.cluster(high);
        if !self.remove_at(cluster, low) {
            return false;
        }

        if self.nodes.get(cluster).is_empty() {
            let summary = node.summary();
            self.remove_at(summary, high);
            if value == node.max() {
                let summary_node = self.nodes.get(summary);
                let max = if summary_node.is_empty() {
                    self.nodes.get(handle).min()
                } else {
                    let last = summary_node.max();
                    node.join(last, self.nodes.get(node.cluster(last)).max())
                };
                self.nodes.get_mut(handle).set_max(max);
            }
        } else if value == node.max() {
            let max = node.join(high, self.nodes.get(cluster).max());
            self.nodes.get_mut(handle).set_max(max);
        }
        true
    }

    fn clear_at(&mut self, handle: Handle) {
        let node = *self.nodes.get(handle);
        if node.is_empty() {
            return;
        }

        if !node.is_leaf() {
            let summary = node.summary();
            let mut next = self.first_at(summary);
            while let Some(high) = next {
                self.clear_at(node.cluster(high));
                next = self.successor_at(summary, high);
            }
            self.clear_at(summary);
        }
        self.nodes.get_mut(handle).reset();
    }

    fn first_at(&self, handle: Handle) -> Option<u64> {
        let node = self.nodes.get(handle);
        (!node.is_empty()).then_some(node.min())
    }

    /// Writes `{min, max, [clusters...]}` for a node, or `_` when it is empty.
    fn fmt_at(&self, handle: Handle, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.nodes.get(handle);
        if node.is_empty() {
            return f.write_str("_");
        }

        write!(f, "{{{}, {}, [", node.min(), node.max())?;
        if let Some(branches) = node.try_branches() {
            let count = 1usize << split_exponent(node.exponent()).1;
            for high in 0..count {
                if high > 0 {
                    f.write_str(", ")?;
                }
                self.fmt_at(branches.first_cluster.offset(high), f)?;
            }
        }
        f.write_str("]}")
    }
}

impl fmt::Debug for RawVebTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(self.root, f)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::format;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    use crate::raw::node::NIL;

    impl RawVebTree {
        /// Validates all tree invariants. Panics with a descriptive message if any are violated.
        /// This is intended for use in tests to catch tree corruption.
        pub(crate) fn validate_invariants(&self) {
            let mut errors: Vec<String> = Vec::new();
            let values = self.validate_node(self.root, &mut errors);

            if values.len() != self.len {
                errors.push(format!("len mismatch: self.len={}, actual count={}", self.len, values.len()));
            }
            if self.nodes.len() != Self::shape_len(self.exponent()).unwrap_or(0) {
                errors.push(format!("arena holds {} nodes, shape needs {:?}", self.nodes.len(), Self::shape_len(self.exponent())));
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        /// Checks the subtree at `handle` and returns its values in ascending order.
        fn validate_node(&self, handle: Handle, errors: &mut Vec<String>) -> Vec<u64> {
            let node = *self.nodes.get(handle);
            let universe = node.universe_size();
            if universe != 1 << node.exponent() {
                errors.push(format!("universe {} is not 2^{} at {:?}", universe, node.exponent(), handle));
            }

            if node.is_leaf() {
                if node.try_branches().is_some() {
                    errors.push(format!("leaf at {:?} has branches", handle));
                }
                if node.is_empty() {
                    return Vec::new();
                }
                if node.min() > node.max() || node.max() >= universe {
                    errors.push(format!("leaf bounds {}..={} invalid at {:?}", node.min(), node.max(), handle));
                }
                let mut values = vec![node.min()];
                if node.max() != node.min() {
                    values.push(node.max());
                }
                return values;
            }

            let Some(branches) = node.try_branches() else {
                errors.push(format!("internal node at {:?} has no branches", handle));
                return Vec::new();
            };

            let (cluster_exponent, summary_exponent) = split_exponent(node.exponent());
            let count = 1usize << summary_exponent;
            if self.nodes.get(branches.summary).exponent() != summary_exponent {
                errors.push(format!("summary exponent mismatch at {:?}", handle));
            }

            let mut stored = Vec::new();
            let mut occupied = Vec::new();
            for high in 0..count {
                let cluster = branches.first_cluster.offset(high);
                if self.nodes.get(cluster).exponent() != cluster_exponent {
                    errors.push(format!("cluster exponent mismatch at {:?}[{}]", handle, high));
                }
                let values = self.validate_node(cluster, errors);
                if !values.is_empty() {
                    occupied.push(high as u64);
                }
                stored.extend(values.into_iter().map(|low| node.join(high as u64, low)));
            }

            let summary = self.validate_node(branches.summary, errors);
            if summary != occupied {
                errors.push(format!("summary {:?} does not match occupied clusters {:?} at {:?}", summary, occupied, handle));
            }

            if node.is_empty() {
                if !stored.is_empty() {
                    errors.push(format!("empty node at {:?} has clustered values {:?}", handle, stored));
                }
                return Vec::new();
            }
            if node.min() > node.max() || node.max() >= universe {
                errors.push(format!("bounds {}..={} invalid at {:?}", node.min(), node.max(), handle));
            }
            if stored.first().is_some_and(|&first| first <= node.min()) {
                errors.push(format!("min {} is not below every clustered value at {:?}", node.min(), handle));
            }
            match stored.last() {
                None if node.min() != node.max() => {
                    errors.push(format!("node at {:?} has min != max but no clustered values", handle));
                }
                Some(&last) if last != node.max() => {
                    errors.push(format!("max {} does not match largest clustered value {} at {:?}", node.max(), last, handle));
                }
                _ => {}
            }

            let mut values = vec![node.min()];
            values.extend(stored);
            values
        }
    }

    fn tree_with(exponent: u8, values: &[u64]) -> RawVebTree {
        let mut tree = RawVebTree::new(exponent).unwrap();
        for &value in values {
            tree.insert(value);
        }
        tree.validate_invariants();
        tree
    }

    #[test]
    fn shape_len_counts_every_node() {
        assert_eq!(RawVebTree::shape_len(0), Some(1));
        assert_eq!(RawVebTree::shape_len(1), Some(1));
        assert_eq!(RawVebTree::shape_len(2), Some(4));
        assert_eq!(RawVebTree::shape_len(4), Some(21));
        assert_eq!(RawVebTree::shape_len(5), Some(42));
        assert_eq!(RawVebTree::shape_len(14), Some(21_415));

        for exponent in 0..=12 {
            let tree = RawVebTree::new(exponent).unwrap();
            assert_eq!(Some(tree.node_count()), RawVebTree::shape_len(exponent));
        }
    }

    #[test]
    fn fits_respects_handle_space() {
        // Test builds use 16-bit handles.
        assert!(RawVebTree::fits(15));
        assert!(!RawVebTree::fits(16));
        assert!(!RawVebTree::fits(63));
    }

    #[test]
    fn empty_tree_validates() {
        for exponent in 0..=10 {
            let tree = RawVebTree::new(exponent).unwrap();
            tree.validate_invariants();
            assert!(tree.is_empty());
            assert_eq!(tree.first(), None);
            assert_eq!(tree.last(), None);
            assert_eq!(format!("{:?}", tree), "_");
        }
    }

    #[test]
    fn singleton_repr_lists_empty_clusters() {
        let tree = tree_with(4, &[1]);
        assert_eq!(format!("{:?}", tree), "{1, 1, [_, _, _, _]}");

        let tree = tree_with(5, &[1]);
        assert_eq!(format!("{:?}", tree), "{1, 1, [_, _, _, _, _, _, _, _]}");

        let tree = tree_with(1, &[1]);
        assert_eq!(format!("{:?}", tree), "{1, 1, []}");
    }

    #[test]
    fn repr_shows_clustered_values() {
        // 5 and 14 land in clusters 1 and 3 of a universe of 16.
        let tree = tree_with(4, &[2, 5, 14]);
        assert_eq!(format!("{:?}", tree), "{2, 14, [_, {1, 1, [_, _]}, _, {2, 2, [_, _]}]}");
    }

    #[test]
    fn zero_exponent_holds_only_zero() {
        let mut tree = RawVebTree::new(0).unwrap();
        assert!(tree.insert(0));
        assert!(!tree.insert(0));
        tree.validate_invariants();
        assert!(tree.contains(0));
        assert!(!tree.contains(1));
        assert_eq!(tree.successor(0), None);
        assert_eq!(tree.predecessor(0), None);
        assert!(tree.remove(0));
        assert!(!tree.remove(0));
        tree.validate_invariants();
    }

    #[test]
    fn leaf_collapses_to_other_value() {
        let mut tree = tree_with(1, &[0, 1]);
        assert!(tree.remove(0));
        tree.validate_invariants();
        assert_eq!(tree.first(), Some(1));
        assert_eq!(tree.last(), Some(1));

        let mut tree = tree_with(1, &[1, 0]);
        assert!(tree.remove(1));
        tree.validate_invariants();
        assert_eq!(tree.first(), Some(0));
        assert_eq!(tree.last(), Some(0));
    }

    #[test]
    fn removing_min_promotes_next_value() {
        let mut tree = tree_with(6, &[3, 17, 40, 63]);
        assert!(tree.remove(3));
        tree.validate_invariants();
        assert_eq!(tree.first(), Some(17));
        assert_eq!(tree.last(), Some(63));

        assert!(tree.remove(63));
        tree.validate_invariants();
        assert_eq!(tree.last(), Some(40));

        assert!(tree.remove(17));
        assert!(tree.remove(40));
        tree.validate_invariants();
        assert!(tree.is_empty());
    }

    #[test]
    fn removing_absent_value_changes_nothing() {
        let mut tree = tree_with(6, &[3, 17, 40]);
        let before = format!("{:?}", tree);
        for value in [0, 4, 16, 18, 41, 63] {
            assert!(!tree.remove(value));
        }
        tree.validate_invariants();
        assert_eq!(format!("{:?}", tree), before);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn clear_resets_every_node() {
        let mut tree = tree_with(8, &[0, 1, 7, 100, 200, 255]);
        tree.clear();
        tree.validate_invariants();
        assert!(tree.is_empty());
        assert!((0..tree.node_count()).all(|index| tree.nodes.get(Handle::from_index(index)).max() == NIL));

        assert!(tree.insert(42));
        tree.validate_invariants();
        assert_eq!(tree.first(), Some(42));
    }

    #[test]
    fn queries_outside_universe() {
        let tree = tree_with(4, &[2, 9]);
        assert!(!tree.contains(16));
        assert_eq!(tree.successor(16), None);
        assert_eq!(tree.predecessor(16), Some(9));
        assert_eq!(tree.predecessor(u64::MAX), Some(9));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn raw_tree_matches_btreeset(
            exponent in 0u8..=10,
            ops in prop::collection::vec((any::<bool>(), any::<u64>()), 0..400),
        ) {
            let mut tree = RawVebTree::new(exponent).unwrap();
            let mut expected = BTreeSet::new();
            let universe = tree.universe_size();

            for (insert, seed) in ops {
                let value = seed % universe;
                if insert {
                    prop_assert_eq!(tree.insert(value), expected.insert(value), "insert({})", value);
                } else {
                    prop_assert_eq!(tree.remove(value), expected.remove(&value), "remove({})", value);
                }
                prop_assert_eq!(tree.len(), expected.len());
            }
            tree.validate_invariants();

            prop_assert_eq!(tree.first(), expected.first().copied());
            prop_assert_eq!(tree.last(), expected.last().copied());
            for value in 0..universe {
                prop_assert_eq!(tree.contains(value), expected.contains(&value), "contains({})", value);
                prop_assert_eq!(tree.successor(value), expected.range(value + 1..).next().copied(), "successor({})", value);
                prop_assert_eq!(tree.predecessor(value), expected.range(..value).next_back().copied(), "predecessor({})", value);
            }
        }
    }
}
