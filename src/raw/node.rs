use super::handle::Handle;

/// Sentinel stored in `max` while a node is empty (the `u64` image of `-1`).
pub(crate) const NIL: u64 = u64::MAX;

/// Exponents at or below this value are leaves: no clusters, no summary.
pub(crate) const LEAF_EXPONENT: u8 = 1;

/// Splits a universe exponent into `(cluster, summary)` exponents.
///
/// Even exponents split evenly. Odd exponents give the summary the extra bit,
/// so a node has `2^summary` clusters of universe `2^cluster` each.
#[inline]
pub(crate) const fn split_exponent(exponent: u8) -> (u8, u8) {
    let cluster = exponent / 2;
    (cluster, exponent - cluster)
}

/// Clusters and summary of an internal node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Branches {
    /// First of `2^summary_exponent` contiguous cluster handles.
    pub(crate) first_cluster: Handle,
    pub(crate) summary: Handle,
}

/// One level of a van Emde Boas tree.
///
/// Emptiness is sentinel-encoded: a node is empty iff `min == universe_size()`
/// and `max == NIL`. The cached `min` is never stored in a cluster; every other
/// element lives in exactly one cluster.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Node {
    min: u64,
    max: u64,
    branches: Option<Branches>,
    exponent: u8,
    cluster_exponent: u8,
}

impl Node {
    /// Creates an empty node with no branches attached yet.
    pub(crate) const fn new(exponent: u8) -> Self {
        Self {
            min: 1 << exponent,
            max: NIL,
            branches: None,
            exponent,
            cluster_exponent: split_exponent(exponent).0,
        }
    }

    #[inline]
    pub(crate) const fn exponent(&self) -> u8 {
        self.exponent
    }

    #[inline]
    pub(crate) const fn universe_size(&self) -> u64 {
        1 << self.exponent
    }

    #[inline]
    pub(crate) const fn is_leaf(&self) -> bool {
        self.exponent <= LEAF_EXPONENT
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.min == self.universe_size() && self.max == NIL
    }

    /// Raw cached minimum; the sentinel when empty.
    #[inline]
    pub(crate) const fn min(&self) -> u64 {
        self.min
    }

    /// Raw cached maximum; `NIL` when empty.
    #[inline]
    pub(crate) const fn max(&self) -> u64 {
        self.max
    }

    #[inline]
    pub(crate) fn set_min(&mut self, min: u64) {
        debug_assert!(min < self.universe_size(), "`Node::set_min()` - `min` outside the universe!");
        self.min = min;
    }

    #[inline]
    pub(crate) fn set_max(&mut self, max: u64) {
        debug_assert!(max < self.universe_size(), "`Node::set_max()` - `max` outside the universe!");
        self.max = max;
    }

    /// Makes `value` the node's only element.
    #[inline]
    pub(crate) fn set_singleton(&mut self, value: u64) {
        self.set_min(value);
        self.set_max(value);
    }

    /// Clears this node's own bounds in place. The shape is untouched.
    #[inline]
    pub(crate) fn reset(&mut self) {
        self.min = self.universe_size();
        self.max = NIL;
    }

    /// Returns the node's branches, panicking on a leaf.
    #[inline]
    pub(crate) fn branches(&self) -> Branches {
        self.branches.expect("`Node::branches()` - leaf nodes have no clusters!")
    }

    /// Returns the node's branches, or `None` on a leaf.
    #[inline]
    pub(crate) const fn try_branches(&self) -> Option<Branches> {
        self.branches
    }

    pub(crate) fn attach(&mut self, branches: Branches) {
        debug_assert!(!self.is_leaf(), "`Node::attach()` - leaf nodes have no clusters!");
        self.branches = Some(branches);
    }

    /// The universe size of each cluster.
    #[inline]
    pub(crate) const fn low_root(&self) -> u64 {
        1 << self.cluster_exponent
    }

    /// Splits `value` into `(cluster index, offset within that cluster)`.
    #[inline]
    pub(crate) const fn split(&self, value: u64) -> (u64, u64) {
        (value >> self.cluster_exponent, value & (self.low_root() - 1))
    }

    /// Inverse of [`split`](Self::split).
    #[inline]
    pub(crate) const fn join(&self, high: u64, low: u64) -> u64 {
        (high << self.cluster_exponent) | low
    }

    /// Handle of cluster `high`.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn cluster(&self, high: u64) -> Handle {
        self.branches().first_cluster.offset(high as usize)
    }

    #[inline]
    pub(crate) fn summary(&self) -> Handle {
        self.branches().summary
    }
}
