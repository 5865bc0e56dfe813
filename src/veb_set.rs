use core::fmt;
use core::iter::FusedIterator;

use crate::error::VebError;
use crate::raw::RawVebTree;

mod batch;

/// The largest universe exponent accepted by [`VebSet::new`].
///
/// Values are `u64`, so the universe `[0, 2^63)` is the largest one whose size
/// is itself representable. In practice the eagerly allocated shape runs out of
/// arena handles long before this, see [`VebError::CapacityExceeded`]: exponents
/// of 32 and above are always rejected. The shape grows roughly with the
/// universe (about 1.4 million nodes at exponent 20, 3 billion at 31), and a
/// shape the allocator cannot reserve is reported the same way.
pub const MAX_EXPONENT: u32 = 63;

/// An ordered set of integers drawn from a fixed universe `[0, 2^k)`, based on
/// a van Emde Boas tree.
///
/// Membership, insertion, removal, successor, and predecessor all run in
/// `O(log k)` time (that is `O(log log U)` for a universe of size `U`),
/// independent of how many values are stored. `first` and `last` are `O(1)`.
///
/// The price is memory: the whole recursive shape is allocated when the set is
/// created, roughly one small node per value of the universe, so the set suits
/// dense universes of up to a few million values.
///
/// Iterators returned by [`VebSet::iter`] produce values in ascending order and
/// take `O(log k)` time per value.
///
/// # Examples
///
/// ```
/// use veb_tree::VebSet;
///
/// // A set over the universe [0, 32).
/// let mut ports = VebSet::new(5)?;
///
/// ports.insert(3);
/// ports.insert(7);
/// ports.insert(3);
/// ports.insert(12);
///
/// assert_eq!(ports.iter().collect::<Vec<_>>(), [3, 7, 12]);
/// assert_eq!(ports.find_next(3), Some(7));
/// assert_eq!(ports.find_prev(12), Some(7));
///
/// assert!(ports.remove(7));
/// assert_eq!(ports.iter().collect::<Vec<_>>(), [3, 12]);
/// # Ok::<(), veb_tree::VebError>(())
/// ```
///
/// The `Debug` representation shows the tree itself: each non-empty node as
/// `{min, max, [clusters...]}` and each empty node as `_`.
///
/// ```
/// use veb_tree::VebSet;
///
/// let mut set = VebSet::new(4)?;
/// set.insert(1);
/// assert_eq!(format!("{set:?}"), "{1, 1, [_, _, _, _]}");
/// # Ok::<(), veb_tree::VebError>(())
/// ```
#[derive(Clone)]
pub struct VebSet {
    tree: RawVebTree,
}

/// An iterator over the values of a `VebSet`, in ascending order.
///
/// This `struct` is created by the [`iter`] method on [`VebSet`].
/// See its documentation for more.
///
/// # Examples
///
/// ```
/// use veb_tree::VebSet;
///
/// let mut set = VebSet::new(4)?;
/// set.extend([3, 1, 2]);
/// let mut iter = set.iter();
/// assert_eq!(iter.next(), Some(1));
/// assert_eq!(iter.next_back(), Some(3));
/// assert_eq!(iter.next(), Some(2));
/// assert_eq!(iter.next(), None);
/// # Ok::<(), veb_tree::VebError>(())
/// ```
///
/// [`iter`]: VebSet::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Clone)]
pub struct Iter<'a> {
    tree: &'a RawVebTree,
    front: Option<u64>,
    back: Option<u64>,
    remaining: usize,
}

impl VebSet {
    /// Makes a new, empty `VebSet` over the universe `[0, 2^exponent)`.
    ///
    /// # Errors
    ///
    /// - [`VebError::InvalidExponent`] if `exponent` is larger than [`MAX_EXPONENT`].
    /// - [`VebError::CapacityExceeded`] if the tree for `exponent` has more nodes
    ///   than can be addressed or than the allocator can reserve.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::{VebError, VebSet};
    ///
    /// let set = VebSet::new(4)?;
    /// assert_eq!(set.universe_size(), 16);
    /// assert!(set.is_empty());
    ///
    /// assert!(matches!(VebSet::new(64), Err(VebError::InvalidExponent { .. })));
    /// # Ok::<(), VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(U) for a universe of size U: every node is allocated up front.
    pub fn new(exponent: u32) -> Result<Self, VebError> {
        if exponent > MAX_EXPONENT {
            return Err(VebError::InvalidExponent {
                exponent,
                max: MAX_EXPONENT,
            });
        }

        #[allow(clippy::cast_possible_truncation)]
        let k = exponent as u8;
        if !RawVebTree::fits(k) {
            return Err(VebError::CapacityExceeded {
                exponent,
                nodes: RawVebTree::shape_len(k),
            });
        }

        let tree = RawVebTree::new(k).map_err(|err| {
            log::warn!("cannot allocate van Emde Boas set: exponent={exponent}: {err}");
            VebError::CapacityExceeded {
                exponent,
                nodes: RawVebTree::shape_len(k),
            }
        })?;
        log::info!(
            "created van Emde Boas set: exponent={exponent}, universe={}, nodes={}",
            tree.universe_size(),
            tree.node_count()
        );
        Ok(Self {
            tree,
        })
    }

    /// Makes a new, empty `VebSet` whose universe is the smallest power of two
    /// holding at least `size` values.
    ///
    /// # Errors
    ///
    /// Same as [`VebSet::new`].
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let set = VebSet::with_universe(10_000)?;
    /// assert_eq!(set.exponent(), 14);
    /// assert_eq!(set.universe_size(), 16_384);
    ///
    /// assert_eq!(VebSet::with_universe(1)?.universe_size(), 1);
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    pub fn with_universe(size: u64) -> Result<Self, VebError> {
        let exponent = if size <= 1 {
            0
        } else {
            u64::BITS - (size - 1).leading_zeros()
        };
        Self::new(exponent)
    }

    /// Returns the universe exponent `k` of this set.
    #[must_use]
    pub fn exponent(&self) -> u32 {
        u32::from(self.tree.exponent())
    }

    /// Returns the universe size `2^k`. Every value must be below it.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// assert_eq!(VebSet::new(5)?.universe_size(), 32);
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    #[must_use]
    pub fn universe_size(&self) -> u64 {
        self.tree.universe_size()
    }

    /// Returns the number of values in the set.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the set contains no values.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns `true` if the set contains `value`.
    ///
    /// Values outside the universe are never contained.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(4)?;
    /// set.insert(1);
    /// assert!(set.contains(1));
    /// assert!(!set.contains(2));
    /// assert!(!set.contains(99));
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log k)
    #[must_use]
    pub fn contains(&self, value: u64) -> bool {
        self.tree.contains(value)
    }

    /// Returns the smallest value in the set, if any.
    ///
    /// # Complexity
    ///
    /// O(1) - the minimum is cached at the root.
    #[must_use]
    pub fn first(&self) -> Option<u64> {
        self.tree.first()
    }

    /// Returns the largest value in the set, if any.
    ///
    /// # Complexity
    ///
    /// O(1) - the maximum is cached at the root.
    #[must_use]
    pub fn last(&self) -> Option<u64> {
        self.tree.last()
    }

    /// Returns the smallest value in the set strictly greater than `value`.
    ///
    /// `value` does not have to be in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(5)?;
    /// set.extend([3, 7, 12]);
    /// assert_eq!(set.find_next(0), Some(3));
    /// assert_eq!(set.find_next(3), Some(7));
    /// assert_eq!(set.find_next(8), Some(12));
    /// assert_eq!(set.find_next(12), None);
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log k)
    #[must_use]
    pub fn find_next(&self, value: u64) -> Option<u64> {
        self.tree.successor(value)
    }

    /// Returns the largest value in the set strictly less than `value`.
    ///
    /// `value` does not have to be in the set, nor in the universe.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(5)?;
    /// set.extend([3, 7, 12]);
    /// assert_eq!(set.find_prev(12), Some(7));
    /// assert_eq!(set.find_prev(4), Some(3));
    /// assert_eq!(set.find_prev(3), None);
    /// assert_eq!(set.find_prev(1_000), Some(12));
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log k)
    #[must_use]
    pub fn find_prev(&self, value: u64) -> Option<u64> {
        self.tree.predecessor(value)
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. Inserting a value that is
    /// already present leaves the set unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not below [`universe_size`](Self::universe_size).
    /// Use [`try_insert`](Self::try_insert) to get an error instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(4)?;
    /// assert_eq!(set.insert(2), true);
    /// assert_eq!(set.insert(2), false);
    /// assert_eq!(set.len(), 1);
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log k)
    pub fn insert(&mut self, value: u64) -> bool {
        assert!(value < self.universe_size(), "`VebSet::insert()` - `value` is outside the universe!");
        self.tree.insert(value)
    }

    /// Adds a value to the set, rejecting values outside the universe.
    ///
    /// # Errors
    ///
    /// [`VebError::OutOfRange`] if `value` is not below
    /// [`universe_size`](Self::universe_size).
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::{VebError, VebSet};
    ///
    /// let mut set = VebSet::new(4)?;
    /// assert_eq!(set.try_insert(15), Ok(true));
    /// assert_eq!(set.try_insert(16), Err(VebError::OutOfRange { value: 16, universe: 16 }));
    /// # Ok::<(), VebError>(())
    /// ```
    pub fn try_insert(&mut self, value: u64) -> Result<bool, VebError> {
        let universe = self.universe_size();
        if value >= universe {
            return Err(VebError::OutOfRange {
                value,
                universe,
            });
        }
        Ok(self.tree.insert(value))
    }

    /// If the set contains `value`, removes it and returns `true`.
    ///
    /// Removing an absent value returns `false` and leaves the set unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(4)?;
    /// set.insert(2);
    /// assert_eq!(set.remove(2), true);
    /// assert_eq!(set.remove(2), false);
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log k)
    pub fn remove(&mut self, value: u64) -> bool {
        self.tree.remove(value)
    }

    /// Removes and returns the smallest value in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(4)?;
    /// set.extend([1, 2]);
    /// while let Some(n) = set.pop_first() {
    ///     assert!(set.iter().all(|k| k > n));
    /// }
    /// assert!(set.is_empty());
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log k)
    pub fn pop_first(&mut self) -> Option<u64> {
        let first = self.first()?;
        self.tree.remove(first);
        Some(first)
    }

    /// Removes and returns the largest value in the set.
    ///
    /// # Complexity
    ///
    /// O(log k)
    pub fn pop_last(&mut self) -> Option<u64> {
        let last = self.last()?;
        self.tree.remove(last);
        Some(last)
    }

    /// Removes every value, keeping the allocated tree for reuse.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(4)?;
    /// set.insert(1);
    /// set.clear();
    /// assert!(set.is_empty());
    /// assert!(!set.contains(1));
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n log k) - only the non-empty part of the tree is visited.
    pub fn clear(&mut self) {
        log::debug!("clearing {} values from van Emde Boas set over 2^{}", self.len(), self.exponent());
        self.tree.clear();
    }

    /// Gets an iterator that visits the values in the set in ascending order.
    ///
    /// Each call starts a fresh traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(4)?;
    /// set.extend([3, 1, 2]);
    /// assert_eq!(set.iter().collect::<Vec<_>>(), [1, 2, 3]);
    /// assert_eq!(set.iter().rev().collect::<Vec<_>>(), [3, 2, 1]);
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1) to create the iterator; O(log k) per step.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            tree: &self.tree,
            front: self.tree.first(),
            back: self.tree.last(),
            remaining: self.tree.len(),
        }
    }
}

impl PartialEq for VebSet {
    fn eq(&self, other: &VebSet) -> bool {
        self.exponent() == other.exponent() && self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for VebSet {}

impl fmt::Debug for VebSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.tree, f)
    }
}

impl Extend<u64> for VebSet {
    #[inline]
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        iter.into_iter().for_each(move |value| {
            self.insert(value);
        });
    }
}

impl<'a> Extend<&'a u64> for VebSet {
    fn extend<I: IntoIterator<Item = &'a u64>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<'a> IntoIterator for &'a VebSet {
    type Item = u64;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl Iterator for Iter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.front?;
        self.remaining -= 1;
        self.front = if self.remaining == 0 {
            None
        } else {
            self.tree.successor(value)
        };
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    fn last(mut self) -> Option<u64> {
        self.next_back()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.back?;
        self.remaining -= 1;
        self.back = if self.remaining == 0 {
            None
        } else {
            self.tree.predecessor(value)
        };
        Some(value)
    }
}

impl ExactSizeIterator for Iter<'_> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl FusedIterator for Iter<'_> {}

impl fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
