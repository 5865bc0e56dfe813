use super::VebSet;

impl VebSet {
    /// Returns `true` if every value yielded by `values` is in the set.
    ///
    /// An empty sequence is vacuously contained. Stops at the first missing
    /// value.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(5)?;
    /// set.insert_all([3, 7, 3, 12]);
    /// assert!(set.contains_all([3, 12]));
    /// assert!(!set.contains_all([3, 4]));
    /// assert!(set.contains_all([]));
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(m log k) for m values.
    #[must_use]
    pub fn contains_all<I: IntoIterator<Item = u64>>(&self, values: I) -> bool {
        values.into_iter().all(|value| self.contains(value))
    }

    /// Inserts every value yielded by `values`, returning how many were new.
    ///
    /// Order does not matter and duplicates are ignored.
    ///
    /// # Panics
    ///
    /// Panics if any value is outside the universe; values before it are
    /// already inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(5)?;
    /// assert_eq!(set.insert_all([3, 7, 3, 12]), 3);
    /// assert_eq!(set.iter().collect::<Vec<_>>(), [3, 7, 12]);
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(m log k) for m values.
    pub fn insert_all<I: IntoIterator<Item = u64>>(&mut self, values: I) -> usize {
        let inserted = values.into_iter().filter(|&value| self.insert(value)).count();
        log::trace!("batch insert added {inserted} values, set now holds {}", self.len());
        inserted
    }

    /// Removes every value yielded by `values`.
    ///
    /// Returns `true` only if every value was present. Every value is attempted
    /// even after one turns out to be missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use veb_tree::VebSet;
    ///
    /// let mut set = VebSet::new(5)?;
    /// set.insert_all([3, 7, 12, 20]);
    /// assert!(set.remove_all([7, 20]));
    /// assert!(!set.remove_all([3, 4]));
    /// assert_eq!(set.iter().collect::<Vec<_>>(), [12]);
    /// # Ok::<(), veb_tree::VebError>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(m log k) for m values.
    pub fn remove_all<I: IntoIterator<Item = u64>>(&mut self, values: I) -> bool {
        let mut missing = 0usize;
        for value in values {
            if !self.remove(value) {
                missing += 1;
            }
        }
        log::trace!("batch remove missed {missing} values, set now holds {}", self.len());
        missing == 0
    }
}
