//! van Emde Boas tree integer sets for Rust.
//!
//! This crate provides [`VebSet`], an ordered set of integers drawn from a
//! fixed universe `[0, 2^k)`. Membership, insertion, removal, and
//! successor/predecessor queries take `O(log k)` time regardless of how many
//! values are stored:
//!
//! - [`find_next`](VebSet::find_next) - The smallest value strictly greater than a key
//! - [`find_prev`](VebSet::find_prev) - The largest value strictly less than a key
//! - [`first`](VebSet::first) / [`last`](VebSet::last) - The cached minimum and maximum, O(1)
//!
//! # Example
//!
//! ```
//! use veb_tree::VebSet;
//!
//! // Universe [0, 32).
//! let mut set = VebSet::new(5)?;
//! set.insert_all([3, 7, 3, 12]);
//!
//! assert_eq!(set.iter().collect::<Vec<_>>(), [3, 7, 12]);
//! assert_eq!(set.find_next(3), Some(7));
//! assert_eq!(set.find_prev(12), Some(7));
//!
//! assert!(set.remove(7));
//! assert_eq!(set.iter().collect::<Vec<_>>(), [3, 12]);
//! # Ok::<(), veb_tree::VebError>(())
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Doubly-logarithmic queries** - Every query recurses into a single cluster per level
//! - **Flat storage** - All nodes live in one arena, addressed by 32-bit handles
//!
//! # Implementation
//!
//! A node over a universe of `2^k` values splits each value into a high half,
//! selecting one of `2^ceil(k/2)` clusters, and a low half, the offset inside a
//! cluster of `2^floor(k/2)` values. A summary node over the cluster indices
//! records which clusters are non-empty, and every node caches its minimum and
//! maximum so most queries stop after a single recursive step per level. The
//! minimum is held only in its node, never in a cluster below it.
//!
//! The whole shape is allocated when the set is created, so memory is linear in
//! the universe size rather than in the number of stored values.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod raw;

pub mod veb_set;

pub use error::VebError;
pub use veb_set::{MAX_EXPONENT, VebSet};
