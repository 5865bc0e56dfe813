use thiserror::Error;

/// Errors returned by [`VebSet`](crate::VebSet) constructors and checked inserts.
///
/// Lookups never fail: a missing value is reported as `false` or `None`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VebError {
    /// The universe exponent is larger than [`MAX_EXPONENT`](crate::MAX_EXPONENT).
    #[error("universe exponent {exponent} exceeds the maximum of {max}")]
    InvalidExponent {
        /// The rejected exponent.
        exponent: u32,
        /// The largest accepted exponent.
        max: u32,
    },
    /// The tree for this exponent has more nodes than the arena can address or hold.
    #[error("a tree over 2^{exponent} values needs {nodes:?} nodes, more than the arena can address")]
    CapacityExceeded {
        /// The requested exponent.
        exponent: u32,
        /// Nodes the shape would need, or `None` if the count overflows `usize`.
        nodes: Option<usize>,
    },
    /// A value lies outside `[0, universe)`.
    #[error("value {value} is outside the universe [0, {universe})")]
    OutOfRange {
        /// The rejected value.
        value: u64,
        /// The set's universe size.
        universe: u64,
    },
}
