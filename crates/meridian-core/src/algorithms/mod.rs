//! Algorithm kernels: the distributed-iterator-contract consumers.
//!
//! Every function here is generic over a [`crate::runtime::Runtime`] (or the
//! narrower traits it actually needs), a [`crate::iter::DistributedIterator`]
//! pair describing the range, and a [`crate::iter::LocalAccess`] describing
//! how to touch the container's bytes locally. None of them know or care
//! what container they're running against — that's the whole point of the
//! three-operation contract in [`crate::iter`].
//!
//! Grouped by the combination rule each family shares:
//! - [`search`] — short-circuiting, first-match-wins.
//! - [`elementwise`] — independent per-element work, no cross-locality
//!   combine.
//! - [`reduce`] — folds, sequential-left or associative-parallel.
//! - [`scan`] — two-phase carry rebase over a prefix.
//! - [`minmax`] — extremum tracking with first-occurrence tie-breaking.

mod common;

pub mod elementwise;
pub mod minmax;
pub mod reduce;
pub mod scan;
pub mod search;

pub use elementwise::{fill, for_each, generate, replace, replace_if, transform};
pub use minmax::{max_element, min_element, minmax_element};
pub use reduce::{accumulate, inner_product, reduce, transform_reduce};
pub use scan::{
    adjacent_difference, exclusive_scan, inclusive_scan, iota, partial_sum, transform_exclusive_scan,
    transform_inclusive_scan, Successor,
};
pub use search::{all_of, any_of, equal, find, find_if, find_if_not, lexicographical_compare, none_of};
