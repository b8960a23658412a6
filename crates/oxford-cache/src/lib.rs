//! Immutable ordered maps for caching specializations.
//!
//! ## Components
//!
//! - [`WeightBalancedTree`]: persistent weight-balanced tree with key and
//!   positional lookup
//! - [`SpecializationCache`]: lock-free reads over a published tree, with
//!   serialized insert-if-absent

pub mod shared;
pub mod tree;

pub use shared::SpecializationCache;
pub use tree::{DELTA, InvariantViolation, Iter, Node, WeightBalancedTree};
