//! Runtime support used by specialized code.
//!
//! - [`Rtti`] / [`RttiTable`]: type descriptors and their interning
//! - [`ClosureTable`]: per-call-site memo of specialized closure instances

pub mod closures;
pub mod rtti;

pub use closures::{ClosureInstance, ClosureTable};
pub use rtti::{Rtti, RttiTable};
