//! Template specialization for the oxford runtime.
//!
//! ## Components
//!
//! - [`SubstitutionMap`]: formal-to-actual substitution over names and
//!   descriptors, with optional tuple flattening
//! - [`rewrite_class`]: pure rewrite of a template [`ClassModel`] into one
//!   instance
//! - [`ClassResolver`]: what the rewriter may ask about other classes
//! - [`rtti`] and [`magic`]: the instruction expansions the rewriter applies
//!
//! [`ClassModel`]: oxford_bytecode::ClassModel

pub mod error;
pub mod magic;
pub mod resolver;
pub mod rewriter;
pub mod rtti;
pub mod substitution;

pub use error::{RewriteError, RewriteResult};
pub use magic::MAGIC_OWNER;
pub use resolver::{ClassResolver, NoResolver, StaticResolver};
pub use rewriter::rewrite_class;
pub use substitution::{SubstitutionMap, declared_formals};
