//! Naming layer shared by every part of the oxford specializer.
//!
//! This crate owns the vocabulary the other crates speak:
//!
//! - `naming`: the reversible codec between natural names and target-legal
//!   identifiers, plus the grammar markers (`⟦ ⟧ , = ✉ ⚙ ⁑`)
//! - `generic_name`: parsed natural names with nested argument lists
//! - `descriptor`: field and method descriptor grammar
//! - `xlation`: the per-template list of formal static parameters
//! - `type_hash`: stable serials for runtime type descriptors

pub mod descriptor;
pub mod error;
pub mod generic_name;
pub mod naming;
pub mod type_hash;
pub mod xlation;

pub use error::{NamingError, NamingResult, XlationError};
pub use generic_name::{ABSTRACT_ARROW, ARROW, Arg, GenericName, Piece, TUPLE};
pub use type_hash::TypeHash;
pub use xlation::{GenericSort, ParamKind, StaticParam, XlationRecord};
