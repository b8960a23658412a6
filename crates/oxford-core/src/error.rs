//! Error types for the naming layer.
//!
//! ## Error Hierarchy
//!
//! ```text
//! NamingError   - malformed names, descriptors, or closure shapes
//! XlationError  - unreadable or incompatible xlation records
//! ```
//!
//! Both are structural: they describe input that can never be made to work
//! by retrying, so callers report them with the offending identifier.

use thiserror::Error;

// ============================================================================
// Naming Errors
// ============================================================================

/// Errors raised while mangling, parsing, or classifying names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// A `⟦` was never closed, or a `⟧` appeared without an opener.
    #[error("unbalanced brackets in '{name}' at offset {offset}")]
    UnbalancedBrackets { name: String, offset: usize },

    /// An argument label was not plain text (`Box⟦a⟦x⟧=T⟧`).
    #[error("argument label in '{name}' must be plain text")]
    MalformedLabel { name: String },

    /// A descriptor did not follow field or method descriptor grammar.
    #[error("malformed descriptor '{descriptor}' at offset {offset}")]
    MalformedDescriptor { descriptor: String, offset: usize },

    /// A closure name has no `⚙` between api class and function.
    #[error("closure name '{name}' has no function marker")]
    MissingFunctionMarker { name: String },

    /// A closure name does not end in an `Arrow⟦…⟧` type.
    #[error("closure name '{name}' does not name an arrow type")]
    MissingArrow { name: String },

    /// An arrow type needs at least a result type.
    #[error("arrow type '{name}' has no result type")]
    EmptyArrow { name: String },

    /// A closure stem has no `⟦⟧` slot for its type arguments.
    #[error("closure stem '{stem}' has no '⟦⟧' placeholder")]
    MissingPlaceholder { stem: String },
}

// ============================================================================
// Xlation Errors
// ============================================================================

/// Errors raised while reading xlation records or binding them to arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XlationError {
    /// The record does not start with the xlation magic bytes.
    #[error("not an xlation record")]
    BadMagic,

    /// The record was written by an incompatible format revision.
    #[error("unsupported xlation record version {0}")]
    UnsupportedVersion(u16),

    /// The record body failed to decode.
    #[error("corrupt xlation record: {0}")]
    Decode(#[from] postcard::Error),

    /// The record declares a different number of formals than were supplied.
    #[error("template '{template}' declares {expected} static parameters but {actual} were supplied")]
    ArityMismatch {
        template: String,
        expected: usize,
        actual: usize,
    },
}

/// Result alias for naming operations.
pub type NamingResult<T> = Result<T, NamingError>;
