//! Errors raised while specializing a template.

use oxford_core::{NamingError, XlationError};
use thiserror::Error;

/// A template could not be rewritten into an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// A formal was required but the map has no actual for it.
    #[error("no actual argument bound for formal '{0}'")]
    UnboundFormal(String),

    /// A name or descriptor in the template or the arguments is malformed.
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// The xlation record does not fit the supplied arguments.
    #[error(transparent)]
    Xlation(#[from] XlationError),

    /// A constant call names an operation the rewriter does not know.
    #[error("unknown constant operation '{op}' in call '{name}'")]
    UnknownMagicOp { op: String, name: String },
}

/// Result alias for rewriting.
pub type RewriteResult<T> = Result<T, RewriteError>;
