//! Error types for loading and specializing classes.
//!
//! ## Error Hierarchy
//!
//! ```text
//! OxfordError (top-level wrapper)
//! ├── NamingError   - malformed names and descriptors
//! ├── XlationError  - unreadable or mismatched xlation records
//! ├── CodecError    - undecodable stored classes
//! ├── RewriteError  - template rewriting failures
//! └── LoadError     - what a class request reports
//! ```
//!
//! [`LoadError`] is `Clone` so a failed load can be memoized and handed to
//! every later request for the same name.

use std::io;
use std::sync::Arc;

use oxford_bytecode::CodecError;
use oxford_core::{NamingError, XlationError};
use oxford_rewriter::RewriteError;
use thiserror::Error;

use crate::classify::describe;

/// A class request failed.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// No class, template, or synthesis rule exists for the name.
    #[error("type not found: {}", describe(name))]
    NotFound { name: String },

    /// A resource exists but could not be read.
    #[error("resource '{path}' for {} could not be read: {source}", describe(name))]
    ResourceUnavailable {
        name: String,
        path: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// The template's xlation record is missing, corrupt, or does not match
    /// the requested arguments.
    #[error("type not found: {}: {source}", describe(name))]
    Xlation {
        name: String,
        #[source]
        source: XlationError,
    },

    /// The requested name is not well formed.
    #[error("malformed type name '{name}': {source}")]
    MalformedName {
        name: String,
        #[source]
        source: NamingError,
    },

    /// The template was found but could not be specialized.
    #[error("specializing {} failed: {source}", describe(name))]
    Rewrite {
        name: String,
        #[source]
        source: RewriteError,
    },

    /// A stored class could not be decoded.
    #[error("stored class for {} is corrupt: {source}", describe(name))]
    Decode {
        name: String,
        #[source]
        source: CodecError,
    },
}

impl LoadError {
    /// The requested name this error is about.
    pub fn name(&self) -> &str {
        match self {
            LoadError::NotFound { name }
            | LoadError::ResourceUnavailable { name, .. }
            | LoadError::Xlation { name, .. }
            | LoadError::MalformedName { name, .. }
            | LoadError::Rewrite { name, .. }
            | LoadError::Decode { name, .. } => name,
        }
    }

    /// Whether callers should treat this as an ordinary missing type.
    ///
    /// Missing, unreadable, or undecodable resources and unusable xlation
    /// records are reported as "type not found"; the other variants are load
    /// failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LoadError::NotFound { .. }
                | LoadError::ResourceUnavailable { .. }
                | LoadError::Xlation { .. }
                | LoadError::Decode { .. }
        )
    }

    pub(crate) fn rewrite(name: &str, source: RewriteError) -> Self {
        match source {
            RewriteError::Xlation(source) => LoadError::Xlation {
                name: name.to_string(),
                source,
            },
            source => LoadError::Rewrite {
                name: name.to_string(),
                source,
            },
        }
    }
}

/// Any error the specializer can produce.
#[derive(Debug, Clone, Error)]
pub enum OxfordError {
    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error(transparent)]
    Xlation(#[from] XlationError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Result alias for the specializer.
pub type OxfordResult<T> = Result<T, OxfordError>;

#[cfg(test)]
mod tests {
    use super::*;
    use oxford_core::naming::mangle_binary_name;

    #[test]
    fn not_found_message_is_demangled() {
        let name = mangle_binary_name("pkg/Box⟦a/B⟧").unwrap();
        let err = LoadError::NotFound { name: name.clone() };
        assert_eq!(err.name(), name);
        assert!(err.to_string().contains("pkg/Box⟦a/B⟧"));
        assert!(err.is_not_found());
    }

    #[test]
    fn xlation_mismatch_reads_as_not_found() {
        let err = LoadError::rewrite(
            "Pair⟦A⟧",
            RewriteError::Xlation(XlationError::ArityMismatch {
                template: "Pair⟦⟧".into(),
                expected: 2,
                actual: 1,
            }),
        );
        assert!(matches!(err, LoadError::Xlation { .. }));
        assert!(err.is_not_found());

        let err = LoadError::rewrite("Pair⟦A⟧", RewriteError::UnboundFormal("T".into()));
        assert!(!err.is_not_found());
    }

    #[test]
    fn corrupt_resource_reads_as_not_found() {
        let err = LoadError::Decode {
            name: "pkg/Bad".into(),
            source: CodecError::BadMagic,
        };
        assert!(err.is_not_found());
    }

    #[test]
    fn converts_into_top_level_error() {
        let err: OxfordError = NamingError::MissingArrow { name: "x".into() }.into();
        assert!(matches!(err, OxfordError::Naming(_)));
    }
}
