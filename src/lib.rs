//! Oxford: on-demand specialization of generic class templates.
//!
//! The target platform has no generics. Generic types and closures are
//! compiled once as templates, and every concrete instantiation is produced
//! the first time some code asks for it by name.
//!
//! ## Architecture
//!
//! - **Naming** ([`oxford_core`]): the reversible codec between natural names
//!   (`List⟦java/lang/String⟧`) and target-legal identifiers
//! - **Rewriting** ([`oxford_rewriter`]): substitution of formals by actuals
//!   through a template class, with RTTI and constant expansion
//! - **Loading** ([`SpecializationLoader`]): classification of requested
//!   names and once-per-name installation of the resulting classes
//! - **Runtime** ([`runtime`]): tables specialized code uses to find type
//!   descriptors and closure instances at run time
//!
//! ## Modules
//!
//! - [`classify`]: what kind of class a requested name denotes
//! - [`config`]: loader settings
//! - [`error`]: load errors and the crate-wide error type
//! - [`loader`]: the specialization loader and the system class seam
//! - [`registry`]: installed classes, one slot per name
//! - [`resources`]: where stored templates and xlation records come from
//! - [`synth`]: classes built from their name alone
//! - [`runtime`]: RTTI and closure tables
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use oxford::{DirectoryResources, SpecializationLoader};
//!
//! let loader = Arc::new(SpecializationLoader::new(DirectoryResources::new("build/classes")));
//! let boxed = loader.load_natural("pkg/Box⟦java/lang/String⟧")?;
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod loader;
pub mod registry;
pub mod resources;
pub mod runtime;
pub mod synth;

pub use classify::{NameClass, classify, describe};
pub use config::LoaderConfig;
pub use error::{LoadError, OxfordError, OxfordResult};
pub use loader::{NoSystemClasses, SpecializationLoader, SystemLoader};
pub use registry::{ClassOrigin, ClassTable, LoadedClass};
pub use resources::{DirectoryResources, MemoryResources, ResourceProvider, TemplateStoreError};
pub use runtime::{ClosureInstance, ClosureTable, Rtti, RttiTable};

pub use oxford_bytecode;
pub use oxford_cache;
pub use oxford_core;
pub use oxford_rewriter;
