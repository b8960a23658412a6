//! Class metadata the rewriter consults while rewriting calls and RTTI.

use oxford_core::{GenericSort, ParamKind};
use rustc_hash::FxHashMap;

/// Answers questions about classes other than the one being rewritten.
///
/// Every answer is optional: `None` means "unknown", and the rewriter then
/// leaves the instruction in its conservative form.
pub trait ClassResolver {
    /// Kinds of the formals of the template with this canonical natural name.
    fn generic_kinds(&self, template: &str) -> Option<Vec<ParamKind>>;

    /// Sort of the template with this canonical natural name.
    fn generic_sort(&self, template: &str) -> Option<GenericSort>;

    /// Whether the class with this mangled binary name is an interface.
    fn is_interface(&self, class: &str) -> Option<bool>;
}

/// A resolver that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl ClassResolver for NoResolver {
    fn generic_kinds(&self, _template: &str) -> Option<Vec<ParamKind>> {
        None
    }

    fn generic_sort(&self, _template: &str) -> Option<GenericSort> {
        None
    }

    fn is_interface(&self, _class: &str) -> Option<bool> {
        None
    }
}

/// A resolver backed by fixed tables.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    templates: FxHashMap<String, (GenericSort, Vec<ParamKind>)>,
    classes: FxHashMap<String, bool>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template by canonical natural name.
    pub fn with_template(mut self, template: impl Into<String>, sort: GenericSort, kinds: Vec<ParamKind>) -> Self {
        self.templates.insert(template.into(), (sort, kinds));
        self
    }

    /// Register a plain class by mangled binary name.
    pub fn with_class(mut self, class: impl Into<String>, is_interface: bool) -> Self {
        self.classes.insert(class.into(), is_interface);
        self
    }
}

impl ClassResolver for StaticResolver {
    fn generic_kinds(&self, template: &str) -> Option<Vec<ParamKind>> {
        self.templates.get(template).map(|(_, kinds)| kinds.clone())
    }

    fn generic_sort(&self, template: &str) -> Option<GenericSort> {
        self.templates.get(template).map(|(sort, _)| *sort)
    }

    fn is_interface(&self, class: &str) -> Option<bool> {
        self.classes.get(class).copied()
    }
}
