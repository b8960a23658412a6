//! Formal-to-actual substitution over names and descriptors.
//!
//! A [`SubstitutionMap`] binds each formal static parameter of a template to
//! the actual argument of one instance. Substitution replaces every name that
//! is exactly a bound formal, at any nesting depth inside `⟦…⟧`, and leaves
//! everything else alone: path-qualified names, argument labels, and unbound
//! names are never touched.
//!
//! The mangled entry points ([`SubstitutionMap::type_name`],
//! [`SubstitutionMap::field_desc`], [`SubstitutionMap::method_desc`], …)
//! demangle their input, substitute, and mangle the result again, so callers
//! can work entirely in the stored form.
//!
//! ## Tuple flattening
//!
//! When tuple flattening is on, an arrow `Arrow⟦D,R⟧` whose domain `D` is a
//! formal bound to `Tuple⟦A,B⟧` becomes `Arrow⟦A,B,R⟧`. Only that one level is
//! flattened. The `_wrapped` entry points never flatten.
//!
//! ## Self references
//!
//! A template names itself either by its canonical name (`pkg/Box⟦⟧`) or by
//! its formal-bearing name (`pkg/Box⟦T⟧`). [`SubstitutionMap::with_self_name`]
//! maps both to the instance name, wherever they occur.

use oxford_core::naming::{
    LEFT_OXFORD, demangle, demangle_binary_name, mangle_binary_name, mangle_identifier,
};
use oxford_core::{Arg, GenericName, NamingResult, Piece, XlationError, XlationRecord, descriptor};
use rustc_hash::FxHashMap;

use crate::error::{RewriteError, RewriteResult};

/// Characters that disqualify a text run from being a formal.
const NOT_A_FORMAL: &[char] = &['/', '$', ';', '⟦', '⟧'];

/// Map from formal parameter name to actual argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionMap {
    bindings: FxHashMap<String, GenericName>,
    flatten_tuples: bool,
    self_name: Option<SelfName>,
}

/// The names a template uses for itself, and what they become.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SelfName {
    aliases: Vec<GenericName>,
    instance: GenericName,
}

/// Formals a template declares in its own name: the plain arguments of
/// `pkg/Box⟦T,U⟧`. A canonical name (`pkg/Box⟦⟧`) declares none.
pub fn declared_formals(template: &GenericName) -> Vec<&str> {
    template
        .args()
        .unwrap_or_default()
        .iter()
        .filter(|arg| arg.label.is_none())
        .filter_map(|arg| arg.value.as_plain())
        .filter(|text| !text.is_empty() && !text.contains(NOT_A_FORMAL))
        .collect()
}

impl SubstitutionMap {
    /// An empty map with tuple flattening enabled.
    pub fn new() -> Self {
        Self {
            bindings: FxHashMap::default(),
            flatten_tuples: true,
            self_name: None,
        }
    }

    /// Pair the record's formals with `actuals` positionally.
    ///
    /// # Errors
    /// Returns [`XlationError::ArityMismatch`] if the counts differ.
    pub fn from_xlation(
        template: &str,
        record: &XlationRecord,
        actuals: &[GenericName],
    ) -> RewriteResult<Self> {
        if record.len() != actuals.len() {
            return Err(XlationError::ArityMismatch {
                template: template.to_string(),
                expected: record.len(),
                actual: actuals.len(),
            }
            .into());
        }
        let mut map = Self::new();
        for (formal, actual) in record.formals().zip(actuals) {
            map.bindings.insert(formal.to_string(), actual.clone());
        }
        Ok(map)
    }

    /// Build from `(formal, natural actual)` text pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> NamingResult<Self> {
        let mut map = Self::new();
        for (formal, actual) in pairs {
            map.bind(formal, GenericName::parse(actual)?);
        }
        Ok(map)
    }

    /// Bind `formal` to `actual`, replacing any previous binding.
    pub fn bind(&mut self, formal: impl Into<String>, actual: GenericName) {
        self.bindings.insert(formal.into(), actual);
    }

    /// Enable or disable tuple flattening for the unwrapped entry points.
    pub fn with_tuple_flattening(mut self, enabled: bool) -> Self {
        self.flatten_tuples = enabled;
        self
    }

    /// Rewrite references to the template `template` (mangled) into
    /// `instance` (mangled).
    pub fn with_self_name(mut self, template: &str, instance: &str) -> NamingResult<Self> {
        let template = GenericName::parse(&demangle_binary_name(template))?;
        let instance = GenericName::parse(&demangle_binary_name(instance))?;
        let mut aliases = vec![template.clone()];
        if let Some(canonical) = template.canonical_template_name() {
            let canonical = GenericName::parse(&canonical)?;
            if canonical != template {
                aliases.push(canonical);
            }
        }
        self.self_name = Some(SelfName { aliases, instance });
        Ok(self)
    }

    pub fn flattens_tuples(&self) -> bool {
        self.flatten_tuples
    }

    /// The actual bound to `formal`.
    pub fn get(&self, formal: &str) -> Option<&GenericName> {
        self.bindings.get(formal)
    }

    /// The actual bound to `formal`, or an error naming it.
    pub fn require(&self, formal: &str) -> RewriteResult<&GenericName> {
        self.get(formal)
            .ok_or_else(|| RewriteError::UnboundFormal(formal.to_string()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound formal names, in no particular order.
    pub fn formals(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    // ========================================================================
    // Natural names
    // ========================================================================

    fn is_bound_formal(&self, text: &str) -> bool {
        !text.is_empty() && !text.contains(NOT_A_FORMAL) && self.bindings.contains_key(text)
    }

    /// Substitute inside a parsed natural name.
    pub fn substitute(&self, name: &GenericName) -> GenericName {
        self.substitute_with(name, self.flatten_tuples)
    }

    /// Substitute inside a parsed natural name without tuple flattening.
    pub fn substitute_wrapped(&self, name: &GenericName) -> GenericName {
        self.substitute_with(name, false)
    }

    fn substitute_with(&self, name: &GenericName, flatten: bool) -> GenericName {
        if let Some(own) = &self.self_name
            && own.aliases.contains(name)
        {
            return own.instance.clone();
        }
        if let Some(text) = name.as_plain() {
            if self.is_bound_formal(text) {
                return self.bindings[text].clone();
            }
            return name.clone();
        }

        let pieces = name
            .pieces()
            .iter()
            .map(|piece| match piece {
                Piece::Text(text) => Piece::Text(text.clone()),
                Piece::Args(args) => Piece::Args(
                    args.iter()
                        .map(|arg| Arg {
                            label: arg.label.clone(),
                            value: self.substitute_with(&arg.value, flatten),
                        })
                        .collect(),
                ),
            })
            .collect();
        let substituted = GenericName::from_pieces(pieces);

        if flatten && (name.is_arrow() || name.is_abstract_arrow()) {
            return self.flatten_domain(name, substituted);
        }
        substituted
    }

    /// `Arrow⟦D,R⟧` with `D` a formal now bound to `Tuple⟦…⟧` becomes
    /// `Arrow⟦…,R⟧`.
    fn flatten_domain(&self, original: &GenericName, substituted: GenericName) -> GenericName {
        let (Some(before), Some(after)) = (original.args(), substituted.args()) else {
            return substituted;
        };
        let [domain, _] = before else {
            return substituted;
        };
        let domain_was_formal = domain.label.is_none()
            && domain.value.as_plain().is_some_and(|text| self.is_bound_formal(text));
        if !domain_was_formal || !after[0].value.is_tuple() {
            return substituted;
        }
        let mut flat: Vec<Arg> = after[0].value.args().unwrap_or_default().to_vec();
        flat.push(after[1].clone());
        substituted.replace_args(flat)
    }

    /// Parse, substitute, and print a natural name.
    pub fn natural_type_name(&self, natural: &str) -> NamingResult<String> {
        Ok(self.substitute(&GenericName::parse(natural)?).to_string())
    }

    // ========================================================================
    // Mangled names
    // ========================================================================

    /// Substitute a mangled binary name; the result is mangled.
    pub fn type_name(&self, mangled: &str) -> NamingResult<String> {
        self.map_type_name(mangled, self.flatten_tuples)
    }

    /// [`Self::type_name`] without tuple flattening.
    pub fn type_name_wrapped(&self, mangled: &str) -> NamingResult<String> {
        self.map_type_name(mangled, false)
    }

    /// Substitute a mangled binary name and return the parsed natural result.
    pub fn instantiate(&self, mangled: &str) -> NamingResult<GenericName> {
        let natural = demangle_binary_name(mangled);
        Ok(self.substitute(&GenericName::parse(&natural)?))
    }

    fn map_type_name(&self, mangled: &str, flatten: bool) -> NamingResult<String> {
        let natural = demangle_binary_name(mangled);
        if !natural.contains(LEFT_OXFORD) && !self.is_bound_formal(&natural) {
            return Ok(mangled.to_string());
        }
        let substituted = self.substitute_with(&GenericName::parse(&natural)?, flatten);
        mangle_binary_name(&substituted.to_string())
    }

    /// Substitute inside a mangled member name.
    ///
    /// Member names are substituted only inside argument lists; a field or
    /// method whose whole name equals a formal keeps its name.
    pub fn member_name(&self, mangled: &str) -> NamingResult<String> {
        let natural = demangle(mangled);
        if !natural.contains(LEFT_OXFORD) {
            return Ok(mangled.to_string());
        }
        let substituted = self.substitute(&GenericName::parse(&natural)?);
        Ok(mangle_identifier(&substituted.to_string()))
    }

    /// Substitute the class names in a mangled field descriptor.
    pub fn field_desc(&self, mangled: &str) -> NamingResult<String> {
        descriptor::map_class_names(mangled, |name| self.map_type_name(name, self.flatten_tuples))
    }

    /// [`Self::field_desc`] without tuple flattening.
    pub fn field_desc_wrapped(&self, mangled: &str) -> NamingResult<String> {
        descriptor::map_class_names(mangled, |name| self.map_type_name(name, false))
    }

    /// Substitute the class names in a mangled method descriptor.
    pub fn method_desc(&self, mangled: &str) -> NamingResult<String> {
        self.field_desc(mangled)
    }
}
