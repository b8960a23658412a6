//! Memoized closure instances for generic call sites.
//!
//! A call site that needs a closure specialized on runtime type arguments
//! owns one [`ClosureTable`]. The table keys instances by a hash of the
//! arguments' serials and only goes to the loader on a miss, so repeated
//! calls with the same arguments cost one lock-free tree lookup.

use std::sync::Arc;

use oxford_cache::SpecializationCache;
use oxford_core::naming::{EMPTY_ARGS, mangle_binary_name};
use oxford_core::{NamingError, NamingResult, TypeHash};
use tracing::trace;

use crate::error::LoadError;
use crate::loader::SpecializationLoader;
use crate::registry::LoadedClass;
use crate::runtime::rtti::Rtti;

/// A closure class specialized for one argument tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureInstance {
    pub key: i64,
    pub class: Arc<LoadedClass>,
}

/// Closure instances of one generic stem, by argument tuple.
#[derive(Debug)]
pub struct ClosureTable {
    stem: String,
    loader: Arc<SpecializationLoader>,
    cache: SpecializationCache<Arc<ClosureInstance>>,
}

macro_rules! arity_entry_points {
    ($($name:ident => ($($param:ident),+);)+) => {
        $(
            pub fn $name(&self, $($param: &Rtti),+) -> Result<Arc<ClosureInstance>, LoadError> {
                self.load(&[$($param),+])
            }
        )+
    };
}

impl ClosureTable {
    /// A table for `stem`, a natural name with a `⟦⟧` slot where the
    /// arguments go (`pkg/Api⚙map⟦⟧✉`).
    pub fn new(loader: Arc<SpecializationLoader>, stem: impl Into<String>) -> NamingResult<Self> {
        let stem = stem.into();
        if !stem.contains(EMPTY_ARGS) {
            return Err(NamingError::MissingPlaceholder { stem });
        }
        Ok(Self {
            stem,
            loader,
            cache: SpecializationCache::new(),
        })
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Cache key for an argument tuple.
    pub fn key(params: &[&Rtti]) -> i64 {
        let serials: Vec<TypeHash> = params.iter().map(|rtti| rtti.serial()).collect();
        TypeHash::closure_key(&serials)
    }

    /// Mangled class name of the instance for `params`.
    pub fn class_name(&self, params: &[&Rtti]) -> NamingResult<String> {
        let names: Vec<&str> = params.iter().map(|rtti| rtti.name()).collect();
        let natural = self
            .stem
            .replacen(EMPTY_ARGS, &format!("⟦{}⟧", names.join(",")), 1);
        mangle_binary_name(&natural)
    }

    /// The cached instance for `key`, without loading.
    pub fn lookup(&self, key: i64) -> Option<Arc<ClosureInstance>> {
        self.cache.get(key)
    }

    /// The instance for `params`, loading and memoizing it on first use.
    ///
    /// Concurrent first uses all get the same instance.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn load(&self, params: &[&Rtti]) -> Result<Arc<ClosureInstance>, LoadError> {
        let key = Self::key(params);
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit);
        }

        let name = self.class_name(params).map_err(|source| LoadError::MalformedName {
            name: self.stem.clone(),
            source,
        })?;
        let class = self.loader.load_class(&name)?;
        trace!(stem = %self.stem, key, "Memoizing closure");
        Ok(self
            .cache
            .put_if_absent(key, Arc::new(ClosureInstance { key, class })))
    }

    /// Number of memoized instances.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    arity_entry_points! {
        load1 => (a);
        load2 => (a, b);
        load3 => (a, b, c);
        load4 => (a, b, c, d);
        load5 => (a, b, c, d, e);
        load6 => (a, b, c, d, e, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::MemoryResources;

    fn table(stem: &str) -> ClosureTable {
        let loader = Arc::new(SpecializationLoader::new(MemoryResources::new()));
        ClosureTable::new(loader, stem).unwrap()
    }

    #[test]
    fn stem_needs_a_placeholder() {
        let loader = Arc::new(SpecializationLoader::new(MemoryResources::new()));
        assert!(matches!(
            ClosureTable::new(loader, "pkg/Api⚙f✉"),
            Err(NamingError::MissingPlaceholder { .. })
        ));
    }

    #[test]
    fn class_name_fills_the_placeholder() {
        let table = table("pkg/Api⚙map⟦⟧✉");
        let int = Rtti::new("Int");
        let list = Rtti::new("List⟦a/B⟧");
        assert_eq!(
            table.class_name(&[&int, &list]).unwrap(),
            mangle_binary_name("pkg/Api⚙map⟦Int,List⟦a/B⟧⟧✉").unwrap()
        );
    }

    #[test]
    fn key_depends_on_order() {
        let a = Rtti::new("A");
        let b = Rtti::new("B");
        assert_ne!(ClosureTable::key(&[&a, &b]), ClosureTable::key(&[&b, &a]));
    }

    #[test]
    fn structural_arrows_load_without_templates() {
        let table = table("Arrow⟦⟧");
        let x = Rtti::new("X");
        let y = Rtti::new("Y");
        let first = table.load2(&x, &y).unwrap();
        let second = table.load2(&x, &y).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.class.is_interface());
        assert_eq!(table.lookup(ClosureTable::key(&[&x, &y])), Some(first));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_class_is_not_memoized_in_the_cache() {
        let table = table("pkg/Box⟦⟧");
        assert!(table.load1(&Rtti::new("Int")).unwrap_err().is_not_found());
        assert!(table.is_empty());
    }
}
