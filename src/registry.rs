//! The per-name table of installed classes.
//!
//! Each requested name owns one slot. The first request for a name runs the
//! load and every concurrent or later request waits on, then shares, its
//! outcome. Failures are kept too, so a name that failed once is never
//! retried by the same table.

use std::sync::{Arc, OnceLock};

use oxford_bytecode::ClassModel;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::LoadError;

/// Where an installed class came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassOrigin {
    /// Read from storage unchanged.
    Stored,
    /// Supplied by the system loader.
    System,
    /// Rewritten from the template stored under this (mangled) name.
    Specialized { template: String },
    /// Built from the name alone.
    Synthesized,
}

/// A class installed under its requested name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedClass {
    pub name: String,
    pub model: ClassModel,
    pub origin: ClassOrigin,
}

impl LoadedClass {
    pub fn new(name: impl Into<String>, model: ClassModel, origin: ClassOrigin) -> Self {
        Self {
            name: name.into(),
            model,
            origin,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.model.is_interface()
    }
}

type LoadOutcome = Result<Arc<LoadedClass>, LoadError>;

/// Installed classes by requested name.
#[derive(Debug, Default)]
pub struct ClassTable {
    slots: Mutex<FxHashMap<String, Arc<OnceLock<LoadOutcome>>>>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Arc<OnceLock<LoadOutcome>> {
        let mut slots = self.slots.lock();
        match slots.get(name) {
            Some(slot) => Arc::clone(slot),
            None => {
                let slot = Arc::new(OnceLock::new());
                slots.insert(name.to_string(), Arc::clone(&slot));
                slot
            }
        }
    }

    /// The class installed under `name`, running `load` if this is the first
    /// request for it.
    ///
    /// `load` runs at most once per name. The table lock is not held while
    /// it runs, so loads of different names proceed in parallel.
    pub fn get_or_load(&self, name: &str, load: impl FnOnce() -> Result<LoadedClass, LoadError>) -> LoadOutcome {
        let slot = self.slot(name);
        slot.get_or_init(|| load().map(Arc::new)).clone()
    }

    /// The class installed under `name`, if loading it has succeeded.
    pub fn find_loaded(&self, name: &str) -> Option<Arc<LoadedClass>> {
        let slot = self.slots.lock().get(name).cloned()?;
        slot.get()?.as_ref().ok().cloned()
    }

    /// The remembered failure for `name`, if loading it has failed.
    pub fn failure(&self, name: &str) -> Option<LoadError> {
        let slot = self.slots.lock().get(name).cloned()?;
        slot.get()?.as_ref().err().cloned()
    }

    /// Number of successfully installed classes.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot.get(), Some(Ok(_))))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of all successfully installed classes, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot.get(), Some(Ok(_))))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxford_bytecode::OBJECT_CLASS;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn class(name: &str) -> LoadedClass {
        LoadedClass::new(name, ClassModel::new(name, OBJECT_CLASS), ClassOrigin::Stored)
    }

    #[test]
    fn loads_once_and_shares() {
        let table = ClassTable::new();
        let calls = AtomicUsize::new(0);
        let first = table
            .get_or_load("A", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(class("A"))
            })
            .unwrap();
        let second = table
            .get_or_load("A", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(class("A"))
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.names(), vec!["A".to_string()]);
    }

    #[test]
    fn failures_are_remembered() {
        let table = ClassTable::new();
        let missing = || LoadError::NotFound { name: "B".into() };
        assert!(table.get_or_load("B", || Err(missing())).is_err());
        let retried = table.get_or_load("B", || Ok(class("B")));
        assert!(matches!(retried, Err(LoadError::NotFound { .. })));
        assert!(table.failure("B").is_some());
        assert!(table.find_loaded("B").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn concurrent_requests_observe_one_installation() {
        let table = ClassTable::new();
        let calls = AtomicUsize::new(0);
        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        table
                            .get_or_load("C", || {
                                calls.fetch_add(1, Ordering::SeqCst);
                                Ok(class("C"))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
