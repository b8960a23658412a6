//! Runtime type descriptors and their interning table.

use std::fmt;
use std::sync::Arc;

use oxford_core::TypeHash;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// The runtime descriptor of one concrete type.
///
/// The serial is derived from the natural name, so two descriptors for the
/// same type agree on it across runs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Rtti {
    name: String,
    serial: TypeHash,
}

impl Rtti {
    /// The descriptor of the type with natural name `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let serial = TypeHash::from_name(&name);
        Self { name, serial }
    }

    /// Natural name of the described type, as it appears in argument lists.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serial(&self) -> TypeHash {
        self.serial
    }
}

impl fmt::Debug for Rtti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rtti({} {:?})", self.name, self.serial)
    }
}

/// Interns descriptors of instantiated types by the descriptors of their
/// arguments.
///
/// The first descriptor stored for an argument tuple wins; later
/// [`put_if_new`](Self::put_if_new) calls get it back instead of storing
/// their own.
#[derive(Debug, Default)]
pub struct RttiTable {
    entries: Mutex<FxHashMap<Box<[TypeHash]>, Arc<Rtti>>>,
}

fn key_of(params: &[&Rtti]) -> Box<[TypeHash]> {
    params.iter().map(|rtti| rtti.serial()).collect()
}

macro_rules! arity_entry_points {
    ($($get:ident, $put:ident => ($($param:ident),+);)+) => {
        $(
            pub fn $get(&self, $($param: &Rtti),+) -> Option<Arc<Rtti>> {
                self.get(&[$($param),+])
            }

            pub fn $put(&self, $($param: &Rtti,)+ value: Arc<Rtti>) -> Arc<Rtti> {
                self.put_if_new(&[$($param),+], value)
            }
        )+
    };
}

impl RttiTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The descriptor stored for `params`.
    pub fn get(&self, params: &[&Rtti]) -> Option<Arc<Rtti>> {
        self.entries.lock().get(&key_of(params)).cloned()
    }

    /// Store `value` for `params` unless something is already there, and
    /// return whatever is stored now.
    pub fn put_if_new(&self, params: &[&Rtti], value: Arc<Rtti>) -> Arc<Rtti> {
        Arc::clone(self.entries.lock().entry(key_of(params)).or_insert(value))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    arity_entry_points! {
        get1, put_if_new1 => (a);
        get2, put_if_new2 => (a, b);
        get3, put_if_new3 => (a, b, c);
        get4, put_if_new4 => (a, b, c, d);
        get5, put_if_new5 => (a, b, c, d, e);
        get6, put_if_new6 => (a, b, c, d, e, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_follows_name() {
        assert_eq!(Rtti::new("Int").serial(), Rtti::new("Int").serial());
        assert_ne!(Rtti::new("Int").serial(), Rtti::new("Bool").serial());
    }

    #[test]
    fn first_writer_wins() {
        let table = RttiTable::new();
        let int = Rtti::new("Int");
        let bool_ = Rtti::new("Bool");

        let first = table.put_if_new2(&int, &bool_, Arc::new(Rtti::new("Pair⟦Int,Bool⟧")));
        let second = table.put_if_new2(&int, &bool_, Arc::new(Rtti::new("other")));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(table.get2(&int, &bool_).unwrap().name(), "Pair⟦Int,Bool⟧");
        assert!(table.get2(&bool_, &int).is_none());
        assert!(table.get1(&int).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn slice_and_arity_forms_agree() {
        let table = RttiTable::new();
        let params: Vec<Rtti> = ["A", "B", "C", "D", "E", "F"].into_iter().map(Rtti::new).collect();
        let refs: Vec<&Rtti> = params.iter().collect();
        table.put_if_new(&refs, Arc::new(Rtti::new("Six")));
        let found = table.get6(refs[0], refs[1], refs[2], refs[3], refs[4], refs[5]);
        assert_eq!(found.unwrap().name(), "Six");
    }
}
