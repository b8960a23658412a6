//! Loadable constants.
//!
//! A `Ldc` instruction pushes one of these. Floats are wrapped in
//! `OrderedFloat` so instructions stay `Eq + Hash` and can be compared
//! structurally in tests and deduplicated by the lowering pass.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Values an `Ldc` instruction can push.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(String),
    /// A class literal, by mangled binary name.
    Class(String),
}

impl Constant {
    pub fn string(value: impl Into<String>) -> Self {
        Constant::String(value.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Constant::Class(name.into())
    }

    /// Descriptor of the value this constant pushes.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Constant::Int(_) => "I",
            Constant::Long(_) => "J",
            Constant::Float(_) => "F",
            Constant::Double(_) => "D",
            Constant::String(_) => "Ljava/lang/String;",
            Constant::Class(_) => "Ljava/lang/Class;",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn float_constants_hash_by_value() {
        let mut set = HashSet::new();
        set.insert(Constant::Double(OrderedFloat(f64::NAN)));
        set.insert(Constant::Double(OrderedFloat(f64::NAN)));
        set.insert(Constant::Float(OrderedFloat(1.5)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn descriptors() {
        assert_eq!(Constant::Long(3).descriptor(), "J");
        assert_eq!(Constant::string("x").descriptor(), "Ljava/lang/String;");
        assert_eq!(Constant::class("a/B").descriptor(), "Ljava/lang/Class;");
    }
}
