//! Constant threading through reserved pseudo-calls.
//!
//! A template cannot hold a constant that depends on its static arguments,
//! so the compiler emits a call `MagicConst.op⁑literal()` instead. Once the
//! literal has been substituted the call is replaced by a constant load.

use oxford_bytecode::{Constant, Insn};
use oxford_core::TypeHash;
use oxford_core::naming::{MAGIC_SEPARATOR, demangle, mangle_identifier};

use crate::error::{RewriteError, RewriteResult};
use crate::substitution::SubstitutionMap;

/// Owner of every constant pseudo-call.
pub const MAGIC_OWNER: &str = "oxford/runtime/MagicConst";

/// Loads the literal as a string.
pub const STRING_OP: &str = "string";

/// Loads the hash of the literal as a long.
pub const HASH_OP: &str = "hash";

/// Split a demangled pseudo-call name into its operation and literal.
///
/// A name without the separator is an operation with an empty literal.
pub fn split_magic_name(name: &str) -> (&str, &str) {
    name.split_once(MAGIC_SEPARATOR).unwrap_or((name, ""))
}

/// Mangled name of a pseudo-call, as the compiler emits it.
pub fn magic_call_name(op: &str, literal: &str) -> String {
    mangle_identifier(&format!("{op}{MAGIC_SEPARATOR}{literal}"))
}

/// The constant load replacing a call to `name` on [`MAGIC_OWNER`].
pub fn rewrite_magic_call(name: &str, subst: &SubstitutionMap) -> RewriteResult<Insn> {
    let natural = demangle(name);
    let (op, literal) = split_magic_name(&natural);
    let literal = if literal.is_empty() {
        String::new()
    } else {
        subst.natural_type_name(literal)?
    };
    match op {
        STRING_OP => Ok(Insn::Ldc(Constant::String(literal))),
        HASH_OP => Ok(Insn::Ldc(Constant::Long(TypeHash::literal(&literal)))),
        _ => Err(RewriteError::UnknownMagicOp {
            op: op.to_string(),
            name: natural.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subst() -> SubstitutionMap {
        SubstitutionMap::from_pairs([("T", "pkg/Int"), ("U", "List⟦Bool⟧")]).unwrap()
    }

    #[test]
    fn string_constant_is_substituted() {
        let insn = rewrite_magic_call(&magic_call_name("string", "Box⟦T⟧"), &subst()).unwrap();
        assert_eq!(insn, Insn::Ldc(Constant::String("Box⟦pkg/Int⟧".into())));
    }

    #[test]
    fn hash_constant_hashes_the_substituted_literal() {
        let insn = rewrite_magic_call(&magic_call_name("hash", "U"), &subst()).unwrap();
        assert_eq!(insn, Insn::Ldc(Constant::Long(TypeHash::literal("List⟦Bool⟧"))));
    }

    #[test]
    fn unknown_operation_is_an_error() {
        let err = rewrite_magic_call(&magic_call_name("frob", "T"), &subst()).unwrap_err();
        assert!(matches!(err, RewriteError::UnknownMagicOp { ref op, .. } if op == "frob"));
    }

    #[test]
    fn name_without_separator() {
        assert_eq!(split_magic_name("string"), ("string", ""));
        assert_eq!(split_magic_name("hash⁑a⁑b"), ("hash", "a⁑b"));
    }
}
