//! Deterministic 64-bit identities for runtime type descriptors and literals.
//!
//! [`TypeHash`] gives every natural type name a stable serial number. Closure
//! tables combine the serials of their type arguments into a single cache key
//! with [`TypeHash::closure_key`], and constant calls that ask for the hash of
//! a literal use [`TypeHash::literal`].
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so a type name and a
//! literal with the same spelling never share a hash.
//!
//! # Examples
//!
//! ```
//! use oxford_core::TypeHash;
//!
//! let int_hash = TypeHash::from_name("Int");
//! assert_eq!(int_hash, TypeHash::from_name("Int"));
//!
//! let ab = TypeHash::closure_key(&[TypeHash::from_name("A"), TypeHash::from_name("B")]);
//! let ba = TypeHash::closure_key(&[TypeHash::from_name("B"), TypeHash::from_name("A")]);
//! assert_ne!(ab, ba);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Domain marker for type-name hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for literal hashes requested by constant calls
    pub const LITERAL: u64 = 0x1a095090689d4647;

    /// Argument position constants.
    /// Each position gets its own constant so argument order matters.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// Multiplier for argument position `i`.
#[inline]
fn marker(i: usize) -> u64 {
    hash_constants::PARAM_MARKERS
        .get(i)
        .copied()
        .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64))
}

/// A deterministic 64-bit hash of a natural type name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Create a type hash from a natural type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a literal, as pushed by `hash⁑…` constant calls.
    #[inline]
    pub fn literal(text: &str) -> i64 {
        (hash_constants::LITERAL ^ xxh64(text.as_bytes(), 0)) as i64
    }

    /// Combine argument serials into a closure-table key.
    ///
    /// The key is the wrapping sum of `serial_i * marker_i`, so reordering
    /// the arguments changes the key.
    #[inline]
    pub fn closure_key(args: &[TypeHash]) -> i64 {
        args.iter()
            .enumerate()
            .fold(0u64, |acc, (i, arg)| acc.wrapping_add(arg.0.wrapping_mul(marker(i))))
            as i64
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_hash_determinism() {
        assert_eq!(TypeHash::from_name("Box⟦Int⟧"), TypeHash::from_name("Box⟦Int⟧"));
        assert_ne!(TypeHash::from_name("Box⟦Int⟧"), TypeHash::from_name("Box⟦Bool⟧"));
    }

    #[test]
    fn literal_hash_differs_from_type_hash() {
        let text = "String";
        assert_ne!(TypeHash::literal(text) as u64, TypeHash::from_name(text).0);
        assert_eq!(TypeHash::literal(text), TypeHash::literal(text));
    }

    #[test]
    fn closure_key_is_order_sensitive() {
        let a = TypeHash::from_name("A");
        let b = TypeHash::from_name("B");
        assert_ne!(TypeHash::closure_key(&[a, b]), TypeHash::closure_key(&[b, a]));
        assert_eq!(TypeHash::closure_key(&[]), 0);
    }

    #[test]
    fn closure_key_beyond_marker_table() {
        let args: Vec<TypeHash> = (0..20).map(|i| TypeHash::from_name(&format!("T{i}"))).collect();
        assert_eq!(TypeHash::closure_key(&args), TypeHash::closure_key(&args));
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", TypeHash(0x1)), "0x0000000000000001");
        assert_eq!(format!("{:?}", TypeHash(0x1)), "TypeHash(0x0000000000000001)");
    }
}
