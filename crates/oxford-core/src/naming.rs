//! Reversible escaping of natural names into target-legal identifiers.
//!
//! Natural names are the source-level spelling of a type or member and may
//! contain characters the target format forbids: `/ . ; $ < > [ ] :`. The
//! codec rewrites each of those as a two-character escape introduced by `\`
//! and marks any changed identifier that does not already begin with `\` by
//! prefixing `\=`.
//!
//! ## Components
//!
//! - [`mangle_identifier`] / [`demangle`]: one path segment at a time
//! - [`cat_mangled`] / [`cat_mangled3`]: join already-mangled pieces
//! - [`mangle_binary_name`] / [`demangle_binary_name`]: `/`-separated names
//!   whose segments may nest `⟦…⟧` argument lists
//! - [`mangle_descriptor`] / [`demangle_descriptor`]: field and method
//!   descriptors, mangling only the class names embedded in them
//!
//! # Examples
//!
//! ```
//! use oxford_core::naming::{demangle, mangle_identifier};
//!
//! assert_eq!(mangle_identifier("cat"), "cat");
//! assert_eq!(mangle_identifier(";$"), "\\?\\%");
//! assert_eq!(demangle(&mangle_identifier("a.b")), "a.b");
//! ```

use crate::descriptor;
use crate::error::{NamingError, NamingResult};

// ============================================================================
// Grammar markers
// ============================================================================

/// Introduces every escape sequence.
pub const ESCAPE: char = '\\';

/// Opens a static argument list.
pub const LEFT_OXFORD: char = '⟦';

/// Closes a static argument list.
pub const RIGHT_OXFORD: char = '⟧';

/// Separates static arguments.
pub const ARG_SEPARATOR: char = ',';

/// Separates an argument label from its value.
pub const LABEL_MARKER: char = '=';

/// Separates path segments of a binary name.
pub const PATH_SEPARATOR: char = '/';

/// Marks a closure class name.
pub const ENVELOPE: char = '✉';

/// Separates the api class from the function in a closure name.
pub const GEAR: char = '⚙';

/// Separates the operation from the literal in a constant-call name.
pub const MAGIC_SEPARATOR: char = '⁑';

/// Placeholder left in a canonical template name where the arguments were.
pub const EMPTY_ARGS: &str = "⟦⟧";

/// Mangled form of the empty identifier, and the prefix of changed names.
pub const EXPLICIT_PREFIX: &str = "\\=";

/// Escape characters, paired by position with [`TRANSLATES`].
const ESCAPES: &str = "|,?%^_}{!-";

/// The natural characters each escape stands for.
const TRANSLATES: &str = "/.;$<>][:\\";

/// Escapes that are accidental when they follow a lone leading `\`.
const FIRST_ESCAPES: &str = "|,?%^_}{!-=";

/// Member names the target format reserves and that pass through unescaped.
const RESERVED_MEMBER_NAMES: [&str; 2] = ["<init>", "<clinit>"];

// ============================================================================
// Character tables
// ============================================================================

#[inline]
fn is_escape_char(ch: char) -> bool {
    ESCAPES.contains(ch)
}

/// The escape character standing in for a dangerous natural character.
#[inline]
fn escape_for(ch: char) -> Option<char> {
    TRANSLATES
        .chars()
        .position(|t| t == ch)
        .and_then(|i| ESCAPES.chars().nth(i))
}

/// The natural character an escape character stands for.
#[inline]
fn translate(ch: char) -> Option<char> {
    ESCAPES
        .chars()
        .position(|e| e == ch)
        .and_then(|i| TRANSLATES.chars().nth(i))
}

#[inline]
fn nth_char(s: &str, n: usize) -> Option<char> {
    s.chars().nth(n)
}

// ============================================================================
// Identifiers
// ============================================================================

/// Mangle one identifier (a single path segment).
///
/// Identity on names that contain no dangerous characters and no accidental
/// escapes. The empty identifier mangles to `\=`.
pub fn mangle_identifier(identifier: &str) -> String {
    if identifier.is_empty() {
        return EXPLICIT_PREFIX.to_string();
    }
    if RESERVED_MEMBER_NAMES.contains(&identifier) {
        return identifier.to_string();
    }

    let chars: Vec<char> = identifier.chars().collect();
    let mut out = String::with_capacity(identifier.len() + 4);
    let mut changed = false;

    for (i, &ch) in chars.iter().enumerate() {
        if ch == ESCAPE {
            out.push(ESCAPE);
            // A natural `\` that would read back as an escape gets `-` after it.
            if let Some(&next) = chars.get(i + 1)
                && (is_escape_char(next) || (i == 0 && next == LABEL_MARKER))
            {
                out.push('-');
                changed = true;
            }
        } else if let Some(escape) = escape_for(ch) {
            out.push(ESCAPE);
            out.push(escape);
            changed = true;
        } else {
            out.push(ch);
        }
    }

    if changed && !out.starts_with(ESCAPE) {
        out.insert_str(0, EXPLICIT_PREFIX);
    }
    out
}

/// Invert [`mangle_identifier`].
///
/// Names that do not start with `\` were never changed and come back as-is.
pub fn demangle(mangled: &str) -> String {
    if mangled.chars().count() < 2 || !mangled.starts_with(ESCAPE) {
        return mangled.to_string();
    }
    let body = mangled.strip_prefix(EXPLICIT_PREFIX).unwrap_or(mangled);
    if body.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(body.len());
    let mut saw_escape = false;
    for ch in body.chars() {
        if saw_escape {
            if let Some(natural) = translate(ch) {
                out.push(natural);
                saw_escape = false;
                continue;
            }
            out.push(ESCAPE);
        }
        saw_escape = ch == ESCAPE;
        if !saw_escape {
            out.push(ch);
        }
    }
    if saw_escape {
        out.push(ESCAPE);
    }
    out
}

/// `true` if `s` carries the mangled marker or contains an escape sequence.
pub fn is_mangled(s: &str) -> bool {
    s.chars().count() >= 2
        && s.starts_with(ESCAPE)
        && (nth_char(s, 1) == Some(LABEL_MARKER) || contains_escape(s))
}

/// Cheap approximation of [`is_mangled`]: starts with `\` and has a second character.
pub fn likely_mangled(s: &str) -> bool {
    s.chars().count() >= 2 && s.starts_with(ESCAPE)
}

/// `true` if `s` contains `\` followed by an escape character.
fn contains_escape(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == ESCAPE
            && let Some(&next) = chars.peek()
            && is_escape_char(next)
        {
            return true;
        }
    }
    false
}

// ============================================================================
// Concatenation
// ============================================================================

/// Concatenate two mangled identifiers so that the result equals the
/// mangling of the concatenated natural names.
pub fn cat_mangled(s1: &str, s2: &str) -> String {
    if s1.is_empty() {
        return s2.to_string();
    }
    if s2.is_empty() {
        return s1.to_string();
    }
    let l1 = s1.chars().count();
    let l2 = s2.chars().count();

    if !likely_mangled(s1) && !likely_mangled(s2) {
        return cat_mangled_checking_joint(s1, s2);
    }

    if likely_mangled(s1) {
        if l1 == 2 && nth_char(s1, 1) == Some(LABEL_MARKER) {
            // s1 is the mangled empty string.
            return s2.to_string();
        }
        if likely_mangled(s2) {
            let ch1 = nth_char(s2, 1);
            if ch1 == Some(LABEL_MARKER) {
                return cat_mangled_checking_joint(s1, &s2[EXPLICIT_PREFIX.len()..]);
            }
            if ch1 == Some('-') && l2 > 2 && nth_char(s2, 2) == Some(LABEL_MARKER) {
                // s2 began with a natural `\=`; its escape is no longer leading.
                let mut out = String::with_capacity(s1.len() + s2.len());
                out.push_str(s1);
                out.push(ESCAPE);
                out.push_str(&s2[2..]);
                return out;
            }
            return format!("{s1}{s2}");
        }
        return cat_mangled_checking_joint(s1, s2);
    }

    // s1 plain, s2 likely mangled.
    let ch1 = nth_char(s2, 1);
    if ch1 == Some(LABEL_MARKER) {
        if l2 == 2 {
            return s1.to_string();
        }
        let joined = cat_mangled_checking_joint(s1, &s2[EXPLICIT_PREFIX.len()..]);
        return format!("{EXPLICIT_PREFIX}{joined}");
    }
    if ch1 == Some('-') && l2 > 2 && nth_char(s2, 2) == Some(LABEL_MARKER) {
        let rest = &s2[3..];
        if contains_escape(rest) {
            return format!("{EXPLICIT_PREFIX}{s1}{EXPLICIT_PREFIX}{rest}");
        }
        return format!("{s1}{EXPLICIT_PREFIX}{rest}");
    }
    if is_mangled(s2) {
        return format!("{EXPLICIT_PREFIX}{s1}{s2}");
    }
    format!("{s1}{s2}")
}

/// Concatenate three mangled identifiers, left to right.
pub fn cat_mangled3(s1: &str, s2: &str, s3: &str) -> String {
    cat_mangled(&cat_mangled(s1, s2), s3)
}

/// Join `s1` and `s2`, repairing an escape that forms across the seam.
fn cat_mangled_checking_joint(s1: &str, s2: &str) -> String {
    let Some(first) = s2.chars().next() else {
        return s1.to_string();
    };
    if s1.ends_with(ESCAPE) {
        let dangerous = if s1.chars().count() == 1 {
            FIRST_ESCAPES.contains(first)
        } else {
            ESCAPES.contains(first)
        };
        if dangerous {
            if s1.starts_with(ESCAPE) {
                return format!("{s1}-{s2}");
            }
            return format!("{EXPLICIT_PREFIX}{s1}-{s2}");
        }
    }
    format!("{s1}{s2}")
}

// ============================================================================
// Binary names
// ============================================================================

/// Check that every `⟦` in `name` has a matching `⟧`.
pub fn check_brackets(name: &str) -> NamingResult<()> {
    let mut depth = 0usize;
    let mut open_at = 0usize;
    for (offset, ch) in name.char_indices() {
        match ch {
            LEFT_OXFORD => {
                if depth == 0 {
                    open_at = offset;
                }
                depth += 1;
            }
            RIGHT_OXFORD => {
                depth = depth.checked_sub(1).ok_or_else(|| NamingError::UnbalancedBrackets {
                    name: name.to_string(),
                    offset,
                })?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(NamingError::UnbalancedBrackets {
            name: name.to_string(),
            offset: open_at,
        });
    }
    Ok(())
}

/// Split `name` at `/` characters that sit outside every `⟦…⟧`.
fn split_top_level(name: &str) -> Vec<&str> {
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut segments = Vec::new();
    for (offset, ch) in name.char_indices() {
        match ch {
            LEFT_OXFORD => depth += 1,
            RIGHT_OXFORD => depth = depth.saturating_sub(1),
            PATH_SEPARATOR if depth == 0 => {
                segments.push(&name[start..offset]);
                start = offset + ch.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&name[start..]);
    segments
}

/// Mangle a `/`-separated natural binary name segment by segment.
///
/// Separators nested inside `⟦…⟧` belong to the argument text and are
/// escaped along with the rest of their segment.
pub fn mangle_binary_name(name: &str) -> NamingResult<String> {
    check_brackets(name)?;
    let segments: Vec<String> = split_top_level(name).into_iter().map(mangle_identifier).collect();
    Ok(segments.join("/"))
}

/// Invert [`mangle_binary_name`].
pub fn demangle_binary_name(mangled: &str) -> String {
    mangled.split(PATH_SEPARATOR).map(demangle).collect::<Vec<_>>().join("/")
}

// ============================================================================
// Descriptors
// ============================================================================

/// Mangle every class name embedded in a natural descriptor.
pub fn mangle_descriptor(desc: &str) -> NamingResult<String> {
    descriptor::map_class_names(desc, |name| mangle_binary_name(name))
}

/// Demangle every class name embedded in a mangled descriptor.
pub fn demangle_descriptor(desc: &str) -> NamingResult<String> {
    descriptor::map_class_names(desc, |name| Ok(demangle_binary_name(name)))
}

/// Remove the `n`th (zero-based) parameter from a method descriptor.
///
/// # Examples
///
/// ```
/// use oxford_core::naming::remove_nth_sig_parameter;
///
/// assert_eq!(remove_nth_sig_parameter("(LA;LB;LC;)LD;", 1).unwrap(), "(LA;LC;)LD;");
/// ```
pub fn remove_nth_sig_parameter(sig: &str, n: usize) -> NamingResult<String> {
    let method = descriptor::MethodDescriptor::parse(sig)?;
    let malformed = || NamingError::MalformedDescriptor {
        descriptor: sig.to_string(),
        offset: 0,
    };
    if n >= method.params.len() {
        return Err(malformed());
    }
    let mut out = String::from("(");
    for (i, param) in method.params.iter().enumerate() {
        if i != n {
            out.push_str(param);
        }
    }
    out.push(')');
    out.push_str(method.result);
    Ok(out)
}

/// Replace `.` with `/` in a dotted class name.
pub fn dot_to_slash(name: &str) -> String {
    name.replace('.', "/")
}

/// Replace `/` with `.` in a slashed class name.
pub fn slash_to_dot(name: &str) -> String {
    name.replace('/', ".")
}

/// The field descriptor for a natural type name: `L<mangled>;`.
pub fn descriptor_for_type(natural: &str) -> NamingResult<String> {
    Ok(format!("L{};", mangle_binary_name(natural)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const INPUTS: [&str; 7] = ["\\=", "", "cat", "\\d\\o\\g\\", "%e%m%u%", ";$", "\\%$"];
    const OUTPUTS: [&str; 7] = ["\\-=", "\\=", "cat", "\\d\\o\\g\\", "%e%m%u%", "\\?\\%", "\\-%\\%"];

    #[test]
    fn mangle_matches_known_vectors() {
        for (input, output) in INPUTS.iter().zip(OUTPUTS.iter()) {
            assert_eq!(mangle_identifier(input), *output, "mangling {input:?}");
        }
    }

    #[test]
    fn demangle_inverts_known_vectors() {
        for (input, output) in INPUTS.iter().zip(OUTPUTS.iter()) {
            assert_eq!(demangle(output), *input, "demangling {output:?}");
        }
    }

    #[test]
    fn cat_mangled_pairs_match_mangled_concatenation() {
        for (i, a) in INPUTS.iter().enumerate() {
            for (j, b) in INPUTS.iter().enumerate() {
                let natural = format!("{a}{b}");
                let joined = cat_mangled(OUTPUTS[i], OUTPUTS[j]);
                assert_eq!(joined, mangle_identifier(&natural), "joining {a:?} and {b:?}");
                assert_eq!(demangle(&joined), natural);
            }
        }
    }

    #[test]
    fn cat_mangled_triples_match_mangled_concatenation() {
        for (i, a) in INPUTS.iter().enumerate() {
            for (j, b) in INPUTS.iter().enumerate() {
                for (k, c) in INPUTS.iter().enumerate() {
                    let natural = format!("{a}{b}{c}");
                    let expected = mangle_identifier(&natural);
                    let left = cat_mangled3(OUTPUTS[i], OUTPUTS[j], OUTPUTS[k]);
                    let right = cat_mangled(OUTPUTS[i], &cat_mangled(OUTPUTS[j], OUTPUTS[k]));
                    assert_eq!(left, expected, "joining {a:?}, {b:?}, {c:?}");
                    assert_eq!(right, expected, "joining {a:?}, ({b:?}, {c:?})");
                    assert_eq!(demangle(&left), natural);
                }
            }
        }
    }

    #[test]
    fn constructor_names_pass_through() {
        assert_eq!(mangle_identifier("<init>"), "<init>");
        assert_eq!(mangle_identifier("<clinit>"), "<clinit>");
        assert_eq!(mangle_identifier("<other>"), "\\^other\\_");
    }

    #[test]
    fn changed_names_get_explicit_prefix() {
        assert_eq!(mangle_identifier("a.b"), "\\=a\\,b");
        assert!(is_mangled("\\=a\\,b"));
        assert!(!is_mangled("cat"));
        assert!(likely_mangled("\\d"));
        assert!(!is_mangled("\\d"));
    }

    #[test]
    fn binary_names_mangle_per_segment() {
        assert_eq!(mangle_binary_name("pkg/Foo").unwrap(), "pkg/Foo");
        assert_eq!(mangle_binary_name("pkg/Box⟦a/B⟧").unwrap(), "pkg/\\=Box⟦a\\|B⟧");
        assert_eq!(demangle_binary_name("pkg/\\=Box⟦a\\|B⟧"), "pkg/Box⟦a/B⟧");
    }

    #[test]
    fn unbalanced_brackets_are_rejected() {
        assert!(matches!(
            mangle_binary_name("Box⟦Int"),
            Err(NamingError::UnbalancedBrackets { offset: 3, .. })
        ));
        assert!(matches!(
            mangle_binary_name("Box⟧"),
            Err(NamingError::UnbalancedBrackets { .. })
        ));
    }

    #[test]
    fn descriptors_mangle_only_class_names() {
        let natural = "(ILBox⟦a/B⟧;[Ljava/lang/String;)V";
        let mangled = mangle_descriptor(natural).unwrap();
        assert_eq!(mangled, "(IL\\=Box⟦a\\|B⟧;[Ljava/lang/String;)V");
        assert_eq!(demangle_descriptor(&mangled).unwrap(), natural);
    }

    #[test]
    fn remove_nth_parameter() {
        assert_eq!(remove_nth_sig_parameter("(LA;LB;LC;)LD;", 1).unwrap(), "(LA;LC;)LD;");
        assert_eq!(remove_nth_sig_parameter("(IJ)V", 0).unwrap(), "(J)V");
        assert!(remove_nth_sig_parameter("(I)V", 3).is_err());
    }

    #[test]
    fn dots_and_slashes() {
        assert_eq!(dot_to_slash("java.lang.Object"), "java/lang/Object");
        assert_eq!(slash_to_dot("java/lang/Object"), "java.lang.Object");
        assert_eq!(descriptor_for_type("pkg/Foo").unwrap(), "Lpkg/Foo;");
    }

    proptest! {
        #[test]
        fn prop_demangle_inverts_mangle(s in "[a-c\\\\=/.;$<>:|,?%^_{}!-]{0,12}") {
            prop_assert_eq!(demangle(&mangle_identifier(&s)), s);
        }

        #[test]
        fn prop_mangled_has_no_dangerous_chars(s in "[a-c/.;$<>:]{0,12}") {
            let mangled = mangle_identifier(&s);
            prop_assert!(!mangled.chars().any(|c| "/.;$<>[]:".contains(c)));
        }

        #[test]
        fn prop_seam_split_recovers_halves(a in "[a-c\\\\=;$%]{0,6}", b in "[a-c\\\\=;$%]{0,6}") {
            let left = mangle_identifier(&a);
            let right = mangle_identifier(&b);
            let joined = format!("{left}{right}");
            let (l, r) = joined.split_at(left.len());
            prop_assert_eq!(demangle(l), a);
            prop_assert_eq!(demangle(r), b);
        }
    }
}
