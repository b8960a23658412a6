//! Field and method descriptor grammar.
//!
//! A field descriptor is zero or more `[` followed by a primitive letter or
//! `L<class name>;`. A method descriptor is `(` field descriptors `)` followed
//! by a field descriptor or `V`. Class names may carry `⟦…⟧` argument lists,
//! so the `;` that ends a class name is the first one outside every bracket.

use crate::error::{NamingError, NamingResult};
use crate::naming::{LEFT_OXFORD, RIGHT_OXFORD};

const PRIMITIVES: &str = "BCDFIJSZ";

/// A method descriptor split into parameter and result descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor<'a> {
    pub params: Vec<&'a str>,
    pub result: &'a str,
}

impl<'a> MethodDescriptor<'a> {
    /// Split `desc` into its parameter and result descriptors.
    pub fn parse(desc: &'a str) -> NamingResult<Self> {
        if !desc.starts_with('(') {
            return Err(malformed(desc, 0));
        }
        let mut params = Vec::new();
        let mut at = 1;
        loop {
            match desc[at..].chars().next() {
                Some(')') => {
                    at += 1;
                    break;
                }
                Some(_) => {
                    let end = field_type_end(desc, at)?;
                    params.push(&desc[at..end]);
                    at = end;
                }
                None => return Err(malformed(desc, at)),
            }
        }
        let end = if desc[at..].starts_with('V') {
            at + 1
        } else {
            field_type_end(desc, at)?
        };
        if end != desc.len() {
            return Err(malformed(desc, end));
        }
        Ok(Self {
            params,
            result: &desc[at..end],
        })
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

fn malformed(desc: &str, offset: usize) -> NamingError {
    NamingError::MalformedDescriptor {
        descriptor: desc.to_string(),
        offset,
    }
}

/// Byte offset one past the field type that starts at `start`.
fn field_type_end(desc: &str, start: usize) -> NamingResult<usize> {
    let mut at = start;
    while desc[at..].starts_with('[') {
        at += 1;
    }
    let Some(tag) = desc[at..].chars().next() else {
        return Err(malformed(desc, at));
    };
    if PRIMITIVES.contains(tag) {
        return Ok(at + 1);
    }
    if tag != 'L' {
        return Err(malformed(desc, at));
    }

    let mut depth = 0usize;
    for (offset, ch) in desc[at + 1..].char_indices() {
        match ch {
            LEFT_OXFORD => depth += 1,
            RIGHT_OXFORD => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                if offset == 0 {
                    return Err(malformed(desc, at));
                }
                return Ok(at + 1 + offset + 1);
            }
            _ => {}
        }
    }
    Err(malformed(desc, at))
}

/// Check that `desc` is exactly one field descriptor.
pub fn validate_field(desc: &str) -> NamingResult<()> {
    if field_type_end(desc, 0)? != desc.len() {
        return Err(malformed(desc, 0));
    }
    Ok(())
}

/// The class name inside a field descriptor, if it names a class.
///
/// Array descriptors yield the element class name.
pub fn class_name_of(desc: &str) -> Option<&str> {
    let element = desc.trim_start_matches('[');
    element.strip_prefix('L')?.strip_suffix(';')
}

/// Rewrite each class name in a field or method descriptor with `f`.
///
/// Everything else (array markers, primitives, parentheses) is copied.
pub fn map_class_names<F>(desc: &str, mut f: F) -> NamingResult<String>
where
    F: FnMut(&str) -> NamingResult<String>,
{
    if desc.starts_with('(') {
        let method = MethodDescriptor::parse(desc)?;
        let mut out = String::with_capacity(desc.len());
        out.push('(');
        for param in &method.params {
            out.push_str(&map_field(param, &mut f)?);
        }
        out.push(')');
        if method.result == "V" {
            out.push('V');
        } else {
            out.push_str(&map_field(method.result, &mut f)?);
        }
        return Ok(out);
    }
    validate_field(desc)?;
    map_field(desc, &mut f)
}

/// Rewrite the class name of a single, already validated field descriptor.
fn map_field<F>(desc: &str, f: &mut F) -> NamingResult<String>
where
    F: FnMut(&str) -> NamingResult<String>,
{
    let dims = desc.len() - desc.trim_start_matches('[').len();
    match class_name_of(desc) {
        Some(name) => Ok(format!("{}L{};", &desc[..dims], f(name)?)),
        None => Ok(desc.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_descriptor() {
        let method = MethodDescriptor::parse("(I[JLfoo/Bar;)V").unwrap();
        assert_eq!(method.params, vec!["I", "[J", "Lfoo/Bar;"]);
        assert_eq!(method.result, "V");
        assert_eq!(method.arity(), 3);
    }

    #[test]
    fn class_names_may_nest_semicolons_in_brackets() {
        let method = MethodDescriptor::parse("(LBox⟦a;b⟧;)LT;").unwrap();
        assert_eq!(method.params, vec!["LBox⟦a;b⟧;"]);
        assert_eq!(method.result, "LT;");
    }

    #[test]
    fn rejects_malformed_descriptors() {
        assert!(MethodDescriptor::parse("I)V").is_err());
        assert!(MethodDescriptor::parse("(I").is_err());
        assert!(MethodDescriptor::parse("(Q)V").is_err());
        assert!(MethodDescriptor::parse("(I)VV").is_err());
        assert!(validate_field("L;").is_err());
        assert!(validate_field("Lfoo").is_err());
        assert!(validate_field("II").is_err());
    }

    #[test]
    fn maps_only_class_names() {
        let mapped = map_class_names("([[LA;I)LB;", |n| Ok(n.to_lowercase())).unwrap();
        assert_eq!(mapped, "([[La;I)Lb;");
        assert_eq!(map_class_names("J", |_| Ok("x".into())).unwrap(), "J");
    }

    #[test]
    fn class_name_of_arrays() {
        assert_eq!(class_name_of("[[Lfoo/Bar;"), Some("foo/Bar"));
        assert_eq!(class_name_of("I"), None);
    }
}
