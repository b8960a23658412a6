//! Classifying requested class names.
//!
//! Every request is one of:
//!
//! | Shape                         | Example (natural)              | Source             |
//! |-------------------------------|--------------------------------|--------------------|
//! | reserved namespace            | `java/lang/Object`             | system loader      |
//! | plain                         | `pkg/Foo`                      | stored class       |
//! | generic instance              | `pkg/Box⟦Int⟧`                 | template `Box⟦⟧`   |
//! | generic function closure      | `Api⚙f⟦Int⟧✉Arrow⟦Int,Int⟧`    | template `Api⚙f⟦⟧✉` |
//! | plain function closure        | `Api⚙f✉Arrow⟦Int,Int⟧`         | synthesized        |
//! | structural arrow              | `Arrow⟦Int,Int⟧`               | synthesized        |
//! | abstract arrow                | `AbstractArrow⟦Int,Int⟧`       | synthesized        |

use oxford_core::naming::{
    ENVELOPE, GEAR, LEFT_OXFORD, RIGHT_OXFORD, check_brackets, demangle_binary_name,
    mangle_binary_name,
};
use oxford_core::{GenericName, NamingError, NamingResult};

use crate::config::LoaderConfig;

/// What a requested name asks the loader to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameClass {
    /// Delegated to the system loader.
    Reserved,
    /// Read from storage unchanged.
    Plain,
    /// Specialize the template stored under `template` (mangled).
    GenericInstance {
        template: String,
        actuals: Vec<GenericName>,
    },
    /// Specialize the closure template stored under `template` (mangled).
    GenericClosure {
        template: String,
        actuals: Vec<GenericName>,
    },
    /// Synthesize a closure delegating to the static method `api.function`.
    FunctionClosure {
        api: String,
        function: String,
        arrow: GenericName,
    },
    /// Synthesize the arrow interface.
    Arrow(GenericName),
    /// Synthesize the abstract arrow base class.
    AbstractArrow(GenericName),
}

impl NameClass {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            NameClass::Reserved => "reserved",
            NameClass::Plain => "plain",
            NameClass::GenericInstance { .. } => "generic",
            NameClass::GenericClosure { .. } => "generic-closure",
            NameClass::FunctionClosure { .. } => "function-closure",
            NameClass::Arrow(_) => "arrow",
            NameClass::AbstractArrow(_) => "abstract-arrow",
        }
    }
}

/// Classify the mangled binary name `name`.
pub fn classify(name: &str, config: &LoaderConfig) -> NamingResult<NameClass> {
    if config.is_reserved(name) {
        return Ok(NameClass::Reserved);
    }

    let natural = demangle_binary_name(name);
    check_brackets(&natural)?;

    if let Some((function_part, arrow_part)) = split_at_envelope(&natural) {
        return classify_closure(&natural, function_part, arrow_part);
    }

    let parsed = GenericName::parse(&natural)?;
    if !parsed.is_generic() {
        return Ok(NameClass::Plain);
    }
    if parsed.is_arrow() {
        require_result(&parsed)?;
        return Ok(NameClass::Arrow(parsed));
    }
    if parsed.is_abstract_arrow() {
        require_result(&parsed)?;
        return Ok(NameClass::AbstractArrow(parsed));
    }
    Ok(NameClass::GenericInstance {
        template: template_name(&parsed, "")?,
        actuals: actuals(&parsed),
    })
}

fn classify_closure(natural: &str, function_part: &str, arrow_part: &str) -> NamingResult<NameClass> {
    let function = GenericName::parse(function_part)?;
    if function.is_generic() {
        return Ok(NameClass::GenericClosure {
            template: template_name(&function, &ENVELOPE.to_string())?,
            actuals: actuals(&function),
        });
    }

    let (api, function) = function_part
        .rsplit_once(GEAR)
        .ok_or_else(|| NamingError::MissingFunctionMarker {
            name: natural.to_string(),
        })?;
    let arrow = GenericName::parse(arrow_part)?;
    if !arrow.is_arrow() {
        return Err(NamingError::MissingArrow {
            name: natural.to_string(),
        });
    }
    require_result(&arrow)?;
    Ok(NameClass::FunctionClosure {
        api: api.to_string(),
        function: function.to_string(),
        arrow,
    })
}

/// Split at the first `✉` outside any argument list.
fn split_at_envelope(natural: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in natural.char_indices() {
        match c {
            LEFT_OXFORD => depth += 1,
            RIGHT_OXFORD => depth = depth.saturating_sub(1),
            ENVELOPE if depth == 0 => {
                return Some((&natural[..i], &natural[i + c.len_utf8()..]));
            }
            _ => {}
        }
    }
    None
}

fn require_result(arrow: &GenericName) -> NamingResult<()> {
    match arrow.args() {
        Some(args) if !args.is_empty() => Ok(()),
        _ => Err(NamingError::EmptyArrow {
            name: arrow.to_string(),
        }),
    }
}

fn template_name(name: &GenericName, trailer: &str) -> NamingResult<String> {
    let canonical = name.canonical_template_name().unwrap_or_default();
    mangle_binary_name(&format!("{canonical}{trailer}"))
}

fn actuals(name: &GenericName) -> Vec<GenericName> {
    name.args()
        .map(|args| args.iter().map(|arg| arg.value.clone()).collect())
        .unwrap_or_default()
}

/// Human-readable form of a mangled name for diagnostics.
///
/// Generic names are shown with their stem and actual arguments split out.
pub fn describe(name: &str) -> String {
    let natural = demangle_binary_name(name);
    match GenericName::parse(&natural) {
        Ok(parsed) if parsed.is_generic() => format!(
            "'{natural}' (stem '{}', arguments [{}])",
            parsed.stem().unwrap_or_default(),
            parsed.extract_parameters().join(", ")
        ),
        _ => format!("'{natural}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_of(natural: &str) -> NameClass {
        classify(&mangle_binary_name(natural).unwrap(), &LoaderConfig::default()).unwrap()
    }

    #[test]
    fn reserved_and_plain() {
        assert_eq!(class_of("java/lang/String"), NameClass::Reserved);
        assert_eq!(class_of("pkg/Foo"), NameClass::Plain);
        assert_eq!(class_of("pkg/Foo$Bar"), NameClass::Plain);
    }

    #[test]
    fn generic_instance_points_at_canonical_template() {
        let NameClass::GenericInstance { template, actuals } = class_of("pkg/Box⟦a/B,Int⟧$Impl")
        else {
            panic!("expected generic instance");
        };
        assert_eq!(template, mangle_binary_name("pkg/Box⟦⟧$Impl").unwrap());
        let actuals: Vec<_> = actuals.iter().map(ToString::to_string).collect();
        assert_eq!(actuals, vec!["a/B", "Int"]);
    }

    #[test]
    fn structural_arrows() {
        assert!(matches!(class_of("Arrow⟦X,Y⟧"), NameClass::Arrow(_)));
        assert!(matches!(class_of("AbstractArrow⟦Y⟧"), NameClass::AbstractArrow(_)));
        let err = classify("Arrow⟦⟧", &LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, NamingError::EmptyArrow { .. }));
    }

    #[test]
    fn closures() {
        let NameClass::GenericClosure { template, actuals } =
            class_of("pkg/Api⚙map⟦Int⟧✉Arrow⟦Int,Int⟧")
        else {
            panic!("expected generic closure");
        };
        assert_eq!(template, mangle_binary_name("pkg/Api⚙map⟦⟧✉").unwrap());
        assert_eq!(actuals, vec![GenericName::plain("Int")]);

        let NameClass::FunctionClosure { api, function, arrow } =
            class_of("pkg/Api⚙inc✉Arrow⟦Int,Int⟧")
        else {
            panic!("expected function closure");
        };
        assert_eq!(api, "pkg/Api");
        assert_eq!(function, "inc");
        assert_eq!(arrow.to_string(), "Arrow⟦Int,Int⟧");
    }

    #[test]
    fn malformed_closures() {
        let config = LoaderConfig::default();
        let no_gear = mangle_binary_name("pkg/inc✉Arrow⟦Int⟧").unwrap();
        assert!(matches!(
            classify(&no_gear, &config),
            Err(NamingError::MissingFunctionMarker { .. })
        ));
        let no_arrow = mangle_binary_name("pkg/Api⚙inc✉Box⟦Int⟧").unwrap();
        assert!(matches!(
            classify(&no_arrow, &config),
            Err(NamingError::MissingArrow { .. })
        ));
    }

    #[test]
    fn unbalanced_names_are_rejected() {
        assert!(matches!(
            classify("Box⟦Int", &LoaderConfig::default()),
            Err(NamingError::UnbalancedBrackets { .. })
        ));
    }

    #[test]
    fn envelope_inside_arguments_is_not_a_closure() {
        assert_eq!(split_at_envelope("Box⟦a✉b⟧"), None);
        assert_eq!(split_at_envelope("f⟦a⟧✉Arrow⟦b⟧"), Some(("f⟦a⟧", "Arrow⟦b⟧")));
    }

    #[test]
    fn describe_splits_stem_and_arguments() {
        let name = mangle_binary_name("pkg/Box⟦a/B,Int⟧").unwrap();
        assert_eq!(describe(&name), "'pkg/Box⟦a/B,Int⟧' (stem 'pkg/Box', arguments [a/B, Int])");
        assert_eq!(describe("pkg/Foo"), "'pkg/Foo'");
    }
}
