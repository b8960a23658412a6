//! Materializing runtime type descriptors for generic types.
//!
//! A template reads `Owner.RTTI` to get the descriptor of a type it mentions.
//! Once `Owner` is an instantiated generic there is no such static field, so
//! the read becomes a call to a factory that builds the descriptor from the
//! descriptors of the type's arguments, pushed recursively in order:
//!
//! ```text
//! getstatic Pair⟦Int,Box⟦Bool⟧⟧.RTTI
//!   =>
//! getstatic Int.RTTI
//! getstatic Bool.RTTI
//! invokestatic Box⟦⟧$RTTIc.factory(RTTI)RTTI
//! invokestatic Pair⟦⟧$RTTIc.factory(RTTI,RTTI)RTTI
//! ```
//!
//! Tuples and arrows use shared factories. Arguments whose formal is not a
//! type (ints, bools, operators) are pushed as string constants.

use oxford_bytecode::{Constant, Insn, OpCode};
use oxford_core::naming::mangle_binary_name;
use oxford_core::{GenericName, NamingResult, ParamKind};

use crate::resolver::ClassResolver;

/// Static field every non-generic class exposes its descriptor through.
pub const RTTI_FIELD: &str = "RTTI";

/// Descriptor class.
pub const RTTI_CLASS: &str = "oxford/runtime/RTTI";

/// Field descriptor of [`RTTI_CLASS`].
pub const RTTI_DESC: &str = "Loxford/runtime/RTTI;";

/// Shared factory owner for `Tuple⟦…⟧`.
pub const TUPLE_RTTI_CLASS: &str = "oxford/runtime/TupleRTTI";

/// Shared factory owner for `Arrow⟦…⟧` and `AbstractArrow⟦…⟧`.
pub const ARROW_RTTI_CLASS: &str = "oxford/runtime/ArrowRTTI";

/// Factory method name.
pub const RTTI_FACTORY: &str = "factory";

/// Appended to a canonical template name to name its factory container.
pub const RTTI_CONTAINER_SUFFIX: &str = "$RTTIc";

const STRING_DESC: &str = "Ljava/lang/String;";

/// Mangled owner of the factory for a generic type.
pub fn factory_owner(name: &GenericName) -> NamingResult<Option<String>> {
    if name.is_tuple() {
        return Ok(Some(TUPLE_RTTI_CLASS.to_string()));
    }
    if name.is_arrow() || name.is_abstract_arrow() {
        return Ok(Some(ARROW_RTTI_CLASS.to_string()));
    }
    match name.canonical_template_name() {
        Some(template) => Ok(Some(mangle_binary_name(&format!(
            "{template}{RTTI_CONTAINER_SUFFIX}"
        ))?)),
        None => Ok(None),
    }
}

/// Append instructions that leave the descriptor of `name` on the stack.
///
/// Returns the peak number of stack slots the sequence uses.
pub fn emit_rtti(
    name: &GenericName,
    resolver: &dyn ClassResolver,
    out: &mut Vec<Insn>,
) -> NamingResult<u16> {
    let (Some(args), Some(owner)) = (name.args(), factory_owner(name)?) else {
        out.push(Insn::Field {
            opcode: OpCode::GetStatic,
            owner: mangle_binary_name(&name.to_string())?,
            name: RTTI_FIELD.to_string(),
            descriptor: RTTI_DESC.to_string(),
        });
        return Ok(1);
    };

    let kinds = if owner == TUPLE_RTTI_CLASS || owner == ARROW_RTTI_CLASS {
        None
    } else {
        name.canonical_template_name()
            .and_then(|template| resolver.generic_kinds(&template))
    };

    let mut descriptor = String::from("(");
    let mut peak = 1u16;
    for (i, arg) in args.iter().enumerate() {
        let kind = kinds
            .as_ref()
            .and_then(|kinds| kinds.get(i).copied())
            .unwrap_or(ParamKind::Type);
        let depth = if kind.has_rtti() {
            descriptor.push_str(RTTI_DESC);
            emit_rtti(&arg.value, resolver, out)?
        } else {
            descriptor.push_str(STRING_DESC);
            out.push(Insn::Ldc(Constant::String(arg.value.to_string())));
            1
        };
        peak = peak.max(i as u16 + depth);
    }
    descriptor.push(')');
    descriptor.push_str(RTTI_DESC);

    out.push(Insn::Method {
        opcode: OpCode::InvokeStatic,
        owner,
        name: RTTI_FACTORY.to_string(),
        descriptor,
        interface: false,
    });
    Ok(peak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{NoResolver, StaticResolver};
    use oxford_core::GenericSort;

    fn emit(name: &str, resolver: &dyn ClassResolver) -> (Vec<Insn>, u16) {
        let mut out = Vec::new();
        let peak = emit_rtti(&GenericName::parse(name).unwrap(), resolver, &mut out).unwrap();
        (out, peak)
    }

    fn owners(insns: &[Insn]) -> Vec<String> {
        insns
            .iter()
            .map(|insn| match insn {
                Insn::Field { owner, .. } | Insn::Method { owner, .. } => owner.clone(),
                Insn::Ldc(Constant::String(s)) => format!("ldc {s}"),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn plain_type_reads_static_field() {
        let (insns, peak) = emit("pkg/Int", &NoResolver);
        assert_eq!(owners(&insns), vec!["pkg/Int"]);
        assert_eq!(peak, 1);
    }

    #[test]
    fn nested_generic_builds_bottom_up() {
        let (insns, peak) = emit("Pair⟦Int,Box⟦Bool⟧⟧", &NoResolver);
        assert_eq!(
            owners(&insns),
            vec![
                "Int".to_string(),
                "Bool".to_string(),
                mangle_binary_name("Box⟦⟧$RTTIc").unwrap(),
                mangle_binary_name("Pair⟦⟧$RTTIc").unwrap(),
            ]
        );
        assert_eq!(peak, 2);
        let Insn::Method { descriptor, .. } = &insns[3] else {
            panic!("expected factory call");
        };
        assert_eq!(descriptor, "(Loxford/runtime/RTTI;Loxford/runtime/RTTI;)Loxford/runtime/RTTI;");
    }

    #[test]
    fn structural_types_use_shared_factories() {
        let (insns, _) = emit("Arrow⟦Tuple⟦A,B⟧,C⟧", &NoResolver);
        assert_eq!(owners(&insns), vec!["A", "B", TUPLE_RTTI_CLASS, "C", ARROW_RTTI_CLASS]);
    }

    #[test]
    fn value_arguments_become_string_constants() {
        let resolver = StaticResolver::new().with_template(
            "Vec⟦⟧",
            GenericSort::Object,
            vec![ParamKind::Type, ParamKind::Int],
        );
        let (insns, _) = emit("Vec⟦Int,3⟧", &resolver);
        assert_eq!(owners(&insns)[..2], ["Int".to_string(), "ldc 3".to_string()]);
        let Insn::Method { descriptor, .. } = &insns[2] else {
            panic!("expected factory call");
        };
        assert_eq!(descriptor, "(Loxford/runtime/RTTI;Ljava/lang/String;)Loxford/runtime/RTTI;");
    }
}
