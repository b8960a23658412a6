//! Rewriting a template class into one specialization.
//!
//! [`rewrite_class`] is a pure function over the structural model: every
//! type name, descriptor, and member name the template mentions goes through
//! the [`SubstitutionMap`], and three instruction patterns get special
//! treatment:
//!
//! - reads of `Owner.RTTI` where `Owner` instantiates to a generic type are
//!   expanded into factory calls (see [`crate::rtti`])
//! - calls on [`MAGIC_OWNER`] become constant loads (see [`crate::magic`])
//! - `invokeinterface` calls whose owner changed are promoted to
//!   `invokevirtual` when the new owner is known to be a class
//!
//! Generic signature attributes are carried through unchanged.

use oxford_bytecode::{
    Access, CLINIT, ClassModel, Constant, FieldNode, INIT, InnerClass, Insn, LocalVariable,
    MethodBuilder, MethodNode, OpCode, TryCatch,
};
use oxford_core::naming::{LEFT_OXFORD, demangle_binary_name};
use oxford_core::{GenericName, GenericSort};
use tracing::{debug, trace};

use crate::error::RewriteResult;
use crate::magic::{MAGIC_OWNER, rewrite_magic_call};
use crate::resolver::ClassResolver;
use crate::rtti::{RTTI_DESC, RTTI_FIELD, emit_rtti};
use crate::substitution::{SubstitutionMap, declared_formals};

/// A static field that gained a second, unflattened copy.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WrappedField {
    name: String,
    flat: String,
    wrapped: String,
}

/// Specialize `template` into the class `instance_name`.
///
/// `instance_name` is the mangled binary name the result is installed
/// under, and every reference the template makes to itself is redirected to
/// it. `subst` must bind every formal the template declares in its own name.
///
/// # Errors
/// [`RewriteError::UnboundFormal`] if a declared formal has no actual.
///
/// [`RewriteError::UnboundFormal`]: crate::error::RewriteError::UnboundFormal
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn rewrite_class(
    template: &ClassModel,
    instance_name: &str,
    subst: &SubstitutionMap,
    resolver: &dyn ClassResolver,
) -> RewriteResult<ClassModel> {
    debug!(
        template = %template.name,
        instance = %instance_name,
        formals = subst.len(),
        "Specializing template"
    );

    // 0. Declared formals, then self references
    let own_name = GenericName::parse(&demangle_binary_name(&template.name))?;
    for formal in declared_formals(&own_name) {
        subst.require(formal)?;
    }
    let subst = &subst.clone().with_self_name(&template.name, instance_name)?;

    // 1. Header
    let mut class = ClassModel {
        version: template.version,
        access: template.access,
        name: instance_name.to_string(),
        signature: template.signature.clone(),
        super_name: template
            .super_name
            .as_deref()
            .map(|name| subst.type_name(name))
            .transpose()?,
        interfaces: template
            .interfaces
            .iter()
            .map(|name| subst.type_name(name))
            .collect::<Result<_, _>>()?,
        source_file: template.source_file.clone(),
        inner_classes: template
            .inner_classes
            .iter()
            .map(|inner| rewrite_inner_class(inner, subst))
            .collect::<RewriteResult<_>>()?,
        fields: Vec::with_capacity(template.fields.len()),
        methods: Vec::with_capacity(template.methods.len()),
        attributes: template.attributes.clone(),
    };

    // 2. Fields, duplicating static fields whose wrapped form diverges
    let mut wrapped_fields = Vec::new();
    for field in &template.fields {
        let rewritten = rewrite_field(field, subst)?;
        if rewritten.is_static() {
            let wrapped = subst.field_desc_wrapped(&field.descriptor)?;
            if wrapped != rewritten.descriptor {
                trace!(field = %rewritten.name, flat = %rewritten.descriptor, %wrapped, "Duplicating closure field");
                wrapped_fields.push(WrappedField {
                    name: rewritten.name.clone(),
                    flat: rewritten.descriptor.clone(),
                    wrapped: wrapped.clone(),
                });
                let mut copy = rewritten.clone();
                copy.descriptor = wrapped;
                copy.value = None;
                class.fields.push(rewritten);
                class.fields.push(copy);
                continue;
            }
        }
        class.fields.push(rewritten);
    }

    // 3. Methods
    for method in &template.methods {
        class
            .methods
            .push(rewrite_method(method, subst, resolver)?);
    }

    // 4. Static initializer copies for duplicated fields
    if !wrapped_fields.is_empty() {
        extend_clinit(&mut class, &wrapped_fields);
    }

    Ok(class)
}

fn rewrite_inner_class(inner: &InnerClass, subst: &SubstitutionMap) -> RewriteResult<InnerClass> {
    Ok(InnerClass {
        name: subst.type_name(&inner.name)?,
        outer_name: inner
            .outer_name
            .as_deref()
            .map(|name| subst.type_name(name))
            .transpose()?,
        inner_name: inner.inner_name.clone(),
        access: inner.access,
    })
}

fn rewrite_field(field: &FieldNode, subst: &SubstitutionMap) -> RewriteResult<FieldNode> {
    Ok(FieldNode {
        access: field.access,
        name: subst.member_name(&field.name)?,
        descriptor: subst.field_desc(&field.descriptor)?,
        signature: field.signature.clone(),
        value: field.value.clone(),
        attributes: field.attributes.clone(),
    })
}

fn rewrite_method(
    method: &MethodNode,
    subst: &SubstitutionMap,
    resolver: &dyn ClassResolver,
) -> RewriteResult<MethodNode> {
    let mut instructions = Vec::with_capacity(method.instructions.len());
    let mut extra_stack = 0u16;
    for insn in &method.instructions {
        extra_stack = extra_stack.max(rewrite_insn(insn, subst, resolver, &mut instructions)?);
    }

    Ok(MethodNode {
        access: method.access,
        name: rewrite_member_name(&method.name, subst)?,
        descriptor: subst.method_desc(&method.descriptor)?,
        signature: method.signature.clone(),
        exceptions: method
            .exceptions
            .iter()
            .map(|name| subst.type_name(name))
            .collect::<Result<_, _>>()?,
        instructions,
        try_catch: method
            .try_catch
            .iter()
            .map(|block| -> RewriteResult<TryCatch> {
                Ok(TryCatch {
                    catch_type: block
                        .catch_type
                        .as_deref()
                        .map(|name| subst.type_name(name))
                        .transpose()?,
                    ..block.clone()
                })
            })
            .collect::<RewriteResult<_>>()?,
        locals: method
            .locals
            .iter()
            .map(|local| -> RewriteResult<LocalVariable> {
                Ok(LocalVariable {
                    descriptor: subst.field_desc(&local.descriptor)?,
                    ..local.clone()
                })
            })
            .collect::<RewriteResult<_>>()?,
        max_stack: method.max_stack.saturating_add(extra_stack),
        max_locals: method.max_locals,
        attributes: method.attributes.clone(),
    })
}

fn rewrite_member_name(name: &str, subst: &SubstitutionMap) -> RewriteResult<String> {
    if name == INIT || name == CLINIT {
        return Ok(name.to_string());
    }
    Ok(subst.member_name(name)?)
}

/// Type operand of `new`, `checkcast`, `ldc` and friends: a binary name, or
/// a descriptor for array classes.
fn rewrite_type_operand(operand: &str, subst: &SubstitutionMap) -> RewriteResult<String> {
    if operand.starts_with('[') {
        Ok(subst.field_desc(operand)?)
    } else {
        Ok(subst.type_name(operand)?)
    }
}

/// Rewrite one instruction into `out`.
///
/// Returns how many stack slots beyond the original instruction's the
/// replacement needs at its peak.
fn rewrite_insn(
    insn: &Insn,
    subst: &SubstitutionMap,
    resolver: &dyn ClassResolver,
    out: &mut Vec<Insn>,
) -> RewriteResult<u16> {
    match insn {
        Insn::Type { opcode, type_name } => out.push(Insn::Type {
            opcode: *opcode,
            type_name: rewrite_type_operand(type_name, subst)?,
        }),
        Insn::Ldc(Constant::Class(name)) => {
            out.push(Insn::Ldc(Constant::Class(rewrite_type_operand(name, subst)?)))
        }
        Insn::MultiANewArray {
            descriptor,
            dimensions,
        } => out.push(Insn::MultiANewArray {
            descriptor: subst.field_desc(descriptor)?,
            dimensions: *dimensions,
        }),
        Insn::Field {
            opcode: OpCode::GetStatic,
            owner,
            name,
            descriptor,
        } if name == RTTI_FIELD && descriptor == RTTI_DESC => {
            let actual = subst.instantiate(owner)?;
            if actual.is_generic() {
                trace!(owner = %actual, "Materializing RTTI");
                let peak = emit_rtti(&actual, resolver, out)?;
                return Ok(peak.saturating_sub(1));
            }
            out.push(Insn::Field {
                opcode: OpCode::GetStatic,
                owner: subst.type_name(owner)?,
                name: name.clone(),
                descriptor: descriptor.clone(),
            });
        }
        Insn::Field {
            opcode,
            owner,
            name,
            descriptor,
        } => out.push(Insn::Field {
            opcode: *opcode,
            owner: subst.type_name(owner)?,
            name: subst.member_name(name)?,
            descriptor: subst.field_desc(descriptor)?,
        }),
        Insn::Method { owner, name, .. } if owner == MAGIC_OWNER => {
            out.push(rewrite_magic_call(name, subst)?);
        }
        Insn::Method {
            opcode,
            owner,
            name,
            descriptor,
            interface,
        } => {
            let new_owner = subst.type_name(owner)?;
            let (opcode, interface) = if *opcode == OpCode::InvokeInterface
                && new_owner != *owner
                && promotes_to_virtual(&new_owner, resolver)?
            {
                trace!(owner = %new_owner, method = %name, "Promoting interface call");
                (OpCode::InvokeVirtual, false)
            } else {
                (*opcode, *interface)
            };
            out.push(Insn::Method {
                opcode,
                owner: new_owner,
                name: rewrite_member_name(name, subst)?,
                descriptor: subst.method_desc(descriptor)?,
                interface,
            });
        }
        other => out.push(other.clone()),
    }
    Ok(0)
}

/// Whether an interface call on the substituted `owner` can be dispatched
/// virtually. Unknown owners stay interface calls.
fn promotes_to_virtual(owner: &str, resolver: &dyn ClassResolver) -> RewriteResult<bool> {
    let natural = demangle_binary_name(owner);
    if !natural.contains(LEFT_OXFORD) {
        return Ok(resolver.is_interface(owner) == Some(false));
    }
    let name = GenericName::parse(&natural)?;
    if name.is_arrow() {
        return Ok(false);
    }
    if name.is_abstract_arrow() {
        return Ok(true);
    }
    Ok(name
        .canonical_template_name()
        .and_then(|template| resolver.generic_sort(&template))
        == Some(GenericSort::Object))
}

/// Copy each flattened static field into its wrapped twin before every
/// `return` of the static initializer, creating one if the template had none.
fn extend_clinit(class: &mut ClassModel, fields: &[WrappedField]) {
    let mut copies = Vec::with_capacity(fields.len() * 2);
    for field in fields {
        copies.push(Insn::Field {
            opcode: OpCode::GetStatic,
            owner: class.name.clone(),
            name: field.name.clone(),
            descriptor: field.flat.clone(),
        });
        copies.push(Insn::Field {
            opcode: OpCode::PutStatic,
            owner: class.name.clone(),
            name: field.name.clone(),
            descriptor: field.wrapped.clone(),
        });
    }

    match class.method_mut(CLINIT) {
        Some(clinit) => {
            if clinit.last_return().is_none() {
                clinit.instructions.extend(copies);
            } else {
                let body = std::mem::take(&mut clinit.instructions);
                for insn in body {
                    if insn.opcode().is_some_and(OpCode::is_return) {
                        clinit.instructions.extend(copies.iter().cloned());
                    }
                    clinit.instructions.push(insn);
                }
            }
            clinit.max_stack = clinit.max_stack.max(1);
        }
        None => {
            let clinit = copies
                .into_iter()
                .fold(MethodBuilder::new(Access::STATIC, CLINIT, "()V"), MethodBuilder::insn)
                .op(OpCode::Return)
                .maxs(1, 0)
                .build();
            class.methods.push(clinit);
        }
    }
}
