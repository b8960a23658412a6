//! Classes synthesized from their names alone.
//!
//! Structural arrows and closures over plain functions need no template:
//! their shape follows from the arrow's arity.
//!
//! - `Arrow⟦P1,…,Pn,R⟧`: interface with `abstract R apply(P1,…,Pn)`
//! - `AbstractArrow⟦P1,…,Pn,R⟧`: abstract class implementing the `Arrow`
//!   with the same arguments, with a no-argument constructor
//! - `Api⚙f✉Arrow⟦P1,…,Pn,R⟧`: concrete `AbstractArrow` whose `apply`
//!   calls the static method `Api.f`, exposed through a `closure` singleton

use oxford_bytecode::{
    Access, CLINIT, ClassModel, FieldNode, INIT, MethodBuilder, MethodNode, OBJECT_CLASS, OpCode,
};
use oxford_core::naming::{descriptor_for_type, mangle_binary_name, mangle_identifier};
use oxford_core::{ABSTRACT_ARROW, ARROW, GenericName, NamingError, NamingResult};

/// Method every arrow exposes.
pub const APPLY: &str = "apply";

/// Static singleton field of a function closure.
pub const CLOSURE_FIELD: &str = "closure";

/// Descriptor of `apply` for an arrow's arguments: every argument but the
/// last is a parameter, the last is the result.
pub fn apply_descriptor(arrow: &GenericName) -> NamingResult<String> {
    let (params, result) = arrow
        .split_arrow()
        .ok_or_else(|| NamingError::EmptyArrow {
            name: arrow.to_string(),
        })?;
    let mut descriptor = String::from("(");
    for param in params {
        descriptor.push_str(&descriptor_for_type(&param.value.to_string())?);
    }
    descriptor.push(')');
    descriptor.push_str(&descriptor_for_type(&result.value.to_string())?);
    Ok(descriptor)
}

/// The same arguments under a different structural stem.
fn restem(arrow: &GenericName, stem: &str) -> GenericName {
    GenericName::with_args(stem, arrow.args().unwrap_or_default().to_vec())
}

fn abstract_apply(arrow: &GenericName) -> NamingResult<MethodNode> {
    Ok(MethodBuilder::new(Access::PUBLIC | Access::ABSTRACT, APPLY, apply_descriptor(arrow)?).build())
}

fn forwarding_init(super_name: &str) -> MethodNode {
    MethodBuilder::new(Access::PUBLIC, INIT, "()V")
        .var(OpCode::Aload, 0)
        .invoke(OpCode::InvokeSpecial, super_name, INIT, "()V")
        .op(OpCode::Return)
        .maxs(1, 1)
        .build()
}

/// The interface `name` for `Arrow⟦…⟧`.
pub fn arrow_interface(name: &str, arrow: &GenericName) -> NamingResult<ClassModel> {
    let mut class = ClassModel::new(name, OBJECT_CLASS);
    class.access = Access::PUBLIC | Access::ABSTRACT | Access::INTERFACE;
    class.methods.push(abstract_apply(arrow)?);
    Ok(class)
}

/// The abstract base class `name` for `AbstractArrow⟦…⟧`.
pub fn abstract_arrow(name: &str, arrow: &GenericName) -> NamingResult<ClassModel> {
    let mut class = ClassModel::new(name, OBJECT_CLASS);
    class.access = Access::PUBLIC | Access::SUPER | Access::ABSTRACT;
    class
        .interfaces
        .push(mangle_binary_name(&restem(arrow, ARROW).to_string())?);
    class.methods.push(forwarding_init(OBJECT_CLASS));
    class.methods.push(abstract_apply(arrow)?);
    Ok(class)
}

/// The closure class `name` over the static method `api.function`.
pub fn function_closure(
    name: &str,
    api: &str,
    function: &str,
    arrow: &GenericName,
) -> NamingResult<ClassModel> {
    let super_name = mangle_binary_name(&restem(arrow, ABSTRACT_ARROW).to_string())?;
    let field_desc = descriptor_for_type(&restem(arrow, ARROW).to_string())?;
    let apply_desc = apply_descriptor(arrow)?;
    let arity = arrow.split_arrow().map_or(0, |(params, _)| params.len()) as u16;

    let mut class = ClassModel::new(name, &super_name);
    class.fields.push(FieldNode::new(
        Access::PUBLIC | Access::FINAL | Access::STATIC,
        CLOSURE_FIELD,
        &field_desc,
    ));

    class.methods.push(
        MethodBuilder::new(Access::STATIC, CLINIT, "()V")
            .type_insn(OpCode::New, name)
            .op(OpCode::Dup)
            .invoke(OpCode::InvokeSpecial, name, INIT, "()V")
            .field(OpCode::PutStatic, name, CLOSURE_FIELD, &field_desc)
            .op(OpCode::Return)
            .maxs(2, 0)
            .build(),
    );
    class.methods.push(forwarding_init(&super_name));

    let apply = (1..=arity)
        .fold(MethodBuilder::new(Access::PUBLIC, APPLY, &apply_desc), |builder, slot| {
            builder.var(OpCode::Aload, slot)
        })
        .invoke(
            OpCode::InvokeStatic,
            mangle_binary_name(api)?,
            mangle_identifier(function),
            &apply_desc,
        )
        .op(OpCode::Areturn)
        .maxs(arity.max(1), arity + 1)
        .build();
    class.methods.push(apply);
    Ok(class)
}
