//! Structural model of target class files.
//!
//! ## Components
//!
//! - `opcode`: instruction opcodes with target encoding values
//! - `access`: access flags
//! - `constant`: values loadable by `ldc`
//! - `model`: classes, fields, methods, and instructions
//! - `builder`: assembling methods by hand
//! - `codec`: the stored binary form

pub mod access;
pub mod builder;
pub mod codec;
pub mod constant;
pub mod model;
pub mod opcode;

pub use access::Access;
pub use builder::MethodBuilder;
pub use codec::CodecError;
pub use constant::Constant;
pub use model::{
    Attribute, CLINIT, ClassModel, FieldNode, INIT, InnerClass, Insn, Label, LocalVariable,
    MethodNode, OBJECT_CLASS, TryCatch,
};
pub use opcode::OpCode;
