//! Structural class model.
//!
//! A [`ClassModel`] is a class file with its constant pool resolved away:
//! every reference to a type, member, or descriptor is a string in mangled
//! form, held directly by the instruction or declaration that uses it. This
//! is the shape templates are stored in and the shape specialization
//! produces.

use serde::{Deserialize, Serialize};

use crate::access::Access;
use crate::constant::Constant;
use crate::opcode::OpCode;

/// Conventional root superclass.
pub const OBJECT_CLASS: &str = "java/lang/Object";

/// Constructor method name.
pub const INIT: &str = "<init>";

/// Static initializer method name.
pub const CLINIT: &str = "<clinit>";

/// A branch target within one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(pub u32);

/// One instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Insn {
    /// An opcode with no operands.
    Simple(OpCode),
    /// `bipush`, `sipush`, `newarray`.
    Int { opcode: OpCode, operand: i32 },
    /// Local variable loads and stores.
    Var { opcode: OpCode, var: u16 },
    Iinc { var: u16, increment: i16 },
    /// `new`, `anewarray`, `checkcast`, `instanceof`. The operand is a
    /// binary name or, for array classes, an array descriptor.
    Type { opcode: OpCode, type_name: String },
    Field {
        opcode: OpCode,
        owner: String,
        name: String,
        descriptor: String,
    },
    Method {
        opcode: OpCode,
        owner: String,
        name: String,
        descriptor: String,
        interface: bool,
    },
    Jump { opcode: OpCode, target: Label },
    Label(Label),
    Ldc(Constant),
    TableSwitch {
        min: i32,
        max: i32,
        default: Label,
        targets: Vec<Label>,
    },
    LookupSwitch {
        default: Label,
        keys: Vec<i32>,
        targets: Vec<Label>,
    },
    MultiANewArray { descriptor: String, dimensions: u8 },
    LineNumber { line: u32, start: Label },
}

impl Insn {
    /// The opcode this instruction encodes to, if it encodes to one.
    pub fn opcode(&self) -> Option<OpCode> {
        match self {
            Insn::Simple(op)
            | Insn::Int { opcode: op, .. }
            | Insn::Var { opcode: op, .. }
            | Insn::Type { opcode: op, .. }
            | Insn::Field { opcode: op, .. }
            | Insn::Method { opcode: op, .. }
            | Insn::Jump { opcode: op, .. } => Some(*op),
            Insn::Iinc { .. } => Some(OpCode::Iinc),
            Insn::Ldc(_) => Some(OpCode::Ldc),
            Insn::TableSwitch { .. } => Some(OpCode::TableSwitch),
            Insn::LookupSwitch { .. } => Some(OpCode::LookupSwitch),
            Insn::MultiANewArray { .. } => Some(OpCode::MultiANewArray),
            Insn::Label(_) | Insn::LineNumber { .. } => None,
        }
    }
}

/// An exception handler range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TryCatch {
    pub start: Label,
    pub end: Label,
    pub handler: Label,
    /// `None` catches everything.
    pub catch_type: Option<String>,
}

/// Debug information for one local variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalVariable {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub start: Label,
    pub end: Label,
    pub index: u16,
}

/// An attribute the model does not interpret. Carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub data: Vec<u8>,
}

/// Inner-class table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InnerClass {
    pub name: String,
    pub outer_name: Option<String>,
    pub inner_name: Option<String>,
    pub access: Access,
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNode {
    pub access: Access,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub value: Option<Constant>,
    pub attributes: Vec<Attribute>,
}

impl FieldNode {
    pub fn new(access: Access, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            value: None,
            attributes: Vec::new(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.access.contains(Access::STATIC)
    }
}

/// A method declaration and its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodNode {
    pub access: Access,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub instructions: Vec<Insn>,
    pub try_catch: Vec<TryCatch>,
    pub locals: Vec<LocalVariable>,
    pub max_stack: u16,
    pub max_locals: u16,
    pub attributes: Vec<Attribute>,
}

impl MethodNode {
    pub fn new(access: Access, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            exceptions: Vec::new(),
            instructions: Vec::new(),
            try_catch: Vec::new(),
            locals: Vec::new(),
            max_stack: 0,
            max_locals: 0,
            attributes: Vec::new(),
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.access.contains(Access::ABSTRACT)
    }

    /// Index of the last normal return, where code appended to the method
    /// body must be inserted.
    pub fn last_return(&self) -> Option<usize> {
        self.instructions
            .iter()
            .rposition(|insn| insn.opcode().is_some_and(OpCode::is_return))
    }
}

/// A class or interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassModel {
    pub version: u32,
    pub access: Access,
    pub name: String,
    pub signature: Option<String>,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub source_file: Option<String>,
    pub inner_classes: Vec<InnerClass>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
    pub attributes: Vec<Attribute>,
}

impl ClassModel {
    /// Class-file major version the models target.
    pub const DEFAULT_VERSION: u32 = 50;

    /// An empty public class extending `super_name`.
    pub fn new(name: impl Into<String>, super_name: impl Into<String>) -> Self {
        Self {
            version: Self::DEFAULT_VERSION,
            access: Access::PUBLIC | Access::SUPER,
            name: name.into(),
            signature: None,
            super_name: Some(super_name.into()),
            interfaces: Vec::new(),
            source_file: None,
            inner_classes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.access.contains(Access::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.access.contains(Access::ABSTRACT)
    }

    /// First method named `name`.
    pub fn method(&self, name: &str) -> Option<&MethodNode> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// First method named `name`, mutably.
    pub fn method_mut(&mut self, name: &str) -> Option<&mut MethodNode> {
        self.methods.iter_mut().find(|m| m.name == name)
    }

    /// All fields named `name`. A specialized class may hold two fields
    /// that share a name and differ in descriptor.
    pub fn fields_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldNode> + 'a {
        self.fields.iter().filter(move |f| f.name == name)
    }

    /// Every instruction of every method.
    pub fn instructions(&self) -> impl Iterator<Item = &Insn> {
        self.methods.iter().flat_map(|m| m.instructions.iter())
    }
}
