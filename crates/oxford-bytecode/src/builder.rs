//! Instruction builder for hand-assembled methods.
//!
//! Synthesized classes (arrow interfaces, closures) and test templates are
//! assembled with [`MethodBuilder`] rather than by pushing raw [`Insn`]
//! values, so labels and stack limits stay consistent.

use crate::access::Access;
use crate::constant::Constant;
use crate::model::{Insn, Label, MethodNode};
use crate::opcode::OpCode;

/// Builds one [`MethodNode`].
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    method: MethodNode,
    next_label: u32,
}

impl MethodBuilder {
    /// Start a method with the given access, name, and descriptor.
    pub fn new(access: Access, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            method: MethodNode::new(access, name, descriptor),
            next_label: 0,
        }
    }

    /// Write an operand-free opcode.
    pub fn op(mut self, op: OpCode) -> Self {
        self.method.instructions.push(Insn::Simple(op));
        self
    }

    /// Write a local-variable load or store.
    pub fn var(mut self, op: OpCode, var: u16) -> Self {
        self.method.instructions.push(Insn::Var { opcode: op, var });
        self
    }

    /// Write `new`, `checkcast`, `instanceof`, or `anewarray`.
    pub fn type_insn(mut self, op: OpCode, type_name: impl Into<String>) -> Self {
        self.method.instructions.push(Insn::Type {
            opcode: op,
            type_name: type_name.into(),
        });
        self
    }

    /// Write a field access.
    pub fn field(
        mut self,
        op: OpCode,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        self.method.instructions.push(Insn::Field {
            opcode: op,
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        });
        self
    }

    /// Write a call. `invokeinterface` marks the owner as an interface.
    pub fn invoke(
        mut self,
        op: OpCode,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        self.method.instructions.push(Insn::Method {
            opcode: op,
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
            interface: op == OpCode::InvokeInterface,
        });
        self
    }

    /// Write a constant load.
    pub fn ldc(mut self, constant: Constant) -> Self {
        self.method.instructions.push(Insn::Ldc(constant));
        self
    }

    /// Write any instruction.
    pub fn insn(mut self, insn: Insn) -> Self {
        self.method.instructions.push(insn);
        self
    }

    /// Allocate a fresh label without placing it.
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Place a label at the current position.
    pub fn label(mut self, label: Label) -> Self {
        self.method.instructions.push(Insn::Label(label));
        self
    }

    /// Declare a thrown exception type.
    pub fn throws(mut self, exception: impl Into<String>) -> Self {
        self.method.exceptions.push(exception.into());
        self
    }

    /// Set stack and local limits.
    pub fn maxs(mut self, max_stack: u16, max_locals: u16) -> Self {
        self.method.max_stack = max_stack;
        self.method.max_locals = max_locals;
        self
    }

    /// Current instruction count.
    pub fn len(&self) -> usize {
        self.method.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.method.instructions.is_empty()
    }

    /// Finish the method.
    pub fn build(self) -> MethodNode {
        self.method
    }
}
