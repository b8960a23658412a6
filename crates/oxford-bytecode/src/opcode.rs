//! Target instruction opcodes.
//!
//! Values match the target virtual machine's encoding so that a model can be
//! lowered to real class files without a translation table. Only the opcodes
//! the front end emits into templates are listed.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// Instruction opcodes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    Nop = 0,
    AconstNull = 1,
    IconstM1 = 2,
    Iconst0 = 3,
    Iconst1 = 4,
    Iconst2 = 5,
    Iconst3 = 6,
    Iconst4 = 7,
    Iconst5 = 8,
    Lconst0 = 9,
    Lconst1 = 10,
    Bipush = 16,
    Sipush = 17,
    Ldc = 18,

    // =========================================================================
    // Locals
    // =========================================================================
    Iload = 21,
    Lload = 22,
    Fload = 23,
    Dload = 24,
    Aload = 25,
    Iaload = 46,
    Aaload = 50,
    Istore = 54,
    Lstore = 55,
    Fstore = 56,
    Dstore = 57,
    Astore = 58,
    Iastore = 79,
    Aastore = 83,

    // =========================================================================
    // Stack
    // =========================================================================
    Pop = 87,
    Pop2 = 88,
    Dup = 89,
    DupX1 = 90,
    Swap = 95,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    Iadd = 96,
    Ladd = 97,
    Isub = 100,
    Lsub = 101,
    Imul = 104,
    Lmul = 105,
    Idiv = 108,
    Ineg = 116,
    Iinc = 132,
    I2l = 133,
    L2i = 136,
    Lcmp = 148,

    // =========================================================================
    // Control flow
    // =========================================================================
    Ifeq = 153,
    Ifne = 154,
    Iflt = 155,
    Ifge = 156,
    Ifgt = 157,
    Ifle = 158,
    IfIcmpeq = 159,
    IfIcmpne = 160,
    IfIcmplt = 161,
    IfIcmpge = 162,
    IfAcmpeq = 165,
    IfAcmpne = 166,
    Goto = 167,
    TableSwitch = 170,
    LookupSwitch = 171,
    Ireturn = 172,
    Lreturn = 173,
    Freturn = 174,
    Dreturn = 175,
    Areturn = 176,
    Return = 177,

    // =========================================================================
    // Fields and calls
    // =========================================================================
    GetStatic = 178,
    PutStatic = 179,
    GetField = 180,
    PutField = 181,
    InvokeVirtual = 182,
    InvokeSpecial = 183,
    InvokeStatic = 184,
    InvokeInterface = 185,

    // =========================================================================
    // Objects
    // =========================================================================
    New = 187,
    NewArray = 188,
    ANewArray = 189,
    ArrayLength = 190,
    Athrow = 191,
    CheckCast = 192,
    InstanceOf = 193,
    MonitorEnter = 194,
    MonitorExit = 195,
    MultiANewArray = 197,
    IfNull = 198,
    IfNonNull = 199,
}

impl OpCode {
    /// Get the opcode name for disassembly.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Nop => "nop",
            OpCode::AconstNull => "aconst_null",
            OpCode::IconstM1 => "iconst_m1",
            OpCode::Iconst0 => "iconst_0",
            OpCode::Iconst1 => "iconst_1",
            OpCode::Iconst2 => "iconst_2",
            OpCode::Iconst3 => "iconst_3",
            OpCode::Iconst4 => "iconst_4",
            OpCode::Iconst5 => "iconst_5",
            OpCode::Lconst0 => "lconst_0",
            OpCode::Lconst1 => "lconst_1",
            OpCode::Bipush => "bipush",
            OpCode::Sipush => "sipush",
            OpCode::Ldc => "ldc",
            OpCode::Iload => "iload",
            OpCode::Lload => "lload",
            OpCode::Fload => "fload",
            OpCode::Dload => "dload",
            OpCode::Aload => "aload",
            OpCode::Iaload => "iaload",
            OpCode::Aaload => "aaload",
            OpCode::Istore => "istore",
            OpCode::Lstore => "lstore",
            OpCode::Fstore => "fstore",
            OpCode::Dstore => "dstore",
            OpCode::Astore => "astore",
            OpCode::Iastore => "iastore",
            OpCode::Aastore => "aastore",
            OpCode::Pop => "pop",
            OpCode::Pop2 => "pop2",
            OpCode::Dup => "dup",
            OpCode::DupX1 => "dup_x1",
            OpCode::Swap => "swap",
            OpCode::Iadd => "iadd",
            OpCode::Ladd => "ladd",
            OpCode::Isub => "isub",
            OpCode::Lsub => "lsub",
            OpCode::Imul => "imul",
            OpCode::Lmul => "lmul",
            OpCode::Idiv => "idiv",
            OpCode::Ineg => "ineg",
            OpCode::Iinc => "iinc",
            OpCode::I2l => "i2l",
            OpCode::L2i => "l2i",
            OpCode::Lcmp => "lcmp",
            OpCode::Ifeq => "ifeq",
            OpCode::Ifne => "ifne",
            OpCode::Iflt => "iflt",
            OpCode::Ifge => "ifge",
            OpCode::Ifgt => "ifgt",
            OpCode::Ifle => "ifle",
            OpCode::IfIcmpeq => "if_icmpeq",
            OpCode::IfIcmpne => "if_icmpne",
            OpCode::IfIcmplt => "if_icmplt",
            OpCode::IfIcmpge => "if_icmpge",
            OpCode::IfAcmpeq => "if_acmpeq",
            OpCode::IfAcmpne => "if_acmpne",
            OpCode::Goto => "goto",
            OpCode::TableSwitch => "tableswitch",
            OpCode::LookupSwitch => "lookupswitch",
            OpCode::Ireturn => "ireturn",
            OpCode::Lreturn => "lreturn",
            OpCode::Freturn => "freturn",
            OpCode::Dreturn => "dreturn",
            OpCode::Areturn => "areturn",
            OpCode::Return => "return",
            OpCode::GetStatic => "getstatic",
            OpCode::PutStatic => "putstatic",
            OpCode::GetField => "getfield",
            OpCode::PutField => "putfield",
            OpCode::InvokeVirtual => "invokevirtual",
            OpCode::InvokeSpecial => "invokespecial",
            OpCode::InvokeStatic => "invokestatic",
            OpCode::InvokeInterface => "invokeinterface",
            OpCode::New => "new",
            OpCode::NewArray => "newarray",
            OpCode::ANewArray => "anewarray",
            OpCode::ArrayLength => "arraylength",
            OpCode::Athrow => "athrow",
            OpCode::CheckCast => "checkcast",
            OpCode::InstanceOf => "instanceof",
            OpCode::MonitorEnter => "monitorenter",
            OpCode::MonitorExit => "monitorexit",
            OpCode::MultiANewArray => "multianewarray",
            OpCode::IfNull => "ifnull",
            OpCode::IfNonNull => "ifnonnull",
        }
    }

    /// `true` for the opcodes that end a method normally.
    pub fn is_return(self) -> bool {
        matches!(
            self,
            OpCode::Ireturn
                | OpCode::Lreturn
                | OpCode::Freturn
                | OpCode::Dreturn
                | OpCode::Areturn
                | OpCode::Return
        )
    }

    /// `true` for the four method-call opcodes.
    pub fn is_invoke(self) -> bool {
        matches!(
            self,
            OpCode::InvokeVirtual
                | OpCode::InvokeSpecial
                | OpCode::InvokeStatic
                | OpCode::InvokeInterface
        )
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_values_match_target_encoding() {
        assert_eq!(u8::from(OpCode::Ldc), 18);
        assert_eq!(u8::from(OpCode::Return), 177);
        assert_eq!(u8::from(OpCode::InvokeInterface), 185);
        assert_eq!(OpCode::try_from(182u8), Ok(OpCode::InvokeVirtual));
    }

    #[test]
    fn unknown_opcode_rejected() {
        assert!(OpCode::try_from(186u8).is_err());
    }

    #[test]
    fn classification() {
        assert!(OpCode::Areturn.is_return());
        assert!(!OpCode::Athrow.is_return());
        assert!(OpCode::InvokeStatic.is_invoke());
        assert_eq!(OpCode::InvokeStatic.to_string(), "invokestatic");
    }
}
