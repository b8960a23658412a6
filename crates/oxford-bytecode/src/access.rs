//! Access flags for classes, fields, and methods.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Target access and property flags. Bit values follow the class-file format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Access: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        /// `ACC_SUPER` on classes, `ACC_SYNCHRONIZED` on methods.
        const SUPER = 0x0020;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
    }
}
