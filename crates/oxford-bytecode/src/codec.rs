//! Stored binary form of class models.
//!
//! Templates live in resources as `OXCL` + little-endian format version +
//! postcard-encoded [`ClassModel`].

use thiserror::Error;

use crate::model::ClassModel;

const MAGIC: [u8; 4] = *b"OXCL";
const VERSION: u16 = 1;

/// Errors reading or writing the stored form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("not a class model")]
    BadMagic,

    #[error("unsupported class model version {0}")]
    UnsupportedVersion(u16),

    #[error("corrupt class model: {0}")]
    Postcard(#[from] postcard::Error),
}

impl ClassModel {
    /// Encode to the stored form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(256);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&postcard::to_allocvec(self)?);
        Ok(out)
    }

    /// Decode the stored form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let body = bytes.strip_prefix(&MAGIC[..]).ok_or(CodecError::BadMagic)?;
        let (version, body) = body.split_at_checked(2).ok_or(CodecError::BadMagic)?;
        let version = u16::from_le_bytes([version[0], version[1]]);
        if version != VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        Ok(postcard::from_bytes(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Access;
    use crate::builder::MethodBuilder;
    use crate::constant::Constant;
    use crate::model::{FieldNode, OBJECT_CLASS};
    use crate::opcode::OpCode;
    use ordered_float::OrderedFloat;

    #[test]
    fn stored_form_decodes_to_same_model() {
        let mut class = ClassModel::new("\\=Box⟦T⟧", OBJECT_CLASS);
        class.fields.push(FieldNode::new(Access::PRIVATE, "value", "LT;"));
        class.methods.push(
            MethodBuilder::new(Access::PUBLIC, "get", "()LT;")
                .var(OpCode::Aload, 0)
                .field(OpCode::GetField, "\\=Box⟦T⟧", "value", "LT;")
                .ldc(Constant::Double(OrderedFloat(2.5)))
                .op(OpCode::Pop2)
                .op(OpCode::Areturn)
                .build(),
        );
        let bytes = class.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"OXCL");
        assert_eq!(ClassModel::from_bytes(&bytes).unwrap(), class);
    }

    #[test]
    fn rejects_truncated_and_foreign_bytes() {
        assert_eq!(ClassModel::from_bytes(b"CAFE"), Err(CodecError::BadMagic));
        assert_eq!(ClassModel::from_bytes(b"OXCL\x01"), Err(CodecError::BadMagic));
        assert_eq!(
            ClassModel::from_bytes(b"OXCL\x02\x00"),
            Err(CodecError::UnsupportedVersion(2))
        );
        assert!(matches!(
            ClassModel::from_bytes(b"OXCL\x01\x00"),
            Err(CodecError::Postcard(_))
        ));
    }
}
