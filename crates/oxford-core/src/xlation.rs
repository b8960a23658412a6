//! Xlation records: the static-parameter list stored beside each template.
//!
//! The front end writes one record per template. It names every formal
//! parameter in order together with its kind, and says whether the template
//! is an object (class) or a trait (interface). Specializing a template
//! pairs the record's formals positionally with the actual arguments.
//!
//! The stored form is a short header (`OXXL` magic plus a format version)
//! followed by a postcard body.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::XlationError;

const MAGIC: [u8; 4] = *b"OXXL";
const VERSION: u16 = 1;

/// What sort of static parameter a formal is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Type,
    Int,
    Bool,
    Unit,
    Dimension,
    Operator,
}

impl ParamKind {
    /// `true` when the actual is a type whose runtime descriptor must be
    /// materialized; value-like kinds are threaded through as constants.
    pub fn has_rtti(self) -> bool {
        matches!(self, ParamKind::Type | ParamKind::Unit | ParamKind::Dimension)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Type => "type",
            ParamKind::Int => "int",
            ParamKind::Bool => "bool",
            ParamKind::Unit => "unit",
            ParamKind::Dimension => "dimension",
            ParamKind::Operator => "operator",
        };
        f.write_str(name)
    }
}

/// Whether a template specializes to a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GenericSort {
    #[default]
    Object,
    Trait,
}

/// One formal static parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticParam {
    pub kind: ParamKind,
    pub name: String,
}

/// The ordered formal parameters of one template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XlationRecord {
    pub sort: GenericSort,
    pub params: Vec<StaticParam>,
}

impl XlationRecord {
    /// An empty record for a template of the given sort.
    pub fn new(sort: GenericSort) -> Self {
        Self {
            sort,
            params: Vec::new(),
        }
    }

    /// Append a formal.
    pub fn with_param(mut self, kind: ParamKind, name: impl Into<String>) -> Self {
        self.params.push(StaticParam {
            kind,
            name: name.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Formal names in declaration order.
    pub fn formals(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Formal kinds in declaration order.
    pub fn kinds(&self) -> Vec<ParamKind> {
        self.params.iter().map(|p| p.kind).collect()
    }

    /// Encode to the stored form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, XlationError> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        let body = postcard::to_allocvec(self)?;
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode the stored form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XlationError> {
        let body = bytes.strip_prefix(&MAGIC[..]).ok_or(XlationError::BadMagic)?;
        let (version, body) = body.split_at_checked(2).ok_or(XlationError::BadMagic)?;
        let version = u16::from_le_bytes([version[0], version[1]]);
        if version != VERSION {
            return Err(XlationError::UnsupportedVersion(version));
        }
        Ok(postcard::from_bytes(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_record() -> XlationRecord {
        XlationRecord::new(GenericSort::Object)
            .with_param(ParamKind::Type, "A")
            .with_param(ParamKind::Int, "n")
    }

    #[test]
    fn stored_form_decodes() {
        let record = pair_record();
        let bytes = record.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"OXXL");
        assert_eq!(XlationRecord::from_bytes(&bytes).unwrap(), record);
    }

    #[test]
    fn formals_and_kinds_keep_order() {
        let record = pair_record();
        assert_eq!(record.formals().collect::<Vec<_>>(), vec!["A", "n"]);
        assert_eq!(record.kinds(), vec![ParamKind::Type, ParamKind::Int]);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn rejects_foreign_bytes() {
        assert_eq!(XlationRecord::from_bytes(b"nope"), Err(XlationError::BadMagic));
        assert_eq!(XlationRecord::from_bytes(b"OXXL"), Err(XlationError::BadMagic));
        assert_eq!(
            XlationRecord::from_bytes(b"OXXL\x07\x00"),
            Err(XlationError::UnsupportedVersion(7))
        );
        assert!(matches!(
            XlationRecord::from_bytes(b"OXXL\x01\x00\x05"),
            Err(XlationError::Decode(_))
        ));
    }

    #[test]
    fn value_kinds_have_no_rtti() {
        assert!(ParamKind::Type.has_rtti());
        assert!(ParamKind::Dimension.has_rtti());
        assert!(!ParamKind::Int.has_rtti());
        assert!(!ParamKind::Operator.has_rtti());
    }
}
