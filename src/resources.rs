//! Where templates and stored classes come from.
//!
//! A class `name` (mangled binary name) is stored as `<name>.class`, in the
//! postcard-encoded [`ClassModel`] form. A template additionally has
//! `<name>.xlation` holding its [`XlationRecord`].
//!
//! Templates are stored under their canonical name (`pkg/Box⟦⟧`) even when
//! the model names itself with its formals (`pkg/Box⟦T⟧`); see
//! [`storage_name`].

use std::io;
use std::path::{Component, Path, PathBuf};

use oxford_bytecode::{ClassModel, CodecError};
use oxford_core::naming::{demangle_binary_name, mangle_binary_name};
use oxford_core::{GenericName, NamingError, XlationError, XlationRecord};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Extension of stored classes and templates.
pub const CLASS_EXTENSION: &str = "class";

/// Extension of xlation records.
pub const XLATION_EXTENSION: &str = "xlation";

/// Resource path of the stored class `name`.
pub fn class_path(name: &str) -> String {
    format!("{name}.{CLASS_EXTENSION}")
}

/// Resource path of the xlation record of template `name`.
pub fn xlation_path(name: &str) -> String {
    format!("{name}.{XLATION_EXTENSION}")
}

/// The name a class `name` (mangled) is stored under: the canonical template
/// name if `name` carries arguments, otherwise `name` itself.
pub fn storage_name(name: &str) -> Result<String, NamingError> {
    let parsed = GenericName::parse(&demangle_binary_name(name))?;
    match parsed.canonical_template_name() {
        Some(canonical) if parsed.args().is_some_and(|args| !args.is_empty()) => {
            mangle_binary_name(&canonical)
        }
        _ => Ok(name.to_string()),
    }
}

/// Read-only access to stored resources.
pub trait ResourceProvider: Send + Sync {
    /// The bytes at `path`, or `None` if there is no such resource.
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;
}

/// Resources under a directory; `a/B.class` is `<root>/a/B.class`.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceProvider for DirectoryResources {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("resource path '{path}' leaves the resource root"),
            ));
        }
        match std::fs::read(self.root.join(relative)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Resources held in memory.
#[derive(Debug, Default)]
pub struct MemoryResources {
    entries: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes at `path`.
    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.entries.write().insert(path.into(), bytes);
    }

    /// Store a class under its own name.
    pub fn insert_class(&self, class: &ClassModel) -> Result<(), CodecError> {
        self.insert(class_path(&class.name), class.to_bytes()?);
        Ok(())
    }

    /// Store a template and its xlation record under the template's
    /// [`storage_name`].
    pub fn insert_template(
        &self,
        template: &ClassModel,
        record: &XlationRecord,
    ) -> Result<(), TemplateStoreError> {
        let stored = storage_name(&template.name)?;
        self.insert(class_path(&stored), template.to_bytes()?);
        self.insert(xlation_path(&stored), record.to_bytes()?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ResourceProvider for MemoryResources {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(path).cloned())
    }
}

/// A template could not be encoded for storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateStoreError {
    #[error(transparent)]
    Class(#[from] CodecError),
    #[error(transparent)]
    Xlation(#[from] XlationError),
    #[error(transparent)]
    Naming(#[from] NamingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxford_bytecode::OBJECT_CLASS;
    use oxford_core::{GenericSort, ParamKind};

    #[test]
    fn memory_round_trip() {
        let resources = MemoryResources::new();
        let template = ClassModel::new("Box⟦⟧", OBJECT_CLASS);
        let record = XlationRecord::new(GenericSort::Object).with_param(ParamKind::Type, "T");
        resources.insert_template(&template, &record).unwrap();

        assert_eq!(resources.len(), 2);
        let bytes = resources.read("Box⟦⟧.class").unwrap().unwrap();
        assert_eq!(ClassModel::from_bytes(&bytes).unwrap(), template);
        let bytes = resources.read("Box⟦⟧.xlation").unwrap().unwrap();
        assert_eq!(XlationRecord::from_bytes(&bytes).unwrap(), record);
        assert!(resources.read("Missing.class").unwrap().is_none());
    }

    #[test]
    fn directory_reads_nested_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("pkg/Foo.class"), b"bytes").unwrap();

        let resources = DirectoryResources::new(dir.path());
        assert_eq!(resources.read("pkg/Foo.class").unwrap(), Some(b"bytes".to_vec()));
        assert_eq!(resources.read("pkg/Bar.class").unwrap(), None);
    }

    #[test]
    fn directory_stays_inside_its_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("classes")).unwrap();
        std::fs::write(dir.path().join("secret.class"), b"outside").unwrap();

        let resources = DirectoryResources::new(dir.path().join("classes"));
        for path in ["../secret.class", "pkg/../../secret.class", "/etc/passwd"] {
            let err = resources.read(path).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{path}");
        }
    }

    #[test]
    fn templates_are_stored_under_their_canonical_name() {
        let own = mangle_binary_name("pkg/Box⟦T⟧").unwrap();
        let canonical = mangle_binary_name("pkg/Box⟦⟧").unwrap();
        assert_eq!(storage_name(&own).unwrap(), canonical);
        assert_eq!(storage_name(&canonical).unwrap(), canonical);
        assert_eq!(storage_name("pkg/Foo").unwrap(), "pkg/Foo");

        let resources = MemoryResources::new();
        let template = ClassModel::new(&own, OBJECT_CLASS);
        let record = XlationRecord::new(GenericSort::Object).with_param(ParamKind::Type, "T");
        resources.insert_template(&template, &record).unwrap();
        assert!(resources.read(&class_path(&canonical)).unwrap().is_some());
        assert!(resources.read(&xlation_path(&canonical)).unwrap().is_some());
    }
}
