//! The specialization loader.
//!
//! A [`SpecializationLoader`] turns a requested class name into an
//! installed class:
//!
//! 1. classify the name ([`classify`])
//! 2. reserved names go to the [`SystemLoader`], plain names are read from
//!    the [`ResourceProvider`], structural arrows and plain function
//!    closures are synthesized
//! 3. generic names locate their template and xlation record by canonical
//!    template name, bind the record's formals to the actual arguments, and
//!    rewrite the template into the requested class
//!
//! Every name is installed at most once, and its outcome (class or error) is
//! shared by all requests for that name for the loader's lifetime.
//!
//! There is meant to be one loader per program. Construct it once and pass
//! it, usually behind an `Arc`, to whatever needs classes.

use std::sync::Arc;

use oxford_bytecode::ClassModel;
use oxford_core::naming::{demangle_binary_name, mangle_binary_name};
use oxford_core::{GenericName, GenericSort, NamingResult, ParamKind, XlationRecord};
use oxford_rewriter::{ClassResolver, SubstitutionMap, rewrite_class};
use tracing::{debug, trace, warn};

use crate::classify::{NameClass, classify};
use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::registry::{ClassOrigin, ClassTable, LoadedClass};
use crate::resources::{ResourceProvider, class_path, xlation_path};
use crate::synth;

/// Supplies classes from reserved namespaces.
pub trait SystemLoader: Send + Sync {
    fn find_system_class(&self, name: &str) -> Option<ClassModel>;
}

/// A system loader that knows no classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSystemClasses;

impl SystemLoader for NoSystemClasses {
    fn find_system_class(&self, _name: &str) -> Option<ClassModel> {
        None
    }
}

/// Loads stored classes and specializes generic ones on first request.
pub struct SpecializationLoader {
    resources: Box<dyn ResourceProvider>,
    system: Box<dyn SystemLoader>,
    config: LoaderConfig,
    classes: ClassTable,
}

impl std::fmt::Debug for SpecializationLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecializationLoader")
            .field("config", &self.config)
            .field("classes", &self.classes.len())
            .finish_non_exhaustive()
    }
}

impl SpecializationLoader {
    /// A loader over `resources` with the default configuration.
    pub fn new(resources: impl ResourceProvider + 'static) -> Self {
        Self {
            resources: Box::new(resources),
            system: Box::new(NoSystemClasses),
            config: LoaderConfig::default(),
            classes: ClassTable::new(),
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_system_loader(mut self, system: impl SystemLoader + 'static) -> Self {
        self.system = Box::new(system);
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The class named `name` (mangled binary name), loading or
    /// specializing it on first request.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn load_class(&self, name: &str) -> Result<Arc<LoadedClass>, LoadError> {
        self.classes.get_or_load(name, || {
            let result = self.define(name);
            match &result {
                Ok(class) if self.config.log_loads => {
                    debug!(name = %demangle_binary_name(name), origin = ?class.origin, "Installed class");
                }
                Ok(_) => {}
                Err(err) if err.is_not_found() => {
                    debug!(name = %demangle_binary_name(name), error = %err, "Class not found");
                }
                Err(err) => warn!(name = %demangle_binary_name(name), error = %err, "Class load failed"),
            }
            result
        })
    }

    /// Load by natural name.
    pub fn load_natural(&self, natural: &str) -> Result<Arc<LoadedClass>, LoadError> {
        let name = mangle_binary_name(natural).map_err(|source| LoadError::MalformedName {
            name: natural.to_string(),
            source,
        })?;
        self.load_class(&name)
    }

    /// The class installed under `name`, without loading it.
    pub fn find_loaded(&self, name: &str) -> Option<Arc<LoadedClass>> {
        self.classes.find_loaded(name)
    }

    /// Number of classes installed so far.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Names of the classes installed so far, sorted.
    pub fn loaded_names(&self) -> Vec<String> {
        self.classes.names()
    }

    fn define(&self, name: &str) -> Result<LoadedClass, LoadError> {
        let class = classify(name, &self.config).map_err(|source| LoadError::MalformedName {
            name: name.to_string(),
            source,
        })?;
        trace!(name = %demangle_binary_name(name), kind = class.kind(), "Classified request");

        let synthesized = |model: NamingResult<ClassModel>| {
            model
                .map(|model| LoadedClass::new(name, model, ClassOrigin::Synthesized))
                .map_err(|source| LoadError::MalformedName {
                    name: name.to_string(),
                    source,
                })
        };

        match class {
            NameClass::Reserved => self
                .system
                .find_system_class(name)
                .map(|model| LoadedClass::new(name, model, ClassOrigin::System))
                .ok_or_else(|| LoadError::NotFound {
                    name: name.to_string(),
                }),
            NameClass::Plain => {
                let model = self.read_class(name, name)?;
                Ok(LoadedClass::new(name, model, ClassOrigin::Stored))
            }
            NameClass::Arrow(arrow) => synthesized(synth::arrow_interface(name, &arrow)),
            NameClass::AbstractArrow(arrow) => synthesized(synth::abstract_arrow(name, &arrow)),
            NameClass::FunctionClosure {
                api,
                function,
                arrow,
            } => synthesized(synth::function_closure(name, &api, &function, &arrow)),
            NameClass::GenericInstance { template, actuals }
            | NameClass::GenericClosure { template, actuals } => {
                self.specialize(name, &template, &actuals)
            }
        }
    }

    fn specialize(
        &self,
        name: &str,
        template: &str,
        actuals: &[GenericName],
    ) -> Result<LoadedClass, LoadError> {
        let model = self.read_class(name, template)?;
        let record = self.read_xlation(name, template)?;
        let subst = SubstitutionMap::from_xlation(&demangle_binary_name(template), &record, actuals)
            .map_err(|source| LoadError::rewrite(name, source))?
            .with_tuple_flattening(self.config.flatten_tuples);

        let specialized =
            rewrite_class(&model, name, &subst, self).map_err(|source| LoadError::rewrite(name, source))?;
        Ok(LoadedClass::new(
            name,
            specialized,
            ClassOrigin::Specialized {
                template: template.to_string(),
            },
        ))
    }

    fn read(&self, name: &str, path: &str) -> Result<Vec<u8>, LoadError> {
        match self.resources.read(path) {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(LoadError::NotFound {
                name: name.to_string(),
            }),
            Err(err) => Err(LoadError::ResourceUnavailable {
                name: name.to_string(),
                path: path.to_string(),
                source: Arc::new(err),
            }),
        }
    }

    /// The stored class `stored`, read on behalf of the request `name`.
    fn read_class(&self, name: &str, stored: &str) -> Result<ClassModel, LoadError> {
        let bytes = self.read(name, &class_path(stored))?;
        ClassModel::from_bytes(&bytes).map_err(|source| LoadError::Decode {
            name: name.to_string(),
            source,
        })
    }

    fn read_xlation(&self, name: &str, template: &str) -> Result<XlationRecord, LoadError> {
        let bytes = self.read(name, &xlation_path(template))?;
        XlationRecord::from_bytes(&bytes).map_err(|source| LoadError::Xlation {
            name: name.to_string(),
            source,
        })
    }

    fn xlation_for(&self, template: &str) -> Option<XlationRecord> {
        let mangled = mangle_binary_name(template).ok()?;
        self.read_xlation(&mangled, &mangled).ok()
    }
}

impl ClassResolver for SpecializationLoader {
    fn generic_kinds(&self, template: &str) -> Option<Vec<ParamKind>> {
        self.xlation_for(template).map(|record| record.kinds())
    }

    fn generic_sort(&self, template: &str) -> Option<GenericSort> {
        self.xlation_for(template).map(|record| record.sort)
    }

    fn is_interface(&self, class: &str) -> Option<bool> {
        match classify(class, &self.config).ok()? {
            NameClass::Plain | NameClass::Reserved => {
                self.load_class(class).ok().map(|loaded| loaded.is_interface())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::MemoryResources;
    use oxford_bytecode::{Access, OBJECT_CLASS};

    struct HostClasses;

    impl SystemLoader for HostClasses {
        fn find_system_class(&self, name: &str) -> Option<ClassModel> {
            (name == OBJECT_CLASS).then(|| ClassModel::new(OBJECT_CLASS, OBJECT_CLASS))
        }
    }

    #[test]
    fn reserved_names_go_to_the_system_loader() {
        let loader = SpecializationLoader::new(MemoryResources::new());
        assert!(loader.load_class(OBJECT_CLASS).unwrap_err().is_not_found());

        let loader = SpecializationLoader::new(MemoryResources::new()).with_system_loader(HostClasses);
        let object = loader.load_class(OBJECT_CLASS).unwrap();
        assert_eq!(object.origin, ClassOrigin::System);
    }

    #[test]
    fn plain_classes_are_loaded_unchanged() {
        let resources = MemoryResources::new();
        let mut stored = ClassModel::new("pkg/Foo", OBJECT_CLASS);
        stored.access |= Access::FINAL;
        resources.insert_class(&stored).unwrap();

        let loader = SpecializationLoader::new(resources);
        let loaded = loader.load_class("pkg/Foo").unwrap();
        assert_eq!(loaded.model, stored);
        assert_eq!(loaded.origin, ClassOrigin::Stored);
        assert_eq!(loader.is_interface("pkg/Foo"), Some(false));
        assert_eq!(loader.is_interface("pkg/Missing"), None);
    }

    #[test]
    fn resolver_reads_template_metadata() {
        let resources = MemoryResources::new();
        let record = XlationRecord::new(GenericSort::Trait)
            .with_param(ParamKind::Type, "T")
            .with_param(ParamKind::Int, "N");
        resources
            .insert_template(&ClassModel::new(mangle_binary_name("pkg/Vec⟦⟧").unwrap(), OBJECT_CLASS), &record)
            .unwrap();

        let loader = SpecializationLoader::new(resources);
        assert_eq!(loader.generic_sort("pkg/Vec⟦⟧"), Some(GenericSort::Trait));
        assert_eq!(
            loader.generic_kinds("pkg/Vec⟦⟧"),
            Some(vec![ParamKind::Type, ParamKind::Int])
        );
        assert_eq!(loader.generic_sort("pkg/Other⟦⟧"), None);
    }
}
