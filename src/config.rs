//! Loader configuration.

/// Settings for a [`SpecializationLoader`](crate::SpecializationLoader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Binary-name prefixes handed to the system loader instead of being
    /// loaded or specialized here.
    pub reserved_prefixes: Vec<String>,
    /// Flatten a tuple-typed arrow domain into the arrow's argument list.
    pub flatten_tuples: bool,
    /// Log every installed class at debug level.
    pub log_loads: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            reserved_prefixes: ["java/", "javax/", "sun/", "com/sun/"]
                .into_iter()
                .map(String::from)
                .collect(),
            flatten_tuples: true,
            log_loads: false,
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reserved prefixes.
    pub fn with_reserved_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Add one reserved prefix.
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefixes.push(prefix.into());
        self
    }

    pub fn with_tuple_flattening(mut self, enabled: bool) -> Self {
        self.flatten_tuples = enabled;
        self
    }

    pub fn with_load_logging(mut self, enabled: bool) -> Self {
        self.log_loads = enabled;
        self
    }

    /// Whether `name` belongs to a reserved namespace.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reserves_platform_namespaces() {
        let config = LoaderConfig::default();
        assert!(config.is_reserved("java/lang/Object"));
        assert!(config.is_reserved("com/sun/Foo"));
        assert!(!config.is_reserved("com/example/Foo"));
        assert!(config.flatten_tuples);
    }

    #[test]
    fn builders_replace_and_extend() {
        let config = LoaderConfig::new()
            .with_reserved_prefixes(["sys/"])
            .with_reserved_prefix("host/")
            .with_tuple_flattening(false)
            .with_load_logging(true);
        assert!(config.is_reserved("sys/A"));
        assert!(config.is_reserved("host/B"));
        assert!(!config.is_reserved("java/lang/Object"));
        assert!(!config.flatten_tuples);
        assert!(config.log_loads);
    }
}
