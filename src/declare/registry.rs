//! Declaration registry.
//!
//! The registry is the explicit table of deployable functions per module.
//! It is built once per run, either from the manifest or by calling
//! [`DeclarationRegistry::declare`] directly, and is read-only afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{FunctionConfig, PublishConfig};
use crate::error::{ConfigError, Result};

/// A module entry in the registry.
#[derive(Debug, Clone, Default)]
pub struct RegisteredModule {
    /// Optional source path, relative to the project root.
    pub source: Option<PathBuf>,
    /// Functions declared by the module, roles already resolved.
    pub functions: Vec<FunctionConfig>,
}

/// Table of declared modules and functions.
#[derive(Debug, Clone, Default)]
pub struct DeclarationRegistry {
    /// Modules keyed by name.
    modules: BTreeMap<String, RegisteredModule>,
}

impl DeclarationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modules: BTreeMap::new(),
        }
    }

    /// Builds a registry from a manifest.
    ///
    /// Function roles fall back to the module role. A function left without
    /// any role is still registered; the scanner reports it.
    ///
    /// # Errors
    ///
    /// Returns an error if a function name is declared twice.
    pub fn from_config(config: &PublishConfig) -> Result<Self> {
        let mut registry = Self::new();

        for module in &config.modules {
            registry.register_module(&module.name, module.source.clone());

            for function in &module.functions {
                let mut resolved = function.clone();
                resolved.role = module.role_for(function).map(String::from);
                registry.declare(&module.name, resolved)?;
            }
        }

        debug!(
            "Registry holds {} modules and {} functions",
            registry.modules.len(),
            registry.function_count()
        );
        Ok(registry)
    }

    /// Registers a module, keeping existing declarations if already present.
    pub fn register_module(&mut self, name: &str, source: Option<PathBuf>) {
        let entry = self.modules.entry(name.to_string()).or_default();
        if source.is_some() {
            entry.source = source;
        }
    }

    /// Declares a function under a module, registering the module if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the function name is already declared in any module.
    pub fn declare(&mut self, module: &str, function: FunctionConfig) -> Result<()> {
        let taken = self
            .modules
            .values()
            .flat_map(|m| m.functions.iter())
            .any(|f| f.name == function.name);

        if taken {
            return Err(ConfigError::DuplicateName {
                resource_type: String::from("function"),
                name: function.name,
            }
            .into());
        }

        self.modules
            .entry(module.to_string())
            .or_default()
            .functions
            .push(function);
        Ok(())
    }

    /// Gets a module by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&RegisteredModule> {
        self.modules.get(name)
    }

    /// Returns all module names in sorted order.
    #[must_use]
    pub fn module_names(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    /// Returns the total number of declared functions.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.modules.values().map(|m| m.functions.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigParser, DEFAULT_MEMORY_MB, DEFAULT_TIMEOUT_SECS};
    use crate::error::PublishError;

    fn function(name: &str, role: Option<&str>) -> FunctionConfig {
        FunctionConfig {
            name: name.to_string(),
            role: role.map(String::from),
            timeout: DEFAULT_TIMEOUT_SECS,
            memory: DEFAULT_MEMORY_MB,
            description: String::new(),
            vpc: None,
        }
    }

    #[test]
    fn test_from_config_resolves_module_role() {
        let yaml = r"
modules:
  - name: auth
    role: module-role
    functions:
      - name: login
      - name: logout
        role: own-role
";
        let config = ConfigParser::new().parse_yaml(yaml, None).unwrap();
        let registry = DeclarationRegistry::from_config(&config).unwrap();

        let module = registry.module("auth").unwrap();
        assert_eq!(module.functions[0].role.as_deref(), Some("module-role"));
        assert_eq!(module.functions[1].role.as_deref(), Some("own-role"));
        assert_eq!(registry.function_count(), 2);
    }

    #[test]
    fn test_declare_rejects_duplicate_function() {
        let mut registry = DeclarationRegistry::new();
        registry.declare("a", function("handler", Some("r"))).unwrap();

        let result = registry.declare("b", function("handler", Some("r")));
        assert!(matches!(
            result,
            Err(PublishError::Config(ConfigError::DuplicateName { .. }))
        ));
    }

    #[test]
    fn test_register_module_keeps_functions() {
        let mut registry = DeclarationRegistry::new();
        registry.declare("a", function("f1", Some("r"))).unwrap();
        registry.register_module("a", Some(PathBuf::from("src/a")));

        let module = registry.module("a").unwrap();
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.source, Some(PathBuf::from("src/a")));
        assert_eq!(registry.module_names(), vec![String::from("a")]);
    }
}
