//! Declaration scanner.
//!
//! Resolves the requested modules against the registry and produces the
//! declared side of the reconciliation: one [`FunctionDeclaration`] per
//! `(module, function)` key.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ConfigError, ModuleError, Result};

use super::registry::DeclarationRegistry;
use super::types::{FunctionDeclaration, FunctionKey};

/// Scanner over a declaration registry.
#[derive(Debug)]
pub struct DeclarationScanner<'a> {
    /// Declaration table.
    registry: &'a DeclarationRegistry,
    /// Project root used to resolve module sources.
    root: &'a Path,
}

impl<'a> DeclarationScanner<'a> {
    /// Creates a new scanner.
    #[must_use]
    pub const fn new(registry: &'a DeclarationRegistry, root: &'a Path) -> Self {
        Self { registry, root }
    }

    /// Returns every declared function of the given modules.
    ///
    /// # Errors
    ///
    /// Returns a module resolution error if a module is not declared or its
    /// source is missing, and a configuration error if a function has no role.
    pub fn scan(&self, modules: &[String]) -> Result<BTreeMap<FunctionKey, FunctionDeclaration>> {
        let mut declared = BTreeMap::new();

        for module_name in modules {
            let module = self
                .registry
                .module(module_name)
                .ok_or_else(|| ModuleError::NotDeclared {
                    module: module_name.clone(),
                })?;

            if let Some(source) = &module.source {
                let path = self.root.join(source);
                if !path.exists() {
                    return Err(ModuleError::SourceMissing {
                        module: module_name.clone(),
                        path,
                    }
                    .into());
                }
            }

            for function in &module.functions {
                let role = function.role.clone().ok_or_else(|| ConfigError::MissingRole {
                    module: module_name.clone(),
                    function: function.name.clone(),
                })?;

                debug!("Declared {module_name}.{}", function.name);
                declared.insert(
                    FunctionKey::new(module_name, &function.name),
                    FunctionDeclaration {
                        name: function.name.clone(),
                        role,
                        timeout_seconds: function.timeout,
                        memory_mb: function.memory,
                        description: function.description.clone(),
                        network_config: function.vpc.clone(),
                    },
                );
            }
        }

        info!(
            "Found {} declared functions in {} modules",
            declared.len(),
            modules.len()
        );
        Ok(declared)
    }
}
