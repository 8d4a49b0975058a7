//! Manifest validation.
//!
//! Runs before any remote call so that invalid metadata aborts the run
//! without touching the compute service. Limits follow the AWS Lambda
//! service quotas.

use crate::error::{ConfigError, PublishError, Result};
use std::collections::HashSet;
use tracing::debug;

use super::spec::{FunctionConfig, ModuleConfig, PublishConfig};

/// Maximum function timeout, in seconds.
pub const MAX_TIMEOUT_SECS: u32 = 900;

/// Minimum function memory, in MB.
pub const MIN_MEMORY_MB: u32 = 128;

/// Maximum function memory, in MB.
pub const MAX_MEMORY_MB: u32 = 10_240;

/// Maximum length of a function description.
const MAX_DESCRIPTION_LEN: usize = 256;

/// Maximum length of a function name.
const MAX_FUNCTION_NAME_LEN: usize = 64;

/// Validator for publish manifests.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a publish manifest.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, config: &PublishConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_package(config, &mut result);
        Self::validate_modules(&config.modules, &mut result);

        if result.errors.is_empty() {
            debug!("Manifest validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(PublishError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    /// Validates packaging settings.
    fn validate_package(config: &PublishConfig, result: &mut ValidationResult) {
        if config.package.install_command.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("package.install_command"),
                message: String::from("Install command cannot be empty"),
            });
        }

        if config.project.runtime.trim().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("project.runtime"),
                message: String::from("Runtime cannot be empty"),
            });
        }

        if config.freshness.extensions.is_empty() {
            result.warnings.push(String::from(
                "freshness.extensions is empty: code changes will never be detected",
            ));
        }
    }

    /// Validates all module declarations.
    fn validate_modules(modules: &[ModuleConfig], result: &mut ValidationResult) {
        if modules.is_empty() {
            result.warnings.push(String::from("No modules declared in manifest"));
            return;
        }

        let mut seen_modules = HashSet::new();
        let mut seen_functions = HashSet::new();

        for (i, module) in modules.iter().enumerate() {
            let prefix = format!("modules[{i}]");

            if module.name.trim().is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: String::from("Module name cannot be empty"),
                });
            } else if !seen_modules.insert(module.name.as_str()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!("Duplicate module name: {}", module.name),
                });
            }

            if module.functions.is_empty() {
                result.warnings.push(format!(
                    "{prefix}: Module '{}' declares no functions; every deployed function it owns will be deleted",
                    module.name
                ));
            }

            for (j, function) in module.functions.iter().enumerate() {
                let prefix = format!("{prefix}.functions[{j}]");

                // Remote function names are global, not per module.
                if !seen_functions.insert(function.name.as_str()) {
                    result.errors.push(ValidationError {
                        field: format!("{prefix}.name"),
                        message: format!("Duplicate function name: {}", function.name),
                    });
                }

                Self::validate_function(function, &prefix, result);
            }
        }

        Self::warn_prefix_overlap(modules, result);
    }

    /// Validates a single function declaration.
    fn validate_function(function: &FunctionConfig, prefix: &str, result: &mut ValidationResult) {
        if !is_valid_function_name(&function.name) {
            result.errors.push(ValidationError {
                field: format!("{prefix}.name"),
                message: format!(
                    "Function name '{}' is invalid. Must be 1-64 characters of letters, digits, '-' or '_'.",
                    function.name
                ),
            });
        }

        if function.timeout == 0 || function.timeout > MAX_TIMEOUT_SECS {
            result.errors.push(ValidationError {
                field: format!("{prefix}.timeout"),
                message: format!(
                    "Timeout {} is out of range (1-{MAX_TIMEOUT_SECS} seconds)",
                    function.timeout
                ),
            });
        }

        if !(MIN_MEMORY_MB..=MAX_MEMORY_MB).contains(&function.memory) {
            result.errors.push(ValidationError {
                field: format!("{prefix}.memory"),
                message: format!(
                    "Memory {} is out of range ({MIN_MEMORY_MB}-{MAX_MEMORY_MB} MB)",
                    function.memory
                ),
            });
        }

        if function.description.len() > MAX_DESCRIPTION_LEN {
            result.errors.push(ValidationError {
                field: format!("{prefix}.description"),
                message: format!("Description exceeds {MAX_DESCRIPTION_LEN} characters"),
            });
        }

        if let Some(vpc) = &function.vpc {
            if vpc.subnet_ids.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.vpc.subnet_ids"),
                    message: String::from("VPC placement requires at least one subnet"),
                });
            }
            if vpc.security_group_ids.is_empty() {
                result.warnings.push(format!(
                    "{prefix}.vpc: No security groups; the VPC default group applies"
                ));
            }
        }
    }

    /// Warns about module names that prefix other module names.
    ///
    /// Remote functions are attributed by handler prefix, so `report` also
    /// claims the functions of `reporting`.
    fn warn_prefix_overlap(modules: &[ModuleConfig], result: &mut ValidationResult) {
        for a in modules {
            for b in modules {
                if a.name != b.name && !a.name.is_empty() && b.name.starts_with(&a.name) {
                    result.warnings.push(format!(
                        "Module '{}' is a prefix of module '{}': deployed functions of '{}' also match '{}'",
                        a.name, b.name, b.name, a.name
                    ));
                }
            }
        }
    }
}

/// Validates a function name against the compute service naming rules.
fn is_valid_function_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_FUNCTION_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::{NetworkConfig, DEFAULT_MEMORY_MB, DEFAULT_TIMEOUT_SECS};

    fn function(name: &str) -> FunctionConfig {
        FunctionConfig {
            name: name.to_string(),
            role: Some(String::from("arn:aws:iam::123456789012:role/test")),
            timeout: DEFAULT_TIMEOUT_SECS,
            memory: DEFAULT_MEMORY_MB,
            description: String::new(),
            vpc: None,
        }
    }

    fn config_with(modules: Vec<ModuleConfig>) -> PublishConfig {
        PublishConfig {
            modules,
            ..PublishConfig::default()
        }
    }

    fn module(name: &str, functions: Vec<FunctionConfig>) -> ModuleConfig {
        ModuleConfig {
            name: name.to_string(),
            source: None,
            role: None,
            functions,
        }
    }

    fn failing_field(config: &PublishConfig) -> Option<String> {
        match ConfigValidator::new().validate(config) {
            Err(PublishError::Config(ConfigError::ValidationError { field, .. })) => field,
            _ => None,
        }
    }

    #[test]
    fn test_valid_function_name() {
        assert!(is_valid_function_name("daily_report"));
        assert!(is_valid_function_name("Login-2"));
        assert!(!is_valid_function_name(""));
        assert!(!is_valid_function_name("has.dot"));
        assert!(!is_valid_function_name(&"x".repeat(65)));
    }

    #[test]
    fn test_valid_manifest_passes() {
        let config = config_with(vec![module("auth", vec![function("login"), function("logout")])]);
        let result = ConfigValidator::new().validate(&config).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_duplicate_function_across_modules() {
        let config = config_with(vec![
            module("auth", vec![function("handler")]),
            module("billing", vec![function("handler")]),
        ]);
        assert_eq!(
            failing_field(&config).as_deref(),
            Some("modules[1].functions[0].name")
        );
    }

    #[test]
    fn test_duplicate_module() {
        let config = config_with(vec![
            module("auth", vec![function("login")]),
            module("auth", vec![function("logout")]),
        ]);
        assert_eq!(failing_field(&config).as_deref(), Some("modules[1].name"));
    }

    #[test]
    fn test_timeout_out_of_range() {
        let mut f = function("slow");
        f.timeout = 901;
        let config = config_with(vec![module("jobs", vec![f])]);
        assert_eq!(
            failing_field(&config).as_deref(),
            Some("modules[0].functions[0].timeout")
        );
    }

    #[test]
    fn test_memory_out_of_range() {
        let mut f = function("tiny");
        f.memory = 64;
        let config = config_with(vec![module("jobs", vec![f])]);
        assert_eq!(
            failing_field(&config).as_deref(),
            Some("modules[0].functions[0].memory")
        );
    }

    #[test]
    fn test_vpc_requires_subnet() {
        let mut f = function("private");
        f.vpc = Some(NetworkConfig::default());
        let config = config_with(vec![module("net", vec![f])]);
        assert_eq!(
            failing_field(&config).as_deref(),
            Some("modules[0].functions[0].vpc.subnet_ids")
        );
    }

    #[test]
    fn test_prefix_overlap_warns() {
        let config = config_with(vec![
            module("report", vec![function("summary")]),
            module("reporting", vec![function("export")]),
        ]);
        let result = ConfigValidator::new().validate(&config).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("'report' is a prefix of module 'reporting'"));
    }
}
