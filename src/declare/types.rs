//! Declaration types shared by the scanner, fetcher and planner.

use serde::Serialize;

use crate::config::{NetworkConfig, DEFAULT_MEMORY_MB, DEFAULT_TIMEOUT_SECS};

/// Identity of a function: the owning module plus the function name.
///
/// Ordering is module first, then function, which keeps every plan listing
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FunctionKey {
    /// Owning module.
    pub module: String,
    /// Function name, as known to the compute service.
    pub function: String,
}

/// A locally declared deployable function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDeclaration {
    /// Function name.
    pub name: String,
    /// Execution role reference.
    pub role: String,
    /// Timeout in seconds.
    pub timeout_seconds: u32,
    /// Memory allocation in MB.
    pub memory_mb: u32,
    /// Free-form description.
    pub description: String,
    /// Optional network placement.
    pub network_config: Option<NetworkConfig>,
}

impl FunctionKey {
    /// Creates a new key.
    #[must_use]
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
        }
    }

    /// Returns the handler string the compute service invokes.
    #[must_use]
    pub fn handler(&self) -> String {
        format!("{}.{}", self.module, self.function)
    }
}

impl FunctionDeclaration {
    /// Creates a declaration with default timeout, memory and description.
    #[must_use]
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            memory_mb: DEFAULT_MEMORY_MB,
            description: String::new(),
            network_config: None,
        }
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u32) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Sets the memory allocation.
    #[must_use]
    pub const fn with_memory(mut self, memory_mb: u32) -> Self {
        self.memory_mb = memory_mb;
        self
    }
}

impl std::fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_format() {
        let key = FunctionKey::new("billing", "charge");
        assert_eq!(key.handler(), "billing.charge");
        assert_eq!(key.to_string(), "billing.charge");
    }

    #[test]
    fn test_key_ordering_is_module_first() {
        let mut keys = vec![
            FunctionKey::new("b", "a"),
            FunctionKey::new("a", "z"),
            FunctionKey::new("a", "b"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                FunctionKey::new("a", "b"),
                FunctionKey::new("a", "z"),
                FunctionKey::new("b", "a"),
            ]
        );
    }

    #[test]
    fn test_declaration_defaults() {
        let decl = FunctionDeclaration::new("f1", "R1");
        assert_eq!(decl.timeout_seconds, 60);
        assert_eq!(decl.memory_mb, 128);
        assert!(decl.description.is_empty());
        assert!(decl.network_config.is_none());
    }
}
