//! Manifest types for the publishing system.
//!
//! This module defines the structs that map to the `lambda.publish.yaml` file.
//! The manifest is the explicit declaration table: every deployable function
//! is listed under the module that owns it, together with its metadata.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root structure of a publish manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishConfig {
    /// Project-level settings.
    #[serde(default)]
    pub project: ProjectConfig,
    /// Packaging settings.
    #[serde(default)]
    pub package: PackageConfig,
    /// Freshness scan settings.
    #[serde(default)]
    pub freshness: FreshnessConfig,
    /// Modules and the functions they declare.
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

/// Project-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Project root, relative to the manifest directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Object store bucket receiving code bundles.
    #[serde(default)]
    pub bucket: Option<String>,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Runtime identifier used when creating functions.
    #[serde(default = "default_runtime")]
    pub runtime: String,
}

/// Packaging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageConfig {
    /// Third-party requirements installed into the bundle.
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Command used to install the project and its requirements.
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,
    /// Libraries provided by the execution environment, never bundled.
    #[serde(default = "default_provided")]
    pub provided: Vec<String>,
    /// Optional prefix for uploaded object keys.
    #[serde(default)]
    pub key_prefix: Option<String>,
}

/// Freshness scan settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreshnessConfig {
    /// File extensions considered significant for code changes.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// A module owning deployable functions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Module name, also the handler prefix.
    pub name: String,
    /// Optional source path, relative to the project root.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Default role for functions that do not set one.
    #[serde(default)]
    pub role: Option<String>,
    /// Deployable functions.
    #[serde(default)]
    pub functions: Vec<FunctionConfig>,
}

/// A single deployable function as written in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionConfig {
    /// Function name, unique across all modules.
    pub name: String,
    /// Execution role reference.
    #[serde(default)]
    pub role: Option<String>,
    /// Timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    /// Memory allocation in MB.
    #[serde(default = "default_memory")]
    pub memory: u32,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Optional network placement.
    #[serde(default)]
    pub vpc: Option<NetworkConfig>,
}

/// Network placement for a function.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct NetworkConfig {
    /// Subnets the function attaches to.
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    /// Security groups applied to the function.
    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

/// Default timeout for declared functions, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u32 = 60;

/// Default memory for declared functions, in MB.
pub const DEFAULT_MEMORY_MB: u32 = 128;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

// Default value functions

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_region() -> String {
    String::from(DEFAULT_REGION)
}

fn default_runtime() -> String {
    String::from("python3.12")
}

fn default_install_command() -> Vec<String> {
    vec![String::from("pip"), String::from("install")]
}

fn default_provided() -> Vec<String> {
    vec![String::from("boto3"), String::from("botocore")]
}

fn default_extensions() -> Vec<String> {
    vec![String::from("py"), String::from("txt"), String::from("sh")]
}

const fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_memory() -> u32 {
    DEFAULT_MEMORY_MB
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            bucket: None,
            region: default_region(),
            runtime: default_runtime(),
        }
    }
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            requirements: Vec::new(),
            install_command: default_install_command(),
            provided: default_provided(),
            key_prefix: None,
        }
    }
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

impl PublishConfig {
    /// Returns the names of all declared modules, in manifest order.
    #[must_use]
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Returns the total number of declared functions.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.modules.iter().map(|m| m.functions.len()).sum()
    }

    /// Resolves the project root against the manifest directory.
    #[must_use]
    pub fn resolved_root(&self, manifest_dir: &Path) -> PathBuf {
        if self.project.root.is_absolute() {
            self.project.root.clone()
        } else {
            manifest_dir.join(&self.project.root)
        }
    }
}

impl ModuleConfig {
    /// Returns the role a function resolves to, falling back to the module role.
    #[must_use]
    pub fn role_for<'a>(&'a self, function: &'a FunctionConfig) -> Option<&'a str> {
        let non_blank = |r: &&str| !r.trim().is_empty();
        function
            .role
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.role.as_deref().filter(non_blank))
    }
}
