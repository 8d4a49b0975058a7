//! Manifest module for the publishing system.
//!
//! This module handles all manifest-related functionality:
//! - Parsing and deserializing `lambda.publish.yaml`
//! - Environment and `.env` overrides
//! - Validation of declared metadata

mod spec;
mod parser;
mod validator;

pub use spec::{
    FreshnessConfig, FunctionConfig, ModuleConfig, NetworkConfig, PackageConfig, ProjectConfig,
    PublishConfig, DEFAULT_MEMORY_MB, DEFAULT_REGION, DEFAULT_TIMEOUT_SECS,
};
pub use parser::{ConfigParser, find_config_file};
pub use validator::{ConfigValidator, ValidationResult};
