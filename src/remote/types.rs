//! Compute service types.
//!
//! Request and response shapes exchanged with the compute service, kept
//! independent of the AWS SDK so the rest of the crate can be tested against
//! a mock service.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::NetworkConfig;
use crate::error::{RemoteError, Result};
use crate::package::ArtifactRef;

/// Format of the `LastModified` field returned by the compute service,
/// e.g. `2016-11-21T19:49:20.006+0000`.
const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// A function as listed by the compute service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFunction {
    /// Function name.
    pub name: String,
    /// Handler entry point, `module.function`.
    pub handler: String,
    /// Execution role reference.
    pub role: String,
    /// Memory allocation in MB.
    pub memory_mb: u32,
    /// Timeout in seconds.
    pub timeout_seconds: u32,
    /// Raw last-modified timestamp.
    pub last_modified: String,
}

/// The compute service's record of a deployed function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedFunction {
    /// Function name.
    pub name: String,
    /// Handler entry point.
    pub handler: String,
    /// Execution role reference.
    pub role: String,
    /// Memory allocation in MB.
    pub memory_mb: u32,
    /// Timeout in seconds.
    pub timeout_seconds: u32,
    /// When the function was last modified remotely.
    pub last_modified: DateTime<Utc>,
}

/// Parameters of a create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFunctionRequest {
    /// Function name.
    pub name: String,
    /// Runtime identifier.
    pub runtime: String,
    /// Execution role reference.
    pub role: String,
    /// Handler entry point.
    pub handler: String,
    /// Uploaded code bundle.
    pub code: ArtifactRef,
    /// Description.
    pub description: String,
    /// Timeout in seconds.
    pub timeout_seconds: u32,
    /// Memory allocation in MB.
    pub memory_mb: u32,
    /// Optional network placement.
    pub vpc: Option<NetworkConfig>,
    /// Whether to publish a new version.
    pub publish: bool,
}

/// Parameters of a configuration update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfigurationRequest {
    /// Function name.
    pub name: String,
    /// Execution role reference.
    pub role: String,
    /// Handler entry point.
    pub handler: String,
    /// Description.
    pub description: String,
    /// Timeout in seconds.
    pub timeout_seconds: u32,
    /// Memory allocation in MB.
    pub memory_mb: u32,
}

/// Parameters of a code update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCodeRequest {
    /// Function name.
    pub name: String,
    /// Uploaded code bundle.
    pub code: ArtifactRef,
    /// Whether to publish a new version.
    pub publish: bool,
}

impl RemoteFunction {
    /// Parses the remote record into a deployed function.
    ///
    /// # Errors
    ///
    /// Returns an error if the last-modified timestamp cannot be parsed.
    pub fn into_deployed(self) -> Result<DeployedFunction> {
        let last_modified = parse_last_modified(&self.last_modified)?;
        Ok(DeployedFunction {
            name: self.name,
            handler: self.handler,
            role: self.role,
            memory_mb: self.memory_mb,
            timeout_seconds: self.timeout_seconds,
            last_modified,
        })
    }
}

/// Parses a last-modified timestamp in the compute service format or RFC 3339.
///
/// # Errors
///
/// Returns an error if neither format matches.
pub fn parse_last_modified(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(value, LAST_MODIFIED_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RemoteError::invalid(format!("Invalid LastModified '{value}': {e}")).into())
}
