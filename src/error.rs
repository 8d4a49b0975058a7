//! Error types for the lambda publishing system.
//!
//! Every failure in this crate is fatal to the current run: nothing is
//! retried and nothing is rolled back. Errors are grouped by the stage that
//! raises them: manifest configuration, module resolution, the remote compute
//! service, and packaging.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the lambda publishing system.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A requested module could not be resolved.
    #[error("Module resolution error: {0}")]
    Module(#[from] ModuleError),

    /// The compute service could not complete a call.
    #[error("Remote unavailable: {0}")]
    Remote(#[from] RemoteError),

    /// Building or uploading a code bundle failed.
    #[error("Packaging error: {0}")]
    Packaging(#[from] PackagingError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file was not found.
    #[error("Manifest file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The manifest could not be parsed.
    #[error("Failed to parse manifest: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Manifest validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A deployable function has no execution role.
    #[error("Function '{module}.{function}' has no role")]
    MissingRole {
        /// Owning module.
        module: String,
        /// Function name.
        function: String,
    },

    /// Duplicate declaration.
    #[error("Duplicate {resource_type} name: {name}")]
    DuplicateName {
        /// Type of resource (module, function).
        resource_type: String,
        /// The duplicated name.
        name: String,
    },

    /// The project root is missing or not a directory.
    #[error("Project root is not a directory: {path}")]
    RootNotFound {
        /// Configured root path.
        path: PathBuf,
    },
}

/// Module resolution errors.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The module has no entry in the declaration registry.
    #[error("Module '{module}' is not declared")]
    NotDeclared {
        /// Requested module name.
        module: String,
    },

    /// The module declares a source path that does not exist.
    #[error("Source for module '{module}' not found at {path}")]
    SourceMissing {
        /// Module name.
        module: String,
        /// Resolved source path.
        path: PathBuf,
    },
}

/// Compute service errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// A listing or mutating call failed.
    #[error("{operation} failed: {message}")]
    RequestFailed {
        /// Name of the failed operation.
        operation: String,
        /// Error reported by the service or transport.
        message: String,
    },

    /// The service answered with data that cannot be interpreted.
    #[error("Invalid response from compute service: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Packaging and artifact upload errors.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// The staging directory or bundle file could not be prepared.
    #[error("Failed to prepare packaging workspace: {message}")]
    Workspace {
        /// Description of the failure.
        message: String,
    },

    /// The dependency install command failed.
    #[error("Install command `{command}` failed: {message}")]
    InstallFailed {
        /// Rendered command line.
        command: String,
        /// Exit status or spawn error.
        message: String,
    },

    /// The bundle archive could not be written.
    #[error("Failed to build bundle archive: {message}")]
    Archive {
        /// Description of the failure.
        message: String,
    },

    /// The bundle could not be uploaded to the object store.
    #[error("Failed to upload s3://{bucket}/{key}: {message}")]
    UploadFailed {
        /// Target bucket.
        bucket: String,
        /// Target key.
        key: String,
        /// Error reported by the store.
        message: String,
    },
}

/// Result type alias for publishing operations.
pub type Result<T> = std::result::Result<T, PublishError>;

impl PublishError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the error was raised before any remote call was made.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Module(_))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl RemoteError {
    /// Creates a request error for the named operation.
    #[must_use]
    pub fn request(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

impl PackagingError {
    /// Creates a workspace error.
    #[must_use]
    pub fn workspace(message: impl Into<String>) -> Self {
        Self::Workspace {
            message: message.into(),
        }
    }

    /// Creates an archive error.
    #[must_use]
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }
}
