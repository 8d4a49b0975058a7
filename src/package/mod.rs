//! Packaging module.
//!
//! Builds the deployable code bundle for a module and uploads it to the
//! object store. The executor only sees the [`Packager`] trait and the
//! [`ArtifactRef`] it returns.

mod bundle;
mod store;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

pub use bundle::{requirement_name, BundlePackager, BUNDLE_ACL, BUNDLE_FILE, STAGING_DIR};
pub use store::{ObjectStore, S3ObjectStore};
#[cfg(test)]
pub(crate) use store::MockObjectStore;

/// Location of an uploaded code bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    /// Bucket holding the bundle.
    pub bucket: String,
    /// Object key of the bundle.
    pub key: String,
    /// Hex SHA-256 of the bundle.
    pub sha256: String,
}

/// Builds and uploads code bundles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Packager: Send + Sync {
    /// Packages the project for the given module and returns the uploaded artifact.
    async fn package(&self, module: &str) -> Result<ArtifactRef>;
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
