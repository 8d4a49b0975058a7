//! Code bundle builder.
//!
//! A bundle is the project installed into a fresh `lambda/` staging
//! directory together with its non-provided requirements, zipped into
//! `lambda.zip` at the project root and uploaded under `<prefix><module>`.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::PackageConfig;
use crate::error::{ConfigError, PackagingError, Result};

use super::store::ObjectStore;
use super::{ArtifactRef, Packager};

/// Staging directory name, relative to the project root.
pub const STAGING_DIR: &str = "lambda";

/// Bundle file name, relative to the project root.
pub const BUNDLE_FILE: &str = "lambda.zip";

/// Canned ACL applied to uploaded bundles.
pub const BUNDLE_ACL: &str = "bucket-owner-full-control";

/// Packager that installs the project with the configured command and zips it.
pub struct BundlePackager<'a> {
    /// Project root.
    root: PathBuf,
    /// Target bucket.
    bucket: String,
    /// Packaging settings.
    settings: PackageConfig,
    /// Upload destination.
    store: &'a dyn ObjectStore,
}

impl<'a> BundlePackager<'a> {
    /// Creates a new packager.
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        bucket: impl Into<String>,
        settings: PackageConfig,
        store: &'a dyn ObjectStore,
    ) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            settings,
            store,
        }
    }

    /// Returns the object key for a module's bundle.
    #[must_use]
    pub fn object_key(&self, module: &str) -> String {
        let prefix = match self.settings.key_prefix.as_deref() {
            Some(p) if !p.trim_matches('/').is_empty() => format!("{}/", p.trim_matches('/')),
            _ => String::new(),
        };
        format!("{prefix}{module}")
    }

    /// Returns the requirements that are not provided by the runtime.
    #[must_use]
    pub fn bundled_requirements(&self) -> Vec<String> {
        self.settings
            .requirements
            .iter()
            .filter(|r| !r.trim().is_empty())
            .filter(|r| {
                let name = requirement_name(r);
                !self.settings.provided.iter().any(|p| requirement_name(p) == name)
            })
            .map(|r| r.trim().to_string())
            .collect()
    }

    /// Removes any previous staging directory and bundle, then recreates the staging directory.
    async fn reset_workspace(staging: &Path, bundle: &Path) -> Result<()> {
        if tokio::fs::try_exists(staging).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(staging)
                .await
                .map_err(|e| PackagingError::workspace(format!("{}: {e}", staging.display())))?;
        }
        if tokio::fs::try_exists(bundle).await.unwrap_or(false) {
            tokio::fs::remove_file(bundle)
                .await
                .map_err(|e| PackagingError::workspace(format!("{}: {e}", bundle.display())))?;
        }
        tokio::fs::create_dir_all(staging)
            .await
            .map_err(|e| PackagingError::workspace(format!("{}: {e}", staging.display())))?;
        Ok(())
    }

    /// Runs the install command for the given targets into the staging directory.
    async fn install(&self, targets: &[String], staging: &Path) -> Result<()> {
        let Some((program, base_args)) = self.settings.install_command.split_first() else {
            return Err(PackagingError::InstallFailed {
                command: String::new(),
                message: String::from("install command is empty"),
            }
            .into());
        };

        let rendered = format!(
            "{} {} -t {}",
            self.settings.install_command.join(" "),
            targets.join(" "),
            staging.display()
        );
        debug!("Running {rendered}");

        let status = Command::new(program)
            .args(base_args)
            .args(targets)
            .arg("-t")
            .arg(staging)
            .current_dir(&self.root)
            .status()
            .await
            .map_err(|e| PackagingError::InstallFailed {
                command: rendered.clone(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(PackagingError::InstallFailed {
                command: rendered,
                message: status.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Packager for BundlePackager<'_> {
    async fn package(&self, module: &str) -> Result<ArtifactRef> {
        if !self.root.is_dir() {
            return Err(ConfigError::RootNotFound {
                path: self.root.clone(),
            }
            .into());
        }

        info!("Packaging {} for module {module}", self.root.display());

        let staging = self.root.join(STAGING_DIR);
        let bundle = self.root.join(BUNDLE_FILE);
        Self::reset_workspace(&staging, &bundle).await?;

        self.install(&[String::from(".")], &staging).await?;
        let requirements = self.bundled_requirements();
        if !requirements.is_empty() {
            self.install(&requirements, &staging).await?;
        }

        let sha256 = write_archive(&staging, &bundle)?;
        let key = self.object_key(module);
        self.store.upload(&bundle, &self.bucket, &key, BUNDLE_ACL).await?;

        info!("Bundle for {module} uploaded to s3://{}/{key}", self.bucket);
        Ok(ArtifactRef {
            bucket: self.bucket.clone(),
            key,
            sha256,
        })
    }
}

/// Returns the normalized distribution name of a requirement specifier.
///
/// `Requests[socks]>=2.0` becomes `requests`; `typing_extensions` becomes `typing-extensions`.
#[must_use]
pub fn requirement_name(spec: &str) -> String {
    spec.trim()
        .split(|c: char| "=<>!~[;@ ".contains(c))
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
        .replace('_', "-")
}

/// Zips the staging directory into the bundle file and returns its hex SHA-256.
fn write_archive(staging: &Path, bundle: &Path) -> Result<String> {
    let file = File::create(bundle).map_err(|e| PackagingError::archive(format!("{}: {e}", bundle.display())))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(staging).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| PackagingError::archive(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(staging)
            .map_err(|e| PackagingError::archive(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|e| PackagingError::archive(e.to_string()))?;
        } else if entry.file_type().is_file() {
            writer
                .start_file(name, options)
                .map_err(|e| PackagingError::archive(e.to_string()))?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut writer)?;
            entries += 1;
        }
    }

    writer
        .finish()
        .map_err(|e| PackagingError::archive(e.to_string()))?;
    debug!("Wrote {entries} files to {}", bundle.display());

    let mut hasher = Sha256::new();
    let mut written = File::open(bundle)?;
    io::copy(&mut written, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
