//! Local code freshness scan.
//!
//! Computes the most recent modification time among recognized files under
//! the project root. Generated and vendored directories are skipped at any
//! depth; dot-named directories are skipped at the top level only.

use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::FreshnessConfig;
use crate::error::{ConfigError, Result};

/// Directory names never considered part of the project's own code.
pub const EXCLUDED_DIRS: &[&str] = &["lib", "lambda", "lambdas", "bin", "dist", "include"];

/// Scanner for the local code timestamp.
#[derive(Debug, Clone)]
pub struct FreshnessScanner {
    /// Recognized file extensions, without the leading dot.
    extensions: Vec<String>,
}

impl FreshnessScanner {
    /// Creates a scanner from the freshness settings.
    #[must_use]
    pub fn new(config: &FreshnessConfig) -> Self {
        Self::with_extensions(config.extensions.iter().map(String::as_str))
    }

    /// Creates a scanner recognizing the given extensions.
    #[must_use]
    pub fn with_extensions<'e>(extensions: impl IntoIterator<Item = &'e str>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Returns the latest modification time of any recognized file under `root`.
    ///
    /// Falls back to the Unix epoch when no recognized file exists. No
    /// deployed function predates the epoch, so no code change is detected.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory.
    pub fn latest_modification(&self, root: &Path) -> Result<DateTime<Utc>> {
        if !root.is_dir() {
            return Err(ConfigError::RootNotFound {
                path: root.to_path_buf(),
            }
            .into());
        }

        let mut latest = DateTime::<Utc>::UNIX_EPOCH;
        let mut scanned = 0usize;

        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {e}");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_recognized(entry.path()) {
                continue;
            }

            let modified = match entry.metadata().map(|m| m.modified()) {
                Ok(Ok(modified)) => DateTime::<Utc>::from(modified),
                Ok(Err(e)) => {
                    debug!("No modification time for {}: {e}", entry.path().display());
                    continue;
                }
                Err(e) => {
                    debug!("No metadata for {}: {e}", entry.path().display());
                    continue;
                }
            };

            scanned += 1;
            if modified > latest {
                latest = modified;
            }
        }

        debug!("Scanned {scanned} files under {}, latest change at {latest}", root.display());
        Ok(latest)
    }

    /// Returns true if the file has a recognized extension.
    fn is_recognized(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// Returns true if the entry is a directory excluded from the scan.
fn is_excluded(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    EXCLUDED_DIRS.contains(&name) || (entry.depth() == 1 && name.starts_with('.'))
}
