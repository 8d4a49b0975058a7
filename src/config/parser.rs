//! Manifest parser for loading publish configuration.
//!
//! This module handles loading the manifest from YAML files and environment
//! variables, with proper precedence and error handling.

use crate::error::{ConfigError, PublishError, Result};
use std::path::Path;
use tracing::{debug, info};

use super::spec::PublishConfig;

/// Manifest parser for loading publish configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<std::path::PathBuf>,
}

impl ConfigParser {
    /// Creates a new manifest parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads the manifest from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<PublishConfig> {
        let path = path.as_ref();
        info!("Loading manifest from: {}", path.display());

        if !path.exists() {
            return Err(PublishError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PublishError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses the manifest from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<PublishConfig> {
        debug!("Parsing YAML manifest");

        let config: PublishConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            PublishError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Parsed manifest with {} modules and {} functions",
            config.modules.len(),
            config.function_count()
        );
        Ok(config)
    }

    /// Loads the manifest with environment variable overrides.
    ///
    /// Recognized variables: `LAMBDA_PUBLISH_ROOT`, `LAMBDA_PUBLISH_BUCKET`
    /// and `LAMBDA_PUBLISH_REGION`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<PublishConfig> {
        let mut config = self.load_file(path)?;

        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Applies environment variable overrides to the manifest.
    fn apply_env_overrides(config: &mut PublishConfig) {
        if let Ok(root) = std::env::var("LAMBDA_PUBLISH_ROOT") {
            debug!("Overriding project.root from environment");
            config.project.root = root.into();
        }

        if let Ok(bucket) = std::env::var("LAMBDA_PUBLISH_BUCKET") {
            debug!("Overriding project.bucket from environment");
            config.project.bucket = Some(bucket);
        }

        if let Ok(region) = std::env::var("LAMBDA_PUBLISH_REGION") {
            debug!("Overriding project.region from environment");
            config.project.region = region;
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| std::path::PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                PublishError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default manifest file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "lambda.publish.yaml",
    "lambda.publish.yml",
    "publish.yaml",
    "publish.yml",
];

/// Finds the manifest in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no manifest is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found manifest: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(PublishError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::{DEFAULT_MEMORY_MB, DEFAULT_REGION, DEFAULT_TIMEOUT_SECS};
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_manifest() {
        let yaml = r"
modules:
  - name: auth
    role: arn:aws:iam::123456789012:role/auth
    functions:
      - name: login
";
        let parser = ConfigParser::new();
        let config = parser.parse_yaml(yaml, None).unwrap();

        assert_eq!(config.project.region, DEFAULT_REGION);
        assert_eq!(config.project.runtime, "python3.12");
        assert!(config.project.bucket.is_none());
        assert_eq!(config.package.install_command, vec!["pip", "install"]);
        assert_eq!(config.package.provided, vec!["boto3", "botocore"]);
        assert_eq!(config.freshness.extensions, vec!["py", "txt", "sh"]);

        let function = &config.modules[0].functions[0];
        assert_eq!(function.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(function.memory, DEFAULT_MEMORY_MB);
        assert!(function.description.is_empty());
        assert!(function.role.is_none());
    }

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r"
project:
  root: ./service
  bucket: artifacts
  region: eu-west-1
  runtime: python3.11

package:
  requirements: [requests, pyyaml]
  key_prefix: lambdas/

freshness:
  extensions: [py]

modules:
  - name: reports
    source: reports
    role: arn:aws:iam::123456789012:role/reports
    functions:
      - name: daily_report
        timeout: 300
        memory: 512
        description: Builds the daily report
        vpc:
          subnet_ids: [subnet-1, subnet-2]
          security_group_ids: [sg-1]
      - name: weekly_report
        role: arn:aws:iam::123456789012:role/weekly
";
        let parser = ConfigParser::new();
        let config = parser.parse_yaml(yaml, None).unwrap();

        assert_eq!(config.project.bucket.as_deref(), Some("artifacts"));
        assert_eq!(config.project.region, "eu-west-1");
        assert_eq!(config.package.requirements.len(), 2);
        assert_eq!(config.package.key_prefix.as_deref(), Some("lambdas/"));
        assert_eq!(config.module_names(), vec!["reports"]);
        assert_eq!(config.function_count(), 2);

        let daily = &config.modules[0].functions[0];
        assert_eq!(daily.timeout, 300);
        assert_eq!(daily.memory, 512);
        let vpc = daily.vpc.as_ref().unwrap();
        assert_eq!(vpc.subnet_ids, vec!["subnet-1", "subnet-2"]);
        assert_eq!(vpc.security_group_ids, vec!["sg-1"]);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let parser = ConfigParser::new();
        let result = parser.parse_yaml("modules: [", None);
        assert!(matches!(
            result,
            Err(PublishError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let parser = ConfigParser::new();
        let result = parser.load_file(temp.path().join("missing.yaml"));
        assert!(matches!(
            result,
            Err(PublishError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_find_config_file_in_parent() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("lambda.publish.yaml");
        std::fs::write(&manifest, "modules: []\n").unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, manifest);
    }
}
