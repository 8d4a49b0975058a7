//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::PublishConfig;

/// lambda-publish - Reconcile declared lambda functions with AWS Lambda.
#[derive(Parser, Debug)]
#[command(name = "lambda-publish")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the publish manifest.
    #[arg(short, long, global = true, env = "LAMBDA_PUBLISH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what a publish would change, without changing anything.
    Plan {
        /// Targeting options.
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Package and publish the declared functions.
    Publish {
        /// Targeting options.
        #[command(flatten)]
        target: TargetArgs,

        /// Only print the plan.
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Validate the manifest and list declared functions.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },
}

/// Options selecting what a plan or publish run targets.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetArgs {
    /// Project root directory (overrides the manifest).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Module to publish; repeat for several. Defaults to every declared module.
    #[arg(short, long = "module")]
    pub modules: Vec<String>,

    /// Bucket receiving code bundles (overrides the manifest).
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Re-deploy every existing function even if nothing changed.
    #[arg(short, long)]
    pub force_upload: bool,

    /// AWS region (overrides the manifest).
    #[arg(short, long)]
    pub region: Option<String>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl TargetArgs {
    /// Applies bucket and region overrides to the manifest.
    pub fn apply(&self, config: &mut PublishConfig) {
        if let Some(bucket) = &self.bucket {
            debug!("Overriding bucket from command line");
            config.project.bucket = Some(bucket.clone());
        }
        if let Some(region) = &self.region {
            debug!("Overriding region from command line");
            config.project.region.clone_from(region);
        }
    }

    /// Returns the project root: `--dir` if given, else the manifest root.
    #[must_use]
    pub fn root(&self, config: &PublishConfig, manifest_dir: &Path) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| config.resolved_root(manifest_dir))
    }
}
