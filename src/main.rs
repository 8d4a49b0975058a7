//! lambda-publish CLI entrypoint.
//!
//! This is the main entrypoint for the lambda-publish command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use lambda_publish::cli::{Cli, Commands, OutputFormatter, TargetArgs, COMPLETION_MARKER};
use lambda_publish::config::{find_config_file, ConfigParser, ConfigValidator, PublishConfig};
use lambda_publish::declare::{DeclarationRegistry, DeclarationScanner};
use lambda_publish::error::{ConfigError, Result};
use lambda_publish::package::{BundlePackager, S3ObjectStore};
use lambda_publish::reconciler::Publisher;
use lambda_publish::remote::LambdaClient;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate { warnings } => cmd_validate(cli.config.as_ref(), warnings, &formatter),
        Commands::Plan { target } => cmd_plan(cli.config.as_ref(), &target, &formatter).await,
        Commands::Publish { target, dry_run, yes } => {
            if dry_run {
                cmd_plan(cli.config.as_ref(), &target, &formatter).await
            } else {
                cmd_publish(cli.config.as_ref(), &target, yes, &formatter).await
            }
        }
    }
}

/// Validate the manifest and list declarations.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (config, manifest_dir) = load_config(config_path, &TargetArgs::default(), show_warnings)?;
    let root = config.resolved_root(&manifest_dir);

    let registry = DeclarationRegistry::from_config(&config)?;
    let declared = DeclarationScanner::new(&registry, &root).scan(&registry.module_names())?;

    eprintln!("Manifest is valid!");
    eprintln!("\nManifest summary:");
    eprintln!("  Root: {}", root.display());
    eprintln!("  Bucket: {}", config.project.bucket.as_deref().unwrap_or("<none>"));
    eprintln!("  Region: {}", config.project.region);
    eprintln!("  Modules: {}", config.modules.len());
    eprintln!("  Functions: {}", config.function_count());
    eprintln!("{}", formatter.format_declarations(&declared));

    Ok(())
}

/// Show the reconciliation plan.
async fn cmd_plan(config_path: Option<&PathBuf>, target: &TargetArgs, formatter: &OutputFormatter) -> Result<()> {
    let (config, manifest_dir) = load_config(config_path, target, false)?;
    let root = target.root(&config, &manifest_dir);
    let registry = DeclarationRegistry::from_config(&config)?;

    let sdk_config = load_aws_config(&config.project.region).await;
    let service = LambdaClient::new(&sdk_config);

    let publisher = Publisher::new(&config, &registry, &service, root)
        .with_modules(target.modules.clone())
        .with_force(target.force_upload);
    let plan = publisher.plan().await?;

    eprintln!("{}", formatter.format_plan(&plan, config.project.bucket.as_deref()));
    Ok(())
}

/// Publish the declared functions.
async fn cmd_publish(
    config_path: Option<&PathBuf>,
    target: &TargetArgs,
    auto_approve: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (config, manifest_dir) = load_config(config_path, target, false)?;
    let root = target.root(&config, &manifest_dir);
    let registry = DeclarationRegistry::from_config(&config)?;

    let bucket = config.project.bucket.clone().ok_or_else(|| {
        ConfigError::validation("A bucket is required to publish (--bucket or project.bucket)", "project.bucket")
    })?;

    let sdk_config = load_aws_config(&config.project.region).await;
    let service = LambdaClient::new(&sdk_config);
    let store = S3ObjectStore::new(&sdk_config);

    let publisher = Publisher::new(&config, &registry, &service, &root)
        .with_modules(target.modules.clone())
        .with_force(target.force_upload);
    let plan = publisher.plan().await?;

    eprintln!("{}", formatter.format_plan(&plan, Some(&bucket)));

    if plan.is_empty() {
        eprintln!("No changes to apply.");
        eprintln!("{COMPLETION_MARKER}");
        return Ok(());
    }

    // Confirm
    if !auto_approve {
        eprint!("Do you want to publish this plan? [y/N]: ");
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Publish cancelled.");
            return Ok(());
        }
    }

    let packager = BundlePackager::new(&root, bucket, config.package.clone(), &store);
    let report = publisher.publish(&plan, &packager).await?;

    eprintln!("{}", formatter.format_report(&report));
    eprintln!("{COMPLETION_MARKER}");
    Ok(())
}

/// Resolves the manifest path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Loads, overrides and validates the manifest. Returns it with its directory.
fn load_config(
    config_path: Option<&PathBuf>,
    target: &TargetArgs,
    show_warnings: bool,
) -> Result<(PublishConfig, PathBuf)> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Loading manifest from: {}", config_file.display());

    let manifest_dir = config_file
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let parser = ConfigParser::new().with_base_path(&manifest_dir);
    parser.load_dotenv()?;

    let mut config = parser.load_with_env(&config_file)?;
    target.apply(&mut config);

    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        if show_warnings {
            warn!("{warning}");
        } else {
            debug!("{warning}");
        }
    }

    info!(
        "Loaded {} modules with {} functions from {}",
        config.modules.len(),
        config.function_count(),
        config_file.display()
    );
    Ok((config, manifest_dir))
}

/// Loads the AWS configuration for a region.
async fn load_aws_config(region: &str) -> aws_config::SdkConfig {
    aws_config::from_env()
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await
}
