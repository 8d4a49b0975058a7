//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::declare::{FunctionDeclaration, FunctionKey};
use crate::planner::{describe_changes, ExecutionReport, ReconciliationPlan};

use super::commands::OutputFormat;

/// Line printed once a publish run finishes, in every output format.
pub const COMPLETION_MARKER: &str = "Done!";

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan row for table display.
#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Function")]
    function: String,
    #[tabled(rename = "Handler")]
    handler: String,
    #[tabled(rename = "Changes")]
    changes: String,
}

/// Declaration row for table display.
#[derive(Tabled)]
struct DeclarationRow {
    #[tabled(rename = "Handler")]
    handler: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Timeout")]
    timeout: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "VPC")]
    vpc: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a reconciliation plan for the given bucket.
    #[must_use]
    pub fn format_plan(&self, plan: &ReconciliationPlan, bucket: Option<&str>) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::new(plan, bucket)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_plan_text(plan, bucket),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &ReconciliationPlan, bucket: Option<&str>) -> String {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "\nPlan for bucket {}{}",
            bucket.unwrap_or("<none>").bold(),
            if plan.force { " (force upload)" } else { "" }
        );

        if plan.is_empty() {
            let _ = writeln!(
                output,
                "{} No changes required - {} functions up to date.",
                "✓".green(),
                plan.unchanged.len()
            );
            return output;
        }
        output.push('\n');

        let mut rows: Vec<PlanRow> = plan
            .to_create
            .iter()
            .map(|(key, declaration)| PlanRow {
                action: "+create".green().to_string(),
                function: declaration.name.clone(),
                handler: key.handler(),
                changes: String::new(),
            })
            .collect();

        for (changes, keys) in plan.updates_by_changes() {
            for key in keys {
                rows.push(PlanRow {
                    action: "~update".yellow().to_string(),
                    function: key.function.clone(),
                    handler: key.handler(),
                    changes: describe_changes(&changes),
                });
            }
        }

        rows.extend(plan.to_delete.values().map(|deployed| PlanRow {
            action: "-delete".red().to_string(),
            function: deployed.name.clone(),
            handler: deployed.handler.clone(),
            changes: String::new(),
        }));

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = writeln!(
            output,
            "\nPlan: {} to create, {} to update, {} to delete, {} unchanged",
            plan.to_create.len().to_string().green(),
            plan.to_update.len().to_string().yellow(),
            plan.to_delete.len().to_string().red(),
            plan.unchanged.len()
        );

        output
    }

    /// Formats an execution report.
    #[must_use]
    pub fn format_report(&self, report: &ExecutionReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();

                for key in &report.deleted {
                    let _ = writeln!(output, "   {} {key}", "-deleted".red());
                }
                for published in &report.created {
                    let _ = writeln!(
                        output,
                        "   {} {} (version {})",
                        "+created".green(),
                        published.key,
                        published.version.as_deref().unwrap_or("$LATEST")
                    );
                }
                for key in &report.reconfigured {
                    let _ = writeln!(output, "   {} {key}", "~configured".yellow());
                }
                for published in &report.code_updated {
                    let _ = writeln!(
                        output,
                        "   {} {} (version {})",
                        "~code".yellow(),
                        published.key,
                        published.version.as_deref().unwrap_or("$LATEST")
                    );
                }
                for (module, artifact) in &report.packaged {
                    let sha = artifact.sha256.get(..12).unwrap_or(&artifact.sha256);
                    let _ = writeln!(output, "   packaged {module} -> {artifact} ({sha})");
                }

                if report.is_empty() {
                    output.push_str("   Nothing applied.\n");
                }
                output
            }
        }
    }

    /// Formats the declared functions of a manifest.
    #[must_use]
    pub fn format_declarations(&self, declared: &BTreeMap<FunctionKey, FunctionDeclaration>) -> String {
        match self.format {
            OutputFormat::Json => {
                let entries: Vec<DeclarationJson<'_>> = declared
                    .iter()
                    .map(|(key, declaration)| DeclarationJson {
                        module: &key.module,
                        handler: key.handler(),
                        declaration,
                    })
                    .collect();
                serde_json::to_string_pretty(&entries).unwrap_or_default()
            }
            OutputFormat::Text => {
                if declared.is_empty() {
                    return String::from("   No functions declared.\n");
                }
                let rows: Vec<DeclarationRow> = declared
                    .iter()
                    .map(|(key, d)| DeclarationRow {
                        handler: key.handler(),
                        role: Self::truncate(&d.role, 48),
                        timeout: format!("{}s", d.timeout_seconds),
                        memory: format!("{} MB", d.memory_mb),
                        vpc: d
                            .network_config
                            .as_ref()
                            .map_or_else(String::new, |n| format!("{} subnets", n.subnet_ids.len())),
                    })
                    .collect();

                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

// JSON serialization helpers

#[derive(Serialize)]
struct PlanJson<'a> {
    bucket: Option<&'a str>,
    force: bool,
    local_timestamp: String,
    create: Vec<String>,
    update: Vec<UpdateGroupJson>,
    delete: Vec<String>,
    unchanged: Vec<String>,
}

#[derive(Serialize)]
struct UpdateGroupJson {
    changes: Vec<String>,
    functions: Vec<String>,
}

#[derive(Serialize)]
struct DeclarationJson<'a> {
    module: &'a str,
    handler: String,
    #[serde(flatten)]
    declaration: &'a FunctionDeclaration,
}

impl<'a> PlanJson<'a> {
    fn new(plan: &ReconciliationPlan, bucket: Option<&'a str>) -> Self {
        Self {
            bucket,
            force: plan.force,
            local_timestamp: plan.local_timestamp.to_rfc3339(),
            create: plan.to_create.keys().map(ToString::to_string).collect(),
            update: plan
                .updates_by_changes()
                .into_iter()
                .map(|(changes, keys)| UpdateGroupJson {
                    changes: changes.iter().map(ToString::to_string).collect(),
                    functions: keys.into_iter().map(ToString::to_string).collect(),
                })
                .collect(),
            delete: plan.to_delete.keys().map(ToString::to_string).collect(),
            unchanged: plan.unchanged.iter().map(ToString::to_string).collect(),
        }
    }
}
