//! Publisher: one plan or publish run.
//!
//! Scans declarations, computes the local code timestamp, fetches deployed
//! functions and plans. Declarations are resolved before any remote call, so
//! configuration problems never reach the compute service.

use std::path::{Path, PathBuf};
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

use crate::config::PublishConfig;
use crate::declare::{DeclarationRegistry, DeclarationScanner};
use crate::error::Result;
use crate::package::Packager;
use crate::planner::{ChangeDetector, ExecutionReport, FreshnessScanner, PlanExecutor, ReconciliationPlan};
use crate::remote::{ComputeService, RemoteStateFetcher};

/// Orchestrates planning and publishing for a set of modules.
pub struct Publisher<'a> {
    /// Manifest.
    config: &'a PublishConfig,
    /// Declared functions.
    registry: &'a DeclarationRegistry,
    /// Compute service client.
    service: &'a dyn ComputeService,
    /// Project root.
    root: PathBuf,
    /// Target modules; empty means every registered module.
    modules: Vec<String>,
    /// Force every shared function into the update bucket.
    force: bool,
    /// Span covering the run.
    span: Span,
}

impl<'a> Publisher<'a> {
    /// Creates a publisher for every registered module.
    #[must_use]
    pub fn new(
        config: &'a PublishConfig,
        registry: &'a DeclarationRegistry,
        service: &'a dyn ComputeService,
        root: impl Into<PathBuf>,
    ) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            config,
            registry,
            service,
            root: root.into(),
            modules: Vec::new(),
            force: false,
            span: info_span!("publish", run_id = %run_id),
        }
    }

    /// Restricts the run to the given modules.
    #[must_use]
    pub fn with_modules(mut self, modules: Vec<String>) -> Self {
        self.modules = modules;
        self
    }

    /// Sets the force flag.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the modules this run targets.
    #[must_use]
    pub fn target_modules(&self) -> Vec<String> {
        if self.modules.is_empty() {
            self.registry.module_names()
        } else {
            self.modules.clone()
        }
    }

    /// Computes the reconciliation plan.
    ///
    /// # Errors
    ///
    /// Returns an error if a module or role cannot be resolved, the root is
    /// missing, or the deployed functions cannot be listed.
    pub async fn plan(&self) -> Result<ReconciliationPlan> {
        self.plan_inner().instrument(self.span.clone()).await
    }

    /// Applies a previously computed plan.
    ///
    /// # Errors
    ///
    /// Returns the first remote or packaging error.
    pub async fn publish(&self, plan: &ReconciliationPlan, packager: &dyn Packager) -> Result<ExecutionReport> {
        let executor = PlanExecutor::new(self.service, packager, self.config.project.runtime.clone());
        executor.execute(plan).instrument(self.span.clone()).await
    }

    async fn plan_inner(&self) -> Result<ReconciliationPlan> {
        let modules = self.target_modules();
        info!("Planning {} module(s) under {}", modules.len(), self.root.display());

        let declared = DeclarationScanner::new(self.registry, &self.root).scan(&modules)?;
        let local_timestamp = FreshnessScanner::new(&self.config.freshness).latest_modification(&self.root)?;
        info!("Local code last modified at {local_timestamp}");

        let deployed = RemoteStateFetcher::new(self.service).fetch(&modules).await?;

        let plan = ChangeDetector::new()
            .with_force(self.force)
            .compute_plan(&declared, &deployed, local_timestamp);

        info!(
            "Plan: {} creates, {} updates, {} deletes, {} unchanged",
            plan.to_create.len(),
            plan.to_update.len(),
            plan.to_delete.len(),
            plan.unchanged.len()
        );
        Ok(plan)
    }
}
