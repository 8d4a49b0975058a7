//! Plan executor.
//!
//! Applies a [`ReconciliationPlan`] against the compute service: deletes,
//! then creates, then updates. The first failure aborts the run; whatever
//! was already applied stays applied.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use crate::declare::FunctionKey;
use crate::error::Result;
use crate::package::{ArtifactRef, Packager};
use crate::remote::{ComputeService, CreateFunctionRequest, UpdateCodeRequest, UpdateConfigurationRequest};

use super::plan::{describe_changes, ReconciliationPlan};

/// Executor for reconciliation plans.
pub struct PlanExecutor<'a> {
    /// Compute service client.
    service: &'a dyn ComputeService,
    /// Bundle packager.
    packager: &'a dyn Packager,
    /// Runtime identifier for new functions.
    runtime: String,
}

/// A function whose code was published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedFunction {
    /// Function key.
    pub key: FunctionKey,
    /// Version returned by the service.
    pub version: Option<String>,
}

/// Summary of an executed plan.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Deleted functions.
    pub deleted: Vec<FunctionKey>,
    /// Created functions.
    pub created: Vec<PublishedFunction>,
    /// Functions whose configuration was updated.
    pub reconfigured: Vec<FunctionKey>,
    /// Functions whose code was replaced.
    pub code_updated: Vec<PublishedFunction>,
    /// Bundles built during the run, by module.
    pub packaged: BTreeMap<String, ArtifactRef>,
}

impl ExecutionReport {
    /// Returns true if nothing was applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
            && self.created.is_empty()
            && self.reconfigured.is_empty()
            && self.code_updated.is_empty()
    }
}

impl<'a> PlanExecutor<'a> {
    /// Creates a new executor.
    #[must_use]
    pub fn new(service: &'a dyn ComputeService, packager: &'a dyn Packager, runtime: impl Into<String>) -> Self {
        Self {
            service,
            packager,
            runtime: runtime.into(),
        }
    }

    /// Executes a plan.
    ///
    /// # Errors
    ///
    /// Returns the first remote or packaging error. Items applied before the
    /// failure are not rolled back.
    pub async fn execute(&self, plan: &ReconciliationPlan) -> Result<ExecutionReport> {
        info!("Executing plan with {} actions", plan.action_count());

        let mut report = ExecutionReport::default();
        let mut deleted_names = HashSet::new();

        for (key, deployed) in &plan.to_delete {
            if !deleted_names.insert(deployed.name.as_str()) {
                debug!("{} already deleted, skipping {key}", deployed.name);
                continue;
            }
            info!("Deleting {key}");
            self.service.delete_function(&deployed.name).await?;
            report.deleted.push(key.clone());
        }

        for (key, declaration) in &plan.to_create {
            let code = self.artifact(&key.module, &mut report.packaged).await?;
            info!("Creating {key}");
            let version = self
                .service
                .create_function(&CreateFunctionRequest {
                    name: declaration.name.clone(),
                    runtime: self.runtime.clone(),
                    role: declaration.role.clone(),
                    handler: key.handler(),
                    code,
                    description: declaration.description.clone(),
                    timeout_seconds: declaration.timeout_seconds,
                    memory_mb: declaration.memory_mb,
                    vpc: declaration.network_config.clone(),
                    publish: true,
                })
                .await?;
            report.created.push(PublishedFunction {
                key: key.clone(),
                version,
            });
        }

        for (key, update) in &plan.to_update {
            info!("Updating {key} ({})", describe_changes(&update.changes));

            if update.needs_configuration(plan.force) {
                let declared = &update.declared;
                self.service
                    .update_function_configuration(&UpdateConfigurationRequest {
                        name: declared.name.clone(),
                        role: declared.role.clone(),
                        handler: key.handler(),
                        description: declared.description.clone(),
                        timeout_seconds: declared.timeout_seconds,
                        memory_mb: declared.memory_mb,
                    })
                    .await?;
                report.reconfigured.push(key.clone());
            }

            if update.needs_code(plan.force) {
                let code = self.artifact(&key.module, &mut report.packaged).await?;
                let version = self
                    .service
                    .update_function_code(&UpdateCodeRequest {
                        name: update.declared.name.clone(),
                        code,
                        publish: true,
                    })
                    .await?;
                report.code_updated.push(PublishedFunction {
                    key: key.clone(),
                    version,
                });
            }
        }

        info!(
            "Plan applied: {} deleted, {} created, {} reconfigured, {} code updates, {} bundles",
            report.deleted.len(),
            report.created.len(),
            report.reconfigured.len(),
            report.code_updated.len(),
            report.packaged.len()
        );
        Ok(report)
    }

    /// Returns the module's bundle, packaging it on first use within the run.
    async fn artifact(&self, module: &str, packaged: &mut BTreeMap<String, ArtifactRef>) -> Result<ArtifactRef> {
        if let Some(artifact) = packaged.get(module) {
            debug!("Reusing bundle {artifact} for {module}");
            return Ok(artifact.clone());
        }

        let artifact = self.packager.package(module).await?;
        packaged.insert(module.to_string(), artifact.clone());
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::declare::FunctionDeclaration;
    use crate::error::{PackagingError, PublishError, RemoteError};
    use crate::package::MockPackager;
    use crate::planner::{ChangedAttribute, PendingUpdate};
    use crate::remote::{DeployedFunction, MockComputeService};
    use chrono::{DateTime, Utc};
    use mockall::Sequence;
    use std::collections::BTreeSet;

    fn artifact(module: &str) -> ArtifactRef {
        ArtifactRef {
            bucket: String::from("artifacts"),
            key: module.to_string(),
            sha256: String::from("00"),
        }
    }

    fn deployed(name: &str) -> DeployedFunction {
        DeployedFunction {
            name: name.to_string(),
            handler: format!("m.{name}"),
            role: String::from("R1"),
            memory_mb: 128,
            timeout_seconds: 60,
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn update(name: &str, changes: &[ChangedAttribute]) -> PendingUpdate {
        PendingUpdate {
            deployed: deployed(name),
            declared: FunctionDeclaration::new(name, "R2").with_timeout(30),
            changes: changes.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn empty_plan(force: bool) -> ReconciliationPlan {
        ReconciliationPlan::new(DateTime::<Utc>::UNIX_EPOCH, force)
    }

    #[tokio::test]
    async fn test_order_is_delete_create_update() {
        let mut plan = empty_plan(false);
        plan.to_delete.insert(FunctionKey::new("m", "old"), deployed("old"));
        plan.to_create
            .insert(FunctionKey::new("m", "new"), FunctionDeclaration::new("new", "R1"));
        plan.to_update
            .insert(FunctionKey::new("m", "f"), update("f", &[ChangedAttribute::Timeout]));

        let mut seq = Sequence::new();
        let mut service = MockComputeService::new();
        let mut packager = MockPackager::new();

        service
            .expect_delete_function()
            .withf(|name: &str| name == "old")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        packager
            .expect_package()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|m| Ok(artifact(m)));
        service
            .expect_create_function()
            .withf(|r: &CreateFunctionRequest| r.handler == "m.new" && r.publish && r.runtime == "python3.12")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(String::from("1"))));
        service
            .expect_update_function_configuration()
            .withf(|r: &UpdateConfigurationRequest| r.name == "f" && r.role == "R2" && r.timeout_seconds == 30)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        service.expect_update_function_code().times(0);

        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let report = executor.execute(&plan).await.unwrap();

        assert_eq!(report.deleted, vec![FunctionKey::new("m", "old")]);
        assert_eq!(report.created[0].version.as_deref(), Some("1"));
        assert_eq!(report.reconfigured, vec![FunctionKey::new("m", "f")]);
        assert!(report.code_updated.is_empty());
    }

    #[tokio::test]
    async fn test_bundle_built_once_per_module() {
        let mut plan = empty_plan(false);
        plan.to_create
            .insert(FunctionKey::new("m", "a"), FunctionDeclaration::new("a", "R1"));
        plan.to_create
            .insert(FunctionKey::new("m", "b"), FunctionDeclaration::new("b", "R1"));
        plan.to_update
            .insert(FunctionKey::new("m", "c"), update("c", &[ChangedAttribute::Code]));
        plan.to_create
            .insert(FunctionKey::new("n", "d"), FunctionDeclaration::new("d", "R1"));

        let mut service = MockComputeService::new();
        let mut packager = MockPackager::new();
        packager
            .expect_package()
            .withf(|m: &str| m == "m")
            .times(1)
            .returning(|m| Ok(artifact(m)));
        packager
            .expect_package()
            .withf(|m: &str| m == "n")
            .times(1)
            .returning(|m| Ok(artifact(m)));
        service
            .expect_create_function()
            .times(3)
            .returning(|_| Ok(Some(String::from("1"))));
        service
            .expect_update_function_code()
            .withf(|r: &UpdateCodeRequest| r.name == "c" && r.code.key == "m" && r.publish)
            .times(1)
            .returning(|_| Ok(Some(String::from("2"))));
        service.expect_update_function_configuration().times(0);

        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let report = executor.execute(&plan).await.unwrap();

        assert_eq!(report.packaged.len(), 2);
        assert_eq!(report.created.len(), 3);
        assert_eq!(report.code_updated.len(), 1);
    }

    #[tokio::test]
    async fn test_forced_empty_update_redeploys_configuration_and_code() {
        let mut plan = empty_plan(true);
        plan.to_update.insert(FunctionKey::new("m", "f"), update("f", &[]));

        let mut seq = Sequence::new();
        let mut service = MockComputeService::new();
        let mut packager = MockPackager::new();
        service
            .expect_update_function_configuration()
            .withf(|r: &UpdateConfigurationRequest| r.name == "f" && r.role == "R2" && r.timeout_seconds == 30)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        packager
            .expect_package()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|m| Ok(artifact(m)));
        service
            .expect_update_function_code()
            .withf(|r: &UpdateCodeRequest| r.name == "f" && r.publish)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));

        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let report = executor.execute(&plan).await.unwrap();
        assert_eq!(report.reconfigured, vec![FunctionKey::new("m", "f")]);
        assert_eq!(report.code_updated.len(), 1);
    }

    #[tokio::test]
    async fn test_forced_code_change_skips_configuration() {
        let mut plan = empty_plan(true);
        plan.to_update
            .insert(FunctionKey::new("m", "f"), update("f", &[ChangedAttribute::Code]));

        let mut service = MockComputeService::new();
        let mut packager = MockPackager::new();
        packager.expect_package().times(1).returning(|m| Ok(artifact(m)));
        service.expect_update_function_configuration().times(0);
        service
            .expect_update_function_code()
            .times(1)
            .returning(|_| Ok(None));

        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let report = executor.execute(&plan).await.unwrap();
        assert!(report.reconfigured.is_empty());
        assert_eq!(report.code_updated.len(), 1);
    }

    #[tokio::test]
    async fn test_create_carries_full_declaration() {
        let vpc = NetworkConfig {
            subnet_ids: vec![String::from("subnet-1"), String::from("subnet-2")],
            security_group_ids: vec![String::from("sg-1")],
        };
        let mut declaration = FunctionDeclaration::new("charge", "arn:aws:iam::1:role/billing")
            .with_timeout(45)
            .with_memory(512);
        declaration.description = String::from("Charges a card");
        declaration.network_config = Some(vpc.clone());

        let mut plan = empty_plan(false);
        plan.to_create
            .insert(FunctionKey::new("billing", "charge"), declaration);

        let mut service = MockComputeService::new();
        let mut packager = MockPackager::new();
        packager.expect_package().times(1).returning(|m| Ok(artifact(m)));
        service
            .expect_create_function()
            .withf(move |r: &CreateFunctionRequest| {
                r.name == "charge"
                    && r.handler == "billing.charge"
                    && r.role == "arn:aws:iam::1:role/billing"
                    && r.runtime == "python3.12"
                    && r.description == "Charges a card"
                    && r.timeout_seconds == 45
                    && r.memory_mb == 512
                    && r.vpc.as_ref() == Some(&vpc)
                    && r.code == artifact("billing")
                    && r.publish
            })
            .times(1)
            .returning(|_| Ok(Some(String::from("1"))));

        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let report = executor.execute(&plan).await.unwrap();
        assert_eq!(report.created[0].key, FunctionKey::new("billing", "charge"));
        assert_eq!(report.packaged["billing"], artifact("billing"));
    }

    #[tokio::test]
    async fn test_config_and_code_change_issue_both_calls() {
        let mut plan = empty_plan(false);
        plan.to_update.insert(
            FunctionKey::new("m", "f"),
            update("f", &[ChangedAttribute::Role, ChangedAttribute::Code]),
        );

        let mut service = MockComputeService::new();
        let mut packager = MockPackager::new();
        packager.expect_package().times(1).returning(|m| Ok(artifact(m)));
        service
            .expect_update_function_configuration()
            .times(1)
            .returning(|_| Ok(()));
        service
            .expect_update_function_code()
            .times(1)
            .returning(|_| Ok(Some(String::from("3"))));

        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let report = executor.execute(&plan).await.unwrap();
        assert_eq!(report.reconfigured.len(), 1);
        assert_eq!(report.code_updated.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_aborts() {
        let mut plan = empty_plan(false);
        plan.to_delete.insert(FunctionKey::new("m", "old"), deployed("old"));
        plan.to_create
            .insert(FunctionKey::new("m", "new"), FunctionDeclaration::new("new", "R1"));

        let mut service = MockComputeService::new();
        let mut packager = MockPackager::new();
        service
            .expect_delete_function()
            .returning(|_| Err(RemoteError::request("DeleteFunction", "throttled").into()));
        service.expect_create_function().times(0);
        packager.expect_package().times(0);

        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let result = executor.execute(&plan).await;
        assert!(matches!(result, Err(PublishError::Remote(_))));
    }

    #[tokio::test]
    async fn test_packaging_failure_aborts() {
        let mut plan = empty_plan(false);
        plan.to_create
            .insert(FunctionKey::new("m", "new"), FunctionDeclaration::new("new", "R1"));

        let mut service = MockComputeService::new();
        let mut packager = MockPackager::new();
        packager
            .expect_package()
            .returning(|_| Err(PackagingError::archive("disk full").into()));
        service.expect_create_function().times(0);

        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let result = executor.execute(&plan).await;
        assert!(matches!(result, Err(PublishError::Packaging(_))));
    }

    #[tokio::test]
    async fn test_shared_remote_function_deleted_once() {
        let mut plan = empty_plan(false);
        plan.to_delete
            .insert(FunctionKey::new("report", "export"), deployed("export"));
        plan.to_delete
            .insert(FunctionKey::new("reporting", "export"), deployed("export"));

        let mut service = MockComputeService::new();
        let packager = MockPackager::new();
        service.expect_delete_function().times(1).returning(|_| Ok(()));

        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let report = executor.execute(&plan).await.unwrap();
        assert_eq!(report.deleted, vec![FunctionKey::new("report", "export")]);
    }

    #[tokio::test]
    async fn test_empty_plan_makes_no_calls() {
        let service = MockComputeService::new();
        let packager = MockPackager::new();
        let executor = PlanExecutor::new(&service, &packager, "python3.12");
        let report = executor.execute(&empty_plan(false)).await.unwrap();
        assert!(report.is_empty());
    }
}
