//! Change detector.
//!
//! Classifies every declared and deployed function into exactly one of the
//! create, update, delete and unchanged buckets. The result depends only on
//! the two maps, the local code timestamp and the force flag.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::declare::{FunctionDeclaration, FunctionKey};
use crate::remote::DeployedFunction;

use super::plan::{PendingUpdate, ReconciliationPlan};

/// An attribute whose declared and deployed values differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ChangedAttribute {
    /// Execution role.
    Role,
    /// Memory allocation.
    MemorySize,
    /// Timeout.
    Timeout,
    /// Local code is newer than the deployed function.
    Code,
}

impl ChangedAttribute {
    /// Returns true if the attribute is applied by a configuration update.
    #[must_use]
    pub const fn is_configuration(self) -> bool {
        matches!(self, Self::Role | Self::MemorySize | Self::Timeout)
    }
}

impl std::fmt::Display for ChangedAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Role => "Role",
            Self::MemorySize => "MemorySize",
            Self::Timeout => "Timeout",
            Self::Code => "Code",
        };
        write!(f, "{s}")
    }
}

/// Computes reconciliation plans.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeDetector {
    /// Treat every shared function as needing an update.
    force: bool,
}

impl ChangeDetector {
    /// Creates a detector without force.
    #[must_use]
    pub const fn new() -> Self {
        Self { force: false }
    }

    /// Sets the force flag.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Returns the attributes that differ between a declaration and its deployed record.
    #[must_use]
    pub fn detect_changes(
        declared: &FunctionDeclaration,
        deployed: &DeployedFunction,
        local_timestamp: DateTime<Utc>,
    ) -> BTreeSet<ChangedAttribute> {
        let mut changes = BTreeSet::new();

        if declared.role != deployed.role {
            changes.insert(ChangedAttribute::Role);
        }
        if declared.memory_mb != deployed.memory_mb {
            changes.insert(ChangedAttribute::MemorySize);
        }
        if declared.timeout_seconds != deployed.timeout_seconds {
            changes.insert(ChangedAttribute::Timeout);
        }
        if deployed.last_modified < local_timestamp {
            changes.insert(ChangedAttribute::Code);
        }

        changes
    }

    /// Computes the plan for the given declared and deployed functions.
    #[must_use]
    pub fn compute_plan(
        &self,
        declared: &BTreeMap<FunctionKey, FunctionDeclaration>,
        deployed: &BTreeMap<FunctionKey, DeployedFunction>,
        local_timestamp: DateTime<Utc>,
    ) -> ReconciliationPlan {
        let mut plan = ReconciliationPlan::new(local_timestamp, self.force);

        for (key, declaration) in declared {
            let Some(remote) = deployed.get(key) else {
                debug!("{key} is not deployed, will create");
                plan.to_create.insert(key.clone(), declaration.clone());
                continue;
            };

            let changes = Self::detect_changes(declaration, remote, local_timestamp);
            if changes.is_empty() && !self.force {
                debug!("{key} is up to date");
                plan.unchanged.insert(key.clone());
                continue;
            }

            debug!(
                "{key} needs update: [{}]{}",
                changes.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
                if self.force { " (forced)" } else { "" }
            );
            plan.to_update.insert(
                key.clone(),
                PendingUpdate {
                    deployed: remote.clone(),
                    declared: declaration.clone(),
                    changes,
                },
            );
        }

        for (key, remote) in deployed {
            if !declared.contains_key(key) {
                debug!("{key} is no longer declared, will delete");
                plan.to_delete.insert(key.clone(), remote.clone());
            }
        }

        plan
    }
}
