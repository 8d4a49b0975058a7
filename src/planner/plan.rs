//! Reconciliation plan types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::declare::{FunctionDeclaration, FunctionKey};
use crate::remote::DeployedFunction;

use super::diff::ChangedAttribute;

/// The outcome of planning: every declared or deployed function in exactly one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Declared but not deployed.
    pub to_create: BTreeMap<FunctionKey, FunctionDeclaration>,
    /// Deployed and declared, with differences or forced.
    pub to_update: BTreeMap<FunctionKey, PendingUpdate>,
    /// Deployed but no longer declared.
    pub to_delete: BTreeMap<FunctionKey, DeployedFunction>,
    /// Deployed and declared with no differences.
    pub unchanged: BTreeSet<FunctionKey>,
    /// Local code timestamp the plan was computed against.
    pub local_timestamp: DateTime<Utc>,
    /// Whether the plan was computed with force.
    pub force: bool,
}

/// A shared function that needs an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUpdate {
    /// Current remote record.
    pub deployed: DeployedFunction,
    /// Local declaration to apply.
    pub declared: FunctionDeclaration,
    /// Attributes that differ. Empty only for forced updates.
    pub changes: BTreeSet<ChangedAttribute>,
}

impl PendingUpdate {
    /// Returns true if a configuration update call is needed.
    ///
    /// A forced update with no detected change re-deploys the configuration too.
    #[must_use]
    pub fn needs_configuration(&self, force: bool) -> bool {
        self.changes.iter().any(|c| c.is_configuration()) || (force && self.changes.is_empty())
    }

    /// Returns true if the code must be replaced.
    #[must_use]
    pub fn needs_code(&self, force: bool) -> bool {
        force || self.changes.contains(&ChangedAttribute::Code)
    }
}

impl ReconciliationPlan {
    /// Creates an empty plan.
    #[must_use]
    pub const fn new(local_timestamp: DateTime<Utc>, force: bool) -> Self {
        Self {
            to_create: BTreeMap::new(),
            to_update: BTreeMap::new(),
            to_delete: BTreeMap::new(),
            unchanged: BTreeSet::new(),
            local_timestamp,
            force,
        }
    }

    /// Returns true if the plan has nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Returns the number of functions the plan will touch.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }

    /// Groups pending updates by their changed attribute set.
    #[must_use]
    pub fn updates_by_changes(&self) -> BTreeMap<BTreeSet<ChangedAttribute>, Vec<&FunctionKey>> {
        let mut groups: BTreeMap<BTreeSet<ChangedAttribute>, Vec<&FunctionKey>> = BTreeMap::new();
        for (key, update) in &self.to_update {
            groups.entry(update.changes.clone()).or_default().push(key);
        }
        groups
    }

}

/// Renders a changed attribute set as `Role, Timeout`, or `forced` when empty.
#[must_use]
pub fn describe_changes(changes: &BTreeSet<ChangedAttribute>) -> String {
    if changes.is_empty() {
        return String::from("forced");
    }
    changes.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl std::fmt::Display for ReconciliationPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No changes required ({} unchanged)", self.unchanged.len());
        }

        writeln!(f, "Reconciliation Plan ({} actions):", self.action_count())?;
        for key in self.to_create.keys() {
            writeln!(f, "  create {key}")?;
        }
        for (changes, keys) in self.updates_by_changes() {
            for key in keys {
                writeln!(f, "  update {key} ({})", describe_changes(&changes))?;
            }
        }
        for key in self.to_delete.keys() {
            writeln!(f, "  delete {key}")?;
        }
        write!(f, "  {} unchanged", self.unchanged.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(changes: &[ChangedAttribute]) -> PendingUpdate {
        PendingUpdate {
            deployed: DeployedFunction {
                name: String::from("f"),
                handler: String::from("m.f"),
                role: String::from("R1"),
                memory_mb: 128,
                timeout_seconds: 60,
                last_modified: DateTime::<Utc>::UNIX_EPOCH,
            },
            declared: FunctionDeclaration::new("f", "R1"),
            changes: changes.iter().copied().collect(),
        }
    }

    #[test]
    fn test_update_triggers() {
        let config_only = update(&[ChangedAttribute::Timeout]);
        assert!(config_only.needs_configuration(false));
        assert!(!config_only.needs_code(false));

        let code_only = update(&[ChangedAttribute::Code]);
        assert!(!code_only.needs_configuration(false));
        assert!(!code_only.needs_configuration(true));
        assert!(code_only.needs_code(false));

        let forced = update(&[]);
        assert!(forced.needs_configuration(true));
        assert!(forced.needs_code(true));
        assert!(!forced.needs_configuration(false));
    }

    #[test]
    fn test_updates_grouped_by_changes() {
        let mut plan = ReconciliationPlan::new(DateTime::<Utc>::UNIX_EPOCH, false);
        plan.to_update
            .insert(FunctionKey::new("m", "a"), update(&[ChangedAttribute::Timeout]));
        plan.to_update
            .insert(FunctionKey::new("m", "b"), update(&[ChangedAttribute::Code]));
        plan.to_update
            .insert(FunctionKey::new("m", "c"), update(&[ChangedAttribute::Timeout]));

        let groups = plan.updates_by_changes();
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[&BTreeSet::from([ChangedAttribute::Timeout])],
            vec![&FunctionKey::new("m", "a"), &FunctionKey::new("m", "c")]
        );
    }

    #[test]
    fn test_action_count() {
        let mut plan = ReconciliationPlan::new(DateTime::<Utc>::UNIX_EPOCH, false);
        plan.to_create
            .insert(FunctionKey::new("auth", "login"), FunctionDeclaration::new("login", "R1"));
        plan.to_update
            .insert(FunctionKey::new("billing", "charge"), update(&[ChangedAttribute::Role]));
        plan.unchanged.insert(FunctionKey::new("report", "export"));

        assert_eq!(plan.action_count(), 2);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_display() {
        let mut plan = ReconciliationPlan::new(DateTime::<Utc>::UNIX_EPOCH, true);
        assert_eq!(plan.to_string(), "No changes required (0 unchanged)");

        plan.to_update.insert(FunctionKey::new("m", "f"), update(&[]));
        plan.unchanged.insert(FunctionKey::new("m", "g"));
        let rendered = plan.to_string();
        assert!(rendered.contains("update m.f (forced)"));
        assert!(rendered.ends_with("1 unchanged"));
    }
}
