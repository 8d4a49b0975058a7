//! Planning module.
//!
//! Compares declared functions with deployed ones, producing a
//! [`ReconciliationPlan`], and applies plans through the [`PlanExecutor`].

mod diff;
mod executor;
mod freshness;
mod plan;

pub use diff::{ChangeDetector, ChangedAttribute};
pub use executor::{ExecutionReport, PlanExecutor, PublishedFunction};
pub use freshness::{FreshnessScanner, EXCLUDED_DIRS};
pub use plan::{describe_changes, PendingUpdate, ReconciliationPlan};
