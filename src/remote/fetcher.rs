//! Remote state fetcher.
//!
//! Lists deployed functions and attributes them to the target modules.
//! Attribution is a plain string prefix match of the module name against
//! the handler: module `report` also claims `reporting.export`. A function
//! matching several target modules is attributed to each of them.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::declare::FunctionKey;
use crate::error::Result;

use super::client::ComputeService;
use super::types::DeployedFunction;

/// Fetcher for the deployed side of the reconciliation.
pub struct RemoteStateFetcher<'a> {
    /// Compute service client.
    service: &'a dyn ComputeService,
}

impl<'a> RemoteStateFetcher<'a> {
    /// Creates a new fetcher.
    #[must_use]
    pub const fn new(service: &'a dyn ComputeService) -> Self {
        Self { service }
    }

    /// Returns the deployed functions belonging to the given modules.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing call fails or returns unparsable data.
    /// No partial result is produced.
    pub async fn fetch(&self, modules: &[String]) -> Result<BTreeMap<FunctionKey, DeployedFunction>> {
        info!("Listing deployed functions for modules: {}", modules.join(", "));

        let listed = self.service.list_functions().await?;
        let total = listed.len();
        let mut deployed = BTreeMap::new();

        for remote in listed {
            let owners: Vec<&String> = modules
                .iter()
                .filter(|m| remote.handler.starts_with(m.as_str()))
                .collect();

            if owners.is_empty() {
                continue;
            }

            if owners.len() > 1 {
                warn!(
                    "Function {} (handler {}) matches several modules by prefix: {}",
                    remote.name,
                    remote.handler,
                    owners.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ")
                );
            }

            let function = remote.into_deployed()?;
            for module in owners {
                debug!("Deployed {module}.{}", function.name);
                deployed.insert(FunctionKey::new(module, &function.name), function.clone());
            }
        }

        info!("Found {} deployed functions out of {total} listed", deployed.len());
        Ok(deployed)
    }
}
