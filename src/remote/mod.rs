//! Compute service integration module.
//!
//! This module provides the compute service seam, its AWS Lambda
//! implementation and the fetcher that reads the deployed side of a
//! reconciliation.

mod client;
mod types;
mod fetcher;

pub use client::{ComputeService, LambdaClient};
#[cfg(test)]
pub(crate) use client::MockComputeService;
pub use types::{
    parse_last_modified, CreateFunctionRequest, DeployedFunction, RemoteFunction,
    UpdateCodeRequest, UpdateConfigurationRequest,
};
pub use fetcher::RemoteStateFetcher;
