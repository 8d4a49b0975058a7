// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Lambda Publish
//!
//! A declarative, idempotent publisher that reconciles locally declared
//! functions with the functions deployed on AWS Lambda.
//!
//! ## Overview
//!
//! Functions are declared in `lambda.publish.yaml` (or built in code through
//! the [`declare::DeclarationRegistry`]). Every run:
//!
//! 1. **Scans** the declarations of the target modules
//! 2. **Computes** the local code timestamp from the project tree
//! 3. **Fetches** the deployed functions whose handler belongs to the modules
//! 4. **Plans** creates, updates (with the exact changed attributes),
//!    deletes and unchanged functions
//! 5. **Publishes** the plan: deletes, then creates, then updates, packaging
//!    each module's bundle at most once
//!
//! ## Modules
//!
//! - [`config`]: Manifest parsing and validation
//! - [`declare`]: Declaration registry and scanner
//! - [`remote`]: Compute service client and deployed state fetcher
//! - [`planner`]: Freshness scan, change detection, plans and execution
//! - [`package`]: Bundle building and upload
//! - [`reconciler`]: Run orchestration
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! project:
//!   bucket: my-artifacts
//!   region: us-east-1
//!
//! modules:
//!   - name: auth
//!     role: arn:aws:iam::123456789012:role/lambda-auth
//!     functions:
//!       - name: login
//!         timeout: 30
//!       - name: logout
//!         memory: 256
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod declare;
pub mod error;
pub mod package;
pub mod planner;
pub mod reconciler;
pub mod remote;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, PublishConfig};
pub use declare::{DeclarationRegistry, DeclarationScanner, FunctionDeclaration, FunctionKey};
pub use error::{PublishError, Result};
pub use package::{ArtifactRef, BundlePackager, Packager, S3ObjectStore};
pub use planner::{ChangeDetector, ChangedAttribute, ExecutionReport, PlanExecutor, ReconciliationPlan};
pub use reconciler::Publisher;
pub use remote::{ComputeService, DeployedFunction, LambdaClient, RemoteStateFetcher};
