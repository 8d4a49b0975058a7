//! CLI module for the lambda publisher.
//!
//! This module provides the command-line interface for planning and
//! publishing declared functions.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, TargetArgs};
pub use output::{COMPLETION_MARKER, OutputFormatter};
