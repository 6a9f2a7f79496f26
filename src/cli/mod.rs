//! Command-line interface for winstrap.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`run`] - The pipeline the arguments drive

pub mod args;
pub mod run;

pub use args::Cli;
pub use run::{default_bundle_dir, default_log_dir, run, Pipeline, RunFlags, RunSummary};
