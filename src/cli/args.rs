//! CLI argument definitions.
//!
//! The run is a single pipeline, so there are no subcommands; each stage
//! is switched by an independent flag. The main entry point is the
//! [`Cli`] struct.

use clap::Parser;
use std::path::PathBuf;

/// winstrap - Windows workstation bootstrap.
///
/// Removes vendor AppX packages, installs developer tools through winget,
/// and deploys bundled config files.
#[derive(Debug, Parser)]
#[command(name = "winstrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Skip AppX bloatware removal
    #[arg(long)]
    pub skip_removal: bool,

    /// Skip package installation
    #[arg(long)]
    pub skip_install: bool,

    /// Skip config file deployment
    #[arg(long)]
    pub skip_configs: bool,

    /// Scan and print the plan without changing anything
    #[arg(long, visible_alias = "scan-only")]
    pub dry_run: bool,

    /// Upgrade already installed packages and tools
    #[arg(long)]
    pub update: bool,

    /// Stream package manager output and log every command
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Catalog file to use instead of the built-in one
    #[arg(long, env = "WINSTRAP_CATALOG", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Directory holding the config files to deploy
    /// (default: `configs` next to the executable)
    #[arg(long, env = "WINSTRAP_BUNDLE_DIR", value_name = "DIR")]
    pub bundle_dir: Option<PathBuf>,

    /// Directory for run logs
    #[arg(long, env = "WINSTRAP_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}
