//! winstrap - Windows workstation bootstrap.
//!
//! winstrap removes preinstalled vendor AppX packages, installs a fixed
//! catalog of developer tools through winget (plus a few tools winget
//! does not carry), and copies bundled config files into place.
//!
//! # Modules
//!
//! - [`catalog`] - The built-in catalog, alias table and validation
//! - [`cli`] - Command-line interface and the run pipeline
//! - [`deploy`] - Config file deployment
//! - [`error`] - Error types and result aliases
//! - [`install`] - winget, npm and direct-download installation
//! - [`mock`] - Scripted fakes for the process, AppX and network seams
//! - [`plan`] - Diff of the catalog against what is installed
//! - [`remove`] - AppX bloatware removal
//! - [`runlog`] - The timestamped per-run log
//! - [`scan`] - Installed-software detection
//! - [`shell`] - Command execution and host environment queries
//! - [`ui`] - Console styling and spinners
//! - [`winget`] - The winget command line
//!
//! # Example
//!
//! ```
//! use winstrap::catalog::{AliasTable, PackageEntry};
//! use winstrap::plan::plan;
//! use winstrap::scan::{parse_listing, InstalledSet};
//!
//! let listing = parse_listing("Name  Id  Version\n-----\nGit  Git.Git  2.45.1\n");
//! let installed = InstalledSet::from_ids(AliasTable::default(), &listing.ids);
//!
//! let catalog = vec![
//!     PackageEntry::new("Git for Windows", "Git.Git"),
//!     PackageEntry::new("Neovim", "Neovim.Neovim"),
//! ];
//! let plan = plan(&catalog, &installed);
//! assert_eq!(plan.install_names(), vec!["Neovim"]);
//! ```

pub mod catalog;
pub mod cli;
pub mod deploy;
pub mod error;
pub mod install;
pub mod mock;
pub mod plan;
pub mod remove;
pub mod runlog;
pub mod scan;
pub mod shell;
pub mod ui;
pub mod winget;

pub use error::{Result, WinstrapError};
