//! Installed-software detection.
//!
//! - [`listing`] - Parser for winget's tabular output
//! - [`installed`] - The normalized set of detected identifiers
//! - [`scanner`] - Combines the listing with direct probes

pub mod installed;
pub mod listing;
pub mod scanner;

pub use installed::InstalledSet;
pub use listing::{parse_listing, Listing};
pub use scanner::{ScanResult, Scanner};
