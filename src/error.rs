//! Error types for winstrap operations.
//!
//! This module defines [`WinstrapError`], the error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Environment errors (not elevated, package manager missing, bad catalog)
//!   bubble up to `main` and end the run with exit code 1
//! - Per-entry failures are caught by the component that owns the loop and
//!   logged; they never reach `main`
//! - Use `anyhow::Error` (via `WinstrapError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for winstrap operations.
#[derive(Debug, Error)]
pub enum WinstrapError {
    /// Catalog file not found at the given location.
    #[error("Catalog not found: {path}")]
    CatalogNotFound { path: PathBuf },

    /// Failed to parse a catalog or alias table.
    #[error("Failed to parse catalog at {path}: {message}")]
    CatalogParseError { path: PathBuf, message: String },

    /// Catalog parsed but violates a structural rule.
    #[error("Invalid catalog: {message}")]
    CatalogInvalid { message: String },

    /// The process is not running with administrator rights.
    #[error("Administrator rights are required. {hint}")]
    NotElevated { hint: String },

    /// The primary package manager is not installed or not on PATH.
    #[error("Package manager '{name}' is not available: {message}")]
    PackageManagerMissing { name: String, message: String },

    /// External command could not be spawned or exited with an error.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// A package manager refused or failed an install, upgrade or removal.
    #[error("{operation} of '{package}' failed ({status}){output}")]
    PackageFailed {
        operation: String,
        package: String,
        status: String,
        output: String,
    },

    /// An installer download failed.
    #[error("Download of {url} failed: {message}")]
    DownloadFailed { url: String, message: String },

    /// The run log could not be opened.
    #[error("Cannot open log file {path}: {message}")]
    LogUnavailable { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for winstrap operations.
pub type Result<T> = std::result::Result<T, WinstrapError>;
