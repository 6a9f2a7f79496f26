//! Scripted fakes for the external-process, AppX and network seams.
//!
//! Every component that touches the machine takes a [`CommandRunner`],
//! [`PackageStore`] or [`Fetcher`]. These fakes record what was asked of
//! them and answer from a script, so a whole run can be exercised without
//! winget, PowerShell or the network.
//!
//! # Example
//!
//! ```
//! use winstrap::mock::MockRunner;
//! use winstrap::winget::Winget;
//!
//! let runner = MockRunner::new().respond("winget --version", 0, "v1.9.25200");
//! assert_eq!(Winget::new(&runner).version().unwrap(), "v1.9.25200");
//! assert!(runner.ran("winget --version"));
//! ```

use crate::error::{Result, WinstrapError};
use crate::install::{Fetcher, ReleaseInfo};
use crate::remove::PackageStore;
use crate::shell::{display_command, CommandOptions, CommandResult, CommandRunner};
use std::cell::RefCell;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
enum Reply {
    Exit { code: i32, stdout: String },
    SpawnFailure,
}

/// [`CommandRunner`] that answers from a script.
///
/// A call is matched against the rules in the order they were added; a
/// rule matches when its pattern is a substring of the rendered command
/// line. Unmatched calls succeed with empty output.
#[derive(Debug, Default)]
pub struct MockRunner {
    rules: Vec<(String, Reply)>,
    calls: RefCell<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `pattern` with an exit code and stdout.
    pub fn respond(mut self, pattern: &str, code: i32, stdout: &str) -> Self {
        self.rules.push((
            pattern.to_string(),
            Reply::Exit {
                code,
                stdout: stdout.to_string(),
            },
        ));
        self
    }

    /// Make commands containing `pattern` fail to start.
    pub fn fail_spawn(mut self, pattern: &str) -> Self {
        self.rules.push((pattern.to_string(), Reply::SpawnFailure));
        self
    }

    /// Rendered command lines, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Whether any call contained `needle`.
    pub fn ran(&self, needle: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.contains(needle))
    }
}

impl CommandRunner for MockRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        _options: &CommandOptions,
    ) -> Result<CommandResult> {
        let line = display_command(program, args);
        self.calls.borrow_mut().push(line.clone());

        let reply = self
            .rules
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            None => Ok(CommandResult::success(String::new(), String::new())),
            Some(Reply::Exit { code: 0, stdout }) => {
                Ok(CommandResult::success(stdout, String::new()))
            }
            Some(Reply::Exit { code, stdout }) => {
                Ok(CommandResult::failure(Some(code), stdout, String::new()))
            }
            Some(Reply::SpawnFailure) => Err(WinstrapError::CommandFailed {
                command: line,
                code: None,
            }),
        }
    }
}

/// In-memory [`PackageStore`].
///
/// Queries match against the package name, the part of the full name
/// before the first `_`.
#[derive(Debug, Default)]
pub struct MockStore {
    packages: RefCell<Vec<String>>,
    failing_removals: Vec<String>,
    failing_queries: Vec<String>,
    removed: RefCell<Vec<String>>,
    queries: RefCell<Vec<String>>,
}

impl MockStore {
    /// A store holding these full package names.
    pub fn new(full_names: &[&str]) -> Self {
        Self {
            packages: RefCell::new(full_names.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn failing_removal(mut self, full_name: &str) -> Self {
        self.failing_removals.push(full_name.to_string());
        self
    }

    pub fn failing_query(mut self, query: &str) -> Self {
        self.failing_queries.push(query.to_string());
        self
    }

    /// Full names removed so far.
    pub fn removed(&self) -> Vec<String> {
        self.removed.borrow().clone()
    }

    /// Queries asked so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl PackageStore for MockStore {
    fn find(&self, query: &str) -> Result<Vec<String>> {
        self.queries.borrow_mut().push(query.to_string());
        if self.failing_queries.iter().any(|q| q == query) {
            return Err(WinstrapError::PackageFailed {
                operation: "Query".to_string(),
                package: query.to_string(),
                status: "exit code 1".to_string(),
                output: String::new(),
            });
        }

        Ok(self
            .packages
            .borrow()
            .iter()
            .filter(|full| {
                let name = full.split('_').next().unwrap_or(full.as_str());
                wildcard_match(query, name)
            })
            .cloned()
            .collect())
    }

    fn remove(&self, full_name: &str) -> Result<()> {
        if self.failing_removals.iter().any(|f| f == full_name) {
            return Err(WinstrapError::PackageFailed {
                operation: "Removal".to_string(),
                package: full_name.to_string(),
                status: "exit code 1".to_string(),
                output: ": 0x80073CFA".to_string(),
            });
        }
        self.packages.borrow_mut().retain(|p| p != full_name);
        self.removed.borrow_mut().push(full_name.to_string());
        Ok(())
    }
}

/// [`Fetcher`] with a fixed release answer.
///
/// Downloads write a small stub file to the destination. Failing
/// downloads leave a truncated file behind, as an interrupted transfer
/// would.
#[derive(Debug, Default)]
pub struct MockFetcher {
    release: Option<ReleaseInfo>,
    fail_downloads: bool,
    downloads: RefCell<Vec<String>>,
}

impl MockFetcher {
    /// Release lookups fail; downloads succeed.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn with_release(version: &str, url: &str) -> Self {
        Self {
            release: Some(ReleaseInfo {
                version: version.to_string(),
                url: url.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn failing_downloads(mut self) -> Self {
        self.fail_downloads = true;
        self
    }

    /// URLs requested so far.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }
}

impl Fetcher for MockFetcher {
    fn latest_release(&self, repo: &str, _asset_suffix: &str) -> anyhow::Result<ReleaseInfo> {
        self.release
            .clone()
            .ok_or_else(|| anyhow::anyhow!("network unavailable while querying {}", repo))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.downloads.borrow_mut().push(url.to_string());
        if self.fail_downloads {
            fs::write(dest, b"M")?;
            return Err(WinstrapError::DownloadFailed {
                url: url.to_string(),
                message: "connection reset".to_string(),
            });
        }
        fs::write(dest, b"MZ")?;
        Ok(())
    }
}

/// Case-insensitive match with `*` standing for any run of characters,
/// as AppX `-Name` queries behave.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let (first, rest) = (parts[0], &parts[1..]);
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };

    let last = rest[rest.len() - 1];
    for part in &rest[..rest.len() - 1] {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}
