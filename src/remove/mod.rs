//! Vendor AppX package removal.
//!
//! Each query (exact name or wildcard) is looked up in the package store
//! and every match removed on its own. Nothing is retried or rolled back.

use crate::catalog::RemovalList;
use crate::error::{Result, WinstrapError};
use crate::runlog::RunLog;
use crate::shell::{exit_status_label, CommandOptions, CommandRunner};
use std::collections::HashSet;

/// Access to installed AppX packages.
pub trait PackageStore {
    /// Full names of packages whose name matches `query` (`*` wildcards allowed).
    fn find(&self, query: &str) -> Result<Vec<String>>;

    /// Remove a package by full name for all users.
    fn remove(&self, full_name: &str) -> Result<()>;
}

/// [`PackageStore`] backed by the PowerShell Appx module.
pub struct AppxStore<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> AppxStore<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn powershell(&self, operation: &str, subject: &str, script: String) -> Result<String> {
        let args: Vec<String> = vec![
            "-NoProfile".into(),
            "-NonInteractive".into(),
            "-Command".into(),
            script,
        ];
        let result = self
            .runner
            .run("powershell", &args, &CommandOptions::captured())?;
        if result.success {
            Ok(result.stdout)
        } else {
            Err(WinstrapError::PackageFailed {
                operation: operation.to_string(),
                package: subject.to_string(),
                status: exit_status_label(result.exit_code),
                output: result.failure_detail(),
            })
        }
    }
}

impl PackageStore for AppxStore<'_> {
    fn find(&self, query: &str) -> Result<Vec<String>> {
        let script = format!(
            "Get-AppxPackage -AllUsers -Name {} | ForEach-Object {{ $_.PackageFullName }}",
            ps_quote(query)
        );
        let stdout = self.powershell("Query", query, script)?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn remove(&self, full_name: &str) -> Result<()> {
        let script = format!(
            "Remove-AppxPackage -AllUsers -Package {} -ErrorAction Stop",
            ps_quote(full_name)
        );
        self.powershell("Removal", full_name, script).map(|_| ())
    }
}

/// Single-quote a PowerShell string literal.
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// What a removal pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    pub removed: Vec<String>,
    pub would_remove: Vec<String>,
    pub failed: Vec<String>,
    pub not_found: Vec<String>,
    pub query_failed: Vec<String>,
}

/// Remove every package matched by `list`.
///
/// Packages matched by more than one query are handled once. In dry-run
/// mode matches are reported and left in place.
pub fn remove_bloatware(
    list: &RemovalList,
    store: &dyn PackageStore,
    dry_run: bool,
    log: &mut RunLog,
) -> RemovalSummary {
    let mut summary = RemovalSummary::default();
    let mut handled = HashSet::new();

    for query in list.queries() {
        let matches = match store.find(query) {
            Ok(matches) => matches,
            Err(e) => {
                log.warning(format!("Could not query {}: {}", query, e));
                summary.query_failed.push(query.to_string());
                continue;
            }
        };

        if matches.is_empty() {
            log.info(format!("{} not found, skipping", query));
            summary.not_found.push(query.to_string());
            continue;
        }

        for full_name in matches {
            if !handled.insert(full_name.clone()) {
                continue;
            }

            if dry_run {
                log.info(format!("Would remove {}", full_name));
                summary.would_remove.push(full_name);
                continue;
            }

            match store.remove(&full_name) {
                Ok(()) => {
                    log.info(format!("Removed {}", full_name));
                    summary.removed.push(full_name);
                }
                Err(e) => {
                    log.error(format!("Failed to remove {}: {}", full_name, e));
                    summary.failed.push(full_name);
                }
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRunner, MockStore};
    use crate::runlog::LogLevel;

    const WEATHER: &str = "Microsoft.BingWeather_4.53.52220.0_x64__8wekyb3d8bbwe";
    const XBOX_BAR: &str = "Microsoft.XboxGamingOverlay_7.124.5142.0_x64__8wekyb3d8bbwe";
    const XBOX_ID: &str = "Microsoft.XboxIdentityProvider_12.115.1001.0_x64__8wekyb3d8bbwe";

    fn list(exact: &[&str], patterns: &[&str]) -> RemovalList {
        RemovalList {
            exact: exact.iter().map(|s| s.to_string()).collect(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn absent_package_logs_not_found() {
        let store = MockStore::new(&[]);
        let mut log = RunLog::memory();

        let summary =
            remove_bloatware(&list(&["Microsoft.BingWeather"], &[]), &store, false, &mut log);

        assert_eq!(summary.not_found, vec!["Microsoft.BingWeather"]);
        assert!(log.contains(LogLevel::Info, "Microsoft.BingWeather not found"));
        assert_eq!(log.count(LogLevel::Error), 0);
        assert!(store.removed().is_empty());
    }

    #[test]
    fn exact_and_pattern_matches_are_removed() {
        let store = MockStore::new(&[WEATHER, XBOX_BAR, XBOX_ID]);
        let mut log = RunLog::memory();

        let summary = remove_bloatware(
            &list(&["Microsoft.BingWeather"], &["*Xbox*"]),
            &store,
            false,
            &mut log,
        );

        assert_eq!(summary.removed, vec![WEATHER, XBOX_BAR, XBOX_ID]);
        assert_eq!(store.removed(), vec![WEATHER, XBOX_BAR, XBOX_ID]);
    }

    #[test]
    fn overlapping_queries_remove_once() {
        let store = MockStore::new(&[XBOX_BAR]);
        let mut log = RunLog::memory();

        let summary = remove_bloatware(
            &list(&["Microsoft.XboxGamingOverlay"], &["*Xbox*"]),
            &store,
            false,
            &mut log,
        );

        assert_eq!(summary.removed, vec![XBOX_BAR]);
        assert_eq!(store.removed().len(), 1);
    }

    #[test]
    fn failed_removal_is_logged_and_loop_continues() {
        let store = MockStore::new(&[WEATHER, XBOX_BAR]).failing_removal(WEATHER);
        let mut log = RunLog::memory();

        let summary = remove_bloatware(
            &list(&["Microsoft.BingWeather", "Microsoft.XboxGamingOverlay"], &[]),
            &store,
            false,
            &mut log,
        );

        assert_eq!(summary.failed, vec![WEATHER]);
        assert_eq!(summary.removed, vec![XBOX_BAR]);
        assert!(log.contains(LogLevel::Error, "Failed to remove Microsoft.BingWeather"));
    }

    #[test]
    fn failed_query_warns() {
        let store = MockStore::new(&[XBOX_BAR]).failing_query("*CandyCrush*");
        let mut log = RunLog::memory();

        let queries = list(&[], &["*CandyCrush*", "*Xbox*"]);
        let summary = remove_bloatware(&queries, &store, false, &mut log);

        assert_eq!(summary.query_failed, vec!["*CandyCrush*"]);
        assert_eq!(summary.removed, vec![XBOX_BAR]);
        assert_eq!(log.count(LogLevel::Warning), 1);
    }

    #[test]
    fn dry_run_removes_nothing() {
        let store = MockStore::new(&[WEATHER]);
        let mut log = RunLog::memory();

        let summary =
            remove_bloatware(&list(&["Microsoft.BingWeather"], &[]), &store, true, &mut log);

        assert_eq!(summary.would_remove, vec![WEATHER]);
        assert!(store.removed().is_empty());
        assert!(log.contains(LogLevel::Info, "Would remove"));
    }

    #[test]
    fn appx_store_quotes_names() {
        let listing = format!("{}\r\n\r\n", WEATHER);
        let runner = MockRunner::new().respond("Get-AppxPackage", 0, &listing);
        let store = AppxStore::new(&runner);

        let found = store.find("Microsoft.BingWeather").unwrap();

        assert_eq!(found, vec![WEATHER]);
        assert!(runner.ran("-Name 'Microsoft.BingWeather'"));
    }

    #[test]
    fn appx_store_removal_failure_is_an_error() {
        let runner = MockRunner::new().respond(
            "Remove-AppxPackage",
            1,
            "Deployment failed with HRESULT: 0x80073CFA",
        );
        let store = AppxStore::new(&runner);

        let err = store.remove(WEATHER).unwrap_err();

        assert!(err.to_string().contains("0x80073CFA"));
    }

    #[test]
    fn ps_quote_doubles_single_quotes() {
        assert_eq!(ps_quote("it's"), "'it''s'");
    }
}
