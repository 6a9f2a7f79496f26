//! Builds the installed set for a run.

use crate::catalog::{AliasTable, Catalog, ExtraTool, Probe};
use crate::runlog::RunLog;
use crate::scan::installed::InstalledSet;
use crate::scan::listing::{is_separator, parse_listing};
use crate::shell::{exit_status_label, CommandRunner, HostEnv};
use crate::winget::{reports_no_upgrades, Winget};
use std::collections::BTreeSet;

/// What the scan found.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Catalog ids detected through the listing or a probe.
    pub installed: InstalledSet,
    /// Names of extra tools whose presence check passed.
    pub extras_present: BTreeSet<String>,
}

impl ScanResult {
    pub fn has_extra(&self, name: &str) -> bool {
        self.extras_present.contains(name)
    }
}

/// Scans winget's listing and the catalog probes.
pub struct Scanner<'a> {
    runner: &'a dyn CommandRunner,
    host: &'a HostEnv,
    aliases: &'a AliasTable,
}

impl<'a> Scanner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, host: &'a HostEnv, aliases: &'a AliasTable) -> Self {
        Self {
            runner,
            host,
            aliases,
        }
    }

    /// Detect installed catalog software.
    ///
    /// A listing that cannot be produced or read is logged as a WARNING
    /// and the scan carries on with probe results alone.
    pub fn scan(&self, catalog: &Catalog, log: &mut RunLog) -> ScanResult {
        let mut installed = InstalledSet::new(self.aliases.clone());

        if let Some(ids) = self.listing_ids("list", log) {
            installed.extend(&ids);
        }

        for probe in &catalog.probes {
            if self.probe_fires(probe) && installed.insert(&probe.id) {
                log.detail(format!("Probe detected {}", probe.id));
            }
        }

        let extras_present = catalog
            .extras
            .iter()
            .filter(|tool| self.extra_present(tool))
            .map(|tool| tool.name().to_string())
            .collect();

        ScanResult {
            installed,
            extras_present,
        }
    }

    /// Identifiers winget reports an upgrade for.
    ///
    /// `None` means the listing was unusable; callers then treat every
    /// installed entry as upgradable.
    pub fn upgradable(&self, log: &mut RunLog) -> Option<InstalledSet> {
        let ids = self.listing_ids("upgrade", log)?;
        Some(InstalledSet::from_ids(self.aliases.clone(), ids))
    }

    /// Whether a probe's command resolves or its path exists.
    pub fn probe_fires(&self, probe: &Probe) -> bool {
        probe
            .command
            .as_deref()
            .is_some_and(|cmd| self.host.has_command(cmd))
            || probe
                .path
                .as_deref()
                .is_some_and(|path| self.host.path_exists(path))
    }

    pub fn extra_present(&self, tool: &ExtraTool) -> bool {
        match tool {
            ExtraTool::Npm(t) => self.host.has_command(&t.command),
            ExtraTool::Download(t) => self.host.path_exists(&t.path),
            ExtraTool::GithubRelease(t) => self.host.has_command(&t.command),
        }
    }

    fn listing_ids(&self, verb: &str, log: &mut RunLog) -> Option<Vec<String>> {
        let winget = Winget::new(self.runner);
        let output = if verb == "upgrade" {
            winget.upgrade_listing()
        } else {
            winget.list()
        };

        let result = match output {
            Ok(result) if verb == "upgrade" && nothing_to_upgrade(&result.stdout) => {
                log.detail("winget upgrade: no upgrades available");
                return Some(Vec::new());
            }
            Ok(result) if result.success => result,
            Ok(result) => {
                log.warning(format!(
                    "winget {} failed ({}); continuing without it",
                    verb,
                    exit_status_label(result.exit_code)
                ));
                return None;
            }
            Err(e) => {
                log.warning(format!("winget {} could not run: {}", verb, e));
                return None;
            }
        };

        let listing = parse_listing(&result.stdout);
        if !listing.separator_found {
            log.warning(format!(
                "winget {} output format unrecognized; continuing without it",
                verb
            ));
            return None;
        }

        log.detail(format!(
            "winget {}: {} rows, {} identifiers",
            verb,
            listing.rows,
            listing.ids.len()
        ));
        Some(listing.ids)
    }
}

/// winget's "nothing to upgrade" reply, which has no table.
fn nothing_to_upgrade(stdout: &str) -> bool {
    !stdout.lines().any(is_separator) && reports_no_upgrades(stdout)
}
