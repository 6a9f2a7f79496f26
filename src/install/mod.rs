//! Package installation.
//!
//! The installer walks an [`InstallationPlan`]: winget packages first,
//! then extra tools. Every entry is attempted on its own; a failure is
//! logged at ERROR and the walk continues.
//!
//! - [`release`] - GitHub release lookups and installer downloads
//! - [`extras`] - npm, direct-download and release-based tools

pub mod extras;
pub mod release;

pub use release::{
    extract_version, installer_file_name, is_newer_version, Fetcher, ReleaseClient, ReleaseInfo,
};

use crate::catalog::PackageEntry;
use crate::plan::{InstallationPlan, PlanTarget};
use crate::runlog::RunLog;
use crate::scan::InstalledSet;
use crate::shell::{display_command, CommandRunner, HostEnv};
use crate::ui::ProgressSpinner;
use crate::winget::{install_args, upgrade_args, Outcome, Winget, WINGET};
use std::path::PathBuf;

/// How the installer behaves for this run.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Upgrade entries that are already present.
    pub update: bool,
    /// Stream tool output to the terminal and log each command line.
    pub verbose: bool,
    /// Show a spinner while a command runs.
    pub spinner: bool,
}

/// What the installer did, by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub upgraded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// Executes the install half of a plan.
pub struct Installer<'a> {
    runner: &'a dyn CommandRunner,
    fetcher: &'a dyn Fetcher,
    options: InstallOptions,
    download_dir: PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        fetcher: &'a dyn Fetcher,
        options: InstallOptions,
    ) -> Self {
        Self {
            runner,
            fetcher,
            options,
            download_dir: std::env::temp_dir().join("winstrap"),
        }
    }

    /// Where downloaded installers are staged.
    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = dir;
        self
    }

    /// Install everything in `plan.to_install`; in update mode also
    /// upgrade what is already present.
    ///
    /// `upgradable` is the set winget reports upgrades for. `None` in
    /// update mode means that set is unknown and every present package is
    /// upgraded.
    pub fn run(
        &self,
        plan: &InstallationPlan,
        upgradable: Option<&InstalledSet>,
        host: &mut HostEnv,
        log: &mut RunLog,
    ) -> InstallReport {
        let mut report = InstallReport::default();

        for item in &plan.to_install {
            if let PlanTarget::Package(entry) = &item.target {
                self.install_package(entry, &mut report, log);
            }
        }

        for item in &plan.already_installed {
            if let PlanTarget::Package(entry) = &item.target {
                if !self.options.update {
                    log.detail(format!("{} already installed, skipping", entry.name));
                    report.skipped.push(entry.name.clone());
                } else if upgradable.is_none_or(|set| set.contains(&entry.id)) {
                    self.upgrade_package(entry, &mut report, log);
                } else {
                    log.info(format!("{} is up to date", entry.name));
                    report.skipped.push(entry.name.clone());
                }
            }
        }

        if !report.installed.is_empty() || !report.upgraded.is_empty() {
            let added = host.refresh_path(self.runner);
            if added > 0 {
                log.detail(format!("Picked up {} new PATH entries", added));
            }
        }

        for item in &plan.to_install {
            if let PlanTarget::Extra(tool) = &item.target {
                self.install_extra(tool, false, host, &mut report, log);
            }
        }

        for item in &plan.already_installed {
            if let PlanTarget::Extra(tool) = &item.target {
                if self.options.update {
                    self.install_extra(tool, true, host, &mut report, log);
                } else {
                    log.detail(format!("{} already installed, skipping", tool.name()));
                    report.skipped.push(tool.name().to_string());
                }
            }
        }

        report
    }

    fn winget(&self) -> Winget<'_> {
        Winget::new(self.runner).streaming(self.options.verbose)
    }

    fn spinner(&self, message: &str) -> ProgressSpinner {
        ProgressSpinner::maybe(self.options.spinner && !self.options.verbose, message)
    }

    fn install_package(&self, entry: &PackageEntry, report: &mut InstallReport, log: &mut RunLog) {
        log.info(format!("Installing {} ({})", entry.name, entry.id));
        log.detail(display_command(WINGET, &install_args(&entry.id)));
        let spinner = self.spinner(&format!("Installing {}", entry.name));
        let result = self.winget().install(&entry.id);
        spinner.finish();

        match result {
            Ok(Outcome::Changed) => {
                log.info(format!("Installed {}", entry.name));
                report.installed.push(entry.name.clone());
            }
            Ok(Outcome::AlreadyCurrent) => {
                log.info(format!("{} was already installed", entry.name));
                report.skipped.push(entry.name.clone());
            }
            Err(e) => {
                log.error(format!("{}: {}", entry.name, e));
                report.failed.push(entry.name.clone());
            }
        }
    }

    fn upgrade_package(&self, entry: &PackageEntry, report: &mut InstallReport, log: &mut RunLog) {
        log.info(format!("Upgrading {} ({})", entry.name, entry.id));
        log.detail(display_command(WINGET, &upgrade_args(&entry.id)));
        let spinner = self.spinner(&format!("Upgrading {}", entry.name));
        let result = self.winget().upgrade(&entry.id);
        spinner.finish();

        match result {
            Ok(Outcome::Changed) => {
                log.info(format!("Upgraded {}", entry.name));
                report.upgraded.push(entry.name.clone());
            }
            Ok(Outcome::AlreadyCurrent) => {
                log.info(format!("{} is up to date", entry.name));
                report.skipped.push(entry.name.clone());
            }
            Err(e) => {
                log.error(format!("{}: {}", entry.name, e));
                report.failed.push(entry.name.clone());
            }
        }
    }
}
