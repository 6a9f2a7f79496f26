//! The bootstrap pipeline.
//!
//! Preflight, removal, scan, plan, install and config deployment run in
//! that order, once. Only preflight failures end the run early; every
//! later stage logs its own problems and carries on.

use super::args::Cli;
use crate::catalog::{self, LoadedCatalog};
use crate::deploy::{deploy_configs, DeploySummary};
use crate::error::{Result, WinstrapError};
use crate::install::{Fetcher, InstallOptions, InstallReport, Installer, ReleaseClient};
use crate::plan::{plan_with_extras, InstallationPlan, PlanTarget};
use crate::remove::{remove_bloatware, AppxStore, PackageStore, RemovalSummary};
use crate::runlog::RunLog;
use crate::scan::{InstalledSet, Scanner};
use crate::shell::{is_elevated, CommandRunner, HostEnv, SystemRunner};
use crate::ui::Theme;
use crate::winget::Winget;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Stage switches for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    pub skip_removal: bool,
    pub skip_install: bool,
    pub skip_configs: bool,
    pub dry_run: bool,
    pub update: bool,
    pub verbose: bool,
}

impl From<&Cli> for RunFlags {
    fn from(cli: &Cli) -> Self {
        Self {
            skip_removal: cli.skip_removal,
            skip_install: cli.skip_install,
            skip_configs: cli.skip_configs,
            dry_run: cli.dry_run,
            update: cli.update,
            verbose: cli.verbose,
        }
    }
}

/// What each stage did. Skipped stages are `None`.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub plan: Option<InstallationPlan>,
    pub removal: Option<RemovalSummary>,
    pub install: Option<InstallReport>,
    pub deploy: Option<DeploySummary>,
}

/// Everything a run needs from the outside world.
pub struct Pipeline<'a> {
    pub loaded: &'a LoadedCatalog,
    pub runner: &'a dyn CommandRunner,
    pub store: &'a dyn PackageStore,
    pub fetcher: &'a dyn Fetcher,
    pub bundle_dir: PathBuf,
    pub elevated: bool,
    pub flags: RunFlags,
    /// Show spinners while commands run.
    pub spinner: bool,
    /// Staging directory for downloaded installers (default: temp dir).
    pub download_dir: Option<PathBuf>,
}

impl Pipeline<'_> {
    pub fn run(&self, host: &mut HostEnv, log: &mut RunLog) -> Result<RunSummary> {
        let flags = self.flags;
        let catalog = &self.loaded.catalog;
        let mut summary = RunSummary::default();

        self.preflight(log)?;
        if flags.dry_run {
            log.info("Dry run: nothing will be removed, installed or copied");
        }

        if flags.skip_removal {
            log.info("Skipping bloatware removal");
        } else {
            log.section("Removing bloatware");
            summary.removal = Some(remove_bloatware(
                &catalog.removals,
                self.store,
                flags.dry_run,
                log,
            ));
        }

        if flags.skip_install {
            log.info("Skipping package installation");
        } else {
            log.section("Scanning installed software");
            let scanner = Scanner::new(self.runner, host, &self.loaded.aliases);
            let scan = scanner.scan(catalog, log);
            log.info(format!("Detected {} catalog identifiers", scan.installed.len()));

            let plan = plan_with_extras(catalog, &scan);
            for line in plan.render().lines() {
                log.info(line);
            }

            let upgradable = if flags.update {
                scanner.upgradable(log)
            } else {
                None
            };

            if flags.dry_run {
                if flags.update {
                    log_would_upgrade(&plan, upgradable.as_ref(), log);
                }
            } else {
                log.section("Installing packages");
                let mut installer = Installer::new(
                    self.runner,
                    self.fetcher,
                    InstallOptions {
                        update: flags.update,
                        verbose: flags.verbose,
                        spinner: self.spinner,
                    },
                );
                if let Some(dir) = &self.download_dir {
                    installer = installer.with_download_dir(dir.clone());
                }
                let report = installer.run(&plan, upgradable.as_ref(), host, log);
                log.info(format!(
                    "Installed {}, upgraded {}, skipped {}, failed {}",
                    report.installed.len(),
                    report.upgraded.len(),
                    report.skipped.len(),
                    report.failed.len()
                ));
                summary.install = Some(report);
            }
            summary.plan = Some(plan);
        }

        if flags.skip_configs {
            log.info("Skipping config deployment");
        } else {
            log.section("Deploying configs");
            summary.deploy = Some(deploy_configs(
                &catalog.configs,
                &self.bundle_dir,
                host,
                flags.dry_run,
                log,
            ));
        }

        Ok(summary)
    }

    /// Elevation and winget checks. Nothing has been changed when these fail.
    fn preflight(&self, log: &mut RunLog) -> Result<()> {
        if !self.elevated {
            return Err(WinstrapError::NotElevated {
                hint: "Re-run winstrap from a terminal started with \"Run as administrator\"."
                    .to_string(),
            });
        }

        let version = Winget::new(self.runner).version()?;
        log.info(format!("Using winget {}", version));
        Ok(())
    }
}

fn log_would_upgrade(
    plan: &InstallationPlan,
    upgradable: Option<&InstalledSet>,
    log: &mut RunLog,
) {
    for item in &plan.already_installed {
        match &item.target {
            PlanTarget::Package(entry) => {
                if upgradable.is_none_or(|set| set.contains(&entry.id)) {
                    log.info(format!("Would upgrade {}", item.name));
                }
            }
            PlanTarget::Extra(_) => log.info(format!("Would check {} for updates", item.name)),
        }
    }
}

/// `<local data dir>/winstrap/logs`, or the temp dir when there is none.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("winstrap")
        .join("logs")
}

/// `configs` next to the executable, else `configs` in the working directory.
pub fn default_bundle_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("configs")))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from("configs"))
}

/// Run winstrap against this machine.
pub fn run(cli: &Cli, theme: Theme) -> Result<RunSummary> {
    let loaded = catalog::load(cli.catalog.as_deref())?;

    let log_dir = cli.log_dir.clone().unwrap_or_else(default_log_dir);
    let mut log = RunLog::open(&log_dir, &Local::now(), Some(theme), cli.verbose)?;
    log.info(format!("winstrap {}", env!("CARGO_PKG_VERSION")));
    if let Some(path) = log.path().map(Path::to_path_buf) {
        log.info(format!("Logging to {}", path.display()));
    }

    let runner = SystemRunner;
    let store = AppxStore::new(&runner);
    let fetcher = ReleaseClient::new()?;

    let pipeline = Pipeline {
        loaded: &loaded,
        runner: &runner,
        store: &store,
        fetcher: &fetcher,
        bundle_dir: cli.bundle_dir.clone().unwrap_or_else(default_bundle_dir),
        elevated: is_elevated(),
        flags: RunFlags::from(cli),
        spinner: console::user_attended() && !cli.verbose,
        download_dir: None,
    };

    let mut host = HostEnv::from_env();
    match pipeline.run(&mut host, &mut log) {
        Ok(summary) => {
            log.info("Finished");
            Ok(summary)
        }
        Err(e) => {
            log.error(e.to_string());
            Err(e)
        }
    }
}
