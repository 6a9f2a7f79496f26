//! Tools installed outside winget.

use super::release::{extract_version, installer_file_name, is_newer_version, ReleaseInfo};
use super::{InstallReport, Installer};
use crate::catalog::{DownloadTool, ExtraTool, NpmTool, ReleaseTool};
use crate::error::{Result, WinstrapError};
use crate::runlog::RunLog;
use crate::shell::{display_command, exit_status_label, CommandOptions, HostEnv};
use std::fs;

enum ExtraOutcome {
    Installed,
    Upgraded,
    Skipped,
}

impl Installer<'_> {
    /// Install one extra tool. `present` is the result of its presence
    /// check; present tools are only handled in update mode.
    pub(super) fn install_extra(
        &self,
        tool: &ExtraTool,
        present: bool,
        host: &HostEnv,
        report: &mut InstallReport,
        log: &mut RunLog,
    ) {
        let name = tool.name().to_string();
        let outcome = match tool {
            ExtraTool::Npm(t) => self.install_npm(t, present, host, log),
            ExtraTool::Download(t) => self.install_download(t, present, log),
            ExtraTool::GithubRelease(t) => self.install_release(t, present, host, log),
        };

        match outcome {
            Ok(ExtraOutcome::Installed) => {
                log.info(format!("Installed {}", name));
                report.installed.push(name);
            }
            Ok(ExtraOutcome::Upgraded) => {
                log.info(format!("Updated {}", name));
                report.upgraded.push(name);
            }
            Ok(ExtraOutcome::Skipped) => report.skipped.push(name),
            Err(e) => {
                log.error(format!("{}: {}", name, e));
                report.failed.push(name);
            }
        }
    }

    fn install_npm(
        &self,
        tool: &NpmTool,
        present: bool,
        host: &HostEnv,
        log: &mut RunLog,
    ) -> Result<ExtraOutcome> {
        let Some(npm) = host.command_path("npm") else {
            log.warning(format!("npm not found on PATH; skipping {}", tool.name));
            return Ok(ExtraOutcome::Skipped);
        };

        let spec = if present {
            format!("{}@latest", tool.package)
        } else {
            tool.package.clone()
        };
        log.info(format!("Installing {} via npm", spec));

        let args = vec!["install".to_string(), "-g".to_string(), spec];
        self.run_program(&npm.to_string_lossy(), &args, &tool.name, log)?;
        Ok(if present {
            ExtraOutcome::Upgraded
        } else {
            ExtraOutcome::Installed
        })
    }

    fn install_download(
        &self,
        tool: &DownloadTool,
        present: bool,
        log: &mut RunLog,
    ) -> Result<ExtraOutcome> {
        if present {
            log.info(format!("Reinstalling {} to pick up updates", tool.name));
        }
        self.fetch_and_run(&tool.name, &tool.url, &tool.args, log)?;
        Ok(if present {
            ExtraOutcome::Upgraded
        } else {
            ExtraOutcome::Installed
        })
    }

    fn install_release(
        &self,
        tool: &ReleaseTool,
        present: bool,
        host: &HostEnv,
        log: &mut RunLog,
    ) -> Result<ExtraOutcome> {
        let release = match self.fetcher.latest_release(&tool.repo, &tool.asset_suffix) {
            Ok(release) => release,
            Err(e) => {
                log.warning(format!(
                    "Could not look up the latest {} release ({:#}); using {}",
                    tool.name, e, tool.fallback_version
                ));
                ReleaseInfo {
                    version: tool.fallback_version.clone(),
                    url: tool.fallback_url.clone(),
                }
            }
        };

        if present {
            match self.installed_version(&tool.command, host) {
                Some(current) if !is_newer_version(&release.version, &current) => {
                    log.info(format!("{} {} is up to date", tool.name, current));
                    return Ok(ExtraOutcome::Skipped);
                }
                Some(current) => log.info(format!(
                    "Updating {} {} -> {}",
                    tool.name, current, release.version
                )),
                None => log.warning(format!(
                    "Could not determine the installed {} version; reinstalling",
                    tool.name
                )),
            }
        }

        log.info(format!("{} {} from {}", tool.name, release.version, release.url));
        self.fetch_and_run(&tool.name, &release.url, &tool.args, log)?;
        Ok(if present {
            ExtraOutcome::Upgraded
        } else {
            ExtraOutcome::Installed
        })
    }

    /// Version reported by `<command> --version`.
    fn installed_version(&self, command: &str, host: &HostEnv) -> Option<String> {
        let program = host
            .command_path(command)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| command.to_string());

        let result = self
            .runner
            .run(&program, &["--version".to_string()], &CommandOptions::captured())
            .ok()
            .filter(|r| r.success)?;

        extract_version(&format!("{}\n{}", result.stdout, result.stderr))
    }

    /// Download an installer into the staging directory, run it, then
    /// delete it.
    fn fetch_and_run(
        &self,
        name: &str,
        url: &str,
        args: &[String],
        log: &mut RunLog,
    ) -> Result<()> {
        fs::create_dir_all(&self.download_dir)?;
        let dest = self.download_dir.join(installer_file_name(url));

        log.info(format!("Downloading {}", url));
        let spinner = self.spinner(&format!("Downloading {}", name));
        let downloaded = self.fetcher.download(url, &dest);
        spinner.finish();

        let outcome =
            downloaded.and_then(|()| self.run_program(&dest.to_string_lossy(), args, name, log));

        // A failed download can leave a partial file behind.
        if dest.exists() {
            if let Err(e) = fs::remove_file(&dest) {
                tracing::debug!("could not delete {}: {}", dest.display(), e);
            }
        }
        outcome
    }

    fn run_program(
        &self,
        program: &str,
        args: &[String],
        name: &str,
        log: &mut RunLog,
    ) -> Result<()> {
        log.detail(display_command(program, args));
        let options = if self.options.verbose {
            CommandOptions::inherited()
        } else {
            CommandOptions::captured()
        };

        let spinner = self.spinner(&format!("Installing {}", name));
        let result = self.runner.run(program, args, &options);
        spinner.finish();
        let result = result?;

        if result.success {
            Ok(())
        } else {
            Err(WinstrapError::PackageFailed {
                operation: "Install".to_string(),
                package: name.to_string(),
                status: exit_status_label(result.exit_code),
                output: result.failure_detail(),
            })
        }
    }
}
