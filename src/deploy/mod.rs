//! Config file deployment.
//!
//! Copies files and directories from the bundle directory to their
//! destinations, overwriting what is there. Each pair is handled on its
//! own; problems with one never stop the others.

use crate::catalog::ConfigFile;
use crate::runlog::RunLog;
use crate::shell::HostEnv;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// What a deploy pass did, by source path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploySummary {
    pub copied: Vec<String>,
    pub would_copy: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// Copy every config pair from `bundle_dir`.
pub fn deploy_configs(
    configs: &[ConfigFile],
    bundle_dir: &Path,
    host: &HostEnv,
    dry_run: bool,
    log: &mut RunLog,
) -> DeploySummary {
    let mut summary = DeploySummary::default();

    for config in configs {
        let source = bundle_dir.join(&config.source);
        if !source.exists() {
            log.warning(format!("Config source {} not found, skipping", source.display()));
            summary.skipped.push(config.source.clone());
            continue;
        }

        let destination = match host.expand(&config.destination) {
            Ok(destination) => destination,
            Err(var) => {
                log.warning(format!(
                    "Cannot resolve %{}% in {}, skipping {}",
                    var, config.destination, config.source
                ));
                summary.skipped.push(config.source.clone());
                continue;
            }
        };

        if dry_run {
            log.info(format!(
                "Would copy {} -> {}",
                source.display(),
                destination.display()
            ));
            summary.would_copy.push(config.source.clone());
            continue;
        }

        if let Some(parent) = destination.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log.error(format!("Cannot create {}: {}", parent.display(), e));
                summary.failed.push(config.source.clone());
                continue;
            }
        }

        match copy_path(&source, &destination) {
            Ok(files) => {
                log.info(format!(
                    "Copied {} -> {} ({} file{})",
                    config.source,
                    destination.display(),
                    files,
                    if files == 1 { "" } else { "s" }
                ));
                summary.copied.push(config.source.clone());
            }
            Err(e) => {
                log.error(format!("{:#}", e));
                summary.failed.push(config.source.clone());
            }
        }
    }

    summary
}

/// Copy a file, or a directory tree, returning the number of files copied.
pub fn copy_path(source: &Path, destination: &Path) -> anyhow::Result<usize> {
    if source.is_dir() {
        copy_dir(source, destination)
    } else {
        fs::copy(source, destination).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                source.display(),
                destination.display()
            )
        })?;
        Ok(1)
    }
}

fn copy_dir(source: &Path, destination: &Path) -> anyhow::Result<usize> {
    fs::create_dir_all(destination)
        .with_context(|| format!("Failed to create {}", destination.display()))?;

    let mut copied = 0;
    let entries = fs::read_dir(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    for entry in entries {
        let entry = entry?;
        let target: PathBuf = destination.join(entry.file_name());
        copied += copy_path(&entry.path(), &target)?;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runlog::LogLevel;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct Fixture {
        bundle: TempDir,
        home: TempDir,
        host: HostEnv,
    }

    fn fixture() -> Fixture {
        let bundle = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let mut vars = HashMap::new();
        vars.insert("USERPROFILE".to_string(), home.path().display().to_string());
        let host = HostEnv::with_vars(Vec::new(), None, vars);

        fs::create_dir_all(bundle.path().join("wezterm")).unwrap();
        fs::write(bundle.path().join("wezterm/wezterm.lua"), "return {}\n").unwrap();
        fs::create_dir_all(bundle.path().join("cmd/aliases/git")).unwrap();
        fs::write(bundle.path().join("cmd/aliases/macros.doskey"), "ls=dir $*\n").unwrap();
        fs::write(bundle.path().join("cmd/aliases/git/git.doskey"), "gs=git status\n").unwrap();

        Fixture { bundle, home, host }
    }

    fn pair(source: &str, destination: &str) -> ConfigFile {
        ConfigFile {
            source: source.to_string(),
            destination: destination.to_string(),
        }
    }

    #[test]
    fn copies_file_and_creates_parent() {
        let f = fixture();
        let mut log = RunLog::memory();
        let configs = [pair("wezterm/wezterm.lua", "%USERPROFILE%/.config/wezterm/wezterm.lua")];

        let summary = deploy_configs(&configs, f.bundle.path(), &f.host, false, &mut log);

        assert_eq!(summary.copied, vec!["wezterm/wezterm.lua"]);
        let copied = f.home.path().join(".config/wezterm/wezterm.lua");
        assert_eq!(fs::read_to_string(copied).unwrap(), "return {}\n");
    }

    #[test]
    fn overwrites_existing_destination() {
        let f = fixture();
        let dest = f.home.path().join(".wezterm.lua");
        fs::write(&dest, "old").unwrap();
        let mut log = RunLog::memory();

        deploy_configs(
            &[pair("wezterm/wezterm.lua", "%USERPROFILE%/.wezterm.lua")],
            f.bundle.path(),
            &f.host,
            false,
            &mut log,
        );

        assert_eq!(fs::read_to_string(dest).unwrap(), "return {}\n");
    }

    #[test]
    fn copies_directories_recursively() {
        let f = fixture();
        let mut log = RunLog::memory();

        let summary = deploy_configs(
            &[pair("cmd/aliases", "%USERPROFILE%/.cmd/aliases")],
            f.bundle.path(),
            &f.host,
            false,
            &mut log,
        );

        assert_eq!(summary.copied, vec!["cmd/aliases"]);
        let root = f.home.path().join(".cmd/aliases");
        assert!(root.join("macros.doskey").is_file());
        assert!(root.join("git/git.doskey").is_file());
        assert!(log.contains(LogLevel::Info, "(2 files)"));
    }

    #[test]
    fn missing_source_warns_and_continues() {
        let f = fixture();
        let mut log = RunLog::memory();

        let summary = deploy_configs(
            &[
                pair("nvim/init.lua", "%USERPROFILE%/nvim/init.lua"),
                pair("wezterm/wezterm.lua", "%USERPROFILE%/.wezterm.lua"),
            ],
            f.bundle.path(),
            &f.host,
            false,
            &mut log,
        );

        assert_eq!(summary.skipped, vec!["nvim/init.lua"]);
        assert_eq!(summary.copied, vec!["wezterm/wezterm.lua"]);
        assert!(log.contains(LogLevel::Warning, "not found"));
    }

    #[test]
    fn unresolved_variable_warns() {
        let f = fixture();
        let mut log = RunLog::memory();

        let summary = deploy_configs(
            &[pair("wezterm/wezterm.lua", "%LOCALAPPDATA%/wezterm.lua")],
            f.bundle.path(),
            &f.host,
            false,
            &mut log,
        );

        assert_eq!(summary.skipped, vec!["wezterm/wezterm.lua"]);
        assert!(log.contains(LogLevel::Warning, "%LOCALAPPDATA%"));
    }

    #[test]
    fn blocked_parent_is_an_error() {
        let f = fixture();
        fs::write(f.home.path().join("blocker"), "a file, not a directory").unwrap();
        let mut log = RunLog::memory();

        let summary = deploy_configs(
            &[pair("wezterm/wezterm.lua", "%USERPROFILE%/blocker/sub/wezterm.lua")],
            f.bundle.path(),
            &f.host,
            false,
            &mut log,
        );

        assert_eq!(summary.failed, vec!["wezterm/wezterm.lua"]);
        assert_eq!(log.count(LogLevel::Error), 1);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let f = fixture();
        let mut log = RunLog::memory();

        let summary = deploy_configs(
            &[
                pair("wezterm/wezterm.lua", "%USERPROFILE%/.wezterm.lua"),
                pair("cmd/aliases", "%USERPROFILE%/.cmd/aliases"),
            ],
            f.bundle.path(),
            &f.host,
            true,
            &mut log,
        );

        assert_eq!(summary.would_copy.len(), 2);
        assert!(fs::read_dir(f.home.path()).unwrap().next().is_none());
        assert!(log.contains(LogLevel::Info, "Would copy"));
    }
}
