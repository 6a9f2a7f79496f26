//! The Windows package manager.
//!
//! Every `winget` invocation the run makes is built here so the flags
//! stay in one place. Commands always accept source and package
//! agreements and disable interactivity; an elevated unattended run has
//! nobody to answer a prompt.

use crate::error::{Result, WinstrapError};
use crate::shell::{exit_status_label, CommandOptions, CommandResult, CommandRunner};

/// Program name.
pub const WINGET: &str = "winget";

/// `APPINSTALLER_CLI_ERROR_UPDATE_NOT_APPLICABLE` (0x8A15002B).
pub const UPDATE_NOT_APPLICABLE: i32 = 0x8A15_002Bu32 as i32;

/// `APPINSTALLER_CLI_ERROR_PACKAGE_ALREADY_INSTALLED` (0x8A150061).
pub const PACKAGE_ALREADY_INSTALLED: i32 = 0x8A15_0061u32 as i32;

/// Messages `winget upgrade` prints instead of a table when nothing is
/// upgradable. Matched case-insensitively.
const NO_UPGRADES: &[&str] = &[
    "no installed package found",
    "no applicable upgrade",
    "no available upgrade",
];

const NON_INTERACTIVE: &[&str] = &["--accept-source-agreements", "--disable-interactivity"];

/// What an install or upgrade did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The package was installed or upgraded.
    Changed,
    /// winget reported nothing to do.
    AlreadyCurrent,
}

/// Thin client over the `winget` command line.
pub struct Winget<'a> {
    runner: &'a dyn CommandRunner,
    stream_output: bool,
}

impl<'a> Winget<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            stream_output: false,
        }
    }

    /// Let install and upgrade output through to the terminal.
    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream_output = stream;
        self
    }

    /// `winget --version`, or [`WinstrapError::PackageManagerMissing`].
    pub fn version(&self) -> Result<String> {
        let missing = |message: String| WinstrapError::PackageManagerMissing {
            name: WINGET.to_string(),
            message,
        };

        let result = self
            .runner
            .run(WINGET, &["--version".to_string()], &CommandOptions::captured())
            .map_err(|_| {
                missing("not found on PATH. Install App Installer from the Microsoft Store.".into())
            })?;

        if !result.success {
            return Err(missing(format!(
                "`winget --version` failed ({})",
                exit_status_label(result.exit_code)
            )));
        }
        Ok(result.stdout.trim().to_string())
    }

    /// Raw `winget list` output.
    pub fn list(&self) -> Result<CommandResult> {
        self.listing("list")
    }

    /// Raw `winget upgrade` output (packages with an available upgrade).
    pub fn upgrade_listing(&self) -> Result<CommandResult> {
        self.listing("upgrade")
    }

    pub fn install(&self, id: &str) -> Result<Outcome> {
        self.change("Install", id, install_args(id))
    }

    pub fn upgrade(&self, id: &str) -> Result<Outcome> {
        self.change("Upgrade", id, upgrade_args(id))
    }

    fn listing(&self, verb: &str) -> Result<CommandResult> {
        let mut args = vec![verb.to_string()];
        args.extend(NON_INTERACTIVE.iter().map(|s| s.to_string()));
        self.runner.run(WINGET, &args, &CommandOptions::captured())
    }

    fn change(&self, operation: &str, id: &str, args: Vec<String>) -> Result<Outcome> {
        let options = if self.stream_output {
            CommandOptions::inherited()
        } else {
            CommandOptions::captured()
        };
        let result = self.runner.run(WINGET, &args, &options)?;
        interpret(operation, id, &result)
    }
}

/// Whether `winget upgrade` output says there is nothing to upgrade.
pub fn reports_no_upgrades(output: &str) -> bool {
    let output = output.to_lowercase();
    NO_UPGRADES.iter().any(|m| output.contains(m))
}

pub fn install_args(id: &str) -> Vec<String> {
    package_args("install", id)
}

pub fn upgrade_args(id: &str) -> Vec<String> {
    package_args("upgrade", id)
}

fn package_args(verb: &str, id: &str) -> Vec<String> {
    let mut args: Vec<String> = [verb, "--id", id, "--exact", "--silent"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.extend(NON_INTERACTIVE.iter().map(|s| s.to_string()));
    args.push("--accept-package-agreements".to_string());
    args
}

/// Map a winget exit status to an [`Outcome`].
pub fn interpret(operation: &str, id: &str, result: &CommandResult) -> Result<Outcome> {
    match result.exit_code {
        Some(0) if result.success => Ok(Outcome::Changed),
        Some(UPDATE_NOT_APPLICABLE) | Some(PACKAGE_ALREADY_INSTALLED) => {
            Ok(Outcome::AlreadyCurrent)
        }
        code => Err(WinstrapError::PackageFailed {
            operation: operation.to_string(),
            package: id.to_string(),
            status: exit_status_label(code),
            output: result.failure_detail(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;

    fn exited(code: i32, stdout: &str) -> CommandResult {
        if code == 0 {
            CommandResult::success(stdout.to_string(), String::new())
        } else {
            CommandResult::failure(Some(code), stdout.to_string(), String::new())
        }
    }

    #[test]
    fn benign_exit_codes_match_hresults() {
        assert_eq!(UPDATE_NOT_APPLICABLE, -1978335189);
        assert_eq!(PACKAGE_ALREADY_INSTALLED, -1978335135);
    }

    #[test]
    fn interpret_success() {
        let outcome = interpret("Install", "Git.Git", &exited(0, "")).unwrap();
        assert_eq!(outcome, Outcome::Changed);
    }

    #[test]
    fn interpret_benign_codes() {
        let outcome = interpret("Upgrade", "Git.Git", &exited(UPDATE_NOT_APPLICABLE, "")).unwrap();
        assert_eq!(outcome, Outcome::AlreadyCurrent);
        let outcome =
            interpret("Install", "Git.Git", &exited(PACKAGE_ALREADY_INSTALLED, "")).unwrap();
        assert_eq!(outcome, Outcome::AlreadyCurrent);
    }

    #[test]
    fn interpret_failure_carries_output_tail() {
        let err = interpret(
            "Install",
            "Neovim.Neovim",
            &exited(0x8A15_0011u32 as i32, "Downloading\nInstaller hash does not match."),
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Install of 'Neovim.Neovim' failed (exit code 0x8A150011)"));
        assert!(message.ends_with(": Downloading | Installer hash does not match."));
    }

    #[test]
    fn install_uses_exact_silent_flags() {
        let runner = MockRunner::new();
        Winget::new(&runner).install("Git.Git").unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            "winget install --id Git.Git --exact --silent --accept-source-agreements \
             --disable-interactivity --accept-package-agreements"
        );
    }

    #[test]
    fn upgrade_targets_single_id() {
        let runner = MockRunner::new();
        Winget::new(&runner).upgrade("Neovim.Neovim").unwrap();
        assert!(runner.ran("winget upgrade --id Neovim.Neovim --exact"));
    }

    #[test]
    fn version_reports_missing_winget() {
        let runner = MockRunner::new().fail_spawn("winget --version");
        let err = Winget::new(&runner).version().unwrap_err();
        assert!(matches!(err, WinstrapError::PackageManagerMissing { .. }));
    }

    #[test]
    fn version_trims_output() {
        let runner = MockRunner::new().respond("winget --version", 0, "v1.9.25200\r\n");
        assert_eq!(Winget::new(&runner).version().unwrap(), "v1.9.25200");
    }

    #[test]
    fn listing_is_non_interactive() {
        let runner = MockRunner::new();
        Winget::new(&runner).list().unwrap();
        Winget::new(&runner).upgrade_listing().unwrap();
        assert!(runner.ran("winget list --accept-source-agreements --disable-interactivity"));
        assert!(runner.ran("winget upgrade --accept-source-agreements --disable-interactivity"));
    }

    #[test]
    fn recognizes_nothing_to_upgrade_replies() {
        assert!(reports_no_upgrades("No installed package found matching input criteria."));
        assert!(reports_no_upgrades("  -\r\nNo applicable upgrade found.\r\n"));
        assert!(!reports_no_upgrades("Name  Id  Version  Available\n----\n"));
    }
}
