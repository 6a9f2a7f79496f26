//! External command execution.
//!
//! Everything winstrap does to the machine goes through a program
//! invocation: `winget`, `npm`, `powershell`, downloaded installers.
//! Components take a [`CommandRunner`] so tests can script the responses.

use crate::error::{Result, WinstrapError};
use std::process::{Command, Stdio};

/// Result of executing an external command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output (empty when not captured).
    pub stdout: String,

    /// Standard error (empty when not captured).
    pub stderr: String,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            success: false,
        }
    }

    /// Last few non-empty lines of combined output, for error messages.
    pub fn output_tail(&self, max_lines: usize) -> String {
        let lines: Vec<&str> = self
            .stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let start = lines.len().saturating_sub(max_lines);
        lines[start..].join(" | ")
    }

    /// `": <tail>"` for error messages, or empty when nothing was captured.
    pub fn failure_detail(&self) -> String {
        let tail = self.output_tail(3);
        if tail.is_empty() {
            String::new()
        } else {
            format!(": {}", tail)
        }
    }
}

/// Human-readable exit status. Negative codes are HRESULTs and read
/// better in hex.
pub fn exit_status_label(code: Option<i32>) -> String {
    match code {
        Some(c) if c < 0 => format!("exit code 0x{:08X}", c as u32),
        Some(c) => format!("exit code {}", c),
        None => "terminated".to_string(),
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOptions {
    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,
}

impl CommandOptions {
    /// Capture both streams.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
        }
    }

    /// Inherit both streams from the parent (output goes to the terminal).
    pub fn inherited() -> Self {
        Self::default()
    }
}

/// Seam for running external programs.
pub trait CommandRunner {
    /// Run `program` with `args` and wait for it to exit.
    ///
    /// Returns `Err` only when the program could not be started; a non-zero
    /// exit is reported through [`CommandResult::success`].
    fn run(
        &self,
        program: &str,
        args: &[String],
        options: &CommandOptions,
    ) -> Result<CommandResult>;
}

/// Runs commands on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        options: &CommandOptions,
    ) -> Result<CommandResult> {
        execute(program, args, options)
    }
}

/// Render a program invocation for logs.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.contains(' ') {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Execute a program directly (no intermediate shell).
pub fn execute(program: &str, args: &[String], options: &CommandOptions) -> Result<CommandResult> {
    tracing::debug!("exec: {}", display_command(program, args));

    let mut cmd = Command::new(program);
    cmd.args(args);

    if options.capture_stdout {
        cmd.stdout(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
    }

    if options.capture_stderr {
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stderr(Stdio::inherit());
    }

    let output = cmd.output().map_err(|e| {
        tracing::debug!("spawn of {} failed: {}", program, e);
        WinstrapError::CommandFailed {
            command: display_command(program, args),
            code: None,
        }
    })?;

    let stdout = if options.capture_stdout {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::new()
    };

    let stderr = if options.capture_stderr {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::new()
    };

    if output.status.success() {
        Ok(CommandResult::success(stdout, stderr))
    } else {
        Ok(CommandResult::failure(output.status.code(), stdout, stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn display_command_quotes_args_with_spaces() {
        let line = display_command("powershell", &args(&["-Command", "Get-AppxPackage -Name x"]));
        assert_eq!(line, "powershell -Command \"Get-AppxPackage -Name x\"");
    }

    #[test]
    fn display_command_without_args() {
        assert_eq!(display_command("winget", &[]), "winget");
    }

    #[test]
    fn missing_program_is_an_error() {
        let result = execute(
            "this-command-does-not-exist-12345",
            &[],
            &CommandOptions::captured(),
        );
        assert!(matches!(
            result,
            Err(WinstrapError::CommandFailed { code: None, .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn execute_captures_stdout() {
        let result = execute("echo", &args(&["hello"]), &CommandOptions::captured()).unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hello");
        assert_eq!(result.exit_code, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn execute_reports_exit_code() {
        let result = execute("sh", &args(&["-c", "exit 3"]), &CommandOptions::captured()).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn output_tail_keeps_last_lines() {
        let result = CommandResult::failure(
            Some(1),
            "one\n\ntwo\nthree\n".to_string(),
            "four\n".to_string(),
        );
        assert_eq!(result.output_tail(2), "three | four");
        assert_eq!(result.output_tail(10), "one | two | three | four");
    }

    #[test]
    fn failure_detail_empty_without_output() {
        let result = CommandResult::failure(Some(1), String::new(), String::new());
        assert_eq!(result.failure_detail(), "");
    }

    #[test]
    fn exit_status_label_formats_hresults_in_hex() {
        assert_eq!(exit_status_label(Some(-1978335189)), "exit code 0x8A15002B");
        assert_eq!(exit_status_label(Some(2)), "exit code 2");
        assert_eq!(exit_status_label(None), "terminated");
    }

    #[test]
    fn captured_options_capture_both_streams() {
        let opts = CommandOptions::captured();
        assert!(opts.capture_stdout);
        assert!(opts.capture_stderr);
        let opts = CommandOptions::inherited();
        assert!(!opts.capture_stdout);
        assert!(!opts.capture_stderr);
    }
}
