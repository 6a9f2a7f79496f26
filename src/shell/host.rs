//! Host environment view used for probes and destination paths.
//!
//! Tool lookup walks PATH entries directly instead of shelling out to
//! `where`/`which`, which behave differently across hosts and return
//! errors that are hard to tell apart from "not found".

use crate::shell::command::{CommandOptions, CommandRunner};
use crate::shell::platform::{env_lookup, expand_env_vars};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// PATH entries, executable extensions, and environment variables.
#[derive(Debug, Clone)]
pub struct HostEnv {
    path_entries: Vec<PathBuf>,
    pathext: Option<String>,
    /// `None` reads the process environment.
    vars: Option<HashMap<String, String>>,
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// File names to try for `tool` given a `PATHEXT`-style extension list.
///
/// A tool that already carries an extension is only tried as-is.
pub fn candidate_names(tool: &str, pathext: Option<&str>) -> Vec<String> {
    let Some(pathext) = pathext else {
        return vec![tool.to_string()];
    };
    if Path::new(tool).extension().is_some() {
        return vec![tool.to_string()];
    }

    let mut names: Vec<String> = pathext
        .split(';')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!("{}{}", tool, ext.to_lowercase()))
        .collect();
    names.push(tool.to_string());
    names
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable.
pub fn resolve_tool_path(
    tool: &str,
    path_entries: &[PathBuf],
    pathext: Option<&str>,
) -> Option<PathBuf> {
    let names = candidate_names(tool, pathext);
    for dir in path_entries {
        for name in &names {
            let candidate = dir.join(name);
            if candidate.is_file() && is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

impl HostEnv {
    /// Snapshot the process environment.
    pub fn from_env() -> Self {
        let pathext = if cfg!(windows) {
            Some(env_lookup("PATHEXT").unwrap_or_else(|| ".COM;.EXE;.BAT;.CMD".to_string()))
        } else {
            None
        };
        Self {
            path_entries: parse_system_path(),
            pathext,
            vars: None,
        }
    }

    /// A fully specified environment (tests, dry runs against fixtures).
    pub fn with_vars(
        path_entries: Vec<PathBuf>,
        pathext: Option<&str>,
        vars: HashMap<String, String>,
    ) -> Self {
        Self {
            path_entries,
            pathext: pathext.map(str::to_string),
            vars: Some(vars),
        }
    }

    /// Look up an environment variable.
    pub fn var(&self, name: &str) -> Option<String> {
        match &self.vars {
            Some(vars) => vars
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
                .filter(|v| !v.is_empty()),
            None => env_lookup(name),
        }
    }

    /// Full path of `tool` on PATH.
    pub fn command_path(&self, tool: &str) -> Option<PathBuf> {
        resolve_tool_path(tool, &self.path_entries, self.pathext.as_deref())
    }

    pub fn has_command(&self, tool: &str) -> bool {
        self.command_path(tool).is_some()
    }

    /// Expand `%VAR%` references in `raw`.
    ///
    /// Returns the name of the first unresolved variable on failure.
    pub fn expand(&self, raw: &str) -> Result<PathBuf, String> {
        expand_env_vars(raw, |name| self.var(name)).map(PathBuf::from)
    }

    /// Whether `raw` expands to an existing path.
    pub fn path_exists(&self, raw: &str) -> bool {
        self.expand(raw).map(|p| p.exists()).unwrap_or(false)
    }

    /// Pick up PATH entries added by installers that ran during this run.
    ///
    /// Installers write the machine and user PATH to the registry; the
    /// running process keeps its startup copy until it is refreshed.
    pub fn refresh_path(&mut self, runner: &dyn CommandRunner) -> usize {
        if !cfg!(windows) {
            return 0;
        }

        let script = "[Environment]::GetEnvironmentVariable('Path','Machine') + ';' + \
                      [Environment]::GetEnvironmentVariable('Path','User')";
        let args: Vec<String> = ["-NoProfile", "-NonInteractive", "-Command", script]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let output = match runner.run("powershell", &args, &CommandOptions::captured()) {
            Ok(result) if result.success => result.stdout,
            Ok(result) => {
                tracing::debug!("PATH refresh exited with {:?}", result.exit_code);
                return 0;
            }
            Err(e) => {
                tracing::debug!("PATH refresh failed: {}", e);
                return 0;
            }
        };

        let mut added = 0;
        for entry in output.trim().split(';').map(str::trim) {
            if entry.is_empty() {
                continue;
            }
            let expanded = self
                .expand(entry)
                .unwrap_or_else(|_| PathBuf::from(entry));
            if !self.path_entries.contains(&expanded) {
                self.path_entries.push(expanded);
                added += 1;
            }
        }

        if added > 0 && self.vars.is_none() {
            if let Ok(joined) = std::env::join_paths(&self.path_entries) {
                std::env::set_var("PATH", joined);
            }
        }
        added
    }
}
