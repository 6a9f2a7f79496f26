//! Catalog schema types.
//!
//! The catalog is the single static table that drives a run: which
//! packages to install, how to detect them outside the package manager,
//! which extra tools to fetch, which AppX packages to remove and which
//! config files to deploy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root catalog structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Packages installed through winget.
    #[serde(default)]
    pub packages: Vec<PackageEntry>,

    /// Direct detection of catalog packages that winget may not list.
    #[serde(default)]
    pub probes: Vec<Probe>,

    /// Tools delivered outside winget.
    #[serde(default)]
    pub extras: Vec<ExtraTool>,

    /// Vendor AppX packages to remove.
    #[serde(default)]
    pub removals: RemovalList,

    /// Files copied from the bundle directory.
    #[serde(default)]
    pub configs: Vec<ConfigFile>,

    /// Extra raw id → canonical id rewrites, applied on top of the
    /// built-in alias table.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// A package installed through winget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PackageEntry {
    /// Display name.
    pub name: String,
    /// winget package identifier.
    pub id: String,
}

impl PackageEntry {
    pub fn new(name: &str, id: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
        }
    }
}

/// Detects a catalog package by executable or install path.
///
/// A probe contributes its `id` when the command resolves on PATH or the
/// path exists, and nothing otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Probe {
    /// Canonical id contributed when the probe fires.
    pub id: String,
    /// Executable name looked up on PATH.
    #[serde(default)]
    pub command: Option<String>,
    /// Install location; `%VAR%` references are expanded.
    #[serde(default)]
    pub path: Option<String>,
}

/// A tool installed outside winget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtraTool {
    /// Global npm package.
    Npm(NpmTool),
    /// Installer fetched from a fixed URL.
    Download(DownloadTool),
    /// Installer fetched from the latest GitHub release.
    GithubRelease(ReleaseTool),
}

impl ExtraTool {
    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            ExtraTool::Npm(t) => &t.name,
            ExtraTool::Download(t) => &t.name,
            ExtraTool::GithubRelease(t) => &t.name,
        }
    }

    /// Short label for the delivery channel.
    pub fn channel(&self) -> &'static str {
        match self {
            ExtraTool::Npm(_) => "npm",
            ExtraTool::Download(_) => "download",
            ExtraTool::GithubRelease(_) => "github",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NpmTool {
    pub name: String,
    /// npm package name.
    pub package: String,
    /// Executable the package puts on PATH.
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DownloadTool {
    pub name: String,
    pub url: String,
    /// Arguments for a silent install.
    #[serde(default)]
    pub args: Vec<String>,
    /// Path that exists once the tool is installed.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReleaseTool {
    pub name: String,
    /// `owner/repo` on GitHub.
    pub repo: String,
    /// Suffix of the release asset to download.
    pub asset_suffix: String,
    /// Arguments for a silent install.
    #[serde(default)]
    pub args: Vec<String>,
    /// Executable used to detect the tool and read its version.
    pub command: String,
    /// Used when the releases API cannot be reached.
    pub fallback_url: String,
    pub fallback_version: String,
}

/// AppX packages targeted for removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemovalList {
    /// Exact package names.
    #[serde(default)]
    pub exact: Vec<String>,
    /// Wildcard patterns (`*` matches any run of characters).
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl RemovalList {
    /// Exact names followed by patterns, in catalog order.
    pub fn queries(&self) -> impl Iterator<Item = &str> {
        self.exact
            .iter()
            .chain(self.patterns.iter())
            .map(String::as_str)
    }
}

/// A file or directory copied from the bundle directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Path relative to the bundle directory.
    pub source: String,
    /// Absolute destination; `%VAR%` references are expanded.
    pub destination: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_catalog() {
        let yaml = r#"
packages:
  - name: Git for Windows
    id: Git.Git
"#;
        let catalog: Catalog = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(catalog.packages, vec![PackageEntry::new("Git for Windows", "Git.Git")]);
        assert!(catalog.extras.is_empty());
        assert!(catalog.removals.exact.is_empty());
    }

    #[test]
    fn rejects_unknown_top_level_field() {
        let yaml = "pakages: []\n";
        assert!(serde_yaml::from_str::<Catalog>(yaml).is_err());
    }

    #[test]
    fn parses_extra_tool_kinds() {
        let yaml = r#"
extras:
  - kind: npm
    name: TypeScript
    package: typescript
    command: tsc
  - kind: download
    name: Build Tools
    url: https://example.invalid/vs_BuildTools.exe
    args: [--quiet]
    path: 'C:\BuildTools'
  - kind: github_release
    name: Ollama
    repo: ollama/ollama
    asset_suffix: OllamaSetup.exe
    command: ollama
    fallback_url: https://example.invalid/OllamaSetup.exe
    fallback_version: 0.5.7
"#;
        let catalog: Catalog = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(catalog.extras.len(), 3);
        assert!(matches!(catalog.extras[0], ExtraTool::Npm(_)));
        assert_eq!(catalog.extras[1].name(), "Build Tools");
        assert_eq!(catalog.extras[1].channel(), "download");
        match &catalog.extras[2] {
            ExtraTool::GithubRelease(t) => {
                assert_eq!(t.repo, "ollama/ollama");
                assert!(t.args.is_empty());
            }
            other => panic!("expected github_release, got {:?}", other),
        }
    }

    #[test]
    fn removal_queries_keep_order() {
        let list = RemovalList {
            exact: vec!["Microsoft.BingWeather".into()],
            patterns: vec!["*Xbox*".into()],
        };
        let queries: Vec<&str> = list.queries().collect();
        assert_eq!(queries, vec!["Microsoft.BingWeather", "*Xbox*"]);
    }
}
