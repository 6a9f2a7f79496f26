//! The static catalog that drives a run.
//!
//! # Modules
//!
//! - [`schema`] - Catalog types (packages, probes, extras, removals, configs)
//! - [`aliases`] - Identifier normalization table
//! - [`builtin`] - Tables embedded at compile time

pub mod aliases;
pub mod builtin;
pub mod schema;

pub use aliases::{fold, AliasTable};
pub use schema::{
    Catalog, ConfigFile, DownloadTool, ExtraTool, NpmTool, PackageEntry, Probe, ReleaseTool,
    RemovalList,
};

use crate::error::{Result, WinstrapError};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

/// Catalog plus the alias table it is looked up with.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub aliases: AliasTable,
}

/// Load the catalog from `path`, or the built-in one when `path` is `None`.
///
/// A catalog file replaces the built-in table entirely; its `aliases`
/// are merged on top of the built-in alias table.
pub fn load(path: Option<&Path>) -> Result<LoadedCatalog> {
    let catalog = match path {
        Some(path) => load_file(path)?,
        None => builtin::load_catalog()?,
    };

    let aliases = builtin::load_aliases()?.extended(&catalog.aliases)?;
    validate(&catalog, &aliases)?;

    tracing::debug!(
        "catalog loaded: {} packages, {} probes, {} extras, {} aliases",
        catalog.packages.len(),
        catalog.probes.len(),
        catalog.extras.len(),
        aliases.len()
    );

    Ok(LoadedCatalog { catalog, aliases })
}

/// Parse a catalog file.
pub fn load_file(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        return Err(WinstrapError::CatalogNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| WinstrapError::CatalogParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn invalid(message: String) -> WinstrapError {
    WinstrapError::CatalogInvalid { message }
}

/// Check the structural rules the rest of the run relies on.
pub fn validate(catalog: &Catalog, aliases: &AliasTable) -> Result<()> {
    let mut ids = HashSet::new();
    for entry in &catalog.packages {
        if entry.name.trim().is_empty() || entry.id.trim().is_empty() {
            return Err(invalid(format!(
                "package entry '{}' / '{}' has an empty name or id",
                entry.name, entry.id
            )));
        }
        if !ids.insert(aliases.canonicalize(&entry.id)) {
            return Err(invalid(format!("duplicate package id '{}'", entry.id)));
        }
    }

    for probe in &catalog.probes {
        match (&probe.command, &probe.path) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(invalid(format!(
                    "probe for '{}' needs exactly one of `command` or `path`",
                    probe.id
                )))
            }
        }
        if !ids.contains(&aliases.canonicalize(&probe.id)) {
            return Err(invalid(format!(
                "probe id '{}' does not match a catalog package",
                probe.id
            )));
        }
    }

    let mut extra_names = HashSet::new();
    for extra in &catalog.extras {
        if extra.name().trim().is_empty() {
            return Err(invalid("extra tool with an empty name".to_string()));
        }
        if !extra_names.insert(extra.name().to_lowercase()) {
            return Err(invalid(format!("duplicate extra tool '{}'", extra.name())));
        }
        let complete = match extra {
            ExtraTool::Npm(t) => !t.package.is_empty() && !t.command.is_empty(),
            ExtraTool::Download(t) => !t.url.is_empty() && !t.path.is_empty(),
            ExtraTool::GithubRelease(t) => {
                t.repo.split('/').filter(|s| !s.is_empty()).count() == 2
                    && !t.asset_suffix.is_empty()
                    && !t.command.is_empty()
                    && !t.fallback_url.is_empty()
            }
        };
        if !complete {
            return Err(invalid(format!(
                "extra tool '{}' is missing required fields",
                extra.name()
            )));
        }
    }

    if catalog.removals.queries().any(|q| q.trim().is_empty()) {
        return Err(invalid("empty removal entry".to_string()));
    }

    for config in &catalog.configs {
        let source = Path::new(&config.source);
        let escapes = source.is_absolute()
            || source
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if config.source.is_empty() || escapes {
            return Err(invalid(format!(
                "config source '{}' must be a relative path inside the bundle",
                config.source
            )));
        }
        if config.destination.trim().is_empty() {
            return Err(invalid(format!("config '{}' has an empty destination", config.source)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn catalog_with(packages: &[(&str, &str)]) -> Catalog {
        Catalog {
            packages: packages
                .iter()
                .map(|(n, i)| PackageEntry::new(n, i))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn load_without_path_uses_builtin() {
        let loaded = load(None).unwrap();
        assert!(loaded
            .catalog
            .packages
            .iter()
            .any(|p| p.id == "Git.Git"));
    }

    #[test]
    fn load_missing_file_errors() {
        let result = load(Some(Path::new("/nonexistent/catalog.yml")));
        assert!(matches!(result, Err(WinstrapError::CatalogNotFound { .. })));
    }

    #[test]
    fn load_file_replaces_builtin() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.yml");
        fs::write(
            &path,
            r#"
packages:
  - name: Git for Windows
    id: Git.Git
aliases:
  'ARP\Machine\X64\Custom': Git.Git
"#,
        )
        .unwrap();

        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded.catalog.packages.len(), 1);
        assert!(loaded.catalog.extras.is_empty());
        assert_eq!(loaded.aliases.resolve(r"ARP\Machine\X64\Custom"), "Git.Git");
        // built-in aliases still apply
        assert_eq!(loaded.aliases.resolve(r"ARP\User\X64\Fork"), "Fork.Fork");
    }

    #[test]
    fn load_file_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.yml");
        fs::write(&path, "packages: {not: [a list").unwrap();
        let result = load(Some(&path));
        assert!(matches!(result, Err(WinstrapError::CatalogParseError { .. })));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let catalog = catalog_with(&[("Git", "Git.Git"), ("Git again", "git.git")]);
        let err = validate(&catalog, &AliasTable::default()).unwrap_err();
        assert!(err.to_string().contains("duplicate package id"));
    }

    #[test]
    fn ids_colliding_through_alias_are_rejected() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("JanDeDobbeleer.OhMyPosh".to_string(), "XP8K0HKJFRXGCK".to_string());
        let aliases = AliasTable::new(map.iter()).unwrap();
        let catalog = catalog_with(&[
            ("Oh My Posh", "JanDeDobbeleer.OhMyPosh"),
            ("Oh My Posh (Store)", "XP8K0HKJFRXGCK"),
        ]);
        assert!(validate(&catalog, &aliases).is_err());
    }

    #[test]
    fn probe_needs_exactly_one_target() {
        let mut catalog = catalog_with(&[("Git", "Git.Git")]);
        catalog.probes.push(Probe {
            id: "Git.Git".into(),
            command: Some("git".into()),
            path: Some("C:\\git.exe".into()),
        });
        assert!(validate(&catalog, &AliasTable::default()).is_err());

        catalog.probes[0].path = None;
        assert!(validate(&catalog, &AliasTable::default()).is_ok());
    }

    #[test]
    fn probe_must_reference_catalog_package() {
        let mut catalog = catalog_with(&[("Git", "Git.Git")]);
        catalog.probes.push(Probe {
            id: "Unknown.Tool".into(),
            command: Some("tool".into()),
            path: None,
        });
        let err = validate(&catalog, &AliasTable::default()).unwrap_err();
        assert!(err.to_string().contains("Unknown.Tool"));
    }

    #[test]
    fn config_source_must_stay_in_bundle() {
        let mut catalog = Catalog::default();
        catalog.configs.push(ConfigFile {
            source: "../secrets.txt".into(),
            destination: "%USERPROFILE%\\x".into(),
        });
        assert!(validate(&catalog, &AliasTable::default()).is_err());
    }

    #[test]
    fn release_repo_must_be_owner_and_name() {
        let mut catalog = Catalog::default();
        catalog.extras.push(ExtraTool::GithubRelease(ReleaseTool {
            name: "Tool".into(),
            repo: "justowner".into(),
            asset_suffix: ".exe".into(),
            args: vec![],
            command: "tool".into(),
            fallback_url: "https://example.invalid/tool.exe".into(),
            fallback_version: "1.0.0".into(),
        }));
        assert!(validate(&catalog, &AliasTable::default()).is_err());
    }

    #[test]
    fn empty_removal_entry_is_rejected() {
        let mut catalog = Catalog::default();
        catalog.removals.patterns.push("  ".into());
        assert!(validate(&catalog, &AliasTable::default()).is_err());
    }
}
