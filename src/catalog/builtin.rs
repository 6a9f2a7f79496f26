//! Built-in catalog and alias tables embedded at compile time.

use crate::catalog::aliases::AliasTable;
use crate::catalog::schema::Catalog;
use crate::error::{Result, WinstrapError};
use include_dir::{include_dir, Dir};
use std::collections::BTreeMap;

/// Embedded assets directory.
static ASSETS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

const CATALOG_FILE: &str = "catalog.yml";
const ALIASES_FILE: &str = "aliases.yml";

fn asset_text(name: &str) -> Result<&'static str> {
    let file = ASSETS_DIR
        .get_file(name)
        .ok_or_else(|| WinstrapError::CatalogNotFound {
            path: format!("assets/{}", name).into(),
        })?;

    file.contents_utf8()
        .ok_or_else(|| WinstrapError::CatalogParseError {
            path: format!("assets/{}", name).into(),
            message: "Invalid UTF-8".to_string(),
        })
}

/// Load the built-in catalog.
pub fn load_catalog() -> Result<Catalog> {
    let content = asset_text(CATALOG_FILE)?;
    serde_yaml::from_str(content).map_err(|e| WinstrapError::CatalogParseError {
        path: format!("assets/{}", CATALOG_FILE).into(),
        message: e.to_string(),
    })
}

/// Load the built-in alias table.
pub fn load_aliases() -> Result<AliasTable> {
    let content = asset_text(ALIASES_FILE)?;
    let map: BTreeMap<String, String> =
        serde_yaml::from_str(content).map_err(|e| WinstrapError::CatalogParseError {
            path: format!("assets/{}", ALIASES_FILE).into(),
            message: e.to_string(),
        })?;
    AliasTable::new(map.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::validate;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = load_catalog().unwrap();
        assert!(!catalog.packages.is_empty());
        assert!(!catalog.removals.exact.is_empty());
        assert!(!catalog.configs.is_empty());
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = load_catalog().unwrap();
        let aliases = load_aliases().unwrap();
        validate(&catalog, &aliases).unwrap();
    }

    #[test]
    fn builtin_aliases_load() {
        let aliases = load_aliases().unwrap();
        assert_eq!(aliases.resolve(r"ARP\User\X64\Fork"), "Fork.Fork");
    }

    #[test]
    fn other_release_lines_are_not_aliased() {
        let aliases = load_aliases().unwrap();
        assert_eq!(aliases.resolve("Python.Python.3.11"), "Python.Python.3.11");
        assert_eq!(aliases.resolve("OpenJS.NodeJS"), "OpenJS.NodeJS");
    }

    #[test]
    fn builtin_alias_targets_are_catalog_ids() {
        let catalog = load_catalog().unwrap();
        let aliases = load_aliases().unwrap();
        for target in aliases.targets() {
            assert!(
                catalog.packages.iter().any(|p| p.id == target),
                "alias target {} is not in the catalog",
                target
            );
        }
    }

    #[test]
    fn builtin_catalog_has_extra_tool_of_each_kind() {
        let catalog = load_catalog().unwrap();
        let channels: Vec<&str> = catalog.extras.iter().map(|e| e.channel()).collect();
        assert!(channels.contains(&"npm"));
        assert!(channels.contains(&"download"));
        assert!(channels.contains(&"github"));
    }
}
