//! Package identifier normalization.
//!
//! winget reports the same software under different identifiers over
//! time: ARP registry paths for apps it did not install, store product
//! ids, and ids that vendors renamed. The alias table maps those raw forms
//! to the identifier the catalog uses. It has to be maintained by hand as
//! the upstream registry changes.

use crate::error::{Result, WinstrapError};
use std::collections::{BTreeMap, HashMap};

/// Raw identifier → canonical identifier rewrites.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// Keyed by the folded raw identifier.
    rewrites: HashMap<String, String>,
}

/// Case folding used for every identifier comparison.
pub fn fold(id: &str) -> String {
    id.trim().to_lowercase()
}

impl AliasTable {
    /// Build a table, rejecting chains (a target that is itself an alias).
    ///
    /// Rejecting chains is what makes [`canonicalize`](Self::canonicalize)
    /// idempotent.
    pub fn new<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut rewrites = HashMap::new();
        for (raw, canonical) in entries {
            let raw_key = fold(raw);
            let canonical = canonical.trim().to_string();
            if raw_key.is_empty() || canonical.is_empty() {
                return Err(WinstrapError::CatalogInvalid {
                    message: format!("empty alias entry '{}' -> '{}'", raw, canonical),
                });
            }
            rewrites.insert(raw_key, canonical);
        }

        for canonical in rewrites.values() {
            if rewrites.contains_key(&fold(canonical)) {
                return Err(WinstrapError::CatalogInvalid {
                    message: format!("alias target '{}' is itself an alias", canonical),
                });
            }
        }

        Ok(Self { rewrites })
    }

    /// Merge `extra` on top of this table.
    pub fn extended(&self, extra: &BTreeMap<String, String>) -> Result<Self> {
        let mut combined: BTreeMap<String, String> = self
            .rewrites
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (raw, canonical) in extra {
            combined.insert(fold(raw), canonical.clone());
        }
        Self::new(combined.iter())
    }

    /// The catalog form of `raw`: its alias target, or `raw` trimmed.
    pub fn resolve<'a>(&'a self, raw: &'a str) -> &'a str {
        let raw = raw.trim();
        self.rewrites
            .get(&fold(raw))
            .map(String::as_str)
            .unwrap_or(raw)
    }

    /// The key used for set membership: alias rewrite, then case folding.
    pub fn canonicalize(&self, raw: &str) -> String {
        fold(self.resolve(raw))
    }

    pub fn len(&self) -> usize {
        self.rewrites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }

    /// Canonical targets, for validation against the catalog.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.rewrites.values().map(String::as_str)
    }
}
