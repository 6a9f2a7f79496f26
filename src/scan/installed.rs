//! The set of package identifiers detected on this machine.

use crate::catalog::AliasTable;
use std::collections::BTreeSet;

/// Canonical identifiers of installed software.
///
/// Every insert and lookup goes through [`AliasTable::canonicalize`], so
/// callers can pass raw listing ids and catalog ids interchangeably.
#[derive(Debug, Clone)]
pub struct InstalledSet {
    aliases: AliasTable,
    ids: BTreeSet<String>,
}

impl InstalledSet {
    pub fn new(aliases: AliasTable) -> Self {
        Self {
            aliases,
            ids: BTreeSet::new(),
        }
    }

    /// Build a set from raw identifiers.
    pub fn from_ids<I, S>(aliases: AliasTable, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new(aliases);
        set.extend(ids);
        set
    }

    /// Insert a raw identifier. Returns `false` if it was already present.
    pub fn insert(&mut self, raw: &str) -> bool {
        let id = self.aliases.canonicalize(raw);
        if id.is_empty() {
            return false;
        }
        self.ids.insert(id)
    }

    pub fn extend<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.insert(id.as_ref());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(&self.aliases.canonicalize(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Canonical (case-folded) identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
