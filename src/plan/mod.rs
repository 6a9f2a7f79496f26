//! Installation planning.
//!
//! Planning is a pure diff of the catalog against the installed set. The
//! same plan is printed in dry-run mode and drives the installer
//! otherwise, so the two can never disagree.

use crate::catalog::{Catalog, ExtraTool, PackageEntry};
use crate::scan::{InstalledSet, ScanResult};
use std::fmt::Write;

/// What a planned item installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanTarget {
    /// A catalog package delivered by winget.
    Package(PackageEntry),
    /// A tool delivered outside winget.
    Extra(ExtraTool),
}

/// One row of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    pub name: String,
    pub target: PlanTarget,
}

impl PlannedItem {
    fn package(entry: &PackageEntry) -> Self {
        Self {
            name: entry.name.clone(),
            target: PlanTarget::Package(entry.clone()),
        }
    }

    fn extra(tool: &ExtraTool) -> Self {
        Self {
            name: tool.name().to_string(),
            target: PlanTarget::Extra(tool.clone()),
        }
    }

    /// Package id, or the delivery channel for extras.
    pub fn source_label(&self) -> &str {
        match &self.target {
            PlanTarget::Package(entry) => &entry.id,
            PlanTarget::Extra(tool) => tool.channel(),
        }
    }
}

/// Catalog split by presence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallationPlan {
    pub to_install: Vec<PlannedItem>,
    pub already_installed: Vec<PlannedItem>,
}

impl InstallationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty() && self.already_installed.is_empty()
    }

    /// Names of everything that will be installed, in plan order.
    pub fn install_names(&self) -> Vec<&str> {
        self.to_install.iter().map(|i| i.name.as_str()).collect()
    }

    /// Plain-text rendering used for the console and the run log.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let sections = [
            ("To install", &self.to_install),
            ("Already installed", &self.already_installed),
        ];
        for (title, items) in sections {
            let _ = writeln!(out, "{} ({}):", title, items.len());
            for item in items {
                let _ = writeln!(out, "  - {} [{}]", item.name, item.source_label());
            }
        }
        out.trim_end().to_string()
    }
}

/// Split catalog packages into to-install and already-installed.
///
/// Each entry lands in exactly one list. Both lists are ordered by
/// display name, case-insensitively; ties keep catalog order.
pub fn plan(packages: &[PackageEntry], installed: &InstalledSet) -> InstallationPlan {
    let mut sorted: Vec<&PackageEntry> = packages.iter().collect();
    sorted.sort_by_key(|entry| entry.name.to_lowercase());

    let (already, missing): (Vec<&PackageEntry>, Vec<&PackageEntry>) = sorted
        .into_iter()
        .partition(|entry| installed.contains(&entry.id));

    InstallationPlan {
        to_install: missing.into_iter().map(PlannedItem::package).collect(),
        already_installed: already.into_iter().map(PlannedItem::package).collect(),
    }
}

/// [`plan`] over the catalog packages, then the extra tools appended in
/// catalog order according to their own presence checks.
pub fn plan_with_extras(catalog: &Catalog, scan: &ScanResult) -> InstallationPlan {
    let mut plan = plan(&catalog.packages, &scan.installed);
    for tool in &catalog.extras {
        let item = PlannedItem::extra(tool);
        if scan.has_extra(tool.name()) {
            plan.already_installed.push(item);
        } else {
            plan.to_install.push(item);
        }
    }
    plan
}
