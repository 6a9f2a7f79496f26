//! Parser for winget's tabular listing output.
//!
//! `winget list` and `winget upgrade` print a header row, a dashed
//! separator, then one row per package with columns padded by spaces:
//!
//! ```text
//! Name              Id                 Version   Available  Source
//! ---------------------------------------------------------------
//! Git               Git.Git            2.45.1    2.46.0     winget
//! Fork              ARP\User\X64\Fork  1.98.0
//! ```
//!
//! The format is not a stable interface. Anything unexpected is dropped
//! rather than guessed at.

use regex::Regex;
use std::sync::LazyLock;

/// Header token of the identifier column.
const HEADER_TOKEN: &str = "Id";

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{3,}$").expect("separator pattern"));

static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("column gap pattern"));

static BARE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[<>]\s*)?[vV]?\d+(?:\.\d+)*$").expect("version pattern"));

/// Mojibake left behind when UTF-8 output is decoded with a legacy code page.
const CORRUPTION_MARKERS: &[&str] = &["Ã", "â€", "\u{FFFD}"];

/// Identifiers pulled out of one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Raw identifiers, in listing order, before aliasing.
    pub ids: Vec<String>,
    /// Whether a separator line was found at all.
    pub separator_found: bool,
    /// Data rows examined after the separator.
    pub rows: usize,
}

/// Text the terminal would actually show for a line that was redrawn
/// with carriage returns (winget's progress spinner does this).
fn visible(line: &str) -> &str {
    line.rsplit('\r').next().unwrap_or(line)
}

/// Whether `line` is the dashed separator under the header.
pub fn is_separator(line: &str) -> bool {
    SEPARATOR.is_match(visible(line).trim())
}

/// Split a data row into its columns.
pub fn split_columns(row: &str) -> Vec<&str> {
    COLUMN_GAP
        .split(row.trim())
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

/// Why a candidate identifier was rejected, if it was.
pub fn rejection(candidate: &str) -> Option<&'static str> {
    if candidate.is_empty() {
        Some("empty")
    } else if candidate.eq_ignore_ascii_case(HEADER_TOKEN) {
        Some("header")
    } else if BARE_VERSION.is_match(candidate) {
        Some("version")
    } else if candidate.contains('…') {
        Some("truncated")
    } else if CORRUPTION_MARKERS.iter().any(|m| candidate.contains(m)) {
        Some("encoding")
    } else {
        None
    }
}

/// Extract package identifiers from listing text.
///
/// Never fails: lines that do not fit the expected shape contribute
/// nothing.
pub fn parse_listing(text: &str) -> Listing {
    let mut listing = Listing::default();

    for raw_line in text.lines() {
        let line = visible(raw_line);

        if !listing.separator_found {
            listing.separator_found = is_separator(line);
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }
        listing.rows += 1;

        let columns = split_columns(line);
        let Some(candidate) = columns.get(1) else {
            continue;
        };

        match rejection(candidate) {
            None => listing.ids.push(candidate.to_string()),
            Some(reason) => tracing::debug!("listing: dropped '{}' ({})", candidate, reason),
        }
    }

    listing
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Name                          Id                           Version        Available  Source
--------------------------------------------------------------------------------------------
Git                           Git.Git                      2.45.1         2.46.0     winget
Fork                          ARP\\User\\X64\\Fork             1.98.0
Microsoft Visual Studio Code  Microsoft.VisualStudioCode   1.90.0                    winget
Windows Terminal              Microsoft.WindowsTerminal    1.20.11781.0              winget
";

    #[test]
    fn extracts_second_column() {
        let listing = parse_listing(LISTING);
        assert!(listing.separator_found);
        assert_eq!(listing.rows, 4);
        assert_eq!(
            listing.ids,
            vec![
                "Git.Git",
                "ARP\\User\\X64\\Fork",
                "Microsoft.VisualStudioCode",
                "Microsoft.WindowsTerminal",
            ]
        );
    }

    #[test]
    fn no_separator_yields_nothing() {
        let text = "Name  Id  Version\nGit  Git.Git  2.45.1\n";
        let listing = parse_listing(text);
        assert!(!listing.separator_found);
        assert!(listing.ids.is_empty());
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(parse_listing(""), Listing::default());
    }

    #[test]
    fn single_field_rows_are_ignored() {
        let text = "Name  Id\n-----\n3 upgrades available.\nSomethingAlone\n";
        let listing = parse_listing(text);
        assert_eq!(listing.rows, 2);
        assert!(listing.ids.is_empty());
    }

    #[test]
    fn progress_spinner_before_header_is_skipped() {
        let text = "   - \r   \\ \r   | \rName   Id\r\n----------\r\nGit   Git.Git   2.45.1\r\n";
        let listing = parse_listing(text);
        assert_eq!(listing.ids, vec!["Git.Git"]);
    }

    #[test]
    fn repeated_header_block_is_filtered() {
        let text = "\
Name   Id        Version
------------------------
Git    Git.Git   2.45.1
The following packages have an upgrade available, but require explicit targeting for upgrade:
Name   Id        Version
------------------------
Fork   Fork.Fork  1.98.0
";
        let listing = parse_listing(text);
        assert_eq!(listing.ids, vec!["Git.Git", "Fork.Fork"]);
    }

    #[test]
    fn nameless_row_drops_version_in_id_column() {
        let text = "Name  Id  Version\n-----\n  SomeApp.Id  1.2.3\n";
        // leading name column is blank, so the version shifts into column two
        let listing = parse_listing(text);
        assert!(listing.ids.is_empty());
    }

    #[test]
    fn rejection_reasons() {
        assert_eq!(rejection(""), Some("empty"));
        assert_eq!(rejection("Id"), Some("header"));
        assert_eq!(rejection("2.45.1"), Some("version"));
        assert_eq!(rejection("v18"), Some("version"));
        assert_eq!(rejection("< 1.0.0"), Some("version"));
        assert_eq!(rejection("Microsoft.VisualStud…"), Some("truncated"));
        assert_eq!(rejection("Vendor.CafÃ©"), Some("encoding"));
        assert_eq!(rejection("Vendor.Appâ€¦"), Some("encoding"));
        assert_eq!(rejection("Git.Git"), None);
        assert_eq!(rejection("7zip.7zip"), None);
    }

    #[test]
    fn split_columns_requires_two_spaces() {
        assert_eq!(
            split_columns("Git for Windows  Git.Git   2.45.1"),
            vec!["Git for Windows", "Git.Git", "2.45.1"]
        );
    }

    #[test]
    fn separator_detection() {
        assert!(is_separator("-----------"));
        assert!(is_separator("  ---  "));
        assert!(!is_separator("--"));
        assert!(!is_separator("Name --- Id"));
    }
}
