//! Release lookups and installer downloads.

use crate::error::{Result, WinstrapError};
use anyhow::Context;
use regex::Regex;
use std::fs::File;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

/// GitHub REST API root.
pub const GITHUB_API: &str = "https://api.github.com";

const API_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

static VERSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(\d+\.\d+\.\d+)", r"version\s+(\d+\.\d+)", r"v(\d+\.\d+)"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Latest release of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Version with any leading `v` removed.
    pub version: String,
    /// Download URL of the installer asset.
    pub url: String,
}

/// Network access used by the installer.
pub trait Fetcher {
    /// Query the latest release of `repo` (`owner/name`) and pick the first
    /// asset whose name ends with `asset_suffix`.
    fn latest_release(&self, repo: &str, asset_suffix: &str) -> anyhow::Result<ReleaseInfo>;

    /// Download `url` to `dest`, replacing any existing file.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// [`Fetcher`] over the reqwest blocking client.
pub struct ReleaseClient {
    api: reqwest::blocking::Client,
    downloads: reqwest::blocking::Client,
    api_base: String,
}

impl ReleaseClient {
    pub fn new() -> Result<Self> {
        Self::with_api_base(GITHUB_API)
    }

    /// Client that talks to a different API root (tests, GitHub Enterprise).
    pub fn with_api_base(api_base: &str) -> Result<Self> {
        let user_agent = concat!("winstrap/", env!("CARGO_PKG_VERSION"));
        let api = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(API_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        let downloads = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(API_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api,
            downloads,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

impl Fetcher for ReleaseClient {
    fn latest_release(&self, repo: &str, asset_suffix: &str) -> anyhow::Result<ReleaseInfo> {
        let url = format!("{}/repos/{}/releases/latest", self.api_base, repo);
        tracing::debug!("GET {}", url);

        let response: serde_json::Value = self
            .api
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()?
            .error_for_status()?
            .json()
            .context("Failed to parse GitHub API response")?;

        let tag = response["tag_name"]
            .as_str()
            .context("No tag_name in response")?;

        let asset_url = response["assets"]
            .as_array()
            .and_then(|assets| {
                assets.iter().find(|asset| {
                    asset["name"]
                        .as_str()
                        .is_some_and(|name| name.ends_with(asset_suffix))
                })
            })
            .and_then(|asset| asset["browser_download_url"].as_str())
            .with_context(|| format!("No asset ending in {} in release {}", asset_suffix, tag))?;

        Ok(ReleaseInfo {
            version: tag.trim_start_matches('v').to_string(),
            url: asset_url.to_string(),
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::debug!("download {} -> {}", url, dest.display());
        let failed = |message: String| WinstrapError::DownloadFailed {
            url: url.to_string(),
            message,
        };

        let mut response = self
            .downloads
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed(e.to_string()))?;

        let mut file = File::create(dest)?;
        response
            .copy_to(&mut file)
            .map_err(|e| failed(e.to_string()))?;
        Ok(())
    }
}

/// Compare versions to check if `latest` is newer than `current`.
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    let parse_version = |v: &str| -> Vec<u32> {
        v.trim_start_matches('v')
            .split('.')
            .take(3)
            .filter_map(|s| s.parse().ok())
            .collect()
    };

    let latest_parts = parse_version(latest);
    let current_parts = parse_version(current);

    for (l, c) in latest_parts.iter().zip(current_parts.iter()) {
        if l > c {
            return true;
        }
        if l < c {
            return false;
        }
    }

    latest_parts.len() > current_parts.len()
}

/// Pull a version number out of `--version` output.
pub fn extract_version(output: &str) -> Option<String> {
    VERSION_PATTERNS
        .iter()
        .find_map(|re| re.captures(output))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Local file name for an installer URL.
pub fn installer_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .filter(|segment| !segment.contains(':'))
        .unwrap_or("installer.exe")
        .to_string()
}
