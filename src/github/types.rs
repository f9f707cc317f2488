//! GitHub API type definitions

use crate::error::FetchError;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::LazyLock;

static GITHUB_REPO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[/:]([^/]+)/([^/]+?)(?:\.git)?/?$").expect("repo pattern is valid")
});

/// Owner/name pair of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl RepoRef {
    /// URL of GitHub's generated archive for `tag` (`zip` or `tar.gz`).
    pub fn source_archive_url(&self, tag: &str, format: &str) -> String {
        let ext = if format == "zip" { "zip" } else { "tar.gz" };
        format!(
            "https://github.com/{}/{}/archive/refs/tags/{}.{}",
            self.owner, self.name, tag, ext
        )
    }
}

/// Extracts owner and repository from a `github.com` locator.
pub fn parse_repo(source: &str) -> Result<RepoRef, FetchError> {
    let caps = GITHUB_REPO
        .captures(source.trim())
        .ok_or_else(|| FetchError::InvalidSource(source.to_string()))?;
    Ok(RepoRef {
        owner: caps[1].to_string(),
        name: caps[2].to_string(),
    })
}

/// Which release to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseQuery {
    Latest,
    Tag(String),
}

impl ReleaseQuery {
    pub fn from_version(version: Option<&str>) -> Self {
        match version {
            Some(tag) => Self::Tag(tag.to_string()),
            None => Self::Latest,
        }
    }
}

/// Resolved release: tag plus its downloadable files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(default)]
    pub assets: Vec<RemoteAsset>,
}

/// One file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteAsset {
    pub id: u64,
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub url: String,
}
