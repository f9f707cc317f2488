//! Error taxonomy for the install pipeline.
//!
//! Each stage reports its own typed error so callers (and tests) can tell a
//! selection problem apart from an extraction or network problem. Command
//! handlers wrap these in `anyhow` with per-entry context.

use std::io;
use thiserror::Error;

pub type FractureResult<T> = Result<T, FractureError>;

/// Failures while narrowing a release's assets down to exactly one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("no assets found containing asset_name '{filter}' in release {tag}")]
    NoAssetsMatchName { filter: String, tag: String },

    #[error("no assets found with asset_extension '{extension}' in release {tag}")]
    NoAssetsMatchExtension { extension: String, tag: String },

    #[error("asset_suffix is required for binary dependencies. Available assets: {}", .candidates.join(", "))]
    MissingRequiredSuffix { candidates: Vec<String> },

    #[error("no assets found matching asset_suffix '{suffix}' in release {tag}")]
    NoAssetsMatchSuffix { suffix: String, tag: String },

    #[error(
        "multiple assets match asset_suffix '{suffix}' ({} found: {}). Refine asset_name, asset_extension or asset_suffix to match exactly one asset",
        .matches.len(),
        .matches.join(", ")
    )]
    AmbiguousAssetMatch { suffix: String, matches: Vec<String> },
}

/// Failures while unpacking an archive or placing its contents.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("archive entry escapes the target directory: {0}")]
    PathTraversalRejected(String),

    #[error("no files found in archive")]
    EmptyArchive,

    #[error(
        "filename specified but archive contains {count} files (expected 1). Remove filename to extract all files to a directory"
    )]
    UnexpectedFileCount { count: usize },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to walk extracted files: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Failures talking to GitHub or writing a download to disk.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid GitHub URL format: {0}")]
    InvalidSource(String),

    #[error("private repository {owner}/{repo} requires {}", crate::config::TOKEN_ENV)]
    CredentialRequired { owner: String, repo: String },

    #[error("repository {owner}/{repo} not found or no access")]
    NotFound { owner: String, repo: String },

    #[error("server returned status {code} for {url}")]
    Status { code: u16, url: String },

    #[error("request failed: {0}")]
    Transport(#[from] ureq::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Umbrella error for installing one manifest entry.
#[derive(Error, Debug)]
pub enum FractureError {
    #[error("invalid configuration for '{entry}': {message}")]
    Config { entry: String, message: String },

    #[error(transparent)]
    Selection(#[from] SelectError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FractureError {
    pub fn config(entry: &str, message: impl Into<String>) -> Self {
        Self::Config {
            entry: entry.to_string(),
            message: message.into(),
        }
    }
}

impl From<git2::Error> for FractureError {
    fn from(err: git2::Error) -> Self {
        Self::Repository(err.message().to_string())
    }
}
