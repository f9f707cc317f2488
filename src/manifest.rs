//! Manifest (`fracture.json`) parsing.
//!
//! The manifest is a JSON object keyed by dependency name. Entries are kept
//! in file order so installs run in the order they were declared.

use crate::error::FractureError;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const ASSET_EXTENSION_TOKEN: &str = "@ASSET_EXTENSION";

/// Archive formats GitHub synthesizes for a tag.
const SOURCE_FORMATS: &[&str] = &["tar.gz", "zip"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// A release asset, optionally extracted.
    Binary,
    /// GitHub's auto-generated source archive for a release tag.
    Source,
    /// A git checkout.
    Repository,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Source => "source",
            Self::Repository => "repository",
        }
    }

    /// Legacy name sniffing, only used with `--infer-types`.
    pub fn infer_from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("provider") {
            Self::Binary
        } else if lower.contains("source") {
            Self::Source
        } else {
            Self::Repository
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Destination path template, relative to the working directory.
    pub path: String,
    /// Git remote URL (`https://github.com/owner/repo[.git]`).
    pub source: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DependencyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub private: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub extract: bool,
    /// Fixed output name: the single extracted file for binaries, the
    /// archive file name for sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ManifestEntry {
    /// The declared type, or the name heuristic when `infer` is allowed.
    pub fn resolve_type(&self, name: &str, infer: bool) -> Result<DependencyType, FractureError> {
        match self.kind {
            Some(kind) => Ok(kind),
            None if infer => Ok(DependencyType::infer_from_name(name)),
            None => Err(FractureError::config(
                name,
                "missing \"type\" (binary, source or repository); pass --infer-types to guess it from the entry name",
            )),
        }
    }

    /// Source-type constraints, checked before any network work.
    pub fn validate_source(&self, name: &str) -> Result<(), FractureError> {
        if self.asset_name.is_some() {
            return Err(FractureError::config(
                name,
                "asset_name is not allowed for source type dependencies",
            ));
        }
        if self.asset_suffix.is_some() {
            return Err(FractureError::config(
                name,
                "asset_suffix is not allowed for source type dependencies",
            ));
        }
        if self.extract && self.filename.is_some() {
            return Err(FractureError::config(
                name,
                "filename cannot be used with extract=true for source type dependencies",
            ));
        }
        if let Some(ext) = self.asset_extension.as_deref()
            && !SOURCE_FORMATS.contains(&ext)
        {
            return Err(FractureError::config(
                name,
                format!(
                    "asset_extension for source type must be 'zip' or 'tar.gz', got '{}'",
                    ext
                ),
            ));
        }
        let uses_extension_token = self.path.contains(ASSET_EXTENSION_TOKEN)
            || self
                .filename
                .as_deref()
                .is_some_and(|f| f.contains(ASSET_EXTENSION_TOKEN));
        if self.extract && uses_extension_token {
            return Err(FractureError::config(
                name,
                "@ASSET_EXTENSION placeholder cannot be used with extract=true",
            ));
        }
        Ok(())
    }

    /// Requested source archive format, `tar.gz` unless overridden.
    pub fn source_format(&self) -> &str {
        self.asset_extension.as_deref().unwrap_or("tar.gz")
    }
}

pub type Manifest = IndexMap<String, ManifestEntry>;

pub fn load(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse(content: &str) -> Result<Manifest> {
    Ok(serde_json::from_str(content)?)
}
