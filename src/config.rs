//! Run configuration.
//!
//! Everything the pipeline needs to know about its surroundings (working
//! directory, manifest and lock locations, scratch root, credentials) lives in
//! [`Settings`] and is passed explicitly to each stage. Environment variables
//! and the clock are reached through [`Environment`] so tests can pin them.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default manifest file name.
pub const MANIFEST_FILE: &str = "fracture.json";

/// Environment variable holding a GitHub personal access token.
pub const TOKEN_ENV: &str = "FRACTURE_GITHUB_PAT";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "FRACTURE_LOG";

pub const GITHUB_API: &str = "https://api.github.com";

/// Name of the scratch directory under the working directory.
const SCRATCH_DIR: &str = "tmp";

#[derive(Debug, Clone)]
pub struct Settings {
    pub work_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub lock_path: PathBuf,
    pub scratch_dir: PathBuf,
    pub github_token: Option<String>,
    pub api_url: String,
    /// Fall back to guessing an entry's type from its name.
    pub infer_types: bool,
}

impl Settings {
    /// Builds settings rooted at `work_dir`. Relative manifest paths are
    /// resolved against it.
    pub fn new(work_dir: impl Into<PathBuf>, manifest: impl AsRef<Path>) -> Self {
        let work_dir = work_dir.into();
        let manifest_path = work_dir.join(manifest.as_ref());
        let lock_path = lock_path_for(&manifest_path);
        Self {
            scratch_dir: work_dir.join(SCRATCH_DIR),
            work_dir,
            manifest_path,
            lock_path,
            github_token: None,
            api_url: GITHUB_API.to_string(),
            infer_types: false,
        }
    }

    /// Settings for the current process: cwd plus the token variable.
    pub fn from_environment(manifest: impl AsRef<Path>, infer_types: bool) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get working directory")?;
        let mut settings = Self::new(cwd, manifest);
        if let Some(token) = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
            settings = settings.with_token(token);
        }
        settings.infer_types = infer_types;
        Ok(settings)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.github_token = Some(token.into());
        self
    }
}

/// `deps.json` -> `deps-lock.json`, kept next to the manifest.
pub fn lock_path_for(manifest: &Path) -> PathBuf {
    let stem = manifest
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "fracture".to_string());
    manifest.with_file_name(format!("{}-lock.json", stem))
}

/// Process-level inputs to path expansion.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
    /// Seconds since the Unix epoch.
    fn unix_time(&self) -> u64;
}

pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn unix_time(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Fixed variables and clock, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    pub vars: HashMap<String, String>,
    pub now: u64,
}

impl StaticEnvironment {
    pub fn new(now: u64) -> Self {
        Self {
            vars: HashMap::new(),
            now,
        }
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl Environment for StaticEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn unix_time(&self) -> u64 {
        self.now
    }
}
