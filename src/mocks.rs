//! In-memory collaborators for installer and command tests.

use crate::error::{FetchError, FractureError, FractureResult};
use crate::github::{GitHubApi, Release, ReleaseQuery, RemoteAsset, RepoRef};
use crate::repo::RepositoryProvider;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// Serves releases and file bodies from maps. Every call is recorded.
#[derive(Default)]
pub struct MockGitHub {
    /// Keyed by tag, plus `"latest"`.
    pub releases: HashMap<String, Release>,
    /// Download bodies keyed by URL.
    pub files: HashMap<String, Vec<u8>>,
    pub has_token: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockGitHub {
    /// A release served both as latest and under its tag.
    pub fn with_release(mut self, tag: &str, assets: &[&str]) -> Self {
        let release = Release {
            tag: tag.to_string(),
            assets: assets
                .iter()
                .enumerate()
                .map(|(i, name)| RemoteAsset {
                    id: i as u64 + 100,
                    name: name.to_string(),
                    url: format!("https://github.com/acme/tool/releases/download/{}/{}", tag, name),
                })
                .collect(),
        };
        self.releases.insert("latest".to_string(), release.clone());
        self.releases.insert(tag.to_string(), release);
        self
    }

    pub fn with_file(mut self, url: &str, body: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), body);
        self
    }

    /// Body for an asset of the latest release, by asset name.
    pub fn with_asset_body(self, asset: &str, body: Vec<u8>) -> Self {
        let url = self
            .releases
            .get("latest")
            .and_then(|r| r.assets.iter().find(|a| a.name == asset))
            .map(|a| a.url.clone())
            .unwrap_or_default();
        self.with_file(&url, body)
    }

    pub fn with_token(mut self) -> Self {
        self.has_token = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn write(&self, url: &str, target: &Path) -> Result<(), FetchError> {
        let body = self.files.get(url).ok_or_else(|| FetchError::Status {
            code: 404,
            url: url.to_string(),
        })?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, body)?;
        Ok(())
    }
}

impl GitHubApi for MockGitHub {
    fn release(
        &self,
        repo: &RepoRef,
        query: &ReleaseQuery,
        private: bool,
    ) -> Result<Release, FetchError> {
        let key = match query {
            ReleaseQuery::Latest => "latest".to_string(),
            ReleaseQuery::Tag(tag) => tag.clone(),
        };
        self.record(format!("release {} {}", repo, key));
        if private && !self.has_token {
            return Err(FetchError::CredentialRequired {
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
            });
        }
        self.releases
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
            })
    }

    fn download_asset(
        &self,
        _repo: &RepoRef,
        asset: &RemoteAsset,
        target: &Path,
    ) -> Result<(), FetchError> {
        self.record(format!("api {}", asset.id));
        self.write(&asset.url, target)
    }

    fn download_url(
        &self,
        url: &str,
        target: &Path,
        authenticated: bool,
    ) -> Result<(), FetchError> {
        self.record(format!("url {} auth={}", url, authenticated));
        self.write(url, target)
    }
}

/// Pretends to clone by creating the target directory.
#[derive(Default)]
pub struct MockRepository {
    /// `None` makes `latest_commit` fail.
    pub head: Option<String>,
    pub fail_clone: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockRepository {
    pub fn with_head(head: &str) -> Self {
        Self {
            head: Some(head.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl RepositoryProvider for MockRepository {
    fn latest_commit(&self, url: &str, _private: bool) -> FractureResult<String> {
        self.record(format!("ls-remote {}", url));
        self.head
            .as_deref()
            .map(crate::repo::short_hash)
            .ok_or_else(|| FractureError::Repository(format!("cannot reach {}", url)))
    }

    fn clone_or_update(&self, url: &str, target: &Path, _private: bool) -> FractureResult<()> {
        let action = if target.exists() { "pull" } else { "clone" };
        self.record(format!("{} {} {}", action, url, target.display()));
        if self.fail_clone {
            return Err(FractureError::Repository(format!("failed to clone {}", url)));
        }
        fs::create_dir_all(target)?;
        Ok(())
    }

    fn checkout(&self, target: &Path, rev: &str) -> FractureResult<()> {
        self.record(format!("checkout {} {}", rev, target.display()));
        Ok(())
    }
}

/// Reads a file produced by a test archive builder.
pub fn bytes_of(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap_or_default()
}
