//! GitHub integration.
//!
//! - Release metadata lookup (latest or by tag)
//! - Asset downloads, either through the API (private repositories) or from
//!   the public download URL
//! - Source archive URLs for a tag

pub mod client;
pub mod types;

pub use client::GitHubClient;
pub use types::{Release, ReleaseQuery, RemoteAsset, RepoRef, parse_repo};

use crate::error::FetchError;
use std::path::Path;

/// Remote side of binary and source installs.
pub trait GitHubApi {
    /// Fetches release metadata. Fails with `CredentialRequired` for a
    /// private repository when no token is configured.
    fn release(
        &self,
        repo: &RepoRef,
        query: &ReleaseQuery,
        private: bool,
    ) -> Result<Release, FetchError>;

    /// Downloads an asset through the authenticated API endpoint.
    fn download_asset(
        &self,
        repo: &RepoRef,
        asset: &RemoteAsset,
        target: &Path,
    ) -> Result<(), FetchError>;

    /// Downloads a URL directly, sending credentials when `authenticated`.
    fn download_url(&self, url: &str, target: &Path, authenticated: bool)
    -> Result<(), FetchError>;
}
