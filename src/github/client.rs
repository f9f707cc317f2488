//! Blocking GitHub client on top of `ureq`.
//!
//! No retries: a transient network failure surfaces immediately.

use super::GitHubApi;
use super::types::{Release, ReleaseQuery, RemoteAsset, RepoRef};
use crate::config::Settings;
use crate::error::FetchError;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;
use ureq::Agent;
use ureq::http::Response;

const USER_AGENT: &str = concat!("fracture/", env!("CARGO_PKG_VERSION"));
const OCTET_STREAM: &str = "application/octet-stream";
const GITHUB_JSON: &str = "application/vnd.github+json";

pub struct GitHubClient {
    agent: Agent,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(settings: &Settings) -> Self {
        let config = Agent::config_builder().http_status_as_error(false).build();
        Self {
            agent: config.into(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.github_token.clone(),
        }
    }

    fn get(
        &self,
        url: &str,
        accept: &str,
        authenticated: bool,
    ) -> Result<Response<ureq::Body>, FetchError> {
        debug!(url, authenticated, "GET");
        let mut request = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", accept);
        if authenticated && let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        Ok(request.call()?)
    }

    fn require_token(&self, repo: &RepoRef) -> Result<(), FetchError> {
        if self.token.is_none() {
            return Err(FetchError::CredentialRequired {
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
            });
        }
        Ok(())
    }
}

impl GitHubApi for GitHubClient {
    fn release(
        &self,
        repo: &RepoRef,
        query: &ReleaseQuery,
        private: bool,
    ) -> Result<Release, FetchError> {
        if private {
            self.require_token(repo)?;
        }
        let url = match query {
            ReleaseQuery::Latest => format!(
                "{}/repos/{}/{}/releases/latest",
                self.api_url, repo.owner, repo.name
            ),
            ReleaseQuery::Tag(tag) => format!(
                "{}/repos/{}/{}/releases/tags/{}",
                self.api_url, repo.owner, repo.name, tag
            ),
        };

        // Public lookups still send the token when one exists; it raises the
        // API rate limit.
        let mut response = self.get(&url, GITHUB_JSON, true)?;
        match response.status().as_u16() {
            200 => Ok(response.body_mut().read_json::<Release>()?),
            404 => Err(FetchError::NotFound {
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
            }),
            code => Err(FetchError::Status { code, url }),
        }
    }

    fn download_asset(
        &self,
        repo: &RepoRef,
        asset: &RemoteAsset,
        target: &Path,
    ) -> Result<(), FetchError> {
        self.require_token(repo)?;
        let url = format!(
            "{}/repos/{}/{}/releases/assets/{}",
            self.api_url, repo.owner, repo.name, asset.id
        );
        println!("   {} Downloading via API: {}", "↓".blue(), asset.name);
        let response = self.get(&url, OCTET_STREAM, true)?;
        write_response(response, &url, target)
    }

    fn download_url(
        &self,
        url: &str,
        target: &Path,
        authenticated: bool,
    ) -> Result<(), FetchError> {
        println!("   {} Downloading {}", "↓".blue(), url);
        let response = self.get(url, OCTET_STREAM, authenticated)?;
        write_response(response, url, target)
    }
}

/// Streams a 200 response body into `target` and marks it executable.
fn write_response(
    response: Response<ureq::Body>,
    url: &str,
    target: &Path,
) -> Result<(), FetchError> {
    let code = response.status().as_u16();
    if code != 200 {
        return Err(FetchError::Status {
            code,
            url: url.to_string(),
        });
    }

    let total_size = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let pb = ProgressBar::new(total_size);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.blue} [{elapsed_precise}] [{bar:40.green/black}] {bytes}/{total_bytes} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_chars("◐◓◑◒")
        .progress_chars("━━╸"));

    let mut file = File::create(target)?;
    let mut reader = response.into_body().into_reader();
    let mut buffer = [0; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])?;
        pb.inc(n as u64);
    }
    file.flush()?;
    pb.finish_and_clear();

    crate::archive::make_executable(target)?;
    debug!(target = %target.display(), "download complete");
    Ok(())
}
