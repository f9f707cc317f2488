//! Git checkouts for `repository` dependencies.
//!
//! Remote ref lookup and the initial clone go through `git2`; updates and
//! explicit checkouts shell out to `git` so they honor the user's git
//! configuration.

use crate::error::{FractureError, FractureResult};
use colored::*;
use git2::{Direction, Remote, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Length of the commit hash recorded in the lock file.
pub const SHORT_HASH_LEN: usize = 8;

pub trait RepositoryProvider {
    /// Short hash of the remote `HEAD`.
    fn latest_commit(&self, url: &str, private: bool) -> FractureResult<String>;

    /// Clones into `target`, or pulls when `target` already exists.
    fn clone_or_update(&self, url: &str, target: &Path, private: bool) -> FractureResult<()>;

    /// Checks out `rev` in an existing working tree.
    fn checkout(&self, target: &Path, rev: &str) -> FractureResult<()>;
}

pub struct GitProvider {
    token: Option<String>,
}

impl GitProvider {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Embeds the token into `https://github.com/` URLs of private entries.
    fn remote_url(&self, url: &str, private: bool) -> String {
        match &self.token {
            Some(token) if private && url.starts_with("https://github.com/") => url.replacen(
                "https://github.com/",
                &format!("https://{}@github.com/", token),
                1,
            ),
            _ => url.to_string(),
        }
    }

    fn require_token(&self, url: &str, private: bool) -> FractureResult<()> {
        if private && self.token.is_none() {
            return Err(FractureError::Repository(format!(
                "private repository {} requires {}",
                url,
                crate::config::TOKEN_ENV
            )));
        }
        Ok(())
    }
}

impl RepositoryProvider for GitProvider {
    fn latest_commit(&self, url: &str, private: bool) -> FractureResult<String> {
        self.require_token(url, private)?;
        let mut remote = Remote::create_detached(self.remote_url(url, private))?;
        remote.connect(Direction::Fetch)?;
        let head = remote
            .list()?
            .iter()
            .find(|head| head.name() == "HEAD")
            .map(|head| head.oid().to_string())
            .ok_or_else(|| FractureError::Repository(format!("no HEAD advertised by {}", url)))?;
        debug!(url, head = %head, "resolved remote HEAD");
        Ok(short_hash(&head))
    }

    fn clone_or_update(&self, url: &str, target: &Path, private: bool) -> FractureResult<()> {
        let remote = self.remote_url(url, private);

        if !target.exists() {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.blue} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷"),
            );
            pb.set_message(format!("Cloning {} to {}...", url, target.display()));
            pb.enable_steady_tick(std::time::Duration::from_millis(100));

            return match Repository::clone(&remote, target) {
                Ok(_) => {
                    pb.finish_with_message(format!("{} Cloned {}", "✓".green(), url));
                    Ok(())
                }
                Err(err) => {
                    pb.finish_with_message(format!("{} Failed to clone {}", "x".red(), url));
                    Err(FractureError::Repository(format!(
                        "failed to clone {}: {}",
                        url,
                        err.message()
                    )))
                }
            };
        }

        println!("   {} Updating {}...", "↻".blue(), target.display());
        if run_git(target, &["pull", "origin", "main"]).is_ok() {
            return Ok(());
        }
        debug!(target = %target.display(), "pull from main failed, trying master");
        run_git(target, &["pull", "origin", "master"])
    }

    fn checkout(&self, target: &Path, rev: &str) -> FractureResult<()> {
        println!("   {} Checking out {}", "→".blue(), rev);
        run_git(target, &["checkout", rev])
    }
}

fn run_git(target: &Path, args: &[&str]) -> FractureResult<()> {
    let output = Command::new("git")
        .arg("-C")
        .arg(target)
        .args(args)
        .output()
        .map_err(|e| FractureError::Repository(format!("failed to run git: {}", e)))?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(FractureError::Repository(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )))
    }
}

pub fn short_hash(hash: &str) -> String {
    hash.chars().take(SHORT_HASH_LEN).collect()
}
