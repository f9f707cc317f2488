//! CLI command handlers
//!
//! `install` and `update` share the bulk pass in this module: load the
//! manifest and prior lock, install every entry in declaration order, and
//! merge the successes into the lock file.

pub mod install;
pub mod update;

use crate::config::Settings;
use crate::install::Installer;
use crate::lock::{LockEntry, LockFile};
use crate::manifest;
use anyhow::{Context, Result};
use colored::*;
use tracing::error;

/// Result of installing every manifest entry.
pub struct BulkOutcome {
    /// Lock file as it was before the run.
    pub prior: LockFile,
    /// Lock entries produced this run, in manifest order.
    pub installed: Vec<LockEntry>,
    /// Names of entries that failed.
    pub failed: Vec<String>,
}

/// Installs every entry; failures are reported and skipped. The lock file is
/// saved once at the end and keeps entries no longer in the manifest.
pub fn install_all(settings: &Settings, installer: &Installer) -> Result<BulkOutcome> {
    let manifest = manifest::load(&settings.manifest_path)?;
    let prior = LockFile::load(&settings.lock_path);
    let mut lock = prior.clone();
    let mut installed = Vec::new();
    let mut failed = Vec::new();

    for (name, entry) in &manifest {
        match installer.install(name, entry, None) {
            Ok(locked) => {
                lock.insert(locked.clone());
                installed.push(locked);
            }
            Err(err) => {
                error!(entry = name.as_str(), error = %err, "install failed");
                println!("   {} Failed to install {}: {}", "x".red(), name.bold(), err);
                failed.push(name.clone());
            }
        }
    }

    lock.save(&settings.lock_path)
        .with_context(|| format!("Failed to save {}", settings.lock_path.display()))?;
    Ok(BulkOutcome {
        prior,
        installed,
        failed,
    })
}

fn print_summary(verb: &str, outcome: &BulkOutcome) {
    if outcome.failed.is_empty() {
        println!(
            "{} {} {} dependencies",
            "✓".green(),
            verb,
            outcome.installed.len()
        );
    } else {
        println!(
            "{} {} {} dependencies, {} failed: {}",
            "!".yellow(),
            verb,
            outcome.installed.len(),
            outcome.failed.len(),
            outcome.failed.join(", ")
        );
    }
}
