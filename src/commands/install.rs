//! `fracture install`

use super::{install_all, print_summary};
use crate::config::Settings;
use crate::install::Installer;
use crate::reconcile::{Drift, reconcile};
use anyhow::Result;
use colored::*;

/// Installs everything in the manifest and reports drift against the
/// previous lock file.
pub fn run_install(settings: &Settings, installer: &Installer) -> Result<Vec<Drift>> {
    println!(
        "{} Installing dependencies from {}",
        "🚀".blue(),
        settings.manifest_path.display()
    );

    let outcome = install_all(settings, installer)?;
    let drift = reconcile(&outcome.prior, &outcome.installed);
    for change in &drift {
        match &change.previous {
            Some(previous) => println!(
                "{} Update available for {}: {} -> {}",
                "📦".blue(),
                change.name.bold(),
                previous,
                change.current.cyan()
            ),
            None => println!(
                "{} New dependency {}: {}",
                "📦".blue(),
                change.name.bold(),
                change.current.cyan()
            ),
        }
    }
    if !drift.is_empty() {
        println!(
            "{} Updates available! Run '{}' to update.",
            "📋".blue(),
            "fracture update".bold()
        );
    }

    print_summary("Installed", &outcome);
    Ok(drift)
}
