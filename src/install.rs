//! Installing a single manifest entry.
//!
//! One [`Installer`] drives the type-specific flow for each entry:
//!
//! - **binary**: release lookup, asset selection, download, optional
//!   extraction into directory or single-file layout
//! - **source**: GitHub's generated archive for the release tag, optionally
//!   extracted with its wrapper folder stripped
//! - **repository**: clone or pull, recording the remote `HEAD` hash
//!
//! Network and git access go through [`GitHubApi`] and
//! [`RepositoryProvider`], so the whole flow runs against fakes in tests.

use crate::archive::{self, ArchiveFormat, ScratchDir};
use crate::config::{Environment, Settings};
use crate::error::FractureResult;
use crate::expand::{self, Expanded, PathExpander, Pending, Resolved};
use crate::github::{GitHubApi, Release, ReleaseQuery, RemoteAsset, RepoRef, parse_repo};
use crate::lock::LockEntry;
use crate::manifest::{DependencyType, ManifestEntry};
use crate::repo::RepositoryProvider;
use crate::select::{AssetFilters, select_asset};
use crate::ui::{self, Table};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Recorded when the remote `HEAD` of a repository cannot be resolved.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Scratch subdirectory that receives extracted archive contents.
const UNPACK_DIR: &str = "unpacked";

pub struct Installer<'a> {
    settings: &'a Settings,
    github: &'a dyn GitHubApi,
    repos: &'a dyn RepositoryProvider,
    expander: PathExpander<'a>,
}

impl<'a> Installer<'a> {
    pub fn new(
        settings: &'a Settings,
        github: &'a dyn GitHubApi,
        repos: &'a dyn RepositoryProvider,
        env: &'a dyn Environment,
    ) -> Self {
        Self {
            settings,
            github,
            repos,
            expander: PathExpander::new(env),
        }
    }

    /// Installs `entry`, at `version` when given, otherwise at the latest
    /// release or commit.
    pub fn install(
        &self,
        name: &str,
        entry: &ManifestEntry,
        version: Option<&str>,
    ) -> FractureResult<LockEntry> {
        let kind = entry.resolve_type(name, self.settings.infer_types)?;
        println!("{} Installing {} ({})", "📦".blue(), name.bold(), kind);

        let (path, resolved_version) = match kind {
            DependencyType::Binary => self.install_binary(name, entry, version)?,
            DependencyType::Source => self.install_source(name, entry, version)?,
            DependencyType::Repository => self.install_repository(name, entry, version)?,
        };

        let mut lock = LockEntry {
            name: name.to_string(),
            path,
            source: entry.source.clone(),
            version: resolved_version.clone(),
            hash: resolved_version,
            kind,
            private: entry.private,
            extract: entry.extract,
        };
        if let Some(version) = version {
            lock.pin(version);
        }
        println!(
            "   {} Installed {} ({})",
            "✓".green(),
            name,
            lock.version.cyan()
        );
        Ok(lock)
    }

    fn install_binary(
        &self,
        name: &str,
        entry: &ManifestEntry,
        version: Option<&str>,
    ) -> FractureResult<(String, String)> {
        let repo = parse_repo(&entry.source)?;
        let pending = self.expander.pending(&entry.path);
        let release = self.fetch_release(&repo, version, entry.private)?;
        print_assets(&release);

        let asset = select_asset(&release.assets, AssetFilters::from(entry), &release.tag)?;
        println!("   {} Selected asset: {}", "→".blue(), asset.name);

        let resolved = Resolved {
            version: &release.tag,
            asset_extension: expand::file_extension(&asset.name),
            extract: entry.extract,
        };
        let path = self.finish(name, pending, resolved);
        let dest = self.settings.work_dir.join(&path);

        match ArchiveFormat::from_name(&asset.name) {
            Some(_) if entry.extract => {
                let scratch = ScratchDir::create(&self.settings.scratch_dir, name)?;
                let download = scratch.join(&asset.name);
                self.download_asset(&repo, asset, &download, entry.private)?;
                let fixed_name = entry
                    .filename
                    .as_deref()
                    .map(|f| self.expand(name, f, resolved));
                self.unpack(&scratch, &download, &dest, fixed_name.as_deref())?;
            }
            _ => {
                if entry.extract {
                    ui::warn_line(&format!(
                        "extract is set but {} is not a supported archive format",
                        asset.name
                    ));
                }
                let file_name = match entry.filename.as_deref() {
                    Some(f) => self.expand(name, f, resolved),
                    None => asset.name.clone(),
                };
                self.download_asset(&repo, asset, &dest.join(file_name), entry.private)?;
            }
        }

        Ok((path, release.tag))
    }

    fn install_source(
        &self,
        name: &str,
        entry: &ManifestEntry,
        version: Option<&str>,
    ) -> FractureResult<(String, String)> {
        entry.validate_source(name)?;
        let repo = parse_repo(&entry.source)?;
        let pending = self.expander.pending(&entry.path);
        let release = self.fetch_release(&repo, version, entry.private)?;

        let format = entry.source_format();
        let resolved = Resolved {
            version: &release.tag,
            asset_extension: Some(format),
            extract: entry.extract,
        };
        let path = self.finish(name, pending, resolved);
        let dest = self.settings.work_dir.join(&path);
        let url = repo.source_archive_url(&release.tag, format);
        println!("   {} Source archive ({}): {}", "→".blue(), format, url);

        if entry.extract {
            let scratch = ScratchDir::create(&self.settings.scratch_dir, name)?;
            let download = scratch.join(&format!("{}-{}.{}", repo.name, release.tag, format));
            self.github.download_url(&url, &download, entry.private)?;

            let unpacked = scratch.join(UNPACK_DIR);
            archive::extract_archive(&download, &unpacked)?;
            let placed = archive::place_source_tree(&unpacked, &dest)?;
            println!(
                "   {} Extracted {} files to {}",
                "✓".green(),
                placed.len(),
                dest.display()
            );
        } else {
            let archive_name = match entry.filename.as_deref() {
                Some(f) => self.expand(name, f, resolved),
                None => format!("{}-{}.{}", repo.name, release.tag, format),
            };
            self.github
                .download_url(&url, &dest.join(archive_name), entry.private)?;
        }

        Ok((path, release.tag))
    }

    fn install_repository(
        &self,
        name: &str,
        entry: &ManifestEntry,
        version: Option<&str>,
    ) -> FractureResult<(String, String)> {
        let pending = self.expander.pending(&entry.path);
        let resolved_version = match version {
            Some(rev) => rev.to_string(),
            None => match self.repos.latest_commit(&entry.source, entry.private) {
                Ok(hash) => hash,
                Err(err) => {
                    warn!(entry = name, error = %err, "could not resolve latest commit");
                    ui::warn_line(&format!(
                        "could not resolve latest commit of {}, recording '{}'",
                        entry.source, UNKNOWN_VERSION
                    ));
                    UNKNOWN_VERSION.to_string()
                }
            },
        };

        let resolved = Resolved {
            version: &resolved_version,
            asset_extension: None,
            extract: entry.extract,
        };
        let path = self.finish(name, pending, resolved);
        let dest = self.settings.work_dir.join(&path);

        self.repos
            .clone_or_update(&entry.source, &dest, entry.private)?;
        if let Some(rev) = version {
            self.repos.checkout(&dest, rev)?;
        }

        Ok((path, resolved_version))
    }

    fn fetch_release(
        &self,
        repo: &RepoRef,
        version: Option<&str>,
        private: bool,
    ) -> FractureResult<Release> {
        let query = ReleaseQuery::from_version(version);
        debug!(repo = %repo, ?query, private, "fetching release");
        Ok(self.github.release(repo, &query, private)?)
    }

    fn download_asset(
        &self,
        repo: &RepoRef,
        asset: &RemoteAsset,
        target: &Path,
        private: bool,
    ) -> FractureResult<()> {
        if private {
            self.github.download_asset(repo, asset, target)?;
        } else {
            self.github.download_url(&asset.url, target, false)?;
        }
        Ok(())
    }

    /// Extracts `download` inside `scratch` and places the result at `dest`.
    fn unpack(
        &self,
        scratch: &ScratchDir,
        download: &Path,
        dest: &Path,
        fixed_name: Option<&str>,
    ) -> FractureResult<Vec<PathBuf>> {
        let unpacked = scratch.join(UNPACK_DIR);
        let files = archive::extract_archive(download, &unpacked)?;
        println!("   {} Found {} files in archive", "→".blue(), files.len());

        let placed = match fixed_name {
            Some(file_name) => vec![archive::place_single(&files, dest, file_name)?],
            None => archive::place_all(&files, &unpacked, dest)?,
        };
        println!(
            "   {} Extracted {} files to {}",
            "✓".green(),
            placed.len(),
            dest.display()
        );
        Ok(placed)
    }

    fn finish(&self, name: &str, pending: Pending, resolved: Resolved<'_>) -> String {
        let expanded = self.expander.finish(pending, resolved);
        report_empty(name, &expanded);
        debug!(entry = name, path = %expanded.path, "expanded destination");
        expanded.path
    }

    fn expand(&self, name: &str, template: &str, resolved: Resolved<'_>) -> String {
        let expanded = self.expander.expand(template, resolved);
        report_empty(name, &expanded);
        expanded.path
    }
}

/// Warns about placeholders that expanded to nothing.
fn report_empty(name: &str, expanded: &Expanded) {
    if expanded.empty.is_empty() {
        return;
    }
    warn!(
        entry = name,
        placeholders = ?expanded.empty,
        "placeholders expanded to empty strings"
    );
    ui::warn_line(&format!(
        "{}: {} expanded to an empty string ({})",
        name,
        expanded.empty.join(", "),
        expanded.path
    ));
}

fn print_assets(release: &Release) {
    println!(
        "   {} Release {} has {} assets:",
        "→".blue(),
        release.tag.cyan(),
        release.assets.len()
    );
    let mut table = Table::new(&["#", "Asset", "URL"]);
    for (i, asset) in release.assets.iter().enumerate() {
        table.add_row(vec![i.to_string(), asset.name.clone(), asset.url.clone()]);
    }
    table.print();
}
