//! `fracture self-update`
//!
//! Fetches the latest release of fracture itself, picks the asset for the
//! running platform, smoke-tests it and swaps it in for the current
//! executable.

use crate::archive::{self, ArchiveFormat, ScratchDir};
use crate::github::{GitHubApi, ReleaseQuery, RemoteAsset, RepoRef};
use anyhow::{Context, Result, bail};
use colored::*;
use semver::Version;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

const REPO_OWNER: &str = "glitch-vpn";
const REPO_NAME: &str = "fracture";

pub fn check_and_upgrade(github: &dyn GitHubApi) -> Result<()> {
    println!("{} Checking for fracture updates...", "🔍".blue());

    let current_ver = Version::parse(env!("CARGO_PKG_VERSION"))?;
    let repo = RepoRef {
        owner: REPO_OWNER.to_string(),
        name: REPO_NAME.to_string(),
    };
    let release = github
        .release(&repo, &ReleaseQuery::Latest, false)
        .context("Failed to check for updates")?;

    let tag_clean = release.tag.trim_start_matches('v');
    let remote_ver = Version::parse(tag_clean).context("Failed to parse remote version")?;
    if remote_ver <= current_ver {
        println!("{} fracture is up to date (v{})", "✓".green(), current_ver);
        return Ok(());
    }
    println!(
        "{} New version available: v{} -> v{}",
        "🚀".green(),
        current_ver,
        remote_ver
    );

    let (os, arch) = (platform_os(), platform_arch());
    println!("   Current platform: {}/{}", os, arch);
    let asset = find_platform_asset(&release.assets, os, arch)
        .with_context(|| format!("No suitable binary found for {}/{}", os, arch))?;
    println!("   {} Selected asset: {}", "→".blue(), asset.name);

    let current_exe = env::current_exe().context("Failed to locate the running executable")?;
    let exe_dir = current_exe
        .parent()
        .context("Executable has no parent directory")?;
    let scratch = ScratchDir::create(&exe_dir.join("tmp_update"), "download")?;
    let download = scratch.join(&asset.name);
    github
        .download_url(&asset.url, &download, false)
        .context("Failed to download update")?;

    let new_binary = if ArchiveFormat::from_name(&asset.name).is_some() {
        let files = archive::extract_archive(&download, &scratch.join("extracted"))
            .context("Failed to extract update archive")?;
        pick_executable(&files).context("No executable binary found in archive")?
    } else {
        download
    };
    archive::make_executable(&new_binary)?;

    println!("   Testing new binary...");
    let output = Command::new(&new_binary)
        .arg("version")
        .output()
        .context("New binary failed to run")?;
    if !output.status.success() {
        bail!(
            "New binary failed its version check: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    debug!(output = %String::from_utf8_lossy(&output.stdout), "new binary version");

    replace_executable(&new_binary, &current_exe)?;
    println!("{} Successfully upgraded to v{}!", "✓".green(), remote_ver);
    Ok(())
}

/// Release naming convention for the running OS.
fn platform_os() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Release naming convention for the running architecture.
fn platform_arch() -> &'static str {
    match env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

fn os_aliases(os: &str) -> &'static [&'static str] {
    match os {
        "darwin" => &["macos", "mac"],
        "windows" => &["win", "win32"],
        _ => &[],
    }
}

fn arch_aliases(arch: &str) -> &'static [&'static str] {
    match arch {
        "amd64" => &["x86_64", "x64"],
        "arm64" => &["aarch64"],
        "386" => &["i386", "x86"],
        _ => &[],
    }
}

/// Finds the release asset for `os`/`arch`.
///
/// Exact `os_arch`, `os-arch` and `os.arch` patterns (aliases included) are
/// tried first, in that order; otherwise the first asset naming both an OS
/// and an architecture alias wins.
pub fn find_platform_asset<'r>(
    assets: &'r [RemoteAsset],
    os: &str,
    arch: &str,
) -> Option<&'r RemoteAsset> {
    let os_names: Vec<&str> = std::iter::once(os).chain(os_aliases(os).iter().copied()).collect();
    let arch_names: Vec<&str> = std::iter::once(arch)
        .chain(arch_aliases(arch).iter().copied())
        .collect();

    let mut patterns = Vec::new();
    for a in &arch_names {
        for o in &os_names {
            for sep in ['_', '-', '.'] {
                patterns.push(format!("{}{}{}", o, sep, a));
            }
        }
    }

    let lowered: Vec<String> = assets.iter().map(|a| a.name.to_lowercase()).collect();
    for pattern in &patterns {
        if let Some(i) = lowered.iter().position(|name| name.contains(pattern.as_str())) {
            debug!(pattern = pattern.as_str(), asset = %assets[i].name, "exact platform match");
            return Some(&assets[i]);
        }
    }

    lowered
        .iter()
        .position(|name| {
            os_names.iter().any(|o| name.contains(o)) && arch_names.iter().any(|a| name.contains(a))
        })
        .map(|i| &assets[i])
}

/// The extracted file most likely to be the fracture binary.
fn pick_executable(files: &BTreeSet<PathBuf>) -> Option<PathBuf> {
    let named = files.iter().find(|f| {
        f.file_name()
            .is_some_and(|n| n.to_string_lossy().contains(REPO_NAME))
    });
    named.or_else(|| files.iter().find(|f| is_executable(f))).cloned()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "exe")
}

fn replace_executable(new_binary: &Path, current_exe: &Path) -> Result<()> {
    let staged = current_exe.with_extension("tmp");
    fs::copy(new_binary, &staged).context("Failed to stage new binary")?;
    archive::make_executable(&staged)?;

    if cfg!(target_os = "windows") {
        // A running executable can be renamed but not overwritten.
        let old_exe = current_exe.with_extension("old");
        if old_exe.exists() {
            let _ = fs::remove_file(&old_exe);
        }
        fs::rename(current_exe, &old_exe).context("Failed to move the running executable")?;
    }
    if let Err(err) = fs::rename(&staged, current_exe) {
        let _ = fs::remove_file(&staged);
        return Err(err).context("Failed to replace binary");
    }
    Ok(())
}
