//! Moving extracted files into their final destination.
//!
//! Extraction always happens inside a scratch directory; these functions
//! move the results out:
//!
//! - [`place_all`] keeps the relative layout (directory mode)
//! - [`place_single`] renames the only file to a fixed name (single-file mode)
//! - [`place_source_tree`] strips the wrapper folder of a GitHub source archive

use crate::error::ExtractError;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Directory mode: moves every file under `root` to the same relative
/// location under `dest`. Zero files is fine.
pub fn place_all(
    files: &BTreeSet<PathBuf>,
    root: &Path,
    dest: &Path,
) -> Result<Vec<PathBuf>, ExtractError> {
    fs::create_dir_all(dest)?;
    let mut placed = Vec::with_capacity(files.len());
    for file in files {
        let relative = file.strip_prefix(root).map_err(|_| {
            ExtractError::PathTraversalRejected(file.display().to_string())
        })?;
        let target = dest.join(relative);
        move_file(file, &target)?;
        placed.push(target);
    }
    debug!("Placed {} files in {}", placed.len(), dest.display());
    Ok(placed)
}

/// Single-file mode: the extraction must have produced exactly one regular
/// file, which becomes `dest_dir/name`.
pub fn place_single(
    files: &BTreeSet<PathBuf>,
    dest_dir: &Path,
    name: &str,
) -> Result<PathBuf, ExtractError> {
    let mut iter = files.iter();
    let only = match (iter.next(), files.len()) {
        (None, _) => return Err(ExtractError::EmptyArchive),
        (Some(only), 1) => only,
        (Some(_), count) => return Err(ExtractError::UnexpectedFileCount { count }),
    };
    fs::create_dir_all(dest_dir)?;
    let target = dest_dir.join(name);
    move_file(only, &target)?;
    Ok(target)
}

/// Source archives: when `root` holds a single top-level directory, its
/// contents land directly in `dest`; otherwise `root` is placed as is.
pub fn place_source_tree(root: &Path, dest: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let base = wrapper_dir(root)?.unwrap_or_else(|| root.to_path_buf());
    if base != root {
        debug!("Stripping wrapper directory {}", base.display());
    }

    fs::create_dir_all(dest)?;
    let mut placed = Vec::new();
    for entry in WalkDir::new(&base).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(&base)
            .map_err(|_| ExtractError::PathTraversalRejected(entry.path().display().to_string()))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            move_file(entry.path(), &target)?;
            placed.push(target);
        }
    }
    Ok(placed)
}

/// The single top-level directory of `root`, if that is all it contains.
fn wrapper_dir(root: &Path) -> io::Result<Option<PathBuf>> {
    let mut entries = fs::read_dir(root)?.collect::<io::Result<Vec<_>>>()?;
    if entries.len() != 1 {
        return Ok(None);
    }
    let entry = entries.remove(0);
    if entry.file_type()?.is_dir() {
        Ok(Some(entry.path()))
    } else {
        Ok(None)
    }
}

/// Renames `from` to `to`, copying across filesystems when rename fails.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}
