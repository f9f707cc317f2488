//! Archive extraction.
//!
//! Supports `.tar.gz`/`.tgz`, `.tar.xz` and `.zip`. Every entry name is
//! normalized and must stay inside the target directory; a single escaping
//! entry aborts the whole extraction with `PathTraversalRejected`.
//!
//! Placement of extracted files into their final destination lives in
//! [`place`].

pub mod place;
pub mod scratch;

pub use place::{place_all, place_single, place_source_tree};
pub use scratch::ScratchDir;

use crate::error::ExtractError;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    Zip,
}

impl ArchiveFormat {
    /// Infers the format from a file name suffix.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".tar.xz") {
            Some(Self::TarXz)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Extracts `archive_path` into `dest_dir`, dispatching on the file name.
///
/// Returns the regular files written, as absolute paths under `dest_dir`.
pub fn extract_archive(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<BTreeSet<PathBuf>, ExtractError> {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let format =
        ArchiveFormat::from_name(&name).ok_or_else(|| ExtractError::UnsupportedFormat(name))?;

    info!(
        "Extracting {:?} archive {} to {}",
        format,
        archive_path.display(),
        dest_dir.display()
    );
    fs::create_dir_all(dest_dir)?;

    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    match format {
        ArchiveFormat::TarGz => extract_tar(flate2::read::GzDecoder::new(reader), dest_dir),
        ArchiveFormat::TarXz => extract_tar(xz2::read::XzDecoder::new(reader), dest_dir),
        ArchiveFormat::Zip => extract_zip(reader, dest_dir),
    }
}

/// Joins an archive entry name onto `dest_dir` after lexical normalization.
///
/// `a/../b` is accepted (it stays inside); `../x`, `a/../../x` and absolute
/// names are rejected.
pub fn safe_join(dest_dir: &Path, entry_name: &str) -> Result<PathBuf, ExtractError> {
    let rejected = || ExtractError::PathTraversalRejected(entry_name.to_string());
    if entry_name.starts_with('/') || entry_name.starts_with('\\') {
        return Err(rejected());
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(rejected());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(rejected()),
        }
    }
    Ok(dest_dir.join(normalized))
}

// ============================================================================
// TAR Extraction
// ============================================================================

fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<BTreeSet<PathBuf>, ExtractError> {
    let mut archive = tar::Archive::new(reader);
    let mut files = BTreeSet::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_type = entry.header().entry_type();
        let raw_name = entry.path()?.to_string_lossy().to_string();
        let dest_path = safe_join(dest_dir, &raw_name)?;

        if entry_type.is_dir() {
            fs::create_dir_all(&dest_path)?;
            #[cfg(unix)]
            if let Ok(mode) = entry.header().mode() {
                set_dir_mode(&dest_path, mode)?;
            }
        } else if entry_type.is_file() {
            write_entry(&mut entry, &dest_path)?;
            #[cfg(unix)]
            if let Ok(mode) = entry.header().mode() {
                set_file_mode(&dest_path, mode)?;
            }
            files.insert(dest_path);
        } else if entry_type.is_symlink() || entry_type.is_hard_link() {
            warn!("Skipping link entry in tar archive: {}", raw_name);
        } else {
            debug!("Skipping tar entry {} ({:?})", raw_name, entry_type);
        }
    }

    debug!("TAR extraction complete: {} files", files.len());
    Ok(files)
}

// ============================================================================
// ZIP Extraction
// ============================================================================

fn extract_zip<R: Read + io::Seek>(
    reader: R,
    dest_dir: &Path,
) -> Result<BTreeSet<PathBuf>, ExtractError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut files = BTreeSet::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let raw_name = entry.name().to_string();
        let dest_path = safe_join(dest_dir, &raw_name)?;
        let mode = entry.unix_mode();

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            #[cfg(unix)]
            if let Some(mode) = mode {
                set_dir_mode(&dest_path, mode)?;
            }
        } else {
            write_entry(&mut entry, &dest_path)?;
            #[cfg(unix)]
            if let Some(mode) = mode {
                set_file_mode(&dest_path, mode)?;
            }
            files.insert(dest_path);
        }
    }

    debug!("ZIP extraction complete: {} files", files.len());
    Ok(files)
}

fn write_entry(entry: &mut impl Read, dest_path: &Path) -> io::Result<()> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut outfile = File::create(dest_path)?;
    io::copy(entry, &mut outfile)?;
    outfile.flush()
}

// ============================================================================
// Unix Permissions
// ============================================================================

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // Keep the file readable and writable by its owner.
    fs::set_permissions(path, fs::Permissions::from_mode((mode & 0o7777) | 0o600))
}

#[cfg(unix)]
fn set_dir_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // Directories must stay enterable and writable while files land in them.
    fs::set_permissions(path, fs::Permissions::from_mode((mode & 0o7777) | 0o700))
}

/// Sets the executable bits on a file (0o755). No-op on Windows.
#[allow(unused_variables)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Archive builders shared by the extraction and installer tests.

    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    pub fn tar_gz(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            append_raw(&mut builder, name, data, 0o755);
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    pub fn tar_xz(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = xz2::write::XzEncoder::new(file, 6);
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            append_raw(&mut builder, name, data, 0o644);
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    pub fn zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o755);
        for (name, data) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    /// Appends an entry without the builder's path validation so tests can
    /// produce hostile names like `../x`.
    pub fn append_raw<W: Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8], mode: u32) {
        let mut header = tar::Header::new_gnu();
        {
            let gnu = header.as_gnu_mut().unwrap();
            gnu.name[..name.len()].copy_from_slice(name.as_bytes());
        }
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, data).unwrap();
    }

    pub fn append_dir<W: Write>(builder: &mut tar::Builder<W>, name: &str) {
        let mut header = tar::Header::new_gnu();
        header.set_path(name).unwrap();
        header.set_size(0);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Directory);
        header.set_cksum();
        builder.append(&header, &[][..]).unwrap();
    }
}
