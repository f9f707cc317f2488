//! Per-entry scratch directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix that keeps per-entry directories apart from anything else under
/// the scratch root.
const ENTRY_PREFIX: &str = "extract_";

/// A directory under the shared scratch root, owned by one entry's install.
///
/// Stale contents from an earlier failed run are cleared on creation, and
/// the directory is removed on drop. The shared root is removed only when
/// nothing else lives in it.
#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
    path: PathBuf,
}

impl ScratchDir {
    pub fn create(root: &Path, entry_name: &str) -> io::Result<Self> {
        let path = root.join(format!("{}{}", ENTRY_PREFIX, sanitize(entry_name)));
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;
        debug!("Created scratch directory {}", path.display());
        Ok(Self {
            root: root.to_path_buf(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.path)
            && err.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %err, "failed to remove scratch directory");
        }
        // Fails while other files remain, which is what we want.
        let _ = fs::remove_dir(&self.root);
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "_".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scratch_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("tmp");
        let path = {
            let scratch = ScratchDir::create(&root, "tool").unwrap();
            fs::write(scratch.join("partial.tar.gz"), b"half").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
        assert!(!root.exists());
    }

    #[test]
    fn test_unrelated_files_survive() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("tmp");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("keep.txt"), b"mine").unwrap();

        drop(ScratchDir::create(&root, "tool").unwrap());
        assert!(root.join("keep.txt").is_file());
        assert!(!root.join("extract_tool").exists());
    }

    #[test]
    fn test_user_directory_named_like_entry_survives() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("tmp");
        fs::create_dir_all(root.join("tool")).unwrap();
        fs::write(root.join("tool/notes.txt"), b"mine").unwrap();

        let scratch = ScratchDir::create(&root, "tool").unwrap();
        assert_eq!(scratch.path(), root.join("extract_tool"));
        drop(scratch);
        assert!(root.join("tool/notes.txt").is_file());
    }

    #[test]
    fn test_stale_contents_cleared() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("tmp");
        fs::create_dir_all(root.join("extract_tool")).unwrap();
        fs::write(root.join("extract_tool/leftover"), b"old").unwrap();

        let scratch = ScratchDir::create(&root, "tool").unwrap();
        assert!(!scratch.join("leftover").exists());
    }

    #[test]
    fn test_entry_names_are_namespaced() {
        assert_eq!(sanitize("terraform-provider-aws"), "terraform-provider-aws");
        assert_eq!(sanitize("../escape"), ".._escape");
        assert_eq!(sanitize("a/b"), "a_b");
        assert_eq!(sanitize(".."), "_");
    }
}
