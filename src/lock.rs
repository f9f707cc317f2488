//! Lock file (`<manifest>-lock.json`) management.
//!
//! Loading never fails: a missing or unreadable lock file is treated as
//! empty so a broken lock can always be regenerated by `install`.

use crate::manifest::DependencyType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct LockFile {
    pub entries: BTreeMap<String, LockEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LockEntry {
    pub name: String,
    /// Expanded destination path.
    pub path: String,
    pub source: String,
    pub version: String,
    /// Release tag, or short commit hash for repositories.
    pub hash: String,
    #[serde(rename = "type")]
    pub kind: DependencyType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub private: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub extract: bool,
}

impl LockEntry {
    /// Pins the entry to an explicitly requested version.
    pub fn pin(&mut self, version: &str) {
        self.version = version.to_string();
        self.hash = version.to_string();
    }
}

impl LockFile {
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(lock) => lock,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable lock file");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&LockEntry> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, entry: LockEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, hash: &str) -> LockEntry {
        LockEntry {
            name: name.to_string(),
            path: format!("bin/{}", name),
            source: format!("https://github.com/acme/{}", name),
            version: hash.to_string(),
            hash: hash.to_string(),
            kind: DependencyType::Binary,
            private: false,
            extract: true,
        }
    }

    #[test]
    fn test_lockfile_insert_and_get() {
        let mut lock = LockFile::default();
        lock.insert(entry("tool", "v1.0.0"));
        let found = lock.get("tool").unwrap();
        assert_eq!(found.hash, "v1.0.0");
        assert_eq!(lock.len(), 1);
    }

    #[test]
    fn test_lockfile_get_missing() {
        let lock = LockFile::default();
        assert!(lock.get("nonexistent").is_none());
        assert!(lock.is_empty());
    }

    #[test]
    fn test_lockfile_serialization_shape() {
        let mut lock = LockFile::default();
        lock.insert(entry("tool", "v1.0.0"));
        let json = serde_json::to_value(&lock).unwrap();
        assert_eq!(json["tool"]["type"], "binary");
        assert_eq!(json["tool"]["extract"], true);
        assert!(json["tool"].get("private").is_none());
    }

    #[test]
    fn test_lockfile_round_trip_on_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fracture-lock.json");
        let mut lock = LockFile::default();
        lock.insert(entry("tool", "v2.3.4"));
        lock.save(&path).unwrap();

        let reloaded = LockFile::load(&path);
        assert_eq!(reloaded, lock);
        assert_eq!(reloaded.get("tool").unwrap().hash, "v2.3.4");
    }

    #[test]
    fn test_missing_or_corrupt_lock_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(LockFile::load(&temp.path().join("absent.json")).is_empty());

        let corrupt = temp.path().join("corrupt-lock.json");
        fs::write(&corrupt, "{ this is not json").unwrap();
        assert!(LockFile::load(&corrupt).is_empty());
    }

    #[test]
    fn test_pin_overrides_version_and_hash() {
        let mut e = entry("tool", "v1.0.0");
        e.pin("v0.9.0");
        assert_eq!(e.version, "v0.9.0");
        assert_eq!(e.hash, "v0.9.0");
    }
}
