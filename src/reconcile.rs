//! Drift detection between a fresh install and the previous lock file.

use crate::lock::{LockEntry, LockFile};

/// An entry whose installed hash differs from what the prior lock recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub name: String,
    /// `None` when the entry was not locked before.
    pub previous: Option<String>,
    pub current: String,
}

/// Compares `installed` against `prior`. Never touches either side.
pub fn reconcile(prior: &LockFile, installed: &[LockEntry]) -> Vec<Drift> {
    installed
        .iter()
        .filter_map(|entry| {
            let previous = prior.get(&entry.name).map(|e| e.hash.clone());
            if previous.as_deref() == Some(entry.hash.as_str()) {
                return None;
            }
            Some(Drift {
                name: entry.name.clone(),
                previous,
                current: entry.hash.clone(),
            })
        })
        .collect()
}
