//! `fracture update [name] [version]`

use super::{install_all, print_summary};
use crate::config::Settings;
use crate::install::Installer;
use crate::lock::{LockEntry, LockFile};
use crate::manifest;
use anyhow::{Context, Result, bail};
use colored::*;

/// Without a name, reinstalls every entry (failures skipped). With a name,
/// reinstalls just that entry, optionally at `version`; any failure is fatal.
pub fn run_update(
    settings: &Settings,
    installer: &Installer,
    name: Option<&str>,
    version: Option<&str>,
) -> Result<Vec<LockEntry>> {
    println!("{} Updating dependencies...", "🔄".blue());

    let Some(name) = name else {
        let outcome = install_all(settings, installer)?;
        print_summary("Updated", &outcome);
        return Ok(outcome.installed);
    };

    let manifest = manifest::load(&settings.manifest_path)?;
    let Some(entry) = manifest.get(name) else {
        bail!(
            "Dependency '{}' not found in {}",
            name,
            settings.manifest_path.display()
        );
    };

    let mut lock = LockFile::load(&settings.lock_path);
    let locked = installer
        .install(name, entry, version)
        .with_context(|| format!("Failed to update {}", name))?;
    lock.insert(locked.clone());
    lock.save(&settings.lock_path)
        .with_context(|| format!("Failed to save {}", settings.lock_path.display()))?;

    println!("{} Updated {} to {}", "✓".green(), name.bold(), locked.version.cyan());
    Ok(vec![locked])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;

    #[test]
    fn test_update_all_skips_failures() {
        let ws = Workspace::new(MIXED_MANIFEST);
        let updated = run_update(&ws.settings, &ws.installer(), None, None).unwrap();
        assert_eq!(updated.len(), 2);
    }

    #[test]
    fn test_update_unknown_name_is_fatal() {
        let ws = Workspace::new(MIXED_MANIFEST);
        let err = run_update(&ws.settings, &ws.installer(), Some("ghost"), None).unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert!(!ws.settings.lock_path.exists());
    }

    #[test]
    fn test_update_failing_entry_is_fatal() {
        let ws = Workspace::new(MIXED_MANIFEST);
        let err = run_update(&ws.settings, &ws.installer(), Some("broken"), None).unwrap_err();
        assert!(format!("{:#}", err).contains("asset_name"));
    }

    #[test]
    fn test_update_named_entry_at_version() {
        let ws = Workspace::new(MIXED_MANIFEST);
        run_update(&ws.settings, &ws.installer(), None, None).unwrap();

        let updated =
            run_update(&ws.settings, &ws.installer(), Some("lib"), Some("v2.0.0")).unwrap();
        assert_eq!(updated[0].version, "v2.0.0");

        let lock = LockFile::load(&ws.settings.lock_path);
        assert_eq!(lock.get("lib").unwrap().hash, "v2.0.0");
        assert_eq!(lock.get("tools").unwrap().hash, "aaaabbbb");
        assert!(ws.repos.calls().iter().any(|c| c.starts_with("checkout v2.0.0")));
    }
}
