//! Release asset selection.
//!
//! Narrows a release's assets in three fixed stages (name substring,
//! extension suffix, suffix substring) and refuses to guess: anything other
//! than exactly one match after the suffix stage is an error that lists the
//! candidates.

use crate::error::SelectError;
use crate::github::RemoteAsset;
use crate::manifest::ManifestEntry;

#[derive(Debug, Clone, Copy, Default)]
pub struct AssetFilters<'a> {
    pub name: Option<&'a str>,
    pub extension: Option<&'a str>,
    pub suffix: Option<&'a str>,
}

impl<'a> From<&'a ManifestEntry> for AssetFilters<'a> {
    fn from(entry: &'a ManifestEntry) -> Self {
        Self {
            name: entry.asset_name.as_deref(),
            extension: entry.asset_extension.as_deref(),
            suffix: entry.asset_suffix.as_deref(),
        }
    }
}

/// Picks exactly one asset from `assets`. `tag` is only used in messages.
pub fn select_asset<'r>(
    assets: &'r [RemoteAsset],
    filters: AssetFilters<'_>,
    tag: &str,
) -> Result<&'r RemoteAsset, SelectError> {
    let mut candidates: Vec<&RemoteAsset> = assets.iter().collect();

    if let Some(name) = filters.name {
        candidates.retain(|a| a.name.contains(name));
        if candidates.is_empty() {
            return Err(SelectError::NoAssetsMatchName {
                filter: name.to_string(),
                tag: tag.to_string(),
            });
        }
    }

    if let Some(extension) = filters.extension {
        let dotted = normalize_extension(extension);
        candidates.retain(|a| a.name.ends_with(&dotted));
        if candidates.is_empty() {
            return Err(SelectError::NoAssetsMatchExtension {
                extension: extension.to_string(),
                tag: tag.to_string(),
            });
        }
    }

    let Some(suffix) = filters.suffix else {
        return Err(SelectError::MissingRequiredSuffix {
            candidates: names(&candidates),
        });
    };

    candidates.retain(|a| a.name.contains(suffix));
    match candidates.as_slice() {
        [] => Err(SelectError::NoAssetsMatchSuffix {
            suffix: suffix.to_string(),
            tag: tag.to_string(),
        }),
        [only] => Ok(*only),
        many => Err(SelectError::AmbiguousAssetMatch {
            suffix: suffix.to_string(),
            matches: names(many),
        }),
    }
}

fn normalize_extension(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}

fn names(assets: &[&RemoteAsset]) -> Vec<String> {
    assets.iter().map(|a| a.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets(names: &[&str]) -> Vec<RemoteAsset> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| RemoteAsset {
                id: i as u64 + 1,
                name: name.to_string(),
                url: format!("https://example.com/download/{}", name),
            })
            .collect()
    }

    fn suffix(s: &str) -> AssetFilters<'_> {
        AssetFilters {
            suffix: Some(s),
            ..Default::default()
        }
    }

    #[test]
    fn test_unique_suffix_match() {
        let list = assets(&["tool_linux_amd64.tar.gz", "tool_windows_amd64.zip"]);
        let picked = select_asset(&list, suffix("linux_amd64"), "v1").unwrap();
        assert_eq!(picked.name, "tool_linux_amd64.tar.gz");
        assert_eq!(picked.id, 1);
    }

    #[test]
    fn test_ambiguous_suffix_names_every_match() {
        let list = assets(&["tool_linux_amd64.tar.gz", "tool_windows_amd64.zip"]);
        let err = select_asset(&list, suffix("amd64"), "v1").unwrap_err();
        assert_eq!(
            err,
            SelectError::AmbiguousAssetMatch {
                suffix: "amd64".to_string(),
                matches: vec![
                    "tool_linux_amd64.tar.gz".to_string(),
                    "tool_windows_amd64.zip".to_string()
                ],
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("tool_linux_amd64.tar.gz"));
        assert!(msg.contains("tool_windows_amd64.zip"));
    }

    #[test]
    fn test_ambiguity_is_order_independent() {
        let forward = assets(&["a_amd64", "b_amd64", "c_arm64"]);
        let reversed = assets(&["c_arm64", "b_amd64", "a_amd64"]);
        assert!(matches!(
            select_asset(&forward, suffix("amd64"), "v1"),
            Err(SelectError::AmbiguousAssetMatch { .. })
        ));
        assert!(matches!(
            select_asset(&reversed, suffix("amd64"), "v1"),
            Err(SelectError::AmbiguousAssetMatch { .. })
        ));
        assert_eq!(
            select_asset(&forward, suffix("arm64"), "v1").unwrap().name,
            select_asset(&reversed, suffix("arm64"), "v1").unwrap().name
        );
    }

    #[test]
    fn test_missing_suffix_always_fails() {
        let single = assets(&["only-asset.tar.gz"]);
        let err = select_asset(&single, AssetFilters::default(), "v1").unwrap_err();
        assert_eq!(
            err,
            SelectError::MissingRequiredSuffix {
                candidates: vec!["only-asset.tar.gz".to_string()]
            }
        );

        let none: Vec<RemoteAsset> = Vec::new();
        assert!(matches!(
            select_asset(&none, AssetFilters::default(), "v1"),
            Err(SelectError::MissingRequiredSuffix { .. })
        ));
    }

    #[test]
    fn test_missing_suffix_lists_narrowed_candidates() {
        let list = assets(&["cli_linux.tar.gz", "cli_linux.zip", "server_linux.tar.gz"]);
        let filters = AssetFilters {
            name: Some("cli"),
            extension: Some("tar.gz"),
            suffix: None,
        };
        let err = select_asset(&list, filters, "v1").unwrap_err();
        assert_eq!(
            err,
            SelectError::MissingRequiredSuffix {
                candidates: vec!["cli_linux.tar.gz".to_string()]
            }
        );
    }

    #[test]
    fn test_name_filter_without_matches() {
        let list = assets(&["tool_linux", "tool_darwin"]);
        let filters = AssetFilters {
            name: Some("server"),
            suffix: Some("linux"),
            ..Default::default()
        };
        assert_eq!(
            select_asset(&list, filters, "v3").unwrap_err(),
            SelectError::NoAssetsMatchName {
                filter: "server".to_string(),
                tag: "v3".to_string()
            }
        );
    }

    #[test]
    fn test_extension_is_anchored_at_end() {
        let list = assets(&["tool.zip.sha256", "tool.zip", "tool.tar.gz"]);
        let filters = AssetFilters {
            extension: Some("zip"),
            suffix: Some("tool"),
            ..Default::default()
        };
        assert_eq!(select_asset(&list, filters, "v1").unwrap().name, "tool.zip");

        let dotted = AssetFilters {
            extension: Some(".zip"),
            suffix: Some("tool"),
            ..Default::default()
        };
        assert_eq!(select_asset(&list, dotted, "v1").unwrap().name, "tool.zip");
    }

    #[test]
    fn test_extension_without_matches() {
        let list = assets(&["tool.tar.gz"]);
        let filters = AssetFilters {
            extension: Some("xz"),
            suffix: Some("tool"),
            ..Default::default()
        };
        assert!(matches!(
            select_asset(&list, filters, "v1"),
            Err(SelectError::NoAssetsMatchExtension { .. })
        ));
    }

    #[test]
    fn test_suffix_without_matches() {
        let list = assets(&["tool_linux_amd64.tar.gz"]);
        assert_eq!(
            select_asset(&list, suffix("darwin"), "v1").unwrap_err(),
            SelectError::NoAssetsMatchSuffix {
                suffix: "darwin".to_string(),
                tag: "v1".to_string()
            }
        );
    }

    #[test]
    fn test_filters_from_manifest_entry() {
        let entry = ManifestEntry {
            asset_name: Some("cli".to_string()),
            asset_suffix: Some("linux_arm64".to_string()),
            ..Default::default()
        };
        let filters = AssetFilters::from(&entry);
        assert_eq!(filters.name, Some("cli"));
        assert_eq!(filters.extension, None);
        assert_eq!(filters.suffix, Some("linux_arm64"));
    }
}
