//! Placeholder expansion for destination paths and file names.
//!
//! Recognized tokens:
//!
//! - `@VERSION` - resolved release tag or commit hash
//! - `@TIMESTAMP` - current Unix time in seconds
//! - `@ASSET_EXTENSION` - extension of the fetched file (empty when extracting)
//! - `$ENV_VAR` - value of an environment variable (uppercase identifiers)
//!
//! Expansion never fails. Tokens that cannot be resolved become empty
//! strings and are reported back in [`Expanded::empty`] so callers can warn.

use crate::config::Environment;
use regex::{Captures, Regex};
use std::sync::LazyLock;

pub const VERSION_TOKEN: &str = "@VERSION";
pub const TIMESTAMP_TOKEN: &str = "@TIMESTAMP";
pub const ASSET_EXTENSION_TOKEN: &str = crate::manifest::ASSET_EXTENSION_TOKEN;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@VERSION|@TIMESTAMP|@ASSET_EXTENSION|\$([A-Z_][A-Z0-9_]*)")
        .expect("placeholder pattern is valid")
});

/// Values known once the remote side has been resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolved<'a> {
    pub version: &'a str,
    pub asset_extension: Option<&'a str>,
    pub extract: bool,
}

/// A template captured before the remote lookup, with the clock already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    template: String,
    timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expanded {
    pub path: String,
    /// Placeholders that were substituted with an empty string.
    pub empty: Vec<String>,
}

pub struct PathExpander<'e> {
    env: &'e dyn Environment,
}

impl<'e> PathExpander<'e> {
    pub fn new(env: &'e dyn Environment) -> Self {
        Self { env }
    }

    /// Captures the template and the current time before the version is
    /// known, so `@TIMESTAMP` reflects the start of the install.
    pub fn pending(&self, template: &str) -> Pending {
        Pending {
            template: template.to_string(),
            timestamp: self.env.unix_time(),
        }
    }

    /// Substitutes every placeholder in a single scan. Inserted values are
    /// never scanned again.
    pub fn finish(&self, pending: Pending, resolved: Resolved<'_>) -> Expanded {
        let mut empty: Vec<String> = Vec::new();
        let mut note = |token: String| {
            if !empty.contains(&token) {
                empty.push(token);
            }
        };

        let path = TOKEN
            .replace_all(&pending.template, |caps: &Captures| {
                if let Some(var) = caps.get(1) {
                    return match self.env.var(var.as_str()) {
                        Some(value) if !value.is_empty() => value,
                        _ => {
                            note(format!("${}", var.as_str()));
                            String::new()
                        }
                    };
                }
                match &caps[0] {
                    VERSION_TOKEN => {
                        if resolved.version.is_empty() {
                            note(VERSION_TOKEN.to_string());
                        }
                        resolved.version.to_string()
                    }
                    TIMESTAMP_TOKEN => pending.timestamp.to_string(),
                    _ if resolved.extract => String::new(),
                    _ => match resolved.asset_extension {
                        Some(ext) if !ext.is_empty() => ext.to_string(),
                        _ => {
                            note(ASSET_EXTENSION_TOKEN.to_string());
                            String::new()
                        }
                    },
                }
            })
            .into_owned();

        Expanded { path, empty }
    }

    /// Both passes at once.
    pub fn expand(&self, template: &str, resolved: Resolved<'_>) -> Expanded {
        self.finish(self.pending(template), resolved)
    }
}

/// Extension of a fetched file name, multi-part archive suffixes included.
///
/// Dotted version numbers and platform tags are not extensions: the part
/// after the last dot must start with a letter and be plain alphanumeric.
pub fn file_extension(name: &str) -> Option<&str> {
    for compound in ["tar.gz", "tar.xz"] {
        if name.len() > compound.len() + 1 && name.ends_with(compound) {
            let start = name.len() - compound.len();
            if name.as_bytes()[start - 1] == b'.' {
                return Some(&name[start..]);
            }
        }
    }
    let (stem, ext) = name.rsplit_once('.')?;
    let plain = ext.len() <= MAX_EXTENSION_LEN
        && ext.starts_with(|c: char| c.is_ascii_alphabetic())
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    if stem.is_empty() || !plain {
        None
    } else {
        Some(ext)
    }
}

const MAX_EXTENSION_LEN: usize = 8;
