//! # fracture - declarative dependency fetcher
//!
//! fracture reads a JSON manifest and materializes each entry on disk:
//!
//! - **binary**: one asset of a GitHub release, optionally unpacked
//! - **source**: GitHub's generated source archive for a release tag
//! - **repository**: a git checkout
//!
//! What was installed is recorded in a lock file next to the manifest, and
//! `install` reports entries whose resolved version moved since the last run.
//!
//! ## Module Organization
//!
//! - [`install`] - per-entry pipeline (expand, select, fetch, extract, lock)
//! - [`expand`], [`select`], [`archive`] - the pipeline stages
//! - [`github`], [`repo`] - remote collaborators behind traits
//! - [`manifest`], [`lock`], [`reconcile`] - persisted state and drift
//! - [`commands`] - CLI command handlers

/// Archive extraction and placement.
pub mod archive;

/// CLI command handlers.
pub mod commands;

/// Run settings and environment access.
pub mod config;

/// Typed errors for each pipeline stage.
pub mod error;

/// Path placeholder expansion.
pub mod expand;

/// GitHub releases and downloads.
pub mod github;

/// Per-entry install pipeline.
pub mod install;

/// Lock file (`<manifest>-lock.json`) management.
pub mod lock;

/// Manifest (`fracture.json`) parsing.
pub mod manifest;

/// Drift between the prior lock file and a fresh install.
pub mod reconcile;

/// Git checkouts.
pub mod repo;

/// Release asset selection.
pub mod select;

/// Terminal UI utilities (tables, warnings).
pub mod ui;

/// Self-update.
pub mod upgrade;

#[cfg(test)]
pub(crate) mod mocks;
