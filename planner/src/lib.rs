//! Platform snapshot planner.
//!
//! This crate decides which compiled modules of a build belong in a vendor,
//! recovery, or ramdisk snapshot, lays them out in a per-image directory tree
//! with JSON metadata sidecars, and packages the tree into a deterministic
//! archive. Planning is pure; only [`executor`] touches the filesystem.
//!
//! # Modules
//!
//! - [`action`] - Planned copy and write steps
//! - [`archive`] - Deterministic zip and tar.zst writers
//! - [`cli`] - Command-line argument definitions
//! - [`dedup`] - First-install-wins output deduplication
//! - [`eligibility`] - Snapshot guard pipeline and flag conflict checks
//! - [`error`] - Semantic error types
//! - [`executor`] - Realises plans under an output root
//! - [`image`] - Image families and their snapshot policies
//! - [`inventory`] - Module enumeration
//! - [`layout`] - Snapshot directory layout
//! - [`logging`] - Stderr backend for the `log` facade
//! - [`manifest`] - Per-artefact JSON metadata records
//! - [`module_name`] - Semantic wrapper for module names
//! - [`output`] - User-facing text formatting
//! - [`packager`] - Output list, archive step, and build variables
//! - [`pass`] - Generation pass orchestration
//! - [`proprietary`] - Proprietary directory classification
//! - [`snapshot_map`] - Identifiers of captured module variants
//! - [`tree`] - Per-unit snapshot tree construction
//! - [`unit`] - Compiled unit model

pub mod action;
pub mod archive;
pub mod cli;
pub mod dedup;
pub mod eligibility;
pub mod error;
pub mod executor;
pub mod image;
pub mod inventory;
pub mod layout;
pub mod logging;
pub mod manifest;
pub mod module_name;
pub mod output;
pub mod packager;
pub mod pass;
pub mod proprietary;
pub mod snapshot_map;
pub mod tree;
pub mod unit;

#[cfg(test)]
mod test_utils;
