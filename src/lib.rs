//! Shared configuration for platform snapshot generation.
//!
//! The planner crate reads a single [`SnapshotConfig`] per run; this crate
//! owns its schema, defaults, and environment overrides so that other tools
//! in the workspace agree on one source of truth.

pub mod config;

pub use config::{
    ArchiveFormat, CURRENT_VERSION, ConfigError, DirectedSnapshots, ENV_OVERRIDES, RamdiskDirs,
    SnapshotConfig,
};
