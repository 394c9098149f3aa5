//! Error types for snapshot planning and execution.
//!
//! Planning fails on its own only for malformed modules: contradictory
//! snapshot flags, a shape the tree builder does not know how to lay out, or
//! an include path that would land outside the snapshot tree. Everything else
//! here comes from the host stand-ins (inventory reading, action execution,
//! archiving).

use crate::module_name::ModuleName;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while planning or realising a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A module is both excluded from and available for the same snapshot.
    #[error(
        "module {module} may not use both \"{family}_available: true\" and \"exclude_from_{family}_snapshot: true\""
    )]
    ConflictingAvailability {
        /// Offending module.
        module: ModuleName,
        /// Image family whose flags conflict.
        family: &'static str,
    },

    /// A module in a proprietary directory uses the exclusion flag.
    #[error(
        "module {module} in {family} proprietary path {dir} may not use \"exclude_from_{family}_snapshot: true\""
    )]
    ExclusionInProprietaryPath {
        /// Offending module.
        module: ModuleName,
        /// Image family whose flag was misused.
        family: &'static str,
        /// Owning source directory of the module.
        dir: Utf8PathBuf,
    },

    /// The tree builder was handed a module it cannot lay out.
    #[error("unknown module {module} ({shape}) in {family} snapshot")]
    UnknownUnitShape {
        /// Offending module.
        module: ModuleName,
        /// Description of the unrecognised shape.
        shape: String,
        /// Image family being generated.
        family: &'static str,
    },

    /// A header or exported include dir is absolute or climbs out of the
    /// source tree.
    #[error("module {module} exports {path}, which is not a relative source-tree path")]
    UnsafeIncludePath {
        /// Offending module.
        module: ModuleName,
        /// Path as given in the inventory.
        path: Utf8PathBuf,
    },

    /// A unit reached the tree builder without a usable output file.
    #[error("module {module} has no output file to snapshot")]
    MissingOutput {
        /// Offending module.
        module: ModuleName,
    },

    /// An artifact metadata record could not be encoded.
    #[error("json marshal to {path} failed: {source}")]
    ManifestSerialization {
        /// Destination of the manifest.
        path: Utf8PathBuf,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The module inventory could not be read or parsed.
    #[error("failed to load module inventory {path}: {reason}")]
    Inventory {
        /// Inventory file path.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The snapshot configuration is unusable.
    #[error(transparent)]
    Config(#[from] platform_snapshot::ConfigError),

    /// A planned action could not be carried out.
    #[error("failed to {action} {path}: {source}")]
    Execution {
        /// Verb describing the action (copy, write).
        action: &'static str,
        /// Destination of the action.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot archive could not be written.
    #[error("failed to write archive {path}: {reason}")]
    Archive {
        /// Archive path.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`SnapshotError`].
pub type Result<T> = std::result::Result<T, SnapshotError>;
