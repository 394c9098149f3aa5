//! Snapshot generation configuration.
//!
//! Every generation pass reads one immutable [`SnapshotConfig`]. It is built
//! once at start-up from an optional `snapshot.toml` file and a handful of
//! build-system environment variables, then shared by reference with the
//! image policies, the tree builder, and the packager. Nothing mutates it
//! after construction.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use thiserror::Error;

/// Version string that marks a snapshot as "being generated now".
pub const CURRENT_VERSION: &str = "current";

/// Environment variables consulted by [`SnapshotConfig::with_env_overrides`].
pub const ENV_OVERRIDES: &[&str] = &[
    "TARGET_DEVICE",
    "TARGET_DEVICE_ARCH",
    "BOARD_VNDK_VERSION",
    "RECOVERY_SNAPSHOT_VERSION",
];

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("invalid snapshot configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the planner cannot work with.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type alias using [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Container format of the packaged snapshot.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
pub enum ArchiveFormat {
    /// Deflate-compressed zip archive.
    #[default]
    #[serde(rename = "zip")]
    Zip,
    /// Tarball compressed with zstd.
    #[serde(rename = "tar.zst")]
    TarZst,
}

impl ArchiveFormat {
    /// Return the filename extension, without the leading dot.
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_snapshot::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::Zip.extension(), "zip");
    /// assert_eq!(ArchiveFormat::TarZst.extension(), "tar.zst");
    /// ```
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarZst => "tar.zst",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Directory rules for the ramdisk image.
///
/// Unlike vendor and recovery, the ramdisk image has no built-in table of
/// proprietary directories; the board configuration supplies both lists.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RamdiskDirs {
    /// Source directories owned by the SoC vendor.
    pub excluded_dirs: Vec<String>,
    /// Platform-owned directories nested inside `excluded_dirs`.
    pub included_dirs: Vec<String>,
}

impl Default for RamdiskDirs {
    fn default() -> Self {
        Self {
            excluded_dirs: vec!["device".to_owned(), "vendor".to_owned()],
            included_dirs: Vec::new(),
        }
    }
}

/// Explicit module allow-lists for directed snapshots.
///
/// A family without a list captures every eligible module. A family with a
/// list captures only the named modules.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DirectedSnapshots {
    /// Modules captured by a directed vendor snapshot.
    pub vendor: Option<BTreeSet<String>>,
    /// Modules captured by a directed recovery snapshot.
    pub recovery: Option<BTreeSet<String>>,
    /// Modules captured by a directed ramdisk snapshot.
    pub ramdisk: Option<BTreeSet<String>>,
}

/// Immutable configuration for one snapshot generation run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Device name used in the archive and list file names.
    pub device_name: String,
    /// Device architecture directory under `<family>-snapshot/`.
    pub device_arch: String,
    /// `BOARD_VNDK_VERSION`; vendor and ramdisk snapshots need `current`.
    pub vndk_version: String,
    /// Recovery snapshot version; recovery snapshots need `current`.
    pub recovery_snapshot_version: String,
    /// Container format of the packaged snapshot.
    pub archive_format: ArchiveFormat,
    /// Ramdisk proprietary directory rules.
    pub ramdisk: RamdiskDirs,
    /// Directed snapshot allow-lists.
    pub directed: DirectedSnapshots,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            device_name: "generic".to_owned(),
            device_arch: "arm64".to_owned(),
            vndk_version: CURRENT_VERSION.to_owned(),
            recovery_snapshot_version: CURRENT_VERSION.to_owned(),
            archive_format: ArchiveFormat::default(),
            ramdisk: RamdiskDirs::default(),
            directed: DirectedSnapshots::default(),
        }
    }
}

impl SnapshotConfig {
    /// Parse and validate configuration from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Invalid`] when validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_snapshot::SnapshotConfig;
    ///
    /// let config = SnapshotConfig::from_toml_str("device_name = \"oriole\"\n")
    ///     .expect("valid configuration");
    /// assert_eq!(config.device_name, "oriole");
    /// assert_eq!(config.device_arch, "arm64");
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply build-system overrides resolved through `lookup`.
    ///
    /// `lookup` is queried with each name in [`ENV_OVERRIDES`]. Blank values
    /// are ignored so a templated environment cannot erase a default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the overridden configuration no
    /// longer validates.
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_snapshot::SnapshotConfig;
    ///
    /// let config = SnapshotConfig::default()
    ///     .with_env_overrides(|name| (name == "TARGET_DEVICE").then(|| "raven".to_owned()))
    ///     .expect("valid overrides");
    /// assert_eq!(config.device_name, "raven");
    /// ```
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in ENV_OVERRIDES {
            let Some(value) = lookup(name).filter(|value| !value.trim().is_empty()) else {
                continue;
            };
            debug!("configuration override {name}={value}");
            let value = value.trim().to_owned();
            match *name {
                "TARGET_DEVICE" => self.device_name = value,
                "TARGET_DEVICE_ARCH" => self.device_arch = value,
                "BOARD_VNDK_VERSION" => self.vndk_version = value,
                _ => self.recovery_snapshot_version = value,
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::with_env_overrides`].
    pub fn with_process_env(self) -> Result<Self> {
        self.with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Check that required identity fields are usable as path components.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        validate_component("device_name", &self.device_name)?;
        validate_component("device_arch", &self.device_arch)?;
        Ok(())
    }

    /// Whether the VNDK version marks a vendor/ramdisk snapshot build.
    #[must_use]
    pub fn vndk_is_current(&self) -> bool {
        self.vndk_version == CURRENT_VERSION
    }

    /// Whether the recovery snapshot version marks a recovery snapshot build.
    #[must_use]
    pub fn recovery_is_current(&self) -> bool {
        self.recovery_snapshot_version == CURRENT_VERSION
    }
}

fn validate_component(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field,
            reason: "must not be empty".to_owned(),
        });
    }
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("\"{value}\" is not a single path component"),
        });
    }
    Ok(())
}
