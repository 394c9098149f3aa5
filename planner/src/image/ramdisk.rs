//! Ramdisk image policy.

use super::{ImageFamily, ImagePolicy};
use crate::proprietary::ProprietaryDirs;
use crate::unit::CompiledUnit;
use platform_snapshot::SnapshotConfig;
use std::collections::BTreeSet;

/// Snapshot policy for the ramdisk.
///
/// Its proprietary directories come from `[ramdisk]` in the configuration;
/// generation follows the VNDK version like the vendor snapshot.
#[derive(Debug, Clone)]
pub struct RamdiskImage {
    dirs: ProprietaryDirs,
    directed: Option<BTreeSet<String>>,
    version: String,
    generate: bool,
}

impl RamdiskImage {
    /// Build the ramdisk policy for this run.
    #[must_use]
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            dirs: ProprietaryDirs::ramdisk(&config.ramdisk),
            directed: config.directed.ramdisk.clone(),
            version: config.vndk_version.clone(),
            generate: config.vndk_is_current(),
        }
    }
}

impl ImagePolicy for RamdiskImage {
    fn family(&self) -> ImageFamily {
        ImageFamily::Ramdisk
    }

    fn proprietary_dirs(&self) -> &ProprietaryDirs {
        &self.dirs
    }

    fn include_vndk(&self) -> bool {
        false
    }

    fn supports_vndk_ext(&self) -> bool {
        false
    }

    fn available(&self, unit: &CompiledUnit) -> Option<bool> {
        unit.ramdisk_available
    }

    fn exclude_from_snapshot(&self, unit: &CompiledUnit) -> bool {
        unit.exclude_from_ramdisk_snapshot
    }

    fn in_image(&self, unit: &CompiledUnit) -> bool {
        unit.in_ramdisk
    }

    fn should_generate(&self) -> bool {
        self.generate
    }

    fn snapshot_version(&self) -> &str {
        &self.version
    }

    fn directed_modules(&self) -> Option<&BTreeSet<String>> {
        self.directed.as_ref()
    }
}
