//! Recovery image policy.

use super::{ImageFamily, ImagePolicy};
use crate::proprietary::ProprietaryDirs;
use crate::unit::CompiledUnit;
use platform_snapshot::SnapshotConfig;
use std::collections::BTreeSet;

/// Snapshot policy for the recovery partition.
#[derive(Debug, Clone)]
pub struct RecoveryImage {
    dirs: ProprietaryDirs,
    directed: Option<BTreeSet<String>>,
    version: String,
    generate: bool,
}

impl RecoveryImage {
    /// Build the recovery policy for this run.
    ///
    /// Recovery is gated on its own snapshot version rather than the VNDK
    /// version.
    #[must_use]
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            dirs: ProprietaryDirs::recovery(),
            directed: config.directed.recovery.clone(),
            version: config.recovery_snapshot_version.clone(),
            generate: config.recovery_is_current(),
        }
    }
}

impl ImagePolicy for RecoveryImage {
    fn family(&self) -> ImageFamily {
        ImageFamily::Recovery
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
        unit.recovery_available
    }

    fn exclude_from_snapshot(&self, unit: &CompiledUnit) -> bool {
        unit.exclude_from_recovery_snapshot
    }

    fn in_image(&self, unit: &CompiledUnit) -> bool {
        unit.in_recovery
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
