//! Vendor image policy.

use super::{ImageFamily, ImagePolicy};
use crate::proprietary::ProprietaryDirs;
use crate::unit::CompiledUnit;
use platform_snapshot::SnapshotConfig;
use std::collections::BTreeSet;

/// Snapshot policy for the vendor partition.
///
/// The vendor snapshot is the only one that captures VNDK libraries from
/// proprietary paths and the only one that installs VNDK extensions under
/// `vndk`/`vndk-sp`.
#[derive(Debug, Clone)]
pub struct VendorImage {
    dirs: ProprietaryDirs,
    directed: Option<BTreeSet<String>>,
    version: String,
    generate: bool,
}

impl VendorImage {
    /// Build the vendor policy for this run.
    #[must_use]
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            dirs: ProprietaryDirs::vendor(),
            directed: config.directed.vendor.clone(),
            version: config.vndk_version.clone(),
            generate: config.vndk_is_current(),
        }
    }
}

impl ImagePolicy for VendorImage {
    fn family(&self) -> ImageFamily {
        ImageFamily::Vendor
    }

    fn proprietary_dirs(&self) -> &ProprietaryDirs {
        &self.dirs
    }

    fn include_vndk(&self) -> bool {
        true
    }

    fn supports_vndk_ext(&self) -> bool {
        true
    }

    fn available(&self, unit: &CompiledUnit) -> Option<bool> {
        unit.vendor_available
    }

    fn exclude_from_snapshot(&self, unit: &CompiledUnit) -> bool {
        unit.exclude_from_vendor_snapshot
    }

    fn in_image(&self, unit: &CompiledUnit) -> bool {
        unit.in_vendor
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
