//! Image families and their snapshot policies.
//!
//! Each partition image that can be frozen into a snapshot answers the same
//! questions: which source directories are proprietary, which compiled units
//! belong to it, how a module opts in or out, and whether this build should
//! generate a snapshot at all. [`ImagePolicy`] captures those questions once
//! so the classifier and the tree builder never branch on the family.

mod ramdisk;
mod recovery;
mod vendor;

pub use ramdisk::RamdiskImage;
pub use recovery::RecoveryImage;
pub use vendor::VendorImage;

use crate::proprietary::ProprietaryDirs;
use crate::unit::CompiledUnit;
use camino::Utf8Path;
use platform_snapshot::SnapshotConfig;
use std::collections::BTreeSet;
use std::fmt;

/// Partition image families that can be snapshotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ImageFamily {
    /// The vendor partition.
    Vendor,
    /// The recovery partition.
    Recovery,
    /// The ramdisk.
    Ramdisk,
}

impl ImageFamily {
    /// All families, in registration order.
    pub const ALL: [Self; 3] = [Self::Vendor, Self::Recovery, Self::Ramdisk];

    /// Lowercase family name used in paths and flags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Recovery => "recovery",
            Self::Ramdisk => "ramdisk",
        }
    }

    /// Name of the build variable that records the archive path.
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_snapshot_planner::image::ImageFamily;
    ///
    /// assert_eq!(ImageFamily::Vendor.make_var(false), "SOONG_VENDOR_SNAPSHOT_ZIP");
    /// assert_eq!(ImageFamily::Ramdisk.make_var(true), "SOONG_RAMDISK_FAKE_SNAPSHOT_ZIP");
    /// ```
    #[must_use]
    pub const fn make_var(self, fake: bool) -> &'static str {
        match (self, fake) {
            (Self::Vendor, false) => "SOONG_VENDOR_SNAPSHOT_ZIP",
            (Self::Vendor, true) => "SOONG_VENDOR_FAKE_SNAPSHOT_ZIP",
            (Self::Recovery, false) => "SOONG_RECOVERY_SNAPSHOT_ZIP",
            (Self::Recovery, true) => "SOONG_RECOVERY_FAKE_SNAPSHOT_ZIP",
            (Self::Ramdisk, false) => "SOONG_RAMDISK_SNAPSHOT_ZIP",
            (Self::Ramdisk, true) => "SOONG_RAMDISK_FAKE_SNAPSHOT_ZIP",
        }
    }

    /// Build the policy for this family from `config`.
    #[must_use]
    pub fn policy(self, config: &SnapshotConfig) -> Box<dyn ImagePolicy> {
        match self {
            Self::Vendor => Box::new(VendorImage::new(config)),
            Self::Recovery => Box::new(RecoveryImage::new(config)),
            Self::Ramdisk => Box::new(RamdiskImage::new(config)),
        }
    }
}

impl fmt::Display for ImageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot capabilities of one image family.
///
/// Implementations are built once from the run's [`SnapshotConfig`] and are
/// read-only afterwards.
pub trait ImagePolicy: fmt::Debug {
    /// The family this policy describes.
    fn family(&self) -> ImageFamily;

    /// Proprietary directory tables for this image.
    fn proprietary_dirs(&self) -> &ProprietaryDirs;

    /// Whether VNDK libraries from proprietary paths may be captured.
    fn include_vndk(&self) -> bool;

    /// Whether VNDK extensions install under `vndk`/`vndk-sp`.
    fn supports_vndk_ext(&self) -> bool;

    /// The unit's `<family>_available` property.
    fn available(&self, unit: &CompiledUnit) -> Option<bool>;

    /// The unit's `exclude_from_<family>_snapshot` property.
    fn exclude_from_snapshot(&self, unit: &CompiledUnit) -> bool;

    /// Whether the unit installs into this image.
    fn in_image(&self, unit: &CompiledUnit) -> bool;

    /// Whether this build generates a snapshot for the family.
    fn should_generate(&self) -> bool;

    /// Version recorded in snapshot identifiers.
    fn snapshot_version(&self) -> &str;

    /// Directed-snapshot allow-list, if one is configured.
    fn directed_modules(&self) -> Option<&BTreeSet<String>>;

    /// Lowercase family name.
    fn name(&self) -> &'static str {
        self.family().as_str()
    }

    /// Whether `dir` is proprietary for this image.
    fn is_proprietary_path(&self, dir: &Utf8Path) -> bool {
        self.proprietary_dirs().is_proprietary(dir)
    }

    /// Whether the unit is owned by the SoC vendor for this image.
    ///
    /// A unit outside every proprietary path still counts when it opts out
    /// of the snapshot: the vendor has taken over that framework module.
    fn is_proprietary_module(&self, unit: &CompiledUnit) -> bool {
        self.is_proprietary_path(&unit.dir) || self.exclude_from_snapshot(unit)
    }

    /// Whether a directed snapshot leaves `name` out.
    fn exclude_from_directed_snapshot(&self, name: &str) -> bool {
        self.directed_modules()
            .is_some_and(|modules| !modules.contains(name))
    }

    /// The per-module exclusion predicate applied by the classifier.
    fn is_excluded(&self, unit: &CompiledUnit) -> bool {
        self.exclude_from_snapshot(unit) || self.exclude_from_directed_snapshot(unit.name.as_str())
    }

    /// Build variable naming the produced archive.
    fn make_var(&self, fake: bool) -> &'static str {
        self.family().make_var(fake)
    }
}
