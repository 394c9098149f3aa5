//! Snapshot directory layout and artifact naming.
//!
//! A snapshot for family `F` on a device with architecture `A` lives under
//! `F-snapshot/A/` (or `fake/F-snapshot/A/` for fake runs):
//!
//! ```text
//! vendor-snapshot/arm64/
//!     arch-arm64-armv8-a/{shared,static,header,binary,object}/
//!     NOTICE_FILES/
//!     configs/
//!     include/
//! ```
//!
//! All paths produced here are relative to the output root.

use crate::image::ImageFamily;
use crate::unit::Target;
use camino::{Utf8Path, Utf8PathBuf};
use platform_snapshot::ArchiveFormat;

/// Directory that isolates fake snapshots from real ones.
const FAKE_DIR: &str = "fake";

/// Infix distinguishing CFI static archives from their plain twins.
const CFI_INFIX: &str = "cfi";

/// Kind subdirectory for binaries.
pub const BINARY_SUBDIR: &str = "binary";

/// Kind subdirectory for objects.
pub const OBJECT_SUBDIR: &str = "object";

/// Resolved directory layout of one snapshot pass.
///
/// # Examples
///
/// ```
/// use platform_snapshot_planner::image::ImageFamily;
/// use platform_snapshot_planner::layout::SnapshotLayout;
///
/// let layout = SnapshotLayout::new(ImageFamily::Recovery, "arm64", true);
/// assert_eq!(layout.snapshot_dir(), "fake/recovery-snapshot");
/// assert_eq!(layout.configs_dir(), "fake/recovery-snapshot/arm64/configs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLayout {
    family: ImageFamily,
    snapshot_dir: Utf8PathBuf,
    arch_dir: Utf8PathBuf,
}

impl SnapshotLayout {
    /// Compute the layout for `family` on a device of `device_arch`.
    #[must_use]
    pub fn new(family: ImageFamily, device_arch: &str, fake: bool) -> Self {
        let name = format!("{family}-snapshot");
        let snapshot_dir = if fake {
            Utf8Path::new(FAKE_DIR).join(name)
        } else {
            Utf8PathBuf::from(name)
        };
        let arch_dir = snapshot_dir.join(device_arch);
        Self {
            family,
            snapshot_dir,
            arch_dir,
        }
    }

    /// Root of the snapshot; the archive is rooted here.
    #[must_use]
    pub fn snapshot_dir(&self) -> &Utf8Path {
        &self.snapshot_dir
    }

    /// `<snapshot>/<device-arch>`.
    #[must_use]
    pub fn arch_dir(&self) -> &Utf8Path {
        &self.arch_dir
    }

    /// Directory for frozen headers.
    #[must_use]
    pub fn include_dir(&self) -> Utf8PathBuf {
        self.arch_dir.join("include")
    }

    /// Directory for init scripts and VINTF fragments.
    #[must_use]
    pub fn configs_dir(&self) -> Utf8PathBuf {
        self.arch_dir.join("configs")
    }

    /// Directory for license notices.
    #[must_use]
    pub fn notice_dir(&self) -> Utf8PathBuf {
        self.arch_dir.join("NOTICE_FILES")
    }

    /// Kind subdirectory for a unit compiled for `target`.
    #[must_use]
    pub fn unit_dir(&self, target: &Target, subdir: &str) -> Utf8PathBuf {
        self.arch_dir.join(arch_segment(target)).join(subdir)
    }

    /// Sorted output list consumed by the archiver.
    #[must_use]
    pub fn list_file(&self, device_name: &str) -> Utf8PathBuf {
        self.snapshot_dir
            .join(format!("{}-{device_name}_list", self.family))
    }

    /// Archive produced for this snapshot.
    #[must_use]
    pub fn archive_path(&self, device_name: &str, format: ArchiveFormat) -> Utf8PathBuf {
        self.snapshot_dir
            .join(format!("{}-{device_name}.{}", self.family, format.extension()))
    }
}

/// `arch-<ARCH>[-<VARIANT>]` directory name for `target`.
#[must_use]
pub fn arch_segment(target: &Target) -> String {
    match target.arch_variant.as_deref().filter(|v| !v.is_empty()) {
        Some(variant) => format!("arch-{}-{variant}", target.arch),
        None => format!("arch-{}", target.arch),
    }
}

/// Insert `.cfi` before the final extension of `file_name`.
///
/// # Examples
///
/// ```
/// use platform_snapshot_planner::layout::cfi_stem;
///
/// assert_eq!(cfi_stem("libbase.a"), "libbase.cfi.a");
/// assert_eq!(cfi_stem("libbase"), "libbase.cfi");
/// ```
#[must_use]
pub fn cfi_stem(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}.{CFI_INFIX}.{ext}"),
        None => format!("{file_name}.{CFI_INFIX}"),
    }
}

/// Manifest path next to an artifact: `<artifact>.json`.
#[must_use]
pub fn manifest_path(artifact: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{artifact}.json"))
}
