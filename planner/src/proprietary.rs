//! Proprietary source directory resolution.
//!
//! A source directory is proprietary when it sits under one of an image's
//! proprietary prefixes and not under any platform carve-out. Matching is by
//! path component, so `vendor` covers `vendor/acme` but not `vendorfoo`.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use platform_snapshot::RamdiskDirs;

/// Directories owned by the SoC vendor in the vendor image.
const VENDOR_PROPRIETARY_DIRS: &[&str] = &["device", "kernel", "vendor", "hardware", "disregard"];

/// Directories owned by the SoC vendor in the recovery image.
const RECOVERY_PROPRIETARY_DIRS: &[&str] = &["device", "hardware", "kernel", "vendor"];

/// Platform-owned directories nested inside the proprietary prefixes.
const PLATFORM_CARVE_OUTS: &[&str] = &[
    "kernel/configs",
    "kernel/prebuilts",
    "kernel/tests",
    "hardware/interfaces",
    "hardware/libhardware",
    "hardware/libhardware_legacy",
    "hardware/ril",
];

/// Prefix tables deciding which source directories are proprietary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProprietaryDirs {
    prefixes: Vec<Utf8PathBuf>,
    carve_outs: Vec<Utf8PathBuf>,
}

impl ProprietaryDirs {
    /// Build tables from arbitrary prefix and carve-out lists.
    #[must_use]
    pub fn new<P, C>(prefixes: P, carve_outs: C) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| normalise(Utf8Path::new(p.as_ref())))
                .collect(),
            carve_outs: carve_outs
                .into_iter()
                .map(|p| normalise(Utf8Path::new(p.as_ref())))
                .collect(),
        }
    }

    /// Tables for the vendor image.
    #[must_use]
    pub fn vendor() -> Self {
        Self::new(VENDOR_PROPRIETARY_DIRS, PLATFORM_CARVE_OUTS)
    }

    /// Tables for the recovery image.
    #[must_use]
    pub fn recovery() -> Self {
        Self::new(RECOVERY_PROPRIETARY_DIRS, PLATFORM_CARVE_OUTS)
    }

    /// Tables for the ramdisk image, taken from board configuration.
    #[must_use]
    pub fn ramdisk(dirs: &RamdiskDirs) -> Self {
        Self::new(&dirs.excluded_dirs, &dirs.included_dirs)
    }

    /// Whether `dir` is proprietary under these tables.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use platform_snapshot_planner::proprietary::ProprietaryDirs;
    ///
    /// let dirs = ProprietaryDirs::vendor();
    /// assert!(dirs.is_proprietary(Utf8Path::new("vendor/acme/libfoo")));
    /// assert!(!dirs.is_proprietary(Utf8Path::new("hardware/interfaces/camera")));
    /// assert!(!dirs.is_proprietary(Utf8Path::new("system/core")));
    /// ```
    #[must_use]
    pub fn is_proprietary(&self, dir: &Utf8Path) -> bool {
        let dir = normalise(dir);
        let under = |prefix: &Utf8PathBuf| dir.starts_with(prefix);
        self.prefixes.iter().any(under) && !self.carve_outs.iter().any(under)
    }
}

/// Drop `.` components and any leading separator.
fn normalise(dir: &Utf8Path) -> Utf8PathBuf {
    dir.components()
        .filter(|c| matches!(c, Utf8Component::Normal(_) | Utf8Component::ParentDir))
        .map(|c| c.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::vendor_root("vendor", true)]
    #[case::vendor_nested("vendor/acme/camera", true)]
    #[case::device("device/google/oriole", true)]
    #[case::disregard("disregard/tmp", true)]
    #[case::kernel_driver("kernel/drivers", true)]
    #[case::kernel_configs("kernel/configs/r", false)]
    #[case::hardware_interfaces("hardware/interfaces/audio", false)]
    #[case::libhardware_legacy("hardware/libhardware_legacy", false)]
    #[case::hardware_other("hardware/qcom/display", true)]
    #[case::system("system/core/libcutils", false)]
    #[case::name_prefix_only("vendorfoo/lib", false)]
    #[case::dot_prefix("./vendor/acme", true)]
    fn vendor_table(#[case] dir: &str, #[case] expected: bool) {
        assert_eq!(
            ProprietaryDirs::vendor().is_proprietary(Utf8Path::new(dir)),
            expected
        );
    }

    #[rstest]
    #[case::disregard("disregard/tmp", false)]
    #[case::hardware_ril("hardware/ril/libril", false)]
    #[case::device("device/acme", true)]
    fn recovery_table(#[case] dir: &str, #[case] expected: bool) {
        assert_eq!(
            ProprietaryDirs::recovery().is_proprietary(Utf8Path::new(dir)),
            expected
        );
    }

    #[rstest]
    fn ramdisk_tables_come_from_configuration() {
        let dirs = ProprietaryDirs::ramdisk(&RamdiskDirs {
            excluded_dirs: vec!["device".to_owned()],
            included_dirs: vec!["device/generic/common".to_owned()],
        });

        assert!(dirs.is_proprietary(Utf8Path::new("device/acme")));
        assert!(!dirs.is_proprietary(Utf8Path::new("device/generic/common/init")));
        assert!(!dirs.is_proprietary(Utf8Path::new("vendor/acme")));
    }

    #[rstest]
    fn carve_outs_win_even_when_shallower_than_a_prefix() {
        let dirs = ProprietaryDirs::new(["device/acme/secret"], ["device"]);

        assert!(!dirs.is_proprietary(Utf8Path::new("device/acme/secret/lib")));
    }

    #[rstest]
    fn empty_tables_match_nothing() {
        let dirs = ProprietaryDirs::new(Vec::<String>::new(), Vec::<String>::new());

        assert!(!dirs.is_proprietary(Utf8Path::new("vendor")));
    }
}
