//! Snapshot eligibility classification.
//!
//! A compiled unit is captured only when it clears every guard of an ordered
//! pipeline. The pipeline is deterministic and performs no I/O: the same unit,
//! proprietary flag, and policy always produce the same [`Verdict`].
//!
//! Conflicting snapshot flags are a separate concern, checked over the whole
//! inventory by [`check_conflicts`] before any unit is classified.

use crate::error::{Result, SnapshotError};
use crate::image::ImagePolicy;
use crate::unit::{CompiledUnit, LibraryKind, OsClass, Sanitizer, UnitKind};
use std::fmt;

/// Guards of the eligibility pipeline, in evaluation order.
///
/// The declaration order is the order in which guards run, so the first
/// failing guard is the one reported in a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Guard {
    /// Disabled, hidden from make, or superseded by its source/prebuilt twin.
    Inactive,
    /// Lives in a proprietary path and is not a capturable VNDK library.
    ProprietaryPath,
    /// Opted out of this snapshot, or left out of a directed snapshot.
    Excluded,
    /// Built for the host or for native bridge.
    NotDeviceTarget,
    /// Not installed into this image for the platform, or already a
    /// snapshot prebuilt.
    NotInImage,
    /// Kernel headers and LL-NDK modules, which stay backward compatible.
    BackwardCompatible,
    /// A sanitizer variant that the snapshot does not capture.
    SanitizerVariant,
    /// No valid primary output.
    MissingOutput,
    /// `<family>_available: false`.
    Unavailable,
    /// A VNDK core library, captured by the VNDK snapshot instead.
    VndkCore,
    /// A shape the snapshot never captures.
    UnsupportedShape,
}

impl Guard {
    /// Short description used in logs and verbose reports.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Inactive => "disabled, hidden, or skip-install",
            Self::ProprietaryPath => "in proprietary path",
            Self::Excluded => "excluded from snapshot",
            Self::NotDeviceTarget => "not a device target",
            Self::NotInImage => "not installed in image",
            Self::BackwardCompatible => "backward-compatible module",
            Self::SanitizerVariant => "uncaptured sanitizer variant",
            Self::MissingOutput => "no valid output",
            Self::Unavailable => "not available to image",
            Self::VndkCore => "VNDK core library",
            Self::UnsupportedShape => "unsupported module shape",
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Outcome of classifying one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The unit's output is captured.
    Eligible,
    /// The unit was rejected by the named guard.
    Rejected(Guard),
}

impl Verdict {
    /// Whether the unit is captured.
    #[must_use]
    pub const fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }

    const fn from_check(passed: bool, guard: Guard) -> Self {
        if passed {
            Self::Eligible
        } else {
            Self::Rejected(guard)
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eligible => f.write_str("eligible"),
            Self::Rejected(guard) => write!(f, "rejected: {guard}"),
        }
    }
}

/// Run the guard pipeline and report the first failing guard.
///
/// # Examples
///
/// ```
/// use platform_snapshot::SnapshotConfig;
/// use platform_snapshot_planner::eligibility::{Guard, Verdict, classify};
/// use platform_snapshot_planner::image::ImageFamily;
/// use platform_snapshot_planner::unit::{CompiledUnit, Target, UnitKind};
///
/// let policy = ImageFamily::Vendor.policy(&SnapshotConfig::default());
/// let mut unit = CompiledUnit::new("crtend", UnitKind::Object, "bionic", Target::device("arm64"));
/// unit.in_vendor = true;
/// unit.output_file = Some("out/crtend.o".into());
///
/// assert_eq!(classify(&unit, false, policy.as_ref()), Verdict::Eligible);
/// assert_eq!(
///     classify(&unit, true, policy.as_ref()),
///     Verdict::Rejected(Guard::ProprietaryPath),
/// );
/// ```
#[must_use]
pub fn classify(
    unit: &CompiledUnit,
    in_proprietary_path: bool,
    policy: &dyn ImagePolicy,
) -> Verdict {
    if !unit.enabled || unit.hide_from_make || unit.is_skip_install() {
        return Verdict::Rejected(Guard::Inactive);
    }
    if in_proprietary_path && !(policy.include_vndk() && unit.vndk.member) {
        return Verdict::Rejected(Guard::ProprietaryPath);
    }
    if policy.is_excluded(unit) {
        return Verdict::Rejected(Guard::Excluded);
    }
    if unit.target.os_class != OsClass::Device || unit.target.native_bridge {
        return Verdict::Rejected(Guard::NotDeviceTarget);
    }
    if !unit.for_platform || unit.snapshot_prebuilt || !policy.in_image(unit) {
        return Verdict::Rejected(Guard::NotInImage);
    }

    match &unit.kind {
        UnitKind::KernelHeaders | UnitKind::LlndkStub | UnitKind::LlndkHeaders => {
            Verdict::Rejected(Guard::BackwardCompatible)
        }
        UnitKind::StaticLibrary(_) | UnitKind::SharedLibrary(_) | UnitKind::HeaderLibrary(_) => {
            classify_library(unit, policy)
        }
        UnitKind::Binary(_) | UnitKind::Object => classify_output(unit, policy),
        UnitKind::Other { .. } => Verdict::Rejected(Guard::UnsupportedShape),
    }
}

/// Boolean form of [`classify`].
#[must_use]
pub fn is_snapshot_eligible(
    unit: &CompiledUnit,
    in_proprietary_path: bool,
    policy: &dyn ImagePolicy,
) -> bool {
    classify(unit, in_proprietary_path, policy).is_eligible()
}

fn classify_library(unit: &CompiledUnit, policy: &dyn ImagePolicy) -> Verdict {
    let Some((kind, _)) = unit.kind.library() else {
        return Verdict::Rejected(Guard::UnsupportedShape);
    };

    // scs and hwasan export sanitized and plain variants of static and
    // header libraries; only the plain one is captured. cfi static variants
    // are captured alongside the plain one.
    let sanitize = &unit.sanitize;
    let sanitized_archive = kind != LibraryKind::Shared
        && (sanitize.is_enabled(Sanitizer::Scs) || sanitize.is_enabled(Sanitizer::Hwasan));
    let cfi_headers = kind == LibraryKind::Header && sanitize.is_enabled(Sanitizer::Cfi);
    if sanitized_archive || cfi_headers {
        return Verdict::Rejected(Guard::SanitizerVariant);
    }

    match kind {
        LibraryKind::Static => classify_output(unit, policy),
        LibraryKind::Shared => {
            if !unit.output_valid() {
                Verdict::Rejected(Guard::MissingOutput)
            } else if policy.include_vndk() && unit.vndk.member {
                Verdict::from_check(unit.vndk.extension, Guard::VndkCore)
            } else {
                Verdict::Eligible
            }
        }
        LibraryKind::Header => Verdict::Eligible,
    }
}

fn classify_output(unit: &CompiledUnit, policy: &dyn ImagePolicy) -> Verdict {
    if !unit.output_valid() {
        return Verdict::Rejected(Guard::MissingOutput);
    }
    Verdict::from_check(
        policy.available(unit).unwrap_or(true),
        Guard::Unavailable,
    )
}

/// Reject contradictory snapshot flags across the whole inventory.
///
/// Runs before any unit is classified so that a misconfigured module aborts
/// the pass before any output is planned.
///
/// # Errors
///
/// Returns [`SnapshotError::ExclusionInProprietaryPath`] when an excluded
/// module lives in a proprietary directory, and
/// [`SnapshotError::ConflictingAvailability`] when an excluded module is also
/// marked available.
pub fn check_conflicts<'a, I>(units: I, policy: &dyn ImagePolicy) -> Result<()>
where
    I: IntoIterator<Item = &'a CompiledUnit>,
{
    units
        .into_iter()
        .try_for_each(|unit| check_unit_conflicts(unit, policy))
}

/// Conflict check for a single unit. See [`check_conflicts`].
///
/// # Errors
///
/// As for [`check_conflicts`].
pub fn check_unit_conflicts(unit: &CompiledUnit, policy: &dyn ImagePolicy) -> Result<()> {
    if !policy.exclude_from_snapshot(unit) {
        return Ok(());
    }
    if policy.is_proprietary_path(&unit.dir) {
        return Err(SnapshotError::ExclusionInProprietaryPath {
            module: unit.name.clone(),
            family: policy.name(),
            dir: unit.dir.clone(),
        });
    }
    if policy.available(unit) == Some(true) {
        return Err(SnapshotError::ConflictingAvailability {
            module: unit.name.clone(),
            family: policy.name(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "eligibility_tests.rs"]
mod tests;
