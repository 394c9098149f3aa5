//! Packaging of a finished snapshot pass.
//!
//! Packaging fixes the order of every output, describes the archive step, and
//! records the archive path into the family's build variable. Only the final
//! sort decides output order, so two passes over the same inventory always
//! produce the same list and archive.

use crate::action::BuildAction;
use crate::layout::SnapshotLayout;
use camino::{Utf8Path, Utf8PathBuf};
use platform_snapshot::{ArchiveFormat, SnapshotConfig};
use std::collections::BTreeMap;

/// Description of the archive step of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePlan {
    /// Directory the archive is rooted at, relative to the output root.
    pub root: Utf8PathBuf,
    /// Sorted output list, relative to the output root.
    pub list_file: Utf8PathBuf,
    /// Archive path, relative to the output root.
    pub archive: Utf8PathBuf,
    /// Container format.
    pub format: ArchiveFormat,
    /// Archived files in sorted order, relative to the output root.
    pub entries: Vec<Utf8PathBuf>,
}

impl ArchivePlan {
    /// Contents of the list file: one output per line.
    #[must_use]
    pub fn list_contents(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{entry}\n"))
            .collect()
    }

    /// Name of `entry` inside the archive.
    #[must_use]
    pub fn entry_name<'p>(&self, entry: &'p Utf8Path) -> &'p Utf8Path {
        entry.strip_prefix(&self.root).unwrap_or(entry)
    }
}

/// Sort `actions` by destination and describe the archive over them.
///
/// # Examples
///
/// ```
/// use platform_snapshot::SnapshotConfig;
/// use platform_snapshot_planner::action::BuildAction;
/// use platform_snapshot_planner::image::ImageFamily;
/// use platform_snapshot_planner::layout::SnapshotLayout;
/// use platform_snapshot_planner::packager::pack;
///
/// let layout = SnapshotLayout::new(ImageFamily::Vendor, "arm64", false);
/// let actions = vec![
///     BuildAction::write("vendor-snapshot/arm64/b.json", "{}"),
///     BuildAction::write("vendor-snapshot/arm64/a.json", "{}"),
/// ];
///
/// let (sorted, archive) = pack(actions, &layout, &SnapshotConfig::default());
/// assert_eq!(sorted[0].destination(), "vendor-snapshot/arm64/a.json");
/// assert_eq!(archive.archive, "vendor-snapshot/vendor-generic.zip");
/// ```
#[must_use]
pub fn pack(
    mut actions: Vec<BuildAction>,
    layout: &SnapshotLayout,
    config: &SnapshotConfig,
) -> (Vec<BuildAction>, ArchivePlan) {
    actions.sort_by(|a, b| a.destination().as_str().cmp(b.destination().as_str()));
    let entries = actions
        .iter()
        .map(|action| action.destination().to_owned())
        .collect();
    let archive = ArchivePlan {
        root: layout.snapshot_dir().to_owned(),
        list_file: layout.list_file(&config.device_name),
        archive: layout.archive_path(&config.device_name, config.archive_format),
        format: config.archive_format,
        entries,
    };
    (actions, archive)
}

/// Registry of named build variables exported to the legacy make layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakeVars {
    vars: BTreeMap<String, String>,
}

impl MakeVars {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any previous value.
    pub fn strict(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Look up `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Merge every variable of `other` into this registry.
    pub fn extend(&mut self, other: Self) {
        self.vars.extend(other.vars);
    }

    /// Render as `NAME := value` lines sorted by name.
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_snapshot_planner::packager::MakeVars;
    ///
    /// let mut vars = MakeVars::new();
    /// vars.strict("SOONG_VENDOR_SNAPSHOT_ZIP", "out/vendor-snapshot/vendor-generic.zip");
    /// vars.strict("SOONG_RECOVERY_SNAPSHOT_ZIP", "out/recovery-snapshot/recovery-generic.zip");
    /// assert_eq!(
    ///     vars.render(),
    ///     "SOONG_RECOVERY_SNAPSHOT_ZIP := out/recovery-snapshot/recovery-generic.zip\n\
    ///      SOONG_VENDOR_SNAPSHOT_ZIP := out/vendor-snapshot/vendor-generic.zip\n",
    /// );
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        self.vars
            .iter()
            .map(|(name, value)| format!("{name} := {value}\n"))
            .collect()
    }
}
