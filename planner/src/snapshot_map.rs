//! Snapshot identifiers of captured modules.
//!
//! Each captured `(module, architecture)` pair gets an identifier of the form
//! `<module>.<family>.<version>.<arch>`, which is the name the snapshot
//! prebuilt for that module is registered under when the snapshot is
//! consumed.

use crate::image::ImagePolicy;
use crate::module_name::ModuleName;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// Identifier of one captured module variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Build the identifier for `module` on `arch` under `policy`.
    #[must_use]
    pub fn new(module: &ModuleName, arch: &str, policy: &dyn ImagePolicy) -> Self {
        Self(format!(
            "{module}.{}.{}.{arch}",
            policy.name(),
            policy.snapshot_version()
        ))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map from `(module, architecture)` to snapshot identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotMap {
    entries: BTreeMap<(ModuleName, String), SnapshotId>,
}

impl SnapshotMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `module` on `arch`; an existing entry is kept.
    pub fn record(&mut self, module: &ModuleName, arch: &str, policy: &dyn ImagePolicy) {
        self.entries
            .entry((module.clone(), arch.to_owned()))
            .or_insert_with(|| SnapshotId::new(module, arch, policy));
    }

    /// Number of recorded variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no variant has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in `(module, arch)` order.
    pub fn iter(&self) -> btree_map::Iter<'_, (ModuleName, String), SnapshotId> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a SnapshotMap {
    type Item = (&'a (ModuleName, String), &'a SnapshotId);
    type IntoIter = btree_map::Iter<'a, (ModuleName, String), SnapshotId>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageFamily;
    use crate::test_utils::policy;
    use platform_snapshot::SnapshotConfig;

    #[test]
    fn identifier_includes_family_version_and_arch() {
        let id = SnapshotId::new(
            &ModuleName::from("libbase"),
            "arm64",
            policy(ImageFamily::Vendor).as_ref(),
        );

        assert_eq!(id.as_str(), "libbase.vendor.current.arm64");
    }

    #[test]
    fn recovery_uses_its_own_version() {
        let config = SnapshotConfig {
            vndk_version: "33".to_owned(),
            recovery_snapshot_version: "current".to_owned(),
            ..SnapshotConfig::default()
        };
        let recovery = ImageFamily::Recovery.policy(&config);

        let id = SnapshotId::new(&ModuleName::from("init"), "x86_64", recovery.as_ref());

        assert_eq!(id.to_string(), "init.recovery.current.x86_64");
    }

    #[test]
    fn variants_are_keyed_by_module_and_arch() {
        let vendor = policy(ImageFamily::Vendor);
        let mut map = SnapshotMap::new();
        let libc = ModuleName::from("libc");

        map.record(&libc, "arm64", vendor.as_ref());
        map.record(&libc, "arm64", vendor.as_ref());
        map.record(&libc, "arm", vendor.as_ref());

        let ids: Vec<&str> = map.iter().map(|(_, id)| id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["libc.vendor.current.arm", "libc.vendor.current.arm64"]
        );
    }
}
