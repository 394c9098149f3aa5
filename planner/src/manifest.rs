//! Per-artifact metadata records.
//!
//! Every captured unit gets a JSON sidecar describing how to re-create the
//! module from its frozen artifact. The schema is consumed by snapshot
//! prebuilt loaders, so keys, key order, and the omission of empty fields
//! are fixed:
//!
//! ```json
//! {"ModuleName":"libbase.cfi","ExportedFlags":["-DBASE"],"Sanitize":"cfi"}
//! ```

use crate::error::{Result, SnapshotError};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// Metadata sidecar written next to each captured artifact.
///
/// Field order is the serialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ArtifactMetadataRecord {
    /// Module name, `.cfi`-suffixed for CFI static variants.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub module_name: String,
    /// Install subdirectory under the partition's library directory.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub relative_install_path: String,
    /// Exported include directories, as `include/<dir>`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exported_dirs: Vec<String>,
    /// Exported system include directories, as `include/<dir>`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exported_system_dirs: Vec<String>,
    /// Exported compile and link flags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exported_flags: Vec<String>,
    /// Sanitizer tag; only `cfi` is ever recorded.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sanitize: String,
    /// Dependents must link the minimal UBSan runtime.
    #[serde(skip_serializing_if = "is_false")]
    pub sanitize_minimal_dep: bool,
    /// Dependents must link the UBSan runtime.
    #[serde(skip_serializing_if = "is_false")]
    pub sanitize_ubsan_dep: bool,
    /// Symlinks installed alongside a binary.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub symlinks: Vec<String>,
    /// Shared library dependencies.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shared_libs: Vec<String>,
    /// Runtime library dependencies.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runtime_libs: Vec<String>,
    /// Required modules.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Init scripts, as `configs/<basename>`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub init_rc: Vec<String>,
    /// VINTF fragments, as `configs/<basename>`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vintf_fragments: Vec<String>,
}

const fn is_false(value: &bool) -> bool {
    !*value
}

impl ArtifactMetadataRecord {
    /// Create a record carrying only the module name.
    #[must_use]
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            ..Self::default()
        }
    }

    /// Encode the record as compact JSON destined for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::ManifestSerialization`] if encoding fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use platform_snapshot_planner::manifest::ArtifactMetadataRecord;
    ///
    /// let record = ArtifactMetadataRecord::new("libfoo");
    /// let json = record.to_json(Utf8Path::new("libfoo.a.json")).expect("encodes");
    /// assert_eq!(json, r#"{"ModuleName":"libfoo"}"#);
    /// ```
    pub fn to_json(&self, path: &Utf8Path) -> Result<String> {
        serde_json::to_string(self).map_err(|source| SnapshotError::ManifestSerialization {
            path: path.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
