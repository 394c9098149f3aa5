//! Semantic wrapper for build module names.
//!
//! This module provides the [`ModuleName`] newtype so module identities are
//! passed explicitly rather than as raw strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix appended to the manifest name of a CFI-sanitized static library.
const CFI_SUFFIX: &str = ".cfi";

/// The name a module is declared under in the build graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Create a new module name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the module name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Return the name a CFI static variant is recorded under.
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_snapshot_planner::module_name::ModuleName;
    ///
    /// assert_eq!(ModuleName::from("libbase").cfi_variant().as_str(), "libbase.cfi");
    /// ```
    #[must_use]
    pub fn cfi_variant(&self) -> Self {
        Self(format!("{}{CFI_SUFFIX}", self.0))
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ModuleName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
