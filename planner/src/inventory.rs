//! Module enumeration.
//!
//! The build graph owns the compiled units; the planner only asks for them
//! through [`ModuleSource`]. [`JsonInventory`] reads a dumped inventory so the
//! planner can run outside the build:
//!
//! ```json
//! { "modules": [ { "name": "libfoo", "dir": "system/libfoo", ... } ] }
//! ```

use crate::error::{Result, SnapshotError};
use crate::unit::CompiledUnit;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::fs;

/// Source of every compiled unit of the build.
#[cfg_attr(test, mockall::automock)]
pub trait ModuleSource {
    /// Enumerate all units, in the build graph's visiting order.
    ///
    /// # Errors
    ///
    /// Returns an error if the units cannot be enumerated.
    fn modules(&self) -> Result<Vec<CompiledUnit>>;
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InventoryDocument {
    modules: Vec<CompiledUnit>,
}

/// Module inventory stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonInventory {
    path: Utf8PathBuf,
}

impl JsonInventory {
    /// Create an inventory backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Inventory file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Parse inventory JSON; `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Inventory`] if `source` is not a valid
    /// inventory document.
    pub fn parse(source: &str, path: &Utf8Path) -> Result<Vec<CompiledUnit>> {
        let document: InventoryDocument =
            serde_json::from_str(source).map_err(|err| SnapshotError::Inventory {
                path: path.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(document.modules)
    }
}

impl ModuleSource for JsonInventory {
    fn modules(&self) -> Result<Vec<CompiledUnit>> {
        let source = fs::read_to_string(&self.path).map_err(|err| SnapshotError::Inventory {
            path: self.path.clone(),
            reason: err.to_string(),
        })?;
        let modules = Self::parse(&source, &self.path)?;
        debug!("loaded {} modules from {}", modules.len(), self.path);
        Ok(modules)
    }
}
