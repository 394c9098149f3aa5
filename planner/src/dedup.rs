//! Destination-keyed deduplication of shared snapshot content.
//!
//! Several modules may ship the same init script or notice file. The first
//! request for a destination wins; later requests are no-ops.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::collections::HashSet;

/// Insert-only record of destinations already installed in a pass.
#[derive(Debug, Default)]
pub struct Deduplicator {
    installed: HashSet<Utf8PathBuf>,
}

impl Deduplicator {
    /// Create an empty deduplicator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand back `payload` the first time `dest` is requested, `None` after.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use platform_snapshot_planner::dedup::Deduplicator;
    ///
    /// let mut dedup = Deduplicator::new();
    /// let dest = Utf8Path::new("vendor-snapshot/arm64/configs/init.rc");
    /// assert_eq!(dedup.install_once(dest, 1), Some(1));
    /// assert_eq!(dedup.install_once(dest, 2), None);
    /// ```
    pub fn install_once<T>(&mut self, dest: &Utf8Path, payload: T) -> Option<T> {
        if self.installed.insert(dest.to_owned()) {
            Some(payload)
        } else {
            debug!("skipping already installed {dest}");
            None
        }
    }
}
