//! Planned file actions.
//!
//! Planning never touches the filesystem. Every output of a pass is described
//! by a [`BuildAction`] whose destination is relative to the output root; the
//! [`executor`](crate::executor) realises them later, if asked.

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// One output-producing step of a snapshot pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildAction {
    /// Copy a built or source file into the snapshot.
    Copy {
        /// File to copy, relative to the source root unless absolute.
        source: Utf8PathBuf,
        /// Destination, relative to the output root.
        destination: Utf8PathBuf,
    },
    /// Write literal contents into the snapshot.
    Write {
        /// Destination, relative to the output root.
        destination: Utf8PathBuf,
        /// File contents.
        contents: String,
    },
}

impl BuildAction {
    /// Copy `source` to `destination`, or write an empty placeholder there
    /// when `fake` is set.
    #[must_use]
    pub fn copy_or_touch(
        source: impl Into<Utf8PathBuf>,
        destination: impl Into<Utf8PathBuf>,
        fake: bool,
    ) -> Self {
        if fake {
            Self::write(destination, String::new())
        } else {
            Self::Copy {
                source: source.into(),
                destination: destination.into(),
            }
        }
    }

    /// Write `contents` to `destination`.
    #[must_use]
    pub fn write(destination: impl Into<Utf8PathBuf>, contents: impl Into<String>) -> Self {
        Self::Write {
            destination: destination.into(),
            contents: contents.into(),
        }
    }

    /// Path this action produces.
    #[must_use]
    pub fn destination(&self) -> &Utf8Path {
        match self {
            Self::Copy { destination, .. } | Self::Write { destination, .. } => destination,
        }
    }
}

impl fmt::Display for BuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy {
                source,
                destination,
            } => write!(f, "copy {source} -> {destination}"),
            Self::Write {
                destination,
                contents,
            } => write!(f, "write {destination} ({} bytes)", contents.len()),
        }
    }
}
