//! CLI argument definitions for the snapshot planner.
//!
//! Kept apart from the entrypoint so argument parsing can be unit tested
//! without running a pass.

use crate::image::ImageFamily;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

/// Plan and package vendor, recovery, and ramdisk snapshots.
#[derive(Parser, Debug, Clone)]
#[command(name = "platform-snapshot")]
#[command(version, about)]
#[command(long_about = concat!(
    "Plan and package platform snapshots.\n\n",
    "Reads a dumped module inventory, decides which compiled modules belong in ",
    "each requested image snapshot, and prints the resulting file plan. With ",
    "--execute the plan is realised under the output directory and packed into ",
    "a deterministic archive.\n\n",
    "Configuration is read from --config and then overridden by TARGET_DEVICE, ",
    "TARGET_DEVICE_ARCH, BOARD_VNDK_VERSION, and RECOVERY_SNAPSHOT_VERSION.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Show the vendor snapshot plan:\n",
    "    $ platform-snapshot --inventory modules.json\n\n",
    "  Build every snapshot and record the archive variables:\n",
    "    $ platform-snapshot -m modules.json --execute --make-vars out/snapshot.mk\n\n",
    "  Build a fake recovery snapshot:\n",
    "    $ platform-snapshot -m modules.json -i recovery --fake --execute\n",
))]
pub struct Cli {
    /// JSON module inventory to read.
    #[arg(short = 'm', long, value_name = "FILE")]
    pub inventory: Utf8PathBuf,

    /// Image to snapshot (repeatable) [default: all images].
    #[arg(short, long = "image", value_enum, value_name = "IMAGE")]
    pub images: Vec<ImageFamily>,

    /// TOML configuration file [default: built-in defaults].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Output root for snapshot trees and archives.
    #[arg(short, long, value_name = "DIR", default_value = "out")]
    pub out_dir: Utf8PathBuf,

    /// Root that relative artefact paths are resolved against.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source_root: Utf8PathBuf,

    /// Write empty placeholders instead of copying artefacts.
    #[arg(long)]
    pub fake: bool,

    /// Copy files and build the archive instead of only printing the plan.
    #[arg(long, conflicts_with = "dry_run")]
    pub execute: bool,

    /// Show configuration and exit without reading the inventory.
    #[arg(long)]
    pub dry_run: bool,

    /// Write archive build variables to this file.
    #[arg(long, value_name = "FILE")]
    pub make_vars: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Requested image families, defaulting to all of them.
    ///
    /// Repeated families are collapsed, keeping first-mention order.
    #[must_use]
    pub fn families(&self) -> Vec<ImageFamily> {
        if self.images.is_empty() {
            return ImageFamily::ALL.to_vec();
        }
        let mut families = Vec::with_capacity(self.images.len());
        for family in &self.images {
            if !families.contains(family) {
                families.push(*family);
            }
        }
        families
    }

    /// Inventory path as given.
    #[must_use]
    pub fn inventory(&self) -> &Utf8Path {
        &self.inventory
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
