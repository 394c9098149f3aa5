//! Output formatting for the snapshot CLI.
//!
//! Everything user-facing goes to stderr as plain text; the only machine
//! readable output is the make-variable file, which [`crate::packager`]
//! renders.

use crate::executor::ExecutionReport;
use crate::image::ImageFamily;
use crate::pass::SnapshotPlan;
use camino::Utf8Path;
use platform_snapshot::SnapshotConfig;
use std::fmt;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; a closed stderr must not fail the run.
    }
}

/// One-line summary of a finished pass.
///
/// # Example
///
/// ```
/// use platform_snapshot::SnapshotConfig;
/// use platform_snapshot_planner::image::ImageFamily;
/// use platform_snapshot_planner::output::plan_summary;
/// use platform_snapshot_planner::pass::generate;
///
/// let config = SnapshotConfig::default();
/// let policy = ImageFamily::Vendor.policy(&config);
/// let plan = generate(&[], policy.as_ref(), &config, false)
///     .expect("plans")
///     .expect("generated");
///
/// assert_eq!(
///     plan_summary(&plan),
///     "vendor snapshot: captured 0 of 0 modules, 0 files"
/// );
/// ```
#[must_use]
pub fn plan_summary(plan: &SnapshotPlan) -> String {
    let kind = if plan.fake { "fake " } else { "" };
    let noun = if plan.reports.len() == 1 {
        "module"
    } else {
        "modules"
    };
    format!(
        "{kind}{} snapshot: captured {} of {} {noun}, {} files",
        plan.family,
        plan.captured(),
        plan.reports.len(),
        plan.outputs().len()
    )
}

/// Full textual description of a plan, without touching the disk.
///
/// Verdicts of rejected units are only listed when `verbose` is set.
#[must_use]
pub fn plan_text(plan: &SnapshotPlan, verbose: bool) -> String {
    let mut lines = vec![plan_summary(plan), String::new()];

    lines.push("Modules:".to_owned());
    for report in &plan.reports {
        if verbose || report.verdict.is_eligible() {
            lines.push(format!("  {}: {}", report.identity, report.verdict));
        }
    }

    lines.push(String::new());
    lines.push("Snapshot variants:".to_owned());
    if plan.snapshot_map.is_empty() {
        lines.push("  (none)".to_owned());
    }
    for id in plan.snapshot_map.iter().map(|(_, id)| id) {
        lines.push(format!("  {}", id.as_str()));
    }

    lines.push(String::new());
    lines.push(format!("Outputs ({}):", plan.archive.list_file));
    for output in plan.outputs() {
        lines.push(format!("  {output}"));
    }
    lines.push(format!("Archive: {}", plan.archive.archive));

    lines.join("\n")
}

/// Message printed when the build does not snapshot `family`.
#[must_use]
pub fn skipped_message(family: ImageFamily, version: &str) -> String {
    format!("{family} snapshot skipped: version is {version}, not current")
}

/// Message printed after a plan was executed.
#[must_use]
pub fn success_message(report: &ExecutionReport) -> String {
    let noun = if report.files == 1 { "file" } else { "files" };
    format!(
        "Wrote {} {noun} to {}\nsha256 {}",
        report.files, report.archive, report.sha256
    )
}

/// Configuration shown by `--dry-run`.
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Inventory the run would read.
    pub inventory: &'a Utf8Path,
    /// Image families the run would snapshot.
    pub families: &'a [ImageFamily],
    /// Output root.
    pub out_dir: &'a Utf8Path,
    /// Root for relative copy sources.
    pub source_root: &'a Utf8Path,
    /// Whether placeholder files replace artefacts.
    pub fake: bool,
    /// Effective configuration after overrides.
    pub config: &'a SnapshotConfig,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let families: Vec<&str> = self.families.iter().map(|f| f.as_str()).collect();
        let mut lines = vec![
            "Dry run - no files will be read or written".to_owned(),
            String::new(),
            format!("Inventory: {}", self.inventory),
            format!("Images: {}", families.join(", ")),
            format!("Output directory: {}", self.out_dir),
            format!("Source root: {}", self.source_root),
            format!("Fake: {}", self.fake),
            format!("Device: {} ({})", self.config.device_name, self.config.device_arch),
            format!("VNDK version: {}", self.config.vndk_version),
            format!(
                "Recovery snapshot version: {}",
                self.config.recovery_snapshot_version
            ),
            format!("Archive format: {}", self.config.archive_format),
        ];

        for (family, list) in [
            (ImageFamily::Vendor, &self.config.directed.vendor),
            (ImageFamily::Recovery, &self.config.directed.recovery),
            (ImageFamily::Ramdisk, &self.config.directed.ramdisk),
        ] {
            if let Some(modules) = list {
                let names: Vec<&str> = modules.iter().map(String::as_str).collect();
                lines.push(format!("Directed {family}: {}", names.join(", ")));
            }
        }

        lines.join("\n")
    }
}
