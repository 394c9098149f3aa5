//! Snapshot generation pass orchestration.
//!
//! A pass walks the whole inventory once for one image family: it validates
//! snapshot flags, classifies every unit, hands eligible units to the tree
//! builder, installs shared headers and notices, and packages the result into
//! a [`SnapshotPlan`]. The pass itself performs no I/O.

use crate::action::BuildAction;
use crate::dedup::Deduplicator;
use crate::eligibility::{Verdict, check_conflicts, classify};
use crate::error::Result;
use crate::image::{ImageFamily, ImagePolicy};
use crate::inventory::ModuleSource;
use crate::layout::SnapshotLayout;
use crate::packager::{ArchivePlan, MakeVars, pack};
use crate::snapshot_map::SnapshotMap;
use crate::tree::TreeBuilder;
use crate::unit::CompiledUnit;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use platform_snapshot::SnapshotConfig;

/// Classification outcome of one unit, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    /// `name (arch[-variant])` of the unit.
    pub identity: String,
    /// Whether and why the unit was captured.
    pub verdict: Verdict,
}

/// Everything a finished pass produced.
#[derive(Debug, Clone)]
pub struct SnapshotPlan {
    /// Image family of the pass.
    pub family: ImageFamily,
    /// Whether this is a fake snapshot.
    pub fake: bool,
    /// Planned actions, sorted by destination.
    pub actions: Vec<BuildAction>,
    /// Archive step over the planned outputs.
    pub archive: ArchivePlan,
    /// Identifiers of the captured module variants.
    pub snapshot_map: SnapshotMap,
    /// Per-unit verdicts in inventory order.
    pub reports: Vec<UnitReport>,
}

impl SnapshotPlan {
    /// Sorted output paths, relative to the output root.
    #[must_use]
    pub fn outputs(&self) -> &[Utf8PathBuf] {
        &self.archive.entries
    }

    /// Build variables recording the archive under `out_root`.
    #[must_use]
    pub fn make_vars(&self, out_root: &Utf8Path) -> MakeVars {
        let mut vars = MakeVars::new();
        vars.strict(
            self.family.make_var(self.fake),
            out_root.join(&self.archive.archive).into_string(),
        );
        vars
    }

    /// Number of units the pass captured.
    #[must_use]
    pub fn captured(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.verdict.is_eligible())
            .count()
    }
}

/// Aggregate state of one in-flight pass.
///
/// Outputs are append-only and the dedup map is insert-only; the run is
/// consumed by [`SnapshotRun::finish`].
#[derive(Debug)]
pub struct SnapshotRun<'a> {
    policy: &'a dyn ImagePolicy,
    config: &'a SnapshotConfig,
    layout: SnapshotLayout,
    fake: bool,
    actions: Vec<BuildAction>,
    dedup: Deduplicator,
    snapshot_map: SnapshotMap,
    headers: Vec<Utf8PathBuf>,
    reports: Vec<UnitReport>,
}

impl<'a> SnapshotRun<'a> {
    /// Start a pass for `policy`'s family.
    #[must_use]
    pub fn new(policy: &'a dyn ImagePolicy, config: &'a SnapshotConfig, fake: bool) -> Self {
        Self {
            policy,
            config,
            layout: SnapshotLayout::new(policy.family(), &config.device_arch, fake),
            fake,
            actions: Vec::new(),
            dedup: Deduplicator::new(),
            snapshot_map: SnapshotMap::new(),
            headers: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Classify `unit` and plan its capture if it is eligible.
    ///
    /// # Errors
    ///
    /// Propagates tree builder failures for eligible units.
    pub fn visit(&mut self, unit: &CompiledUnit) -> Result<Verdict> {
        let in_proprietary_path = self.policy.is_proprietary_path(&unit.dir);
        let verdict = classify(unit, in_proprietary_path, self.policy);
        debug!("{} snapshot: {} {verdict}", self.policy.name(), unit.identity());
        self.reports.push(UnitReport {
            identity: unit.identity(),
            verdict,
        });
        if !verdict.is_eligible() {
            return Ok(verdict);
        }

        let builder = TreeBuilder::new(self.policy, &self.layout, self.fake);
        self.actions.extend(builder.install(unit, &mut self.dedup)?);
        if let Some((_, lib)) = unit.kind.library() {
            self.headers.extend(lib.headers.iter().cloned());
        }
        self.actions
            .extend(builder.install_notice(unit, &mut self.dedup));
        self.snapshot_map
            .record(&unit.name, &unit.target.arch, self.policy);
        Ok(verdict)
    }

    /// Install collected headers and package the pass.
    #[must_use]
    pub fn finish(mut self) -> SnapshotPlan {
        let builder = TreeBuilder::new(self.policy, &self.layout, self.fake);
        let header_actions = builder.install_headers(&self.headers);
        self.actions.extend(header_actions);

        let (actions, archive) = pack(self.actions, &self.layout, self.config);
        info!(
            "{} snapshot: {} outputs from {} module variants",
            self.policy.name(),
            actions.len(),
            self.snapshot_map.len()
        );
        SnapshotPlan {
            family: self.policy.family(),
            fake: self.fake,
            actions,
            archive,
            snapshot_map: self.snapshot_map,
            reports: self.reports,
        }
    }
}

/// Run a full pass over `units`.
///
/// Returns `Ok(None)` when the build does not generate a snapshot for this
/// family.
///
/// # Errors
///
/// Returns a configuration conflict before any unit is planned, or a tree
/// builder failure for an eligible unit.
///
/// # Examples
///
/// ```
/// use platform_snapshot::SnapshotConfig;
/// use platform_snapshot_planner::image::ImageFamily;
/// use platform_snapshot_planner::pass::generate;
///
/// let config = SnapshotConfig::default();
/// let policy = ImageFamily::Vendor.policy(&config);
/// let plan = generate(&[], policy.as_ref(), &config, false)
///     .expect("empty inventory plans")
///     .expect("vendor snapshot is generated");
/// assert!(plan.actions.is_empty());
/// ```
pub fn generate(
    units: &[CompiledUnit],
    policy: &dyn ImagePolicy,
    config: &SnapshotConfig,
    fake: bool,
) -> Result<Option<SnapshotPlan>> {
    if !policy.should_generate() {
        info!(
            "{} snapshot not generated for version {}",
            policy.name(),
            policy.snapshot_version()
        );
        return Ok(None);
    }
    check_conflicts(units, policy)?;

    let mut run = SnapshotRun::new(policy, config, fake);
    for unit in units {
        run.visit(unit)?;
    }
    Ok(Some(run.finish()))
}

/// Enumerate `source` and run a full pass over its units.
///
/// # Errors
///
/// Returns enumeration failures from `source`, then the errors of
/// [`generate`].
pub fn generate_from(
    source: &dyn ModuleSource,
    policy: &dyn ImagePolicy,
    config: &SnapshotConfig,
    fake: bool,
) -> Result<Option<SnapshotPlan>> {
    if !policy.should_generate() {
        return generate(&[], policy, config, fake);
    }
    let units = source.modules()?;
    generate(&units, policy, config, fake)
}

#[cfg(test)]
#[path = "pass_tests.rs"]
mod tests;
