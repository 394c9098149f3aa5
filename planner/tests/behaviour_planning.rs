//! Behaviour-driven tests for snapshot planning.
//!
//! These scenarios drive whole generation passes over small inventories and
//! check verdicts and planned outputs. They use the rstest-bdd mutable world
//! pattern.

use platform_snapshot::SnapshotConfig;
use platform_snapshot_planner::eligibility::Verdict;
use platform_snapshot_planner::error::SnapshotError;
use platform_snapshot_planner::image::ImageFamily;
use platform_snapshot_planner::pass::{SnapshotPlan, generate};
use platform_snapshot_planner::unit::{
    Binary, CompiledUnit, Library, Sanitizer, SanitizerState, Target, UnitKind,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PlanningWorld {
    config: SnapshotConfig,
    units: Vec<CompiledUnit>,
    generated: bool,
    plan: Option<SnapshotPlan>,
    error: Option<SnapshotError>,
}

#[fixture]
fn world() -> PlanningWorld {
    PlanningWorld::default()
}

fn parse_family(name: &str) -> ImageFamily {
    match name {
        "vendor" => ImageFamily::Vendor,
        "recovery" => ImageFamily::Recovery,
        "ramdisk" => ImageFamily::Ramdisk,
        other => panic!("unknown image family {other}"),
    }
}

fn add_unit(world: &mut PlanningWorld, name: &str, dir: &str, kind: UnitKind, output: String) {
    let mut unit = CompiledUnit::new(name, kind, dir, Target::device("arm64"));
    unit.in_vendor = true;
    unit.output_file = Some(output.into());
    world.units.push(unit);
}

fn unit_mut<'a>(world: &'a mut PlanningWorld, name: &str) -> &'a mut CompiledUnit {
    world
        .units
        .iter_mut()
        .find(|unit| unit.name.as_str() == name)
        .expect("unit declared")
}

fn plan(world: &PlanningWorld) -> &SnapshotPlan {
    world.plan.as_ref().expect("plan generated")
}

fn verdict_of(world: &PlanningWorld, name: &str) -> Verdict {
    let identity = format!("{name} (arm64)");
    plan(world)
        .reports
        .iter()
        .find(|report| report.identity == identity)
        .map(|report| report.verdict)
        .expect("unit reported")
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a static library \"{name}\" in \"{dir}\"")]
fn given_static_library(world: &mut PlanningWorld, name: String, dir: String) {
    let output = format!("out/{name}.a");
    add_unit(
        world,
        &name,
        &dir,
        UnitKind::StaticLibrary(Library::default()),
        output,
    );
}

#[given("a binary \"{name}\" in \"{dir}\"")]
fn given_binary(world: &mut PlanningWorld, name: String, dir: String) {
    let output = format!("out/{name}");
    add_unit(world, &name, &dir, UnitKind::Binary(Binary::default()), output);
}

#[given("module \"{name}\" requires init script \"{path}\"")]
fn given_init_script(world: &mut PlanningWorld, name: String, path: String) {
    unit_mut(world, &name).init_rc.push(path.into());
}

#[given("module \"{name}\" is excluded from the vendor snapshot")]
fn given_excluded(world: &mut PlanningWorld, name: String) {
    unit_mut(world, &name).exclude_from_vendor_snapshot = true;
}

#[given("module \"{name}\" is available to vendor")]
fn given_vendor_available(world: &mut PlanningWorld, name: String) {
    unit_mut(world, &name).vendor_available = Some(true);
}

#[given("module \"{name}\" has the cfi sanitizer enabled")]
fn given_cfi(world: &mut PlanningWorld, name: String) {
    unit_mut(world, &name).sanitize = SanitizerState::with([Sanitizer::Cfi]);
}

#[given("module \"{name}\" is installed to recovery only")]
fn given_recovery_only(world: &mut PlanningWorld, name: String) {
    let unit = unit_mut(world, &name);
    unit.in_vendor = false;
    unit.in_recovery = true;
}

#[given("module \"{name}\" is installed to ramdisk only")]
fn given_ramdisk_only(world: &mut PlanningWorld, name: String) {
    let unit = unit_mut(world, &name);
    unit.in_vendor = false;
    unit.in_ramdisk = true;
}

#[given("the ramdisk excludes \"{excluded}\" but includes \"{included}\"")]
fn given_ramdisk_dirs(world: &mut PlanningWorld, excluded: String, included: String) {
    world.config.ramdisk.excluded_dirs = vec![excluded];
    world.config.ramdisk.included_dirs = vec![included];
}

#[given("the VNDK version is \"{version}\"")]
fn given_vndk_version(world: &mut PlanningWorld, version: String) {
    world.config.vndk_version = version;
}

#[given("the vendor snapshot is directed to \"{name}\"")]
fn given_directed(world: &mut PlanningWorld, name: String) {
    world.config.directed.vendor = Some(BTreeSet::from([name]));
}

#[when("the {family} snapshot is planned")]
fn when_planned(world: &mut PlanningWorld, family: String) {
    let policy = parse_family(&family).policy(&world.config);
    match generate(&world.units, policy.as_ref(), &world.config, false) {
        Ok(plan) => {
            world.generated = plan.is_some();
            world.plan = plan;
        }
        Err(err) => world.error = Some(err),
    }
}

#[then("module \"{name}\" is captured")]
fn then_captured(world: &mut PlanningWorld, name: String) {
    assert_eq!(verdict_of(world, &name), Verdict::Eligible);
}

#[then("module \"{name}\" is rejected as \"{reason}\"")]
fn then_rejected(world: &mut PlanningWorld, name: String, reason: String) {
    match verdict_of(world, &name) {
        Verdict::Rejected(guard) => assert_eq!(guard.describe(), reason),
        Verdict::Eligible => panic!("{name} was captured"),
    }
}

#[then("the plan contains \"{path}\"")]
fn then_plan_contains(world: &mut PlanningWorld, path: String) {
    assert!(
        plan(world).outputs().iter().any(|output| *output == path),
        "missing {path}"
    );
}

#[then("the plan has {count} outputs")]
fn then_output_count(world: &mut PlanningWorld, count: usize) {
    assert_eq!(plan(world).outputs().len(), count);
}

#[then("the plan has {count} config files")]
fn then_config_count(world: &mut PlanningWorld, count: usize) {
    let configs = plan(world)
        .outputs()
        .iter()
        .filter(|output| output.as_str().contains("/configs/"))
        .count();
    assert_eq!(configs, count);
}

#[then("planning fails naming module \"{name}\"")]
fn then_planning_fails(world: &mut PlanningWorld, name: String) {
    let error = world.error.as_ref().expect("planning failed");
    assert!(matches!(error, SnapshotError::ConflictingAvailability { .. }));
    assert!(error.to_string().contains(&name));
    assert!(world.plan.is_none());
}

#[then("no snapshot is generated")]
fn then_not_generated(world: &mut PlanningWorld) {
    assert!(world.error.is_none());
    assert!(!world.generated);
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/planning.feature",
    name = "Capture a platform static library"
)]
fn scenario_capture_static_library(world: PlanningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/planning.feature",
    name = "Skip a module in a proprietary directory"
)]
fn scenario_skip_proprietary(world: PlanningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/planning.feature",
    name = "Capture a module in a platform carve-out"
)]
fn scenario_capture_carve_out(world: PlanningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/planning.feature",
    name = "Copy a shared init script once"
)]
fn scenario_shared_init_script(world: PlanningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/planning.feature",
    name = "Abort on conflicting snapshot flags"
)]
fn scenario_conflicting_flags(world: PlanningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/planning.feature",
    name = "Rename a cfi static library"
)]
fn scenario_cfi_rename(world: PlanningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/planning.feature",
    name = "Capture only recovery modules in the recovery pass"
)]
fn scenario_recovery_pass(world: PlanningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/planning.feature",
    name = "Honour configured ramdisk carve-outs"
)]
fn scenario_ramdisk_carve_outs(world: PlanningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/planning.feature",
    name = "Skip the pass for a frozen version"
)]
fn scenario_frozen_version(world: PlanningWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/planning.feature",
    name = "Capture only directed modules"
)]
fn scenario_directed(world: PlanningWorld) {
    let _ = world;
}
