//! Unit tests for the generation pass.

use super::*;
use crate::eligibility::Guard;
use crate::error::SnapshotError;
use crate::inventory::MockModuleSource;
use crate::test_utils::{binary, header_lib, policy, shared_lib, static_lib};
use crate::unit::{Library, UnitKind};
use rstest::rstest;

fn plan(units: &[CompiledUnit], family: ImageFamily, fake: bool) -> SnapshotPlan {
    let config = SnapshotConfig::default();
    generate(units, policy(family).as_ref(), &config, fake)
        .expect("pass succeeds")
        .expect("snapshot generated")
}

fn count_under(plan: &SnapshotPlan, segment: &str) -> usize {
    plan.outputs()
        .iter()
        .filter(|path| path.as_str().contains(segment))
        .count()
}

#[rstest]
fn proprietary_module_is_skipped() {
    let mut acme = static_lib("libacme");
    acme.dir = "vendor/acme".into();

    let plan = plan(&[acme, static_lib("libfoo")], ImageFamily::Vendor, false);

    assert_eq!(
        plan.reports[0].verdict,
        Verdict::Rejected(Guard::ProprietaryPath)
    );
    assert_eq!(plan.captured(), 1);
    assert!(plan.outputs().iter().all(|p| !p.as_str().contains("libacme")));
}

#[rstest]
fn shared_init_script_is_copied_once() {
    let mut first = binary("first");
    first.init_rc = vec!["system/common/common.rc".into()];
    let before = count_under(&plan(&[first.clone()], ImageFamily::Vendor, false), "/configs/");

    let mut second = binary("second");
    second.init_rc = vec![
        "system/common/common.rc".into(),
        "system/second/second.rc".into(),
    ];
    let after = count_under(&plan(&[first, second], ImageFamily::Vendor, false), "/configs/");

    assert_eq!(after, before + 1);
}

#[rstest]
fn conflict_aborts_before_any_output() {
    let mut bad = static_lib("libbad");
    bad.exclude_from_vendor_snapshot = true;
    bad.vendor_available = Some(true);
    let config = SnapshotConfig::default();

    let outcome = generate(
        &[static_lib("libfoo"), bad],
        policy(ImageFamily::Vendor).as_ref(),
        &config,
        false,
    );

    assert!(matches!(
        outcome,
        Err(SnapshotError::ConflictingAvailability { .. })
    ));
}

#[rstest]
fn outputs_are_sorted_and_unique() {
    let mut foo = static_lib("libfoo");
    foo.notice_file = Some("system/libfoo/NOTICE".into());
    let mut bar = shared_lib("libbar");
    bar.notice_file = Some("system/libbar/NOTICE".into());

    let plan = plan(&[foo, bar], ImageFamily::Vendor, false);

    let outputs: Vec<&str> = plan.outputs().iter().map(|p| p.as_str()).collect();
    let mut sorted = outputs.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(outputs, sorted);
    assert_eq!(count_under(&plan, "NOTICE_FILES"), 2);
}

#[rstest]
fn headers_from_all_libraries_are_deduplicated() {
    let shared = Library {
        headers: vec!["system/core/include/shared.h".into()],
        ..Library::default()
    };
    let mut foo = header_lib("libfoo_headers");
    foo.kind = UnitKind::HeaderLibrary(shared.clone());
    let mut bar = static_lib("libbar");
    bar.kind = UnitKind::StaticLibrary(Library {
        headers: vec![
            "system/core/include/shared.h".into(),
            "system/bar/bar.h".into(),
        ],
        ..Library::default()
    });

    let plan = plan(&[foo, bar], ImageFamily::Vendor, false);

    assert_eq!(count_under(&plan, "/include/"), 2);
    assert!(
        plan.outputs()
            .iter()
            .any(|p| p == "vendor-snapshot/arm64/include/system/core/include/shared.h")
    );
}

#[rstest]
fn ineligible_units_contribute_nothing() {
    let mut hidden = static_lib("libhidden");
    hidden.hide_from_make = true;
    hidden.notice_file = Some("NOTICE".into());

    let plan = plan(&[hidden], ImageFamily::Vendor, false);

    assert!(plan.actions.is_empty());
    assert!(plan.snapshot_map.is_empty());
}

#[rstest]
fn identical_inputs_yield_identical_plans() {
    let units = vec![static_lib("libfoo"), shared_lib("libbar"), binary("toybox")];

    let first = plan(&units, ImageFamily::Vendor, false);
    let second = plan(&units, ImageFamily::Vendor, false);

    assert_eq!(first.actions, second.actions);
    assert_eq!(first.archive, second.archive);
}

#[rstest]
fn fake_pass_nests_under_fake_and_uses_fake_variable() {
    let plan = plan(&[static_lib("libfoo")], ImageFamily::Vendor, true);

    assert!(plan.outputs().iter().all(|p| p.starts_with("fake/vendor-snapshot")));
    assert!(
        plan.actions
            .iter()
            .all(|a| matches!(a, BuildAction::Write { .. }))
    );
    let vars = plan.make_vars(Utf8Path::new("out"));
    assert_eq!(
        vars.get("SOONG_VENDOR_FAKE_SNAPSHOT_ZIP"),
        Some("out/fake/vendor-snapshot/vendor-generic.zip")
    );
}

#[rstest]
fn snapshot_map_records_captured_variants() {
    let plan = plan(&[static_lib("libfoo")], ImageFamily::Vendor, false);

    let recorded: Vec<(&str, &str, &str)> = plan
        .snapshot_map
        .iter()
        .map(|((module, arch), id)| (module.as_str(), arch.as_str(), id.as_str()))
        .collect();
    assert_eq!(
        recorded,
        vec![("libfoo", "arm64", "libfoo.vendor.current.arm64")]
    );
}

#[rstest]
fn pass_is_skipped_when_version_is_frozen() {
    let config = SnapshotConfig {
        vndk_version: "34".to_owned(),
        ..SnapshotConfig::default()
    };
    let vendor = ImageFamily::Vendor.policy(&config);

    let outcome = generate(&[static_lib("libfoo")], vendor.as_ref(), &config, false)
        .expect("skipping is not an error");

    assert!(outcome.is_none());
}

#[rstest]
fn recovery_pass_only_captures_recovery_units() {
    let mut init = binary("init");
    init.in_vendor = false;
    init.in_recovery = true;

    let plan = plan(&[init, binary("vendor_only")], ImageFamily::Recovery, false);

    assert_eq!(plan.captured(), 1);
    assert_eq!(
        plan.outputs()[0],
        "recovery-snapshot/arm64/arch-arm64/binary/init"
    );
}

#[rstest]
fn enumerates_the_source_once() {
    let mut source = MockModuleSource::new();
    source
        .expect_modules()
        .times(1)
        .returning(|| Ok(vec![static_lib("libfoo"), binary("toybox")]));
    let config = SnapshotConfig::default();

    let plan = generate_from(&source, policy(ImageFamily::Vendor).as_ref(), &config, false)
        .expect("pass succeeds")
        .expect("snapshot generated");

    assert_eq!(plan.captured(), 2);
}

#[rstest]
fn skipped_pass_does_not_enumerate() {
    let mut source = MockModuleSource::new();
    source.expect_modules().times(0);
    let config = SnapshotConfig {
        recovery_snapshot_version: "33".to_owned(),
        ..SnapshotConfig::default()
    };
    let recovery = ImageFamily::Recovery.policy(&config);

    let outcome = generate_from(&source, recovery.as_ref(), &config, false).expect("skips");

    assert!(outcome.is_none());
}

#[rstest]
fn enumeration_failures_propagate() {
    let mut source = MockModuleSource::new();
    source.expect_modules().returning(|| {
        Err(SnapshotError::Inventory {
            path: "inventory.json".into(),
            reason: "truncated".to_owned(),
        })
    });
    let config = SnapshotConfig::default();

    let outcome = generate_from(&source, policy(ImageFamily::Vendor).as_ref(), &config, false);

    assert!(matches!(outcome, Err(SnapshotError::Inventory { .. })));
}

#[rstest]
#[case::absolute("/tmp/src/system/libfoo/include/foo.h")]
#[case::climbing("../../escaped.h")]
fn escaping_header_aborts_the_pass(#[case] header: &str) {
    let mut unit = header_lib("libfoo_headers");
    unit.kind = UnitKind::HeaderLibrary(Library {
        headers: vec![header.into()],
        ..Library::default()
    });
    let config = SnapshotConfig::default();

    let outcome = generate(&[unit], policy(ImageFamily::Vendor).as_ref(), &config, true);

    match outcome {
        Err(SnapshotError::UnsafeIncludePath { module, path }) => {
            assert_eq!(module.as_str(), "libfoo_headers");
            assert_eq!(path, header);
        }
        other => panic!("expected an unsafe include path error, got {other:?}"),
    }
}
