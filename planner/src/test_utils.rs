//! Shared test utilities for the planner crate.

use crate::image::{ImageFamily, ImagePolicy};
use crate::unit::{Binary, CompiledUnit, Library, Target, UnitKind};
use platform_snapshot::SnapshotConfig;

/// Policy for `family` under the default configuration.
pub fn policy(family: ImageFamily) -> Box<dyn ImagePolicy> {
    family.policy(&SnapshotConfig::default())
}

fn vendor_unit(name: &str, kind: UnitKind, output: Option<String>) -> CompiledUnit {
    let mut unit = CompiledUnit::new(
        name,
        kind,
        format!("system/{name}"),
        Target::device("arm64"),
    );
    unit.in_vendor = true;
    unit.output_file = output.map(Into::into);
    unit
}

/// A vendor static library built at `out/<name>.a`.
pub fn static_lib(name: &str) -> CompiledUnit {
    vendor_unit(
        name,
        UnitKind::StaticLibrary(Library::default()),
        Some(format!("out/{name}.a")),
    )
}

/// A vendor shared library built at `out/<name>.so`.
pub fn shared_lib(name: &str) -> CompiledUnit {
    vendor_unit(
        name,
        UnitKind::SharedLibrary(Library::default()),
        Some(format!("out/{name}.so")),
    )
}

/// A vendor header-only library.
pub fn header_lib(name: &str) -> CompiledUnit {
    vendor_unit(name, UnitKind::HeaderLibrary(Library::default()), None)
}

/// A vendor binary built at `out/<name>`.
pub fn binary(name: &str) -> CompiledUnit {
    vendor_unit(
        name,
        UnitKind::Binary(Binary::default()),
        Some(format!("out/{name}")),
    )
}

/// A vendor object built at `out/<name>.o`.
pub fn object(name: &str) -> CompiledUnit {
    vendor_unit(name, UnitKind::Object, Some(format!("out/{name}.o")))
}
