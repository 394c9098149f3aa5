//! Compiled units as seen by the snapshot planner.
//!
//! A [`CompiledUnit`] is the planner's view of one module variant that the
//! build graph has already compiled. The planner never looks at how a unit
//! was built; it only needs the shape of the output ([`UnitKind`]), where the
//! module lives, and the flags that decide whether its output is frozen.
//!
//! Units deserialize from the module inventory format:
//!
//! ```json
//! {
//!   "name": "libfoo",
//!   "dir": "system/libfoo",
//!   "kind": { "type": "static_library", "exported_flags": ["-DFOO"] },
//!   "target": { "arch": "arm64", "arch_variant": "armv8-a" },
//!   "output_file": "out/libfoo.a",
//!   "in_vendor": true
//! }
//! ```

use crate::module_name::ModuleName;
use camino::Utf8PathBuf;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

/// Operating-system class a unit was compiled for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsClass {
    /// The on-device operating system.
    #[default]
    Device,
    /// The build host.
    Host,
}

/// Compilation target of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    /// Architecture type, e.g. `arm64` or `x86_64`.
    pub arch: String,
    /// Optional architecture variant, e.g. `armv8-a`.
    #[serde(default)]
    pub arch_variant: Option<String>,
    /// Operating-system class.
    #[serde(default)]
    pub os_class: OsClass,
    /// Whether this is a native-bridge (binary translation) variant.
    #[serde(default)]
    pub native_bridge: bool,
}

impl Target {
    /// Create a device target for `arch` with no variant.
    #[must_use]
    pub fn device(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            arch_variant: None,
            os_class: OsClass::Device,
            native_bridge: false,
        }
    }

    /// Attach an architecture variant.
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.arch_variant = Some(variant.into());
        self
    }
}

/// Sanitizers a unit variant may be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sanitizer {
    /// Control-flow integrity.
    Cfi,
    /// Shadow call stack.
    Scs,
    /// Hardware-assisted address sanitizer.
    Hwasan,
    /// Undefined-behaviour sanitizer.
    Ubsan,
    /// Address sanitizer.
    Asan,
    /// Minimal UBSan runtime.
    MinimalRuntime,
}

impl Sanitizer {
    /// Return the build-system spelling of the sanitizer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cfi => "cfi",
            Self::Scs => "scs",
            Self::Hwasan => "hwasan",
            Self::Ubsan => "ubsan",
            Self::Asan => "asan",
            Self::MinimalRuntime => "minimal_runtime",
        }
    }
}

impl fmt::Display for Sanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sanitizer configuration of one unit variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizerState {
    /// Sanitizers enabled for this variant.
    pub enabled: BTreeSet<Sanitizer>,
    /// Dependents must link the minimal UBSan runtime.
    pub minimal_runtime_dep: bool,
    /// Dependents must link the full UBSan runtime.
    pub ubsan_runtime_dep: bool,
}

impl SanitizerState {
    /// Build a state with the given sanitizers enabled.
    #[must_use]
    pub fn with(sanitizers: impl IntoIterator<Item = Sanitizer>) -> Self {
        Self {
            enabled: sanitizers.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Whether `sanitizer` is enabled.
    #[must_use]
    pub fn is_enabled(&self, sanitizer: Sanitizer) -> bool {
        self.enabled.contains(&sanitizer)
    }

    /// Whether dependents need the minimal runtime.
    #[must_use]
    pub fn needs_minimal_runtime(&self) -> bool {
        self.minimal_runtime_dep || self.is_enabled(Sanitizer::MinimalRuntime)
    }

    /// Whether dependents need the UBSan runtime.
    #[must_use]
    pub fn needs_ubsan_runtime(&self) -> bool {
        self.ubsan_runtime_dep || self.is_enabled(Sanitizer::Ubsan)
    }
}

/// VNDK membership of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Vndk {
    /// The unit is a VNDK library.
    pub member: bool,
    /// The unit is a vendor extension of a VNDK library.
    pub extension: bool,
    /// The unit belongs to the VNDK-SP (same-process) set.
    pub speed_profile: bool,
}

/// Source/prebuilt provenance of a unit.
///
/// When a module exists both as source and as a prebuilt, the build graph
/// picks one and marks the other as superseded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Built from source with no prebuilt twin.
    #[default]
    Source,
    /// Built from source, but a preferred prebuilt twin replaces it.
    SupersededSource,
    /// A prebuilt; `preferred` says whether it wins over the source twin.
    Prebuilt {
        /// Whether the prebuilt is the selected twin.
        preferred: bool,
    },
}

impl Provenance {
    /// Whether the other twin was selected in place of this unit.
    #[must_use]
    pub const fn is_superseded(self) -> bool {
        matches!(self, Self::SupersededSource | Self::Prebuilt { preferred: false })
    }
}

/// Snapshot data carried by every library kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Library {
    /// Exported include directories, source-tree relative.
    pub exported_dirs: Vec<Utf8PathBuf>,
    /// Exported system include directories, source-tree relative.
    pub exported_system_dirs: Vec<Utf8PathBuf>,
    /// Exported compile and link flags.
    pub exported_flags: Vec<String>,
    /// Header files to freeze under `include/`, source-tree relative.
    pub headers: Vec<Utf8PathBuf>,
}

/// Snapshot data carried by binaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Binary {
    /// Symlink names installed alongside the binary.
    pub symlinks: Vec<String>,
}

/// Library linkage of a library unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    /// Archive (`.a`).
    Static,
    /// Shared object (`.so`).
    Shared,
    /// Headers only; no compiled output.
    Header,
}

impl LibraryKind {
    /// Snapshot subdirectory for this linkage.
    #[must_use]
    pub const fn subdir(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Shared => "shared",
            Self::Header => "header",
        }
    }
}

/// Shape of a compiled unit.
///
/// Only libraries, binaries, and objects can be captured. The remaining
/// variants exist so that the classifier can name what it rejects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnitKind {
    /// A static library.
    StaticLibrary(Library),
    /// A shared library.
    SharedLibrary(Library),
    /// A header-only library.
    HeaderLibrary(Library),
    /// An executable.
    Binary(Binary),
    /// A relocatable object file.
    Object,
    /// Kernel header provider.
    KernelHeaders,
    /// LL-NDK stub library.
    LlndkStub,
    /// LL-NDK header library.
    LlndkHeaders,
    /// Any other module type.
    Other {
        /// Build-system module type name.
        module_type: String,
    },
}

impl UnitKind {
    /// Return the library linkage and data if this is a library.
    #[must_use]
    pub const fn library(&self) -> Option<(LibraryKind, &Library)> {
        match self {
            Self::StaticLibrary(lib) => Some((LibraryKind::Static, lib)),
            Self::SharedLibrary(lib) => Some((LibraryKind::Shared, lib)),
            Self::HeaderLibrary(lib) => Some((LibraryKind::Header, lib)),
            _ => None,
        }
    }

    /// Human-readable shape name used in diagnostics.
    #[must_use]
    pub fn shape_name(&self) -> &str {
        match self {
            Self::StaticLibrary(_) => "static library",
            Self::SharedLibrary(_) => "shared library",
            Self::HeaderLibrary(_) => "header library",
            Self::Binary(_) => "binary",
            Self::Object => "object",
            Self::KernelHeaders => "kernel headers",
            Self::LlndkStub => "llndk stub library",
            Self::LlndkHeaders => "llndk headers",
            Self::Other { module_type } => module_type,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// One compiled module variant handed over by the build graph.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompiledUnit {
    /// Module name.
    pub name: ModuleName,
    /// Output shape.
    pub kind: UnitKind,
    /// Owning source directory, source-tree relative.
    pub dir: Utf8PathBuf,
    /// Compilation target.
    pub target: Target,
    /// Primary output; `None` when the unit has not been built.
    #[serde(default)]
    pub output_file: Option<Utf8PathBuf>,
    /// Sanitizer variant.
    #[serde(default)]
    pub sanitize: SanitizerState,
    /// VNDK membership.
    #[serde(default)]
    pub vndk: Vndk,
    /// Source/prebuilt provenance.
    #[serde(default)]
    pub provenance: Provenance,
    /// Whether the module is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the module is hidden from the legacy make layer.
    #[serde(default)]
    pub hide_from_make: bool,
    /// Explicit skip-install marker.
    #[serde(default)]
    pub skip_install: bool,
    /// Whether the variant installs for the platform rather than an APEX.
    #[serde(default = "default_true")]
    pub for_platform: bool,
    /// Whether the unit is itself a snapshot prebuilt.
    #[serde(default)]
    pub snapshot_prebuilt: bool,
    /// Installs into the vendor image.
    #[serde(default)]
    pub in_vendor: bool,
    /// Installs into the recovery image.
    #[serde(default)]
    pub in_recovery: bool,
    /// Installs into the ramdisk image.
    #[serde(default)]
    pub in_ramdisk: bool,
    /// `vendor_available` property.
    #[serde(default)]
    pub vendor_available: Option<bool>,
    /// `recovery_available` property.
    #[serde(default)]
    pub recovery_available: Option<bool>,
    /// `ramdisk_available` property.
    #[serde(default)]
    pub ramdisk_available: Option<bool>,
    /// `exclude_from_vendor_snapshot` property.
    #[serde(default)]
    pub exclude_from_vendor_snapshot: bool,
    /// `exclude_from_recovery_snapshot` property.
    #[serde(default)]
    pub exclude_from_recovery_snapshot: bool,
    /// `exclude_from_ramdisk_snapshot` property.
    #[serde(default)]
    pub exclude_from_ramdisk_snapshot: bool,
    /// Install subdirectory relative to the partition's library directory.
    #[serde(default)]
    pub relative_install_path: String,
    /// Shared library dependencies, by snapshot name.
    #[serde(default)]
    pub shared_libs: Vec<String>,
    /// Runtime-only library dependencies.
    #[serde(default)]
    pub runtime_libs: Vec<String>,
    /// Generically required modules.
    #[serde(default)]
    pub required: Vec<String>,
    /// Init scripts shipped with the module.
    #[serde(default)]
    pub init_rc: Vec<Utf8PathBuf>,
    /// VINTF manifest fragments shipped with the module.
    #[serde(default)]
    pub vintf_fragments: Vec<Utf8PathBuf>,
    /// License notice file.
    #[serde(default)]
    pub notice_file: Option<Utf8PathBuf>,
}

impl CompiledUnit {
    /// Create an enabled, platform-installed unit with no other flags set.
    #[must_use]
    pub fn new(
        name: impl Into<ModuleName>,
        kind: UnitKind,
        dir: impl Into<Utf8PathBuf>,
        target: Target,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            dir: dir.into(),
            target,
            output_file: None,
            sanitize: SanitizerState::default(),
            vndk: Vndk::default(),
            provenance: Provenance::default(),
            enabled: true,
            hide_from_make: false,
            skip_install: false,
            for_platform: true,
            snapshot_prebuilt: false,
            in_vendor: false,
            in_recovery: false,
            in_ramdisk: false,
            vendor_available: None,
            recovery_available: None,
            ramdisk_available: None,
            exclude_from_vendor_snapshot: false,
            exclude_from_recovery_snapshot: false,
            exclude_from_ramdisk_snapshot: false,
            relative_install_path: String::new(),
            shared_libs: Vec::new(),
            runtime_libs: Vec::new(),
            required: Vec::new(),
            init_rc: Vec::new(),
            vintf_fragments: Vec::new(),
            notice_file: None,
        }
    }

    /// Whether the unit has a usable primary output.
    #[must_use]
    pub const fn output_valid(&self) -> bool {
        self.output_file.is_some()
    }

    /// Whether install rules are suppressed for this unit.
    #[must_use]
    pub const fn is_skip_install(&self) -> bool {
        self.skip_install || self.provenance.is_superseded()
    }

    /// Identity string used in diagnostics: `name (arch[-variant])`.
    #[must_use]
    pub fn identity(&self) -> String {
        match &self.target.arch_variant {
            Some(variant) => format!("{} ({}-{variant})", self.name, self.target.arch),
            None => format!("{} ({})", self.name, self.target.arch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn deserializes_minimal_inventory_entry() {
        let json = r#"{
            "name": "libfoo",
            "dir": "system/libfoo",
            "kind": { "type": "static_library", "exported_flags": ["-DFOO"] },
            "target": { "arch": "arm64" },
            "output_file": "out/libfoo.a"
        }"#;

        let unit: CompiledUnit = serde_json::from_str(json).expect("valid unit");

        assert_eq!(unit.name.as_str(), "libfoo");
        assert!(unit.enabled);
        assert!(unit.for_platform);
        assert_eq!(unit.target.os_class, OsClass::Device);
        let (kind, lib) = unit.kind.library().expect("library");
        assert_eq!(kind, LibraryKind::Static);
        assert_eq!(lib.exported_flags, vec!["-DFOO"]);
    }

    #[rstest]
    fn deserializes_prebuilt_provenance_and_sanitizers() {
        let json = r#"{
            "name": "libbar",
            "dir": "prebuilts/libbar",
            "kind": { "type": "shared_library" },
            "target": { "arch": "arm", "arch_variant": "armv7-a-neon" },
            "provenance": { "prebuilt": { "preferred": false } },
            "sanitize": { "enabled": ["cfi", "minimal_runtime"] }
        }"#;

        let unit: CompiledUnit = serde_json::from_str(json).expect("valid unit");

        assert!(unit.is_skip_install());
        assert!(unit.sanitize.is_enabled(Sanitizer::Cfi));
        assert!(unit.sanitize.needs_minimal_runtime());
        assert!(!unit.sanitize.needs_ubsan_runtime());
        assert_eq!(unit.identity(), "libbar (arm-armv7-a-neon)");
    }

    #[rstest]
    fn unknown_fields_are_rejected() {
        let json = r#"{
            "name": "x", "dir": "d", "kind": { "type": "object" },
            "target": { "arch": "x86" }, "vendor_availble": true
        }"#;

        assert!(serde_json::from_str::<CompiledUnit>(json).is_err());
    }

    #[rstest]
    #[case::source(Provenance::Source, false)]
    #[case::superseded(Provenance::SupersededSource, true)]
    #[case::preferred_prebuilt(Provenance::Prebuilt { preferred: true }, false)]
    #[case::unpreferred_prebuilt(Provenance::Prebuilt { preferred: false }, true)]
    fn provenance_supersession(#[case] provenance: Provenance, #[case] superseded: bool) {
        assert_eq!(provenance.is_superseded(), superseded);
    }

    #[rstest]
    fn other_shape_reports_module_type() {
        let kind = UnitKind::Other {
            module_type: "prebuilt_etc".to_owned(),
        };
        assert_eq!(kind.shape_name(), "prebuilt_etc");
        assert!(kind.library().is_none());
    }
}
