//! Snapshot tree building.
//!
//! The tree builder turns one eligible unit into the actions that freeze it:
//! a copy of its artifact (except for header-only libraries), a copy of each
//! init script and VINTF fragment, and a JSON metadata sidecar. Notices and
//! headers are shared across units and installed through separate entry
//! points once every unit has been seen.

use crate::action::BuildAction;
use crate::dedup::Deduplicator;
use crate::error::{Result, SnapshotError};
use crate::image::ImagePolicy;
use crate::layout::{self, BINARY_SUBDIR, OBJECT_SUBDIR, SnapshotLayout};
use crate::manifest::ArtifactMetadataRecord;
use crate::unit::{Binary, CompiledUnit, Library, LibraryKind, Sanitizer, UnitKind};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use log::trace;

/// Directory under which exported include dirs are recorded.
const INCLUDE_PREFIX: &str = "include";

/// File name endings frozen from a library's header list.
const HEADER_EXTS: &[&str] = &[
    ".h", ".hh", ".hpp", ".hxx", ".h++", ".inl", ".inc", ".ipp", ".h.generic",
];

/// Directory under which init scripts and VINTF fragments are recorded.
const CONFIGS_PREFIX: &str = "configs";

/// Plans the snapshot layout for eligible units of one image.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    policy: &'a dyn ImagePolicy,
    layout: &'a SnapshotLayout,
    fake: bool,
}

impl<'a> TreeBuilder<'a> {
    /// Create a builder writing into `layout` under `policy`.
    #[must_use]
    pub fn new(policy: &'a dyn ImagePolicy, layout: &'a SnapshotLayout, fake: bool) -> Self {
        Self {
            policy,
            layout,
            fake,
        }
    }

    /// Plan the actions that capture `unit`.
    ///
    /// Config files go through `dedup`, so a script shared by several units
    /// is copied once.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnknownUnitShape`] for units that are not
    /// libraries, binaries, or objects, [`SnapshotError::UnsafeIncludePath`]
    /// for a library exporting an absolute or `..` path,
    /// [`SnapshotError::MissingOutput`] when
    /// an artifact-bearing unit has no output file, and
    /// [`SnapshotError::ManifestSerialization`] if the sidecar cannot be
    /// encoded.
    pub fn install(
        &self,
        unit: &CompiledUnit,
        dedup: &mut Deduplicator,
    ) -> Result<Vec<BuildAction>> {
        let mut actions = Vec::new();
        let mut record = self.base_record(unit);

        let manifest_out = match &unit.kind {
            UnitKind::StaticLibrary(lib) => {
                self.install_library(unit, LibraryKind::Static, lib, &mut record, &mut actions)?
            }
            UnitKind::SharedLibrary(lib) => {
                self.install_library(unit, LibraryKind::Shared, lib, &mut record, &mut actions)?
            }
            UnitKind::HeaderLibrary(lib) => {
                self.install_library(unit, LibraryKind::Header, lib, &mut record, &mut actions)?
            }
            UnitKind::Binary(bin) => self.install_binary(unit, bin, &mut record, &mut actions)?,
            UnitKind::Object => self.install_object(unit, &mut actions)?,
            UnitKind::KernelHeaders
            | UnitKind::LlndkStub
            | UnitKind::LlndkHeaders
            | UnitKind::Other { .. } => {
                return Err(SnapshotError::UnknownUnitShape {
                    module: unit.name.clone(),
                    shape: unit.kind.shape_name().to_owned(),
                    family: self.policy.name(),
                });
            }
        };

        let configs_dir = self.layout.configs_dir();
        for path in unit.init_rc.iter().chain(&unit.vintf_fragments) {
            let Some(name) = path.file_name() else {
                continue;
            };
            let dest = configs_dir.join(name);
            let action = BuildAction::copy_or_touch(path.clone(), dest.clone(), self.fake);
            actions.extend(dedup.install_once(&dest, action));
        }

        let json = record.to_json(&manifest_out)?;
        actions.push(BuildAction::write(manifest_out, json));

        for action in &actions {
            trace!("{}: {action}", unit.name);
        }
        Ok(actions)
    }

    /// Plan the notice copy for `unit`, if it has one not yet installed.
    #[must_use]
    pub fn install_notice(
        &self,
        unit: &CompiledUnit,
        dedup: &mut Deduplicator,
    ) -> Option<BuildAction> {
        let notice = unit.notice_file.as_ref()?;
        let dest = self.layout.notice_dir().join(format!("{}.txt", unit.name));
        let action = BuildAction::copy_or_touch(notice.clone(), dest.clone(), self.fake);
        dedup.install_once(&dest, action)
    }

    /// Plan header copies into `include/`, keeping the first of duplicates.
    ///
    /// Only source-relative files with a header extension are copied.
    #[must_use]
    pub fn install_headers(&self, headers: &[Utf8PathBuf]) -> Vec<BuildAction> {
        let include_dir = self.layout.include_dir();
        let mut seen = Deduplicator::new();
        headers
            .iter()
            .filter(|header| is_source_relative(header) && is_header_file(header))
            .filter_map(|header| seen.install_once(header, header))
            .map(|header| {
                BuildAction::copy_or_touch(header.clone(), include_dir.join(header), self.fake)
            })
            .collect()
    }

    fn base_record(&self, unit: &CompiledUnit) -> ArtifactMetadataRecord {
        let relative_install_path = if self.policy.supports_vndk_ext() && unit.vndk.extension {
            if unit.vndk.speed_profile {
                "vndk-sp".to_owned()
            } else {
                "vndk".to_owned()
            }
        } else {
            unit.relative_install_path.clone()
        };

        ArtifactMetadataRecord {
            relative_install_path,
            runtime_libs: unit.runtime_libs.clone(),
            required: unit.required.clone(),
            init_rc: config_refs(&unit.init_rc),
            vintf_fragments: config_refs(&unit.vintf_fragments),
            ..ArtifactMetadataRecord::new(unit.name.as_str())
        }
    }

    fn install_library(
        &self,
        unit: &CompiledUnit,
        kind: LibraryKind,
        lib: &Library,
        record: &mut ArtifactMetadataRecord,
        actions: &mut Vec<BuildAction>,
    ) -> Result<Utf8PathBuf> {
        check_include_paths(unit, lib)?;
        record.exported_flags.clone_from(&lib.exported_flags);
        record.exported_dirs = include_refs(&lib.exported_dirs);
        record.exported_system_dirs = include_refs(&lib.exported_system_dirs);

        // Shared-lib deps mean nothing to archives or headers.
        if kind == LibraryKind::Shared {
            record.shared_libs.clone_from(&unit.shared_libs);
        }
        if kind == LibraryKind::Static {
            record.sanitize_minimal_dep = unit.sanitize.needs_minimal_runtime();
            record.sanitize_ubsan_dep = unit.sanitize.needs_ubsan_runtime();
        }

        let dir = self.layout.unit_dir(&unit.target, kind.subdir());
        if kind == LibraryKind::Header {
            return Ok(dir.join(format!("{}.json", unit.name)));
        }

        let (output, file_name) = output_of(unit)?;
        let stem = if kind == LibraryKind::Static && unit.sanitize.is_enabled(Sanitizer::Cfi) {
            record.sanitize = Sanitizer::Cfi.as_str().to_owned();
            record.module_name = unit.name.cfi_variant().into_inner();
            layout::cfi_stem(file_name)
        } else {
            file_name.to_owned()
        };

        let dest = dir.join(stem);
        actions.push(BuildAction::copy_or_touch(output, dest.clone(), self.fake));
        Ok(layout::manifest_path(&dest))
    }

    fn install_binary(
        &self,
        unit: &CompiledUnit,
        bin: &Binary,
        record: &mut ArtifactMetadataRecord,
        actions: &mut Vec<BuildAction>,
    ) -> Result<Utf8PathBuf> {
        record.symlinks.clone_from(&bin.symlinks);
        record.shared_libs.clone_from(&unit.shared_libs);

        let (output, file_name) = output_of(unit)?;
        let dest = self
            .layout
            .unit_dir(&unit.target, BINARY_SUBDIR)
            .join(file_name);
        actions.push(BuildAction::copy_or_touch(output, dest.clone(), self.fake));
        Ok(layout::manifest_path(&dest))
    }

    fn install_object(
        &self,
        unit: &CompiledUnit,
        actions: &mut Vec<BuildAction>,
    ) -> Result<Utf8PathBuf> {
        // Objects are never installed on device, so their file names may
        // collide; the module name is the stem.
        let (output, _) = output_of(unit)?;
        let file_name = match output.extension() {
            Some(ext) => format!("{}.{ext}", unit.name),
            None => unit.name.to_string(),
        };
        let dest = self
            .layout
            .unit_dir(&unit.target, OBJECT_SUBDIR)
            .join(file_name);
        actions.push(BuildAction::copy_or_touch(output, dest.clone(), self.fake));
        Ok(layout::manifest_path(&dest))
    }
}

fn output_of(unit: &CompiledUnit) -> Result<(&Utf8Path, &str)> {
    unit.output_file
        .as_deref()
        .and_then(|path| path.file_name().map(|name| (path, name)))
        .ok_or_else(|| SnapshotError::MissingOutput {
            module: unit.name.clone(),
        })
}

fn check_include_paths(unit: &CompiledUnit, lib: &Library) -> Result<()> {
    match lib
        .headers
        .iter()
        .chain(&lib.exported_dirs)
        .chain(&lib.exported_system_dirs)
        .find(|path| !is_source_relative(path))
    {
        Some(path) => Err(SnapshotError::UnsafeIncludePath {
            module: unit.name.clone(),
            path: path.clone(),
        }),
        None => Ok(()),
    }
}

fn is_source_relative(path: &Utf8Path) -> bool {
    path.components()
        .all(|component| matches!(component, Utf8Component::Normal(_) | Utf8Component::CurDir))
}

fn is_header_file(path: &Utf8Path) -> bool {
    path.file_name()
        .is_some_and(|name| HEADER_EXTS.iter().any(|ext| name.ends_with(ext)))
}

fn include_refs(dirs: &[Utf8PathBuf]) -> Vec<String> {
    dirs.iter()
        .map(|dir| Utf8Path::new(INCLUDE_PREFIX).join(dir).into_string())
        .collect()
}

fn config_refs(files: &[Utf8PathBuf]) -> Vec<String> {
    files
        .iter()
        .filter_map(|file| file.file_name())
        .map(|name| Utf8Path::new(CONFIGS_PREFIX).join(name).into_string())
        .collect()
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
