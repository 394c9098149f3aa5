//! Realisation of a snapshot plan on disk.
//!
//! The executor is the only part of the planner that writes files. It applies
//! every planned action under the output root, writes the sorted list file,
//! builds the archive from that list, and reports the archive digest.

use crate::action::BuildAction;
use crate::archive::{ArchiveEntry, compute_sha256, write_archive};
use crate::error::{Result, SnapshotError};
use crate::packager::MakeVars;
use crate::pass::SnapshotPlan;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs;

/// Outcome of executing a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Number of files copied or written.
    pub files: usize,
    /// Absolute or out-dir-relative path of the list file.
    pub list_file: Utf8PathBuf,
    /// Path of the archive.
    pub archive: Utf8PathBuf,
    /// SHA-256 of the archive, lowercase hex.
    pub sha256: String,
}

/// Applies snapshot plans under an output root.
#[derive(Debug, Clone)]
pub struct Executor {
    out_dir: Utf8PathBuf,
    source_root: Utf8PathBuf,
}

impl Executor {
    /// Create an executor writing under `out_dir` and resolving relative copy
    /// sources against `source_root`.
    #[must_use]
    pub fn new(out_dir: impl Into<Utf8PathBuf>, source_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            source_root: source_root.into(),
        }
    }

    /// Output root.
    #[must_use]
    pub fn out_dir(&self) -> &Utf8Path {
        &self.out_dir
    }

    /// Apply `plan` and build its archive.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Execution`] when a copy or write fails,
    /// [`SnapshotError::Archive`] when the archive cannot be built, and
    /// [`SnapshotError::Io`] when the digest cannot be computed.
    pub fn execute(&self, plan: &SnapshotPlan) -> Result<ExecutionReport> {
        for action in &plan.actions {
            self.apply(action)?;
        }

        let list_file = self.out_dir.join(&plan.archive.list_file);
        self.write_file(&list_file, plan.archive.list_contents().as_bytes())?;

        let entries: Vec<ArchiveEntry> = plan
            .outputs()
            .iter()
            .map(|output| ArchiveEntry {
                source: self.out_dir.join(output),
                name: plan.archive.entry_name(output).to_owned(),
            })
            .collect();
        let archive = self.out_dir.join(&plan.archive.archive);
        write_archive(plan.archive.format, &archive, &entries)?;
        let sha256 = compute_sha256(&archive)?;
        info!("wrote {archive} ({} entries, sha256 {sha256})", entries.len());

        Ok(ExecutionReport {
            files: plan.actions.len(),
            list_file,
            archive,
            sha256,
        })
    }

    /// Write rendered build variables to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Execution`] when the file cannot be written.
    pub fn write_make_vars(&self, path: &Utf8Path, vars: &MakeVars) -> Result<()> {
        debug!("write {path}");
        self.write_file(path, vars.render().as_bytes())
    }

    fn apply(&self, action: &BuildAction) -> Result<()> {
        let dest = self.out_dir.join(action.destination());
        match action {
            BuildAction::Copy { source, .. } => {
                let source = self.resolve_source(source);
                debug!("copy {source} -> {dest}");
                ensure_parent(&dest, "copy")?;
                fs::copy(&source, &dest).map_err(|source| SnapshotError::Execution {
                    action: "copy",
                    path: dest.clone(),
                    source,
                })?;
                Ok(())
            }
            BuildAction::Write { contents, .. } => {
                debug!("write {dest}");
                self.write_file(&dest, contents.as_bytes())
            }
        }
    }

    fn write_file(&self, dest: &Utf8Path, contents: &[u8]) -> Result<()> {
        ensure_parent(dest, "write")?;
        fs::write(dest, contents).map_err(|source| SnapshotError::Execution {
            action: "write",
            path: dest.to_owned(),
            source,
        })
    }

    fn resolve_source(&self, source: &Utf8Path) -> Utf8PathBuf {
        if source.is_absolute() {
            source.to_owned()
        } else {
            self.source_root.join(source)
        }
    }
}

fn ensure_parent(dest: &Utf8Path, action: &'static str) -> Result<()> {
    let Some(parent) = dest.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent).map_err(|source| SnapshotError::Execution {
        action,
        path: parent.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageFamily;
    use crate::pass::generate;
    use crate::test_utils::{policy, static_lib};
    use platform_snapshot::SnapshotConfig;
    use rstest::rstest;
    use tempfile::TempDir;

    fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf8 temp dir")
    }

    #[rstest]
    fn copies_artifacts_and_writes_sidecars() {
        let dir = TempDir::new().expect("temp dir");
        let root = utf8_root(&dir);
        fs::create_dir_all(root.join("src/out")).expect("mkdir");
        fs::write(root.join("src/out/libfoo.a"), b"!<arch>\n").expect("artifact");
        let config = SnapshotConfig::default();
        let plan = generate(
            &[static_lib("libfoo")],
            policy(ImageFamily::Vendor).as_ref(),
            &config,
            false,
        )
        .expect("plans")
        .expect("generated");

        let report = Executor::new(root.join("out"), root.join("src"))
            .execute(&plan)
            .expect("executes");

        let static_dir = root.join("out/vendor-snapshot/arm64/arch-arm64/static");
        assert_eq!(
            fs::read(static_dir.join("libfoo.a")).expect("copied"),
            b"!<arch>\n"
        );
        assert_eq!(
            fs::read_to_string(static_dir.join("libfoo.a.json")).expect("sidecar"),
            r#"{"ModuleName":"libfoo"}"#
        );
        assert_eq!(report.files, 2);
        assert!(report.archive.ends_with("vendor-generic.zip"));
        assert_eq!(report.sha256.len(), 64);
        assert!(
            fs::read_to_string(&report.list_file)
                .expect("list")
                .starts_with("vendor-snapshot/arm64/arch-arm64/static/libfoo.a\n")
        );
    }

    #[rstest]
    fn missing_source_is_an_execution_error() {
        let dir = TempDir::new().expect("temp dir");
        let root = utf8_root(&dir);
        let config = SnapshotConfig::default();
        let plan = generate(
            &[static_lib("libmissing")],
            policy(ImageFamily::Vendor).as_ref(),
            &config,
            false,
        )
        .expect("plans")
        .expect("generated");

        let err = Executor::new(root.join("out"), root.join("src"))
            .execute(&plan)
            .expect_err("source is missing");

        assert!(matches!(err, SnapshotError::Execution { action: "copy", .. }));
    }

    #[rstest]
    fn fake_plans_need_no_sources() {
        let dir = TempDir::new().expect("temp dir");
        let root = utf8_root(&dir);
        let config = SnapshotConfig::default();
        let plan = generate(
            &[static_lib("libfoo")],
            policy(ImageFamily::Vendor).as_ref(),
            &config,
            true,
        )
        .expect("plans")
        .expect("generated");

        let report = Executor::new(root.join("out"), root.join("nowhere"))
            .execute(&plan)
            .expect("executes");

        let placeholder = root.join("out/fake/vendor-snapshot/arm64/arch-arm64/static/libfoo.a");
        assert_eq!(fs::metadata(placeholder).expect("placeholder").len(), 0);
        assert!(report.archive.starts_with(root.join("out/fake")));
    }

    #[rstest]
    fn make_vars_are_written_with_parents() {
        let dir = TempDir::new().expect("temp dir");
        let root = utf8_root(&dir);
        let mut vars = MakeVars::new();
        vars.strict("SOONG_VENDOR_SNAPSHOT_ZIP", "out/vendor-snapshot/vendor-generic.zip");
        let path = root.join("build/vars/snapshot.mk");

        Executor::new(root.join("out"), root.clone())
            .write_make_vars(&path, &vars)
            .expect("writes");

        assert_eq!(
            fs::read_to_string(path).expect("read back"),
            "SOONG_VENDOR_SNAPSHOT_ZIP := out/vendor-snapshot/vendor-generic.zip\n"
        );
    }
}
