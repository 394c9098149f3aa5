//! Deterministic snapshot archive writers.
//!
//! Both formats store entries in list order with a fixed timestamp, fixed
//! `0644` permissions, and no owner information, so identical inputs always
//! produce byte-identical archives.

use crate::error::{Result, SnapshotError};
use camino::{Utf8Path, Utf8PathBuf};
use platform_snapshot::ArchiveFormat;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read, Write};

/// Permissions recorded for every archived file.
const ENTRY_MODE: u32 = 0o644;

/// zstd compression level for `tar.zst` archives.
const ZSTD_LEVEL: i32 = 0;

/// One file to archive: its location on disk and its name in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File on disk.
    pub source: Utf8PathBuf,
    /// Path inside the archive.
    pub name: Utf8PathBuf,
}

/// Write `entries` into a new archive at `output` in `format`.
///
/// # Errors
///
/// Returns [`SnapshotError::Archive`] if any entry cannot be read or the
/// archive cannot be written.
pub fn write_archive(
    format: ArchiveFormat,
    output: &Utf8Path,
    entries: &[ArchiveEntry],
) -> Result<()> {
    let outcome = match format {
        ArchiveFormat::Zip => write_zip(output, entries),
        ArchiveFormat::TarZst => write_tar_zst(output, entries),
    };
    outcome.map_err(|err| SnapshotError::Archive {
        path: output.to_owned(),
        reason: err.to_string(),
    })
}

fn write_zip(output: &Utf8Path, entries: &[ArchiveEntry]) -> io::Result<()> {
    let file = fs::File::create(output)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::<()>::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(ENTRY_MODE);

    for entry in entries {
        let contents = fs::read(&entry.source)?;
        zip.start_file(entry.name.as_str(), options)
            .map_err(io::Error::other)?;
        zip.write_all(&contents)?;
    }
    zip.finish().map_err(io::Error::other)?;
    Ok(())
}

fn write_tar_zst(output: &Utf8Path, entries: &[ArchiveEntry]) -> io::Result<()> {
    let file = fs::File::create(output)?;
    let encoder = zstd::Encoder::new(file, ZSTD_LEVEL)?.auto_finish();
    let mut archive = tar::Builder::new(encoder);

    for entry in entries {
        let contents = fs::read(&entry.source)?;
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(ENTRY_MODE);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        header.set_entry_type(tar::EntryType::Regular);
        archive.append_data(&mut header, entry.name.as_std_path(), contents.as_slice())?;
    }
    archive.into_inner()?;
    Ok(())
}

/// Compute the SHA-256 digest of a file as lowercase hex.
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
