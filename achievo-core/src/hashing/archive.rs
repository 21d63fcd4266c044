//! Archive unpacking ahead of hashing
//!
//! Zip containers are unpacked into a fresh directory under the scratch root.
//! The directory belongs to the returned [`HashSource`] and is deleted when it
//! is dropped, so concurrent resolutions never share extracted files.

use super::MAX_HASHABLE_FILE_SIZE;
use crate::types::FetchError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Zip files larger than this are not unpacked
pub const MAX_ARCHIVE_SIZE: u64 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Not an archive, hashed as is
    Plain,
    Zip,
    /// Rar and 7z are not unpacked
    Unsupported,
}

impl ArchiveKind {
    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "zip" => ArchiveKind::Zip,
            "rar" | "7z" => ArchiveKind::Unsupported,
            _ => ArchiveKind::Plain,
        }
    }
}

/// File ready for hashing, plus the scratch directory backing it if any
#[derive(Debug)]
pub struct HashSource {
    path: PathBuf,
    scratch_dir: Option<TempDir>,
}

impl HashSource {
    /// Validate `path` and unpack it when it is a zip
    ///
    /// Blocking.
    pub fn prepare(path: &Path, scratch_root: &Path) -> Result<Self, FetchError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| FetchError::FileUnavailable(format!("{}: {}", path.display(), e)))?;

        match ArchiveKind::detect(path) {
            ArchiveKind::Plain => Ok(Self {
                path: path.to_path_buf(),
                scratch_dir: None,
            }),
            ArchiveKind::Unsupported => Err(FetchError::FileUnavailable(format!(
                "{}: archive format not supported",
                path.display()
            ))),
            ArchiveKind::Zip => {
                if metadata.len() > MAX_ARCHIVE_SIZE {
                    return Err(FetchError::FileUnavailable(format!(
                        "{}: {} bytes exceeds archive limit",
                        path.display(),
                        metadata.len()
                    )));
                }
                extract_first_file(path, scratch_root)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_extracted(&self) -> bool {
        self.scratch_dir.is_some()
    }
}

/// Unpack the first regular file of a zip into a new scratch directory
///
/// The entry may not exceed the hashing limit, whatever its header claims.
pub fn extract_first_file(archive_path: &Path, scratch_root: &Path) -> Result<HashSource, FetchError> {
    extract_limited(archive_path, scratch_root, MAX_HASHABLE_FILE_SIZE)
}

fn extract_limited(archive_path: &Path, scratch_root: &Path, max_entry_size: u64) -> Result<HashSource, FetchError> {
    let unavailable = |e: &dyn std::fmt::Display| {
        FetchError::FileUnavailable(format!("{}: {}", archive_path.display(), e))
    };

    let file = File::open(archive_path).map_err(|e| unavailable(&e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| unavailable(&e))?;

    std::fs::create_dir_all(scratch_root).map_err(|e| unavailable(&e))?;
    let scratch = tempfile::Builder::new()
        .prefix("extract-")
        .tempdir_in(scratch_root)
        .map_err(|e| unavailable(&e))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| unavailable(&e))?;
        if !entry.is_file() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(archive = %archive_path.display(), entry = entry.name(), "Skipping unsafe zip entry");
            continue;
        };
        let Some(file_name) = relative.file_name() else {
            continue;
        };

        if entry.size() > max_entry_size {
            return Err(FetchError::FileUnavailable(format!(
                "{}: entry {} is {} bytes, exceeds hashing limit",
                archive_path.display(),
                relative.display(),
                entry.size()
            )));
        }

        let target = scratch.path().join(file_name);
        let mut out = File::create(&target).map_err(|e| unavailable(&e))?;
        let written = std::io::copy(&mut (&mut entry).take(max_entry_size + 1), &mut out)
            .map_err(|e| unavailable(&e))?;
        if written > max_entry_size {
            return Err(FetchError::FileUnavailable(format!(
                "{}: entry {} inflates past hashing limit",
                archive_path.display(),
                relative.display()
            )));
        }

        tracing::debug!(
            archive = %archive_path.display(),
            entry = %relative.display(),
            target = %target.display(),
            "Extracted archive entry"
        );
        return Ok(HashSource {
            path: target,
            scratch_dir: Some(scratch),
        });
    }

    Err(FetchError::FileUnavailable(format!(
        "{}: archive contains no regular file",
        archive_path.display()
    )))
}
