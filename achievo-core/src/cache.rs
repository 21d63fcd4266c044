//! On-disk cache of reference datasets
//!
//! Layout under `<root>/cache/`:
//! - `consoles.json` console catalog, no expiry
//! - `games_<consoleId>.json` per-console game catalog, no expiry
//! - `hash_table.json` content hash table, expires after the configured TTL
//!
//! Writes go through a temp file in the same directory followed by a rename so
//! concurrent readers never observe a half-written file.

use crate::types::FetchError;
use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Cached dataset family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    ConsoleCatalog,
    GameCatalog,
    HashTable,
}

impl DatasetKind {
    /// File name; `sub_key` is the console id for game catalogs
    pub fn file_name(self, sub_key: Option<u32>) -> String {
        match self {
            DatasetKind::ConsoleCatalog => "consoles.json".to_string(),
            DatasetKind::GameCatalog => format!("games_{}.json", sub_key.unwrap_or(0)),
            DatasetKind::HashTable => "hash_table.json".to_string(),
        }
    }
}

/// True while `written + ttl` lies in the future
pub fn is_fresh(written: SystemTime, now: SystemTime, ttl: Duration) -> bool {
    match written.checked_add(ttl) {
        Some(expiry) => expiry > now,
        None => true,
    }
}

pub struct ReferenceCache {
    dir: PathBuf,
    hash_table_ttl: Duration,
}

impl ReferenceCache {
    pub fn new(dir: impl Into<PathBuf>, hash_table_ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            hash_table_ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: DatasetKind, sub_key: Option<u32>) -> PathBuf {
        self.dir.join(kind.file_name(sub_key))
    }

    /// Expiry window; `None` means trusted while the file exists
    pub fn ttl_for(&self, kind: DatasetKind) -> Option<Duration> {
        match kind {
            DatasetKind::HashTable => Some(self.hash_table_ttl),
            DatasetKind::ConsoleCatalog | DatasetKind::GameCatalog => None,
        }
    }

    /// Read a cached dataset
    ///
    /// `Ok(None)` on a miss (file absent or expired). A file that exists but
    /// does not parse is `Err(FetchError::Parse)`.
    pub async fn load<T: DeserializeOwned>(
        &self,
        kind: DatasetKind,
        sub_key: Option<u32>,
    ) -> Result<Option<T>, FetchError> {
        let path = self.path_for(kind, sub_key);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Cache miss");
                return Ok(None);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache file not readable");
                return Ok(None);
            }
        };

        if let Some(ttl) = self.ttl_for(kind) {
            let written = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if !is_fresh(written, SystemTime::now(), ttl) {
                debug!(path = %path.display(), "Cache entry expired");
                return Ok(None);
            }
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache file not readable");
                return Ok(None);
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| FetchError::Parse(format!("{}: {}", path.display(), e)))
    }

    /// Persist a dataset; returns whether the write succeeded
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn store<T: Serialize + ?Sized>(&self, kind: DatasetKind, sub_key: Option<u32>, value: &T) -> bool {
        let path = self.path_for(kind, sub_key);
        let json = match serde_json::to_vec(value) {
            Ok(j) => j,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to serialize cache entry");
                return false;
            }
        };

        let dir = self.dir.clone();
        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &json)).await;

        match result {
            Ok(Ok(())) => {
                debug!(path = %path.display(), "Cache entry written");
                true
            }
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "Failed to write cache entry");
                false
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache write task failed");
                false
            }
        }
    }

    /// Remove every cached dataset
    pub async fn clear(&self) -> std::io::Result<usize> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
