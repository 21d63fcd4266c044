//! Reference datasets used for identity resolution
//!
//! Three datasets are fetched from a provider and cached on disk:
//! - console catalog (`{id, name}`), sorted by name descending
//! - per-console game catalog (`{id, title, consoleId}`), sorted by title descending
//! - content hash table (`{hash, id}`) across every console
//!
//! The descending sort gives lookups a deterministic iteration order.

use crate::types::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleCatalogEntry {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogGameEntry {
    pub id: u32,
    pub title: String,
    #[serde(rename = "consoleId")]
    pub console_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHashEntry {
    /// Lowercase hex digest
    pub hash: String,
    #[serde(rename = "id")]
    pub catalog_game_id: u32,
}

/// Known consoles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleCatalog {
    entries: Vec<ConsoleCatalogEntry>,
}

impl ConsoleCatalog {
    pub fn new(mut entries: Vec<ConsoleCatalogEntry>) -> Self {
        entries.sort_by(|a, b| b.name.cmp(&a.name).then(a.id.cmp(&b.id)));
        Self { entries }
    }

    pub fn entries(&self) -> &[ConsoleCatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Games of one console
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameCatalog {
    entries: Vec<CatalogGameEntry>,
}

impl GameCatalog {
    pub fn new(mut entries: Vec<CatalogGameEntry>) -> Self {
        entries.sort_by(|a, b| b.title.cmp(&a.title).then(a.id.cmp(&b.id)));
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogGameEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Binary image digests mapped to catalog game ids
#[derive(Debug, Clone, Default)]
pub struct ContentHashTable {
    entries: Vec<ContentHashEntry>,
    index: HashMap<String, u32>,
}

impl ContentHashTable {
    /// Build the table; hashes are lowercased and the first id of a
    /// duplicated hash is kept
    pub fn new(entries: Vec<ContentHashEntry>) -> Self {
        let mut entries: Vec<ContentHashEntry> = entries
            .into_iter()
            .map(|e| ContentHashEntry {
                hash: e.hash.trim().to_ascii_lowercase(),
                catalog_game_id: e.catalog_game_id,
            })
            .filter(|e| !e.hash.is_empty())
            .collect();
        entries.sort_by(|a, b| a.hash.cmp(&b.hash).then(a.catalog_game_id.cmp(&b.catalog_game_id)));
        entries.dedup();

        let mut index = HashMap::with_capacity(entries.len());
        for entry in &entries {
            index.entry(entry.hash.clone()).or_insert(entry.catalog_game_id);
        }

        Self { entries, index }
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, hash: &str) -> Option<u32> {
        if hash.is_empty() {
            return None;
        }
        self.index.get(&hash.to_ascii_lowercase()).copied()
    }

    pub fn entries(&self) -> &[ContentHashEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Access to reference datasets of one provider
#[async_trait]
pub trait ReferenceCatalog: Send + Sync {
    async fn consoles(&self, cancel: &CancellationToken) -> Result<ConsoleCatalog, FetchError>;

    async fn games(&self, console_id: u32, cancel: &CancellationToken) -> Result<GameCatalog, FetchError>;

    /// Hash table covering every console of `consoles`
    async fn hash_table(
        &self,
        consoles: &ConsoleCatalog,
        cancel: &CancellationToken,
    ) -> Result<ContentHashTable, FetchError>;
}

/// Catalog held entirely in memory (offline data, tests)
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    pub consoles: Vec<ConsoleCatalogEntry>,
    pub games: Vec<CatalogGameEntry>,
    pub hashes: Vec<ContentHashEntry>,
}

#[async_trait]
impl ReferenceCatalog for StaticCatalog {
    async fn consoles(&self, cancel: &CancellationToken) -> Result<ConsoleCatalog, FetchError> {
        crate::types::ensure_not_cancelled(cancel)?;
        Ok(ConsoleCatalog::new(self.consoles.clone()))
    }

    async fn games(&self, console_id: u32, cancel: &CancellationToken) -> Result<GameCatalog, FetchError> {
        crate::types::ensure_not_cancelled(cancel)?;
        Ok(GameCatalog::new(
            self.games
                .iter()
                .filter(|g| g.console_id == console_id)
                .cloned()
                .collect(),
        ))
    }

    async fn hash_table(
        &self,
        _consoles: &ConsoleCatalog,
        cancel: &CancellationToken,
    ) -> Result<ContentHashTable, FetchError> {
        crate::types::ensure_not_cancelled(cancel)?;
        Ok(ContentHashTable::new(self.hashes.clone()))
    }
}
