//! Cached RetroAchievements reference datasets
//!
//! Console list and per-console game lists are fetched once and trusted while
//! their cache file exists. The hash library is fetched per console with
//! bounded concurrency, merged, and written back as one file that expires
//! after the configured TTL.

use super::wire::RaHashLibrary;
use super::RetroAchievementsApi;
use crate::cache::{DatasetKind, ReferenceCache};
use crate::catalog::{
    CatalogGameEntry, ConsoleCatalog, ConsoleCatalogEntry, ContentHashEntry, ContentHashTable, GameCatalog,
    ReferenceCatalog,
};
use crate::types::{ensure_not_cancelled, FetchError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct RetroAchievementsCatalog {
    api: Arc<RetroAchievementsApi>,
    cache: ReferenceCache,
    concurrency: usize,
}

impl RetroAchievementsCatalog {
    pub fn new(api: Arc<RetroAchievementsApi>, cache: ReferenceCache, concurrency: usize) -> Self {
        Self {
            api,
            cache,
            concurrency: concurrency.max(1),
        }
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    async fn fetch_hash_table(
        &self,
        consoles: &ConsoleCatalog,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContentHashEntry>, FetchError> {
        let ids: Vec<u32> = consoles.entries().iter().map(|c| c.id).collect();

        let mut results: Vec<(u32, Result<RaHashLibrary, FetchError>)> = stream::iter(ids)
            .map(|console_id| async move { (console_id, self.api.hash_library(console_id, cancel).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        results.sort_by_key(|(console_id, _)| *console_id);

        let mut entries = Vec::new();
        for (console_id, result) in results {
            match result {
                Ok(library) if library.md5_list.is_empty() => {
                    debug!(console_id, "Empty hash library");
                }
                Ok(library) => {
                    let before = entries.len();
                    entries.extend(library.md5_list.into_iter().filter_map(|(hash, id)| {
                        id.value().map(|catalog_game_id| ContentHashEntry { hash, catalog_game_id })
                    }));
                    debug!(console_id, hashes = entries.len() - before, "Hash library fetched");
                }
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(e) => {
                    warn!(console_id, error = %e, "Hash library fetch failed");
                }
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl ReferenceCatalog for RetroAchievementsCatalog {
    async fn consoles(&self, cancel: &CancellationToken) -> Result<ConsoleCatalog, FetchError> {
        if let Some(entries) = self
            .cache
            .load::<Vec<ConsoleCatalogEntry>>(DatasetKind::ConsoleCatalog, None)
            .await?
        {
            return Ok(ConsoleCatalog::new(entries));
        }

        let entries: Vec<ConsoleCatalogEntry> = self
            .api
            .console_ids(cancel)
            .await?
            .into_iter()
            .map(|c| ConsoleCatalogEntry { id: c.id, name: c.name })
            .collect();
        info!(consoles = entries.len(), "Console catalog fetched");

        let catalog = ConsoleCatalog::new(entries);
        if !catalog.is_empty() {
            self.cache.store(DatasetKind::ConsoleCatalog, None, catalog.entries()).await;
        }
        Ok(catalog)
    }

    async fn games(&self, console_id: u32, cancel: &CancellationToken) -> Result<GameCatalog, FetchError> {
        if let Some(entries) = self
            .cache
            .load::<Vec<CatalogGameEntry>>(DatasetKind::GameCatalog, Some(console_id))
            .await?
        {
            return Ok(GameCatalog::new(entries));
        }

        let entries: Vec<CatalogGameEntry> = self
            .api
            .game_list(console_id, cancel)
            .await?
            .into_iter()
            .map(|g| CatalogGameEntry {
                id: g.id,
                title: g.title,
                console_id: if g.console_id == 0 { console_id } else { g.console_id },
            })
            .collect();
        info!(console_id, games = entries.len(), "Game catalog fetched");

        let catalog = GameCatalog::new(entries);
        if !catalog.is_empty() {
            self.cache
                .store(DatasetKind::GameCatalog, Some(console_id), catalog.entries())
                .await;
        }
        Ok(catalog)
    }

    async fn hash_table(
        &self,
        consoles: &ConsoleCatalog,
        cancel: &CancellationToken,
    ) -> Result<ContentHashTable, FetchError> {
        if let Some(entries) = self
            .cache
            .load::<Vec<ContentHashEntry>>(DatasetKind::HashTable, None)
            .await?
        {
            return Ok(ContentHashTable::new(entries));
        }

        ensure_not_cancelled(cancel)?;
        let table = ContentHashTable::new(self.fetch_hash_table(consoles, cancel).await?);
        info!(hashes = table.len(), consoles = consoles.len(), "Hash table fetched");

        if !table.is_empty() {
            self.cache.store(DatasetKind::HashTable, None, table.entries()).await;
        }
        Ok(table)
    }
}
