//! Identity resolution: local game to provider catalog id
//!
//! **Algorithm:**
//! 1. Hash path (game has local files): unpack archives, hash each file with
//!    every transform in trial order, look digests up in the content hash
//!    table. First hit wins.
//! 2. Console path: map the game's platforms to a catalog console.
//! 3. Name path: match the game name against that console's game catalog.
//! 4. Nothing matched: catalog id `0`.
//!
//! Resolution is stateless; every call starts from the (cached) catalogs.
//! Catalog failures degrade to empty datasets. Only cancellation is reported
//! as an error.

pub mod console;
pub mod name_match;

use crate::catalog::{ContentHashTable, ReferenceCatalog};
use crate::hashing::{self, archive::HashSource, HashTransform};
use crate::types::{ensure_not_cancelled, FetchError};
use achievo_common::{Game, NO_MATCH_ID};
use console::find_console_for_platforms;
use name_match::{find_game, NameRule};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a catalog id was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Hash(HashTransform),
    Name(NameRule),
}

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// `0` when nothing matched
    pub catalog_game_id: u32,
    pub matched_by: Option<MatchMethod>,
    /// Console the name path ran against
    pub console_id: Option<u32>,
}

impl Resolution {
    pub fn no_match(console_id: Option<u32>) -> Self {
        Self {
            catalog_game_id: NO_MATCH_ID,
            matched_by: None,
            console_id,
        }
    }

    pub fn is_match(&self) -> bool {
        self.catalog_game_id != NO_MATCH_ID
    }
}

/// Resolver bound to one provider's reference catalog
pub struct IdentityResolver<C> {
    catalog: C,
    scratch_root: PathBuf,
}

impl<C: ReferenceCatalog> IdentityResolver<C> {
    /// `scratch_root` receives one temporary directory per archive extraction
    pub fn new(catalog: C, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            scratch_root: scratch_root.into(),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub async fn resolve(&self, game: &Game, cancel: &CancellationToken) -> Result<Resolution, FetchError> {
        ensure_not_cancelled(cancel)?;
        let consoles = degrade("console catalog", self.catalog.consoles(cancel).await)?;

        if !game.rom_paths.is_empty() {
            let table = degrade("hash table", self.catalog.hash_table(&consoles, cancel).await)?;
            if table.is_empty() {
                debug!(game = %game.name, "Hash table empty, skipping hash path");
            } else if let Some((transform, id)) = self.resolve_by_hash(game, Arc::new(table), cancel).await? {
                return Ok(Resolution {
                    catalog_game_id: id,
                    matched_by: Some(MatchMethod::Hash(transform)),
                    console_id: None,
                });
            }
        }

        let Some(console) = find_console_for_platforms(&consoles, &game.platforms) else {
            warn!(game = %game.name, platforms = ?game.platforms, "No console found for game");
            return Ok(Resolution::no_match(None));
        };
        let console_id = console.id;

        ensure_not_cancelled(cancel)?;
        let games = degrade("game catalog", self.catalog.games(console_id, cancel).await)?;

        match find_game(&games, &game.name) {
            Some((entry, rule)) => {
                info!(game = %game.name, title = %entry.title, id = entry.id, console_id, rule = %rule, "Name match");
                Ok(Resolution {
                    catalog_game_id: entry.id,
                    matched_by: Some(MatchMethod::Name(rule)),
                    console_id: Some(console_id),
                })
            }
            None => {
                warn!(game = %game.name, console_id, "No game found in console catalog");
                Ok(Resolution::no_match(Some(console_id)))
            }
        }
    }

    /// Try each local file in order
    async fn resolve_by_hash(
        &self,
        game: &Game,
        table: Arc<ContentHashTable>,
        cancel: &CancellationToken,
    ) -> Result<Option<(HashTransform, u32)>, FetchError> {
        for rom in &game.rom_paths {
            ensure_not_cancelled(cancel)?;

            let path = rom.clone();
            let scratch_root = self.scratch_root.clone();
            let table = Arc::clone(&table);
            let outcome = tokio::task::spawn_blocking(move || {
                let source = HashSource::prepare(&path, &scratch_root)?;
                hashing::first_match(source.path(), &table)
            })
            .await;

            match outcome {
                Ok(Ok(Some(hit))) => return Ok(Some(hit)),
                Ok(Ok(None)) => {
                    warn!(game = %game.name, path = %rom.display(), "No hash match");
                }
                Ok(Err(e)) => {
                    warn!(game = %game.name, path = %rom.display(), error = %e, "Hash path skipped");
                }
                Err(e) => {
                    warn!(game = %game.name, path = %rom.display(), error = %e, "Hashing task failed");
                }
            }
        }
        Ok(None)
    }
}

/// Recover from a dataset failure with an empty dataset; cancellation passes through
fn degrade<T: Default>(what: &str, result: Result<T, FetchError>) -> Result<T, FetchError> {
    match result {
        Ok(value) => Ok(value),
        Err(FetchError::Cancelled) => Err(FetchError::Cancelled),
        Err(e) => {
            warn!(dataset = what, error = %e, "Reference dataset unavailable, continuing with empty data");
            Ok(T::default())
        }
    }
}
