//! Achievement orchestration across providers
//!
//! For one game, every provider that is enabled and supports the game runs
//! concurrently (bounded). Results are put back into registration order and
//! the first one with data is returned. Completion order never matters.

use crate::clients::build_clients;
use crate::types::SourceClient;
use achievo_common::config::{AppConfig, RootFolder};
use achievo_common::{Error, Game, GameAchievements, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct AchievementService {
    clients: Vec<Arc<dyn SourceClient>>,
    concurrency: usize,
}

impl AchievementService {
    /// `clients` in priority order
    pub fn new(clients: Vec<Arc<dyn SourceClient>>, concurrency: usize) -> Self {
        Self {
            clients,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &AppConfig, root: &RootFolder) -> Result<Self> {
        let clients = build_clients(config, root).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self::new(clients, config.network.concurrency()))
    }

    pub fn clients(&self) -> &[Arc<dyn SourceClient>] {
        &self.clients
    }

    /// Achievements for one game
    ///
    /// Returns [`Error::Cancelled`] when `cancel` fires; partial results are
    /// discarded.
    pub async fn fetch(&self, game: &Game, cancel: &CancellationToken) -> Result<GameAchievements> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let eligible: Vec<(usize, Arc<dyn SourceClient>)> = self
            .clients
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled_in_settings() && c.supports(game))
            .map(|(i, c)| (i, Arc::clone(c)))
            .collect();

        if eligible.is_empty() {
            debug!(game = %game.name, "No enabled provider supports this game");
            return Ok(GameAchievements::empty(game));
        }

        let mut results: Vec<(usize, GameAchievements)> = stream::iter(eligible)
            .map(|(index, client)| async move {
                let result = client.get_achievements(game, cancel).await;
                debug!(game = %game.name, provider = client.name(), has_data = result.has_data, "Provider finished");
                (index, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        results.sort_by_key(|(index, _)| *index);
        let chosen = results.into_iter().map(|(_, r)| r).find(|r| r.has_data);

        Ok(match chosen {
            Some(result) => {
                info!(
                    game = %game.name,
                    provider = result.source_link.as_ref().map(|l| l.provider_name.as_str()).unwrap_or(""),
                    total = result.total,
                    unlocked = result.unlocked_count,
                    "Achievements resolved"
                );
                result
            }
            None => {
                info!(game = %game.name, "No achievements found");
                GameAchievements::empty(game)
            }
        })
    }

    /// Achievements for many games, in input order
    pub async fn fetch_library(&self, games: &[Game], cancel: &CancellationToken) -> Result<Vec<GameAchievements>> {
        let results: Vec<Result<GameAchievements>> = stream::iter(games)
            .map(|game| self.fetch(game, cancel))
            .buffered(self.concurrency)
            .collect()
            .await;
        results.into_iter().collect()
    }
}
