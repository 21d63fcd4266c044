//! RetroAchievements provider
//!
//! Hash-capable: games are identified through the content hash library first
//! and by console + title second (see [`crate::resolver`]). Achievement data
//! comes from `API_GetGameInfoAndUserProgress.php`.
//!
//! The API key is sent as a query parameter and never logged.

pub mod catalog;
pub mod wire;

use crate::cache::ReferenceCache;
use crate::normalizer::{normalize_retroachievements, BadgeUrls};
use crate::resolver::IdentityResolver;
use crate::types::{ensure_not_cancelled, FetchError, SourceClient};
use achievo_common::config::{
    resolve_retroachievements_settings, AppConfig, NetworkConfig, RetroAchievementsSettings, RootFolder,
};
use achievo_common::{Game, GameAchievements, SourceLink};
use async_trait::async_trait;
use catalog::RetroAchievementsCatalog;
use governor::{DefaultDirectRateLimiter, Quota};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wire::{RaConsole, RaGame, RaGameProgress, RaHashLibrary};

pub const PROVIDER_NAME: &str = "RetroAchievements";

const USER_AGENT: &str = concat!("achievo/", env!("CARGO_PKG_VERSION"));

/// Base URLs, overridable for tests and mirrors
#[derive(Debug, Clone)]
pub struct RetroAchievementsEndpoints {
    /// Directory holding the `API_*.php` endpoints
    pub api_base: String,
    /// `dorequest.php` endpoint
    pub hash_library: String,
    /// Directory of badge images
    pub badge_base: String,
    /// Public site, used for source links
    pub site_base: String,
}

impl Default for RetroAchievementsEndpoints {
    fn default() -> Self {
        Self {
            api_base: "https://retroachievements.org/API/".to_string(),
            hash_library: "https://retroachievements.org/dorequest.php".to_string(),
            badge_base: "https://media.retroachievements.org/Badge/".to_string(),
            site_base: "https://retroachievements.org".to_string(),
        }
    }
}

impl RetroAchievementsEndpoints {
    /// All endpoints under one server root
    pub fn with_root(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            api_base: format!("{}/API/", root),
            hash_library: format!("{}/dorequest.php", root),
            badge_base: format!("{}/Badge/", root),
            site_base: root.to_string(),
        }
    }

    fn api_url(&self, endpoint: &str) -> String {
        if self.api_base.ends_with('/') {
            format!("{}{}", self.api_base, endpoint)
        } else {
            format!("{}/{}", self.api_base, endpoint)
        }
    }

    pub fn game_page(&self, game_id: u32) -> String {
        format!("{}/game/{}", self.site_base.trim_end_matches('/'), game_id)
    }
}

/// Typed access to the web API
pub struct RetroAchievementsApi {
    http_client: reqwest::Client,
    endpoints: RetroAchievementsEndpoints,
    user: String,
    api_key: String,
    /// `None` when no minimum interval is configured
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl RetroAchievementsApi {
    pub fn new(
        settings: &RetroAchievementsSettings,
        endpoints: RetroAchievementsEndpoints,
        network: &NetworkConfig,
    ) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(network.timeout())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoints,
            user: settings.user.clone(),
            api_key: settings.api_key.clone(),
            rate_limiter: Quota::with_period(Duration::from_millis(network.min_request_interval_ms))
                .map(DefaultDirectRateLimiter::direct),
        })
    }

    pub fn endpoints(&self) -> &RetroAchievementsEndpoints {
        &self.endpoints
    }

    /// GET and decode one JSON document
    ///
    /// Cancellation is checked before the request and raced against it.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<T, FetchError> {
        ensure_not_cancelled(cancel)?;
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
        ensure_not_cancelled(cancel)?;

        tracing::debug!(url, "RetroAchievements request");

        let request = async {
            let response = self.http_client.get(url).query(query).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Api(status.as_u16(), body));
            }
            Ok(response.text().await?)
        };

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            body = request => body?,
        };

        serde_json::from_str(&body).map_err(|e| FetchError::Parse(format!("{}: {}", url, e)))
    }

    fn auth(&self) -> Vec<(&'static str, String)> {
        vec![("z", self.user.clone()), ("y", self.api_key.clone())]
    }

    pub async fn console_ids(&self, cancel: &CancellationToken) -> Result<Vec<RaConsole>, FetchError> {
        let url = self.endpoints.api_url("API_GetConsoleIDs.php");
        self.get_json(&url, &self.auth(), cancel).await
    }

    pub async fn game_list(&self, console_id: u32, cancel: &CancellationToken) -> Result<Vec<RaGame>, FetchError> {
        let url = self.endpoints.api_url("API_GetGameList.php");
        let mut query = self.auth();
        query.push(("i", console_id.to_string()));
        self.get_json(&url, &query, cancel).await
    }

    /// Hash library of one console; an empty `MD5List` is an empty map
    pub async fn hash_library(&self, console_id: u32, cancel: &CancellationToken) -> Result<RaHashLibrary, FetchError> {
        let query = [("r", "hashlibrary".to_string()), ("c", console_id.to_string())];
        self.get_json(&self.endpoints.hash_library, &query, cancel).await
    }

    pub async fn game_info_and_user_progress(
        &self,
        game_id: u32,
        cancel: &CancellationToken,
    ) -> Result<RaGameProgress, FetchError> {
        let url = self.endpoints.api_url("API_GetGameInfoAndUserProgress.php");
        let mut query = self.auth();
        query.push(("u", self.user.clone()));
        query.push(("g", game_id.to_string()));
        self.get_json(&url, &query, cancel).await
    }
}

/// RetroAchievements source client
pub struct RetroAchievementsClient {
    settings: RetroAchievementsSettings,
    api: Arc<RetroAchievementsApi>,
    resolver: IdentityResolver<RetroAchievementsCatalog>,
    badges: BadgeUrls,
}

impl RetroAchievementsClient {
    pub fn new(
        settings: RetroAchievementsSettings,
        endpoints: RetroAchievementsEndpoints,
        network: &NetworkConfig,
        cache: ReferenceCache,
        scratch_root: impl Into<PathBuf>,
    ) -> Result<Self, FetchError> {
        let badges = BadgeUrls::new(endpoints.badge_base.clone());
        let api = Arc::new(RetroAchievementsApi::new(&settings, endpoints, network)?);
        let catalog = RetroAchievementsCatalog::new(Arc::clone(&api), cache, network.concurrency());

        Ok(Self {
            settings,
            api,
            resolver: IdentityResolver::new(catalog, scratch_root),
            badges,
        })
    }

    /// Build from application config; credentials resolve ENV → TOML
    pub fn from_config(config: &AppConfig, root: &RootFolder) -> Result<Self, FetchError> {
        let cache = ReferenceCache::new(root.cache_dir(), config.cache.hash_table_ttl());
        Self::new(
            resolve_retroachievements_settings(config),
            RetroAchievementsEndpoints::default(),
            &config.network,
            cache,
            root.scratch_dir(),
        )
    }

    pub fn catalog(&self) -> &RetroAchievementsCatalog {
        self.resolver.catalog()
    }

    async fn fetch(&self, game: &Game, cancel: &CancellationToken) -> Result<GameAchievements, FetchError> {
        if !self.is_configured() {
            return Err(FetchError::ConfigurationMissing("RetroAchievements user and API key".to_string()));
        }
        let resolution = self.resolver.resolve(game, cancel).await?;
        if !resolution.is_match() {
            tracing::info!(game = %game.name, "No RetroAchievements match");
            return Ok(GameAchievements::empty(game));
        }
        let game_id = resolution.catalog_game_id;
        tracing::debug!(game = %game.name, game_id, matched_by = ?resolution.matched_by, "Resolved RetroAchievements id");

        let progress = self.api.game_info_and_user_progress(game_id, cancel).await?;
        let items = normalize_retroachievements(&progress, &self.badges);
        let mut result = GameAchievements::from_items(game, game_id, items);

        if result.has_data {
            let title = if progress.title.is_empty() {
                game.name.clone()
            } else {
                progress.title.clone()
            };
            result = result.with_source_link(SourceLink {
                game_name: title,
                provider_name: PROVIDER_NAME.to_string(),
                url: self.api.endpoints().game_page(game_id),
            });
        }
        Ok(result)
    }
}

#[async_trait]
impl SourceClient for RetroAchievementsClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn is_configured(&self) -> bool {
        self.settings.has_credentials()
    }

    fn enabled_in_settings(&self) -> bool {
        self.settings.enabled
    }

    fn supports(&self, game: &Game) -> bool {
        !game.platforms.is_empty() || !game.rom_paths.is_empty()
    }

    async fn get_achievements(&self, game: &Game, cancel: &CancellationToken) -> GameAchievements {
        match self.fetch(game, cancel).await {
            Ok(result) => {
                tracing::info!(
                    game = %game.name,
                    game_id = result.catalog_game_id,
                    total = result.total,
                    unlocked = result.unlocked_count,
                    "RetroAchievements fetch complete"
                );
                result
            }
            Err(e @ FetchError::ConfigurationMissing(_)) => {
                tracing::warn!(game = %game.name, error = %e, "RetroAchievements skipped");
                GameAchievements::empty(game)
            }
            Err(FetchError::Cancelled) => {
                tracing::debug!(game = %game.name, "RetroAchievements fetch cancelled");
                GameAchievements::empty(game)
            }
            Err(e) => {
                tracing::warn!(game = %game.name, error = %e, "RetroAchievements fetch failed");
                GameAchievements::empty(game)
            }
        }
    }
}
