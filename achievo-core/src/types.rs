//! Source client contract and fetch error taxonomy
//!
//! Every achievement provider implements [`SourceClient`]. The contract is
//! infallible at its boundary: providers recover from every [`FetchError`]
//! internally and hand back a degraded [`GameAchievements`] instead.
//!
//! # Example
//! ```rust,ignore
//! use achievo_core::types::SourceClient;
//!
//! let client = RetroAchievementsClient::from_config(&config, &root)?;
//! if client.enabled_in_settings() && client.supports(&game) {
//!     let achievements = client.get_achievements(&game, &cancel).await;
//!     println!("{}/{}", achievements.unlocked_count, achievements.total);
//! }
//! ```

use achievo_common::{Game, GameAchievements};
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Achievement provider
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Provider name for logs and provenance
    fn name(&self) -> &'static str;

    /// Required credentials/settings are present
    fn is_configured(&self) -> bool;

    /// User-level toggle, checked by the orchestrator before invocation
    fn enabled_in_settings(&self) -> bool;

    /// Whether this provider can have data for the game at all
    fn supports(&self, game: &Game) -> bool;

    /// Resolve and fetch achievements for a game
    ///
    /// Never fails. Without configuration no network I/O happens and an empty
    /// result is returned; any other failure is logged and also yields an
    /// empty result (`has_data == false`, no source link).
    async fn get_achievements(&self, game: &Game, cancel: &CancellationToken) -> GameAchievements;
}

/// Failure while fetching or reading a reference dataset or provider payload
#[derive(Debug, Error)]
pub enum FetchError {
    /// Credentials or settings absent; no network I/O was attempted
    #[error("Not configured: {0}")]
    ConfigurationMissing(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Malformed provider or cache payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// Local game file missing, too large or unreadable
    #[error("File unavailable: {0}")]
    FileUnavailable(String),

    #[error("Cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Fail fast when the caller has cancelled
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), FetchError> {
    if cancel.is_cancelled() {
        Err(FetchError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Provider returning a fixed result
    pub struct MockClient {
        pub name: &'static str,
        pub enabled: bool,
        pub configured: bool,
        pub result: Option<Vec<achievo_common::AchievementRecord>>,
        pub delay: std::time::Duration,
    }

    impl MockClient {
        pub fn with_items(name: &'static str, items: Vec<achievo_common::AchievementRecord>) -> Self {
            Self {
                name,
                enabled: true,
                configured: true,
                result: Some(items),
                delay: std::time::Duration::ZERO,
            }
        }

        pub fn empty(name: &'static str) -> Self {
            Self {
                name,
                enabled: true,
                configured: true,
                result: None,
                delay: std::time::Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl SourceClient for MockClient {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn enabled_in_settings(&self) -> bool {
            self.enabled
        }

        fn supports(&self, _game: &Game) -> bool {
            true
        }

        async fn get_achievements(&self, game: &Game, _cancel: &CancellationToken) -> GameAchievements {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match (&self.result, self.configured) {
                (Some(items), true) => GameAchievements::from_items(game, 1, items.clone()),
                _ => GameAchievements::empty(game),
            }
        }
    }
}
