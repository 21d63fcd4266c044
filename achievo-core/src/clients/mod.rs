//! Achievement providers
//!
//! The provider set is closed: [`SourceKind`] lists every client and
//! [`build_clients`] constructs them from explicit settings, in priority
//! order.

pub mod genshin_impact;
pub mod retroachievements;

use crate::types::{FetchError, SourceClient};
use achievo_common::config::{AppConfig, RootFolder};
use genshin_impact::GenshinImpactClient;
use retroachievements::RetroAchievementsClient;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    RetroAchievements,
    GenshinImpact,
}

impl SourceKind {
    /// Registration order; earlier sources win when several have data
    pub const ALL: [SourceKind; 2] = [SourceKind::RetroAchievements, SourceKind::GenshinImpact];

    pub fn build(self, config: &AppConfig, root: &RootFolder) -> Result<Arc<dyn SourceClient>, FetchError> {
        let client: Arc<dyn SourceClient> = match self {
            SourceKind::RetroAchievements => Arc::new(RetroAchievementsClient::from_config(config, root)?),
            SourceKind::GenshinImpact => {
                Arc::new(GenshinImpactClient::new(config.genshin_impact.clone(), &config.network)?)
            }
        };
        Ok(client)
    }
}

/// Every provider, in registration order
pub fn build_clients(config: &AppConfig, root: &RootFolder) -> Result<Vec<Arc<dyn SourceClient>>, FetchError> {
    SourceKind::ALL.iter().map(|kind| kind.build(config, root)).collect()
}
