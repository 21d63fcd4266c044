//! Shared data model
//!
//! `Game` is the caller's view of a library entry and is never mutated here.
//! `GameAchievements` is the per-game aggregate handed back to the caller; it is
//! rebuilt on every resolution and only constructed through
//! [`GameAchievements::from_items`] or [`GameAchievements::empty`] so that the
//! count and progression invariants always hold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Catalog id meaning "no match found"
pub const NO_MATCH_ID: u32 = 0;

/// Game as known by the host library
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Uuid,
    pub name: String,
    /// Platform display names, most specific first
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Local image files (ROMs, disc images, archives)
    #[serde(default)]
    pub rom_paths: Vec<PathBuf>,
}

impl Game {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            platforms: Vec::new(),
            rom_paths: Vec::new(),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platforms.push(platform.into());
        self
    }

    pub fn with_rom(mut self, path: impl Into<PathBuf>) -> Self {
        self.rom_paths.push(path.into());
        self
    }
}

/// One achievement in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementRecord {
    pub name: String,
    pub description: String,
    pub locked_icon_ref: String,
    pub unlocked_icon_ref: String,
    /// `None` means locked
    pub unlocked_at: Option<DateTime<Utc>>,
    /// Share of players owning this achievement (0-100)
    pub rarity_percent: u8,
    /// Provider-side identifier, when the provider has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
    /// Display category (manual data sets group achievements)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Sort key of `category` among its siblings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_icon: Option<String>,
}

impl AchievementRecord {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }

    /// Rarity tier under the given thresholds
    pub fn rarity_tier(&self, thresholds: &RarityThresholds) -> RarityTier {
        thresholds.classify(self.rarity_percent)
    }
}

/// Provenance of a resolved achievement list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLink {
    /// Game name as the provider spells it
    pub game_name: String,
    pub provider_name: String,
    pub url: String,
}

/// Estimated time to unlock every achievement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateTimeToUnlock {
    /// Number of players the estimate is based on
    pub data_count: u32,
    /// Display text, e.g. `"30-35h"`
    pub estimate_time: String,
    pub estimate_time_min: u32,
    pub estimate_time_max: u32,
}

impl EstimateTimeToUnlock {
    /// Parse a range such as `"30-35h"`, `"8h"` or `"100+h"` (hours).
    ///
    /// An open-ended range uses its lower bound as maximum.
    pub fn parse(text: &str, data_count: u32) -> Option<Self> {
        let display = text.trim();
        let cleaned: String = display
            .chars()
            .filter(|c| !c.is_whitespace() && *c != 'h' && *c != 'H')
            .collect();
        if cleaned.is_empty() {
            return None;
        }

        let mut parts = cleaned.splitn(2, '-');
        let min: u32 = parts.next()?.trim_end_matches('+').parse().ok()?;
        let max = match parts.next() {
            Some(upper) => upper.parse().ok()?,
            None => min,
        };

        Some(Self {
            data_count,
            estimate_time: display.to_string(),
            estimate_time_min: min,
            estimate_time_max: max.max(min),
        })
    }

    /// Upper estimate in seconds
    pub fn max_seconds(&self) -> u64 {
        u64::from(self.estimate_time_max) * 3600
    }
}

/// Per-game aggregate read by the UI and the search layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAchievements {
    pub game_id: Uuid,
    pub game_name: String,
    /// Provider catalog id, [`NO_MATCH_ID`] when unresolved
    pub catalog_game_id: u32,
    pub items: Vec<AchievementRecord>,
    pub total: u32,
    pub unlocked_count: u32,
    pub locked_count: u32,
    pub progression_percent: u8,
    pub source_link: Option<SourceLink>,
    pub has_data: bool,
    /// Data comes from a curated data set rather than the player's account
    #[serde(default)]
    pub is_manual: bool,
    #[serde(default)]
    pub estimate_time: Option<EstimateTimeToUnlock>,
}

impl GameAchievements {
    /// Result for a game without achievement data
    pub fn empty(game: &Game) -> Self {
        Self {
            game_id: game.id,
            game_name: game.name.clone(),
            catalog_game_id: NO_MATCH_ID,
            items: Vec::new(),
            total: 0,
            unlocked_count: 0,
            locked_count: 0,
            progression_percent: 0,
            source_link: None,
            has_data: false,
            is_manual: false,
            estimate_time: None,
        }
    }

    /// Aggregate a list of records, computing counts and progression
    pub fn from_items(game: &Game, catalog_game_id: u32, items: Vec<AchievementRecord>) -> Self {
        let total = items.len() as u32;
        let unlocked_count = items.iter().filter(|a| a.is_unlocked()).count() as u32;

        Self {
            game_id: game.id,
            game_name: game.name.clone(),
            catalog_game_id,
            total,
            unlocked_count,
            locked_count: total - unlocked_count,
            progression_percent: progression_percent(unlocked_count, total),
            has_data: total > 0,
            items,
            source_link: None,
            is_manual: false,
            estimate_time: None,
        }
    }

    pub fn with_source_link(mut self, link: SourceLink) -> Self {
        self.source_link = Some(link);
        self
    }

    /// Count achievements per rarity tier
    pub fn rarity_summary(&self, thresholds: &RarityThresholds) -> RaritySummary {
        let mut summary = RaritySummary::default();
        for item in &self.items {
            let count = match item.rarity_tier(thresholds) {
                RarityTier::Common => &mut summary.common,
                RarityTier::Uncommon => &mut summary.uncommon,
                RarityTier::Rare => &mut summary.rare,
                RarityTier::UltraRare => &mut summary.ultra_rare,
            };
            count.total += 1;
            if item.is_unlocked() {
                count.unlocked += 1;
            }
        }
        summary
    }
}

/// `ceil(unlocked * 100 / total)`, 0 for an empty set
pub fn progression_percent(unlocked: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let unlocked = u64::from(unlocked.min(total));
    let total = u64::from(total);
    ((unlocked * 100).div_ceil(total)) as u8
}

/// Rarity classification of an achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RarityTier {
    Common,
    Uncommon,
    Rare,
    UltraRare,
}

/// Upper bounds (inclusive, in percent) of each non-common tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityThresholds {
    pub uncommon: u8,
    pub rare: u8,
    pub ultra_rare: u8,
}

impl Default for RarityThresholds {
    fn default() -> Self {
        Self {
            uncommon: 30,
            rare: 10,
            ultra_rare: 5,
        }
    }
}

impl RarityThresholds {
    pub fn classify(&self, rarity_percent: u8) -> RarityTier {
        if rarity_percent <= self.ultra_rare {
            RarityTier::UltraRare
        } else if rarity_percent <= self.rare {
            RarityTier::Rare
        } else if rarity_percent <= self.uncommon {
            RarityTier::Uncommon
        } else {
            RarityTier::Common
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCount {
    pub total: u32,
    pub unlocked: u32,
}

/// Per-tier counts for summary display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaritySummary {
    pub common: TierCount,
    pub uncommon: TierCount,
    pub rare: TierCount,
    pub ultra_rare: TierCount,
}
