//! Provider payloads to canonical achievement records

use crate::clients::retroachievements::wire::{RaAchievement, RaGameProgress};
use achievo_common::AchievementRecord;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Icon URL templates keyed by badge id
#[derive(Debug, Clone)]
pub struct BadgeUrls {
    base: String,
}

impl BadgeUrls {
    /// `base` is the directory holding `{badge}.png` and `{badge}_lock.png`
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self { base }
    }

    pub fn unlocked(&self, badge: &str) -> String {
        format!("{}{}.png", self.base, badge)
    }

    pub fn locked(&self, badge: &str) -> String {
        format!("{}{}_lock.png", self.base, badge)
    }
}

/// `floor(awarded * 100 / players)`, 0 without players, capped at 100
pub fn rarity_percent(num_awarded: u32, num_players: u32) -> u8 {
    if num_players == 0 {
        return 0;
    }
    let percent = u64::from(num_awarded) * 100 / u64::from(num_players);
    percent.min(100) as u8
}

/// Parse a provider earn timestamp
///
/// Accepts `YYYY-MM-DD HH:MM:SS` (UTC) and RFC 3339. Anything else is `None`,
/// which the record treats as locked.
pub fn parse_earned_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
}

fn normalize_achievement(raw: &RaAchievement, players: u32, badges: &BadgeUrls) -> AchievementRecord {
    AchievementRecord {
        name: raw.title.clone(),
        description: raw.description.clone(),
        locked_icon_ref: badges.locked(&raw.badge_name),
        unlocked_icon_ref: badges.unlocked(&raw.badge_name),
        unlocked_at: raw.date_earned.as_deref().and_then(parse_earned_at),
        rarity_percent: rarity_percent(raw.num_awarded, players),
        api_name: None,
        category: None,
        category_order: None,
        category_icon: None,
    }
}

/// Game progress payload to records, in display order
pub fn normalize_retroachievements(progress: &RaGameProgress, badges: &BadgeUrls) -> Vec<AchievementRecord> {
    let players = progress.player_count();
    progress
        .achievements
        .iter()
        .map(|a| normalize_achievement(a, players, badges))
        .collect()
}
