//! Genshin Impact manual achievement data
//!
//! The game has no achievement API; the achievement list comes from the
//! community data dump on GitHub. Three documents are needed:
//! - `TextMap/TextMap{LANG}.json` text hash to localized string
//! - `ExcelBinOutput/AchievementExcelConfigData.json` achievements
//! - `ExcelBinOutput/AchievementGoalExcelConfigData.json` categories
//!
//! Unlock state is not available, so every record is locked and the result is
//! flagged manual.

use crate::types::{ensure_not_cancelled, FetchError, SourceClient};
use achievo_common::config::{GenshinImpactSettings, NetworkConfig};
use achievo_common::{AchievementRecord, Game, GameAchievements, SourceLink, NO_MATCH_ID};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

pub const PROVIDER_NAME: &str = "GitHub";
pub const GAME_NAME: &str = "Genshin Impact";

const DEFAULT_DATA_BASE: &str = "https://raw.githubusercontent.com/Sycamore0/GenshinData/main";
const SOURCE_URL: &str = "https://github.com/Sycamore0/GenshinData";
const ICON: &str = "GenshinImpact/ac.png";

fn category_icon(order: u32) -> String {
    format!("GenshinImpact/ac_{}.png", order)
}

/// `AchievementExcelConfigData.json` row
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementData {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub goal_id: Option<u64>,
    #[serde(default)]
    pub title_text_map_hash: Option<u64>,
    #[serde(default)]
    pub desc_text_map_hash: Option<u64>,
}

/// `AchievementGoalExcelConfigData.json` row
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementGoal {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub order_id: Option<u32>,
    #[serde(default)]
    pub name_text_map_hash: Option<u64>,
}

/// Host locale (`en_US`) to data dump language code (`EN`)
pub fn text_map_language(locale: &str) -> &'static str {
    match locale {
        "zh_CN" => "CHS",
        "zh_TW" => "CHT",
        "de_DE" => "DE",
        "es_ES" => "ES",
        "fr_FR" => "FR",
        "id_ID" => "ID",
        "it_IT" => "IT",
        "ja_JP" => "JP",
        "ko_KR" => "KR",
        "pt_BR" | "pt_PT" => "PT",
        "ru_RU" => "RU",
        "th_TH" => "TH",
        "tr_TR" => "TR",
        "vi_VN" => "VI",
        _ => "EN",
    }
}

pub struct GenshinImpactClient {
    settings: GenshinImpactSettings,
    http_client: reqwest::Client,
    data_base: String,
}

impl GenshinImpactClient {
    pub fn new(settings: GenshinImpactSettings, network: &NetworkConfig) -> Result<Self, FetchError> {
        Self::with_data_base(settings, network, DEFAULT_DATA_BASE)
    }

    /// Client reading the data dump from another location
    pub fn with_data_base(
        settings: GenshinImpactSettings,
        network: &NetworkConfig,
        data_base: &str,
    ) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(network.timeout())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            settings,
            http_client,
            data_base: data_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, cancel: &CancellationToken) -> Result<T, FetchError> {
        ensure_not_cancelled(cancel)?;
        let url = format!("{}/{}", self.data_base, path);
        tracing::debug!(url = %url, "Genshin Impact data request");

        let request = async {
            let response = self.http_client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Api(status.as_u16(), url.clone()));
            }
            Ok::<_, FetchError>(response.bytes().await?)
        };
        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            bytes = request => bytes?,
        };
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Parse(format!("{}: {}", url, e)))
    }

    async fn fetch(&self, game: &Game, cancel: &CancellationToken) -> Result<GameAchievements, FetchError> {
        let text_map_path = format!("TextMap/TextMap{}.json", text_map_language(&self.settings.language));
        let (text_map, achievements, goals) = tokio::try_join!(
            self.get_json::<HashMap<String, String>>(&text_map_path, cancel),
            self.get_json::<Vec<AchievementData>>("ExcelBinOutput/AchievementExcelConfigData.json", cancel),
            self.get_json::<Vec<AchievementGoal>>("ExcelBinOutput/AchievementGoalExcelConfigData.json", cancel),
        )?;

        let items = build_records(&text_map, &achievements, &goals);
        let mut result = GameAchievements::from_items(game, NO_MATCH_ID, items);
        result.is_manual = true;
        if result.has_data {
            result = result.with_source_link(SourceLink {
                game_name: GAME_NAME.to_string(),
                provider_name: PROVIDER_NAME.to_string(),
                url: SOURCE_URL.to_string(),
            });
        }
        Ok(result)
    }
}

/// Join achievements with their texts and categories; nameless rows are dropped
pub fn build_records(
    text_map: &HashMap<String, String>,
    achievements: &[AchievementData],
    goals: &[AchievementGoal],
) -> Vec<AchievementRecord> {
    let text = |hash: Option<u64>| hash.and_then(|h| text_map.get(&h.to_string())).cloned();
    let categories: HashMap<u64, &AchievementGoal> =
        goals.iter().filter_map(|g| g.id.map(|id| (id, g))).collect();

    achievements
        .iter()
        .filter_map(|a| {
            let name = text(a.title_text_map_hash).filter(|n| !n.trim().is_empty())?;
            // Rows without goalId belong to goal 0
            let goal = categories.get(&a.goal_id.unwrap_or(0));
            let order = goal.and_then(|g| g.order_id).unwrap_or(0);
            Some(AchievementRecord {
                name,
                description: text(a.desc_text_map_hash).unwrap_or_default(),
                locked_icon_ref: ICON.to_string(),
                unlocked_icon_ref: ICON.to_string(),
                unlocked_at: None,
                rarity_percent: 100,
                api_name: Some(a.id.to_string()),
                category: goal.and_then(|g| text(g.name_text_map_hash)),
                category_order: Some(order),
                category_icon: Some(category_icon(order)),
            })
        })
        .collect()
}

#[async_trait]
impl SourceClient for GenshinImpactClient {
    fn name(&self) -> &'static str {
        "Genshin Impact"
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn enabled_in_settings(&self) -> bool {
        self.settings.enabled
    }

    fn supports(&self, game: &Game) -> bool {
        game.name.trim().eq_ignore_ascii_case(GAME_NAME)
    }

    async fn get_achievements(&self, game: &Game, cancel: &CancellationToken) -> GameAchievements {
        match self.fetch(game, cancel).await {
            Ok(result) => result,
            Err(FetchError::Cancelled) => GameAchievements::empty(game),
            Err(e) => {
                tracing::warn!(game = %game.name, error = %e, "Genshin Impact data fetch failed");
                GameAchievements::empty(game)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_map() -> HashMap<String, String> {
        [
            ("100", "Wonders of the World"),
            ("200", "Memories of the Heart"),
            ("1", "Onward and Upward"),
            ("2", "Reach Adventure Rank 5"),
            ("3", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_language_mapping() {
        assert_eq!(text_map_language("en_US"), "EN");
        assert_eq!(text_map_language("zh_CN"), "CHS");
        assert_eq!(text_map_language("ja_JP"), "JP");
        assert_eq!(text_map_language("xx_XX"), "EN");
    }

    #[test]
    fn test_build_records() {
        let achievements: Vec<AchievementData> = serde_json::from_str(
            r#"[
                {"id": 80001, "orderId": 1, "titleTextMapHash": 1, "descTextMapHash": 2},
                {"id": 80002, "goalId": 1, "titleTextMapHash": 3, "descTextMapHash": 2},
                {"id": 80003, "goalId": 1, "titleTextMapHash": 999},
                {"id": 80004, "goalId": 1, "titleTextMapHash": 2}
            ]"#,
        )
        .unwrap();
        let goals: Vec<AchievementGoal> =
            serde_json::from_str(r#"[{"nameTextMapHash": 100}, {"id": 0, "nameTextMapHash": 100}, {"id": 1, "orderId": 2, "nameTextMapHash": 200}]"#)
                .unwrap();

        let records = build_records(&text_map(), &achievements, &goals);
        assert_eq!(records.len(), 2);
        let record = &records[0];
        assert_eq!(record.name, "Onward and Upward");
        assert_eq!(record.description, "Reach Adventure Rank 5");
        assert_eq!(record.api_name.as_deref(), Some("80001"));
        assert_eq!(record.category.as_deref(), Some("Wonders of the World"));
        assert_eq!(record.rarity_percent, 100);
        assert!(!record.is_unlocked());
        // Goal 0 carries no orderId
        assert_eq!(record.category_order, Some(0));
        assert_eq!(record.category_icon.as_deref(), Some("GenshinImpact/ac_0.png"));
        assert_eq!(record.unlocked_icon_ref, "GenshinImpact/ac.png");

        let ordered = &records[1];
        assert_eq!(ordered.category.as_deref(), Some("Memories of the Heart"));
        assert_eq!(ordered.category_order, Some(2));
        assert_eq!(ordered.category_icon.as_deref(), Some("GenshinImpact/ac_2.png"));
    }

    #[test]
    fn test_supports_only_genshin() {
        let client = GenshinImpactClient::new(GenshinImpactSettings::default(), &NetworkConfig::default()).unwrap();
        assert!(client.supports(&Game::new("Genshin Impact")));
        assert!(client.supports(&Game::new("genshin impact ")));
        assert!(!client.supports(&Game::new("Honkai: Star Rail")));
        assert!(!client.enabled_in_settings());
    }
}
