//! RetroAchievements response payloads
//!
//! The web API is loose with types: integers arrive as numbers or strings,
//! and keyed collections become `[]` when empty. These structs absorb both.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// `API_GetConsoleIDs.php` row
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaConsole {
    #[serde(rename = "ID", deserialize_with = "lenient_u32")]
    pub id: u32,
    pub name: String,
}

/// `API_GetGameList.php` row
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaGame {
    #[serde(rename = "ID", deserialize_with = "lenient_u32")]
    pub id: u32,
    pub title: String,
    #[serde(rename = "ConsoleID", default, deserialize_with = "lenient_u32")]
    pub console_id: u32,
}

/// `dorequest.php?r=hashlibrary` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaHashLibrary {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "MD5List", default, deserialize_with = "map_or_empty_list")]
    pub md5_list: BTreeMap<String, LenientU32>,
}

/// `API_GetGameInfoAndUserProgress.php` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaGameProgress {
    #[serde(rename = "ID", default, deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub console_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub num_distinct_players_casual: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub num_distinct_players: Option<u32>,
    #[serde(default, deserialize_with = "achievement_collection")]
    pub achievements: Vec<RaAchievement>,
}

impl RaGameProgress {
    /// Player count used as the rarity denominator
    pub fn player_count(&self) -> u32 {
        self.num_distinct_players_casual
            .or(self.num_distinct_players)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaAchievement {
    #[serde(rename = "ID", default, deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub badge_name: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub num_awarded: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub display_order: u32,
    #[serde(default)]
    pub date_earned: Option<String>,
}

/// Integer that may be encoded as a JSON string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LenientU32 {
    Number(u32),
    Text(String),
}

impl LenientU32 {
    pub fn value(&self) -> Option<u32> {
        match self {
            LenientU32::Number(n) => Some(*n),
            LenientU32::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient_opt_u32(deserializer)?.unwrap_or(0))
}

fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw: Option<LenientU32> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.value()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapOrList<T> {
    Map(BTreeMap<String, T>),
    List(Vec<T>),
}

fn map_or_empty_list<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw: Option<MapOrList<T>> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(MapOrList::Map(map)) => map,
        Some(MapOrList::List(_)) | None => BTreeMap::new(),
    })
}

/// Achievements keyed by id, or a plain array
fn achievement_collection<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RaAchievement>, D::Error> {
    let raw: Option<MapOrList<RaAchievement>> = Option::deserialize(deserializer)?;
    let mut items = match raw {
        Some(MapOrList::Map(map)) => map.into_values().collect(),
        Some(MapOrList::List(list)) => list,
        None => Vec::new(),
    };
    items.sort_by_key(|a| (a.display_order, a.id));
    Ok(items)
}
