//! Multi-provider orchestration with real clients
//!
//! The Genshin Impact data dump and the RetroAchievements API are both served
//! by local fake servers.

mod helpers;

use achievo_common::config::GenshinImpactSettings;
use achievo_common::Game;
use achievo_core::clients::genshin_impact::GenshinImpactClient;
use achievo_core::{AchievementService, SourceClient};
use helpers::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn genshin_settings() -> GenshinImpactSettings {
    GenshinImpactSettings {
        enabled: true,
        language: "ja_JP".to_string(),
    }
}

async fn mount_genshin_dump(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/TextMap/TextMapJP.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "10": "天地万象",
            "1": "冒険の始まり",
            "2": "冒険ランク5に到達する"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ExcelBinOutput/AchievementExcelConfigData.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 80001, "titleTextMapHash": 1, "descTextMapHash": 2},
            {"id": 80002, "titleTextMapHash": 404}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ExcelBinOutput/AchievementGoalExcelConfigData.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 0, "nameTextMapHash": 10}])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_genshin_dump_becomes_manual_records() {
    let server = MockServer::start().await;
    mount_genshin_dump(&server).await;

    let client = GenshinImpactClient::with_data_base(genshin_settings(), &network(5), &server.uri()).unwrap();
    let result = client
        .get_achievements(&Game::new("Genshin Impact"), &CancellationToken::new())
        .await;

    assert!(result.has_data);
    assert!(result.is_manual);
    assert_eq!(result.total, 1);
    assert_eq!(result.unlocked_count, 0);
    assert_eq!(result.items[0].name, "冒険の始まり");
    assert_eq!(result.items[0].category.as_deref(), Some("天地万象"));
    assert_eq!(result.items[0].category_icon.as_deref(), Some("GenshinImpact/ac_0.png"));
    assert_eq!(result.source_link.unwrap().provider_name, "GitHub");
}

#[tokio::test]
async fn test_genshin_missing_document_degrades() {
    let server = MockServer::start().await;
    // Only the text map exists
    Mock::given(method("GET"))
        .and(path("/TextMap/TextMapJP.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = GenshinImpactClient::with_data_base(genshin_settings(), &network(5), &server.uri()).unwrap();
    let result = client
        .get_achievements(&Game::new("Genshin Impact"), &CancellationToken::new())
        .await;

    assert!(!result.has_data);
    assert!(result.source_link.is_none());
}

#[tokio::test]
async fn test_service_routes_each_game_to_its_provider() {
    let ra_server = MockServer::start().await;
    let genshin_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_consoles(&ra_server, json!([{"ID": 3, "Name": "SNES"}]), 1).await;
    mount_game_list(&ra_server, 3, json!([{"ID": 228, "Title": "Super Mario World"}]), 1).await;
    mount_progress(
        &ra_server,
        228,
        ResponseTemplate::new(200).set_body_json(progress_body(228, "Super Mario World")),
    )
    .await;
    mount_genshin_dump(&genshin_server).await;

    let retro: Arc<dyn SourceClient> = Arc::new(ra_client(&ra_server, dir.path(), 5));
    let genshin: Arc<dyn SourceClient> = Arc::new(
        GenshinImpactClient::with_data_base(genshin_settings(), &network(5), &genshin_server.uri()).unwrap(),
    );
    let service = AchievementService::new(vec![retro, genshin], 2);

    let games = vec![
        Game::new("Super Mario World").with_platform("SNES"),
        Game::new("Genshin Impact"),
        Game::new("Unknown Game"),
    ];
    let results = service.fetch_library(&games, &CancellationToken::new()).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].catalog_game_id, 228);
    assert!(!results[0].is_manual);
    assert!(results[1].is_manual);
    assert_eq!(results[1].total, 1);
    assert!(!results[2].has_data);
    assert_eq!(results[2].game_name, "Unknown Game");
}
