//! Test Helper Utilities
//!
//! Shared fixtures for the achievo-core integration tests: a fake
//! RetroAchievements server and client wiring against it.

#![allow(dead_code)]

use achievo_common::config::{NetworkConfig, RetroAchievementsSettings};
use achievo_core::cache::ReferenceCache;
use achievo_core::clients::retroachievements::{RetroAchievementsClient, RetroAchievementsEndpoints};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER: &str = "tester";
pub const API_KEY: &str = "secret-key";

pub fn settings() -> RetroAchievementsSettings {
    RetroAchievementsSettings {
        enabled: true,
        user: USER.to_string(),
        api_key: API_KEY.to_string(),
    }
}

pub fn network(timeout_secs: u64) -> NetworkConfig {
    NetworkConfig {
        timeout_secs,
        max_concurrent_requests: 4,
        min_request_interval_ms: 0,
    }
}

/// Client talking to `server`, caching under `root`
pub fn ra_client(server: &MockServer, root: &Path, timeout_secs: u64) -> RetroAchievementsClient {
    RetroAchievementsClient::new(
        settings(),
        RetroAchievementsEndpoints::with_root(&server.uri()),
        &network(timeout_secs),
        ReferenceCache::new(root.join("cache"), Duration::from_secs(72 * 3600)),
        root.join("scratch"),
    )
    .expect("client")
}

pub async fn mount_consoles(server: &MockServer, consoles: Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/API/API_GetConsoleIDs.php"))
        .and(query_param("z", USER))
        .and(query_param("y", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(consoles))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn mount_game_list(server: &MockServer, console_id: u32, games: Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/API/API_GetGameList.php"))
        .and(query_param("i", console_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(games))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn mount_hash_library(server: &MockServer, console_id: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path("/dorequest.php"))
        .and(query_param("r", "hashlibrary"))
        .and(query_param("c", console_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_progress(server: &MockServer, game_id: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/API/API_GetGameInfoAndUserProgress.php"))
        .and(query_param("g", game_id.to_string()))
        .and(query_param("u", USER))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Progress payload with two achievements, one earned
pub fn progress_body(game_id: u32, title: &str) -> Value {
    json!({
        "ID": game_id,
        "Title": title,
        "NumDistinctPlayersCasual": "400",
        "Achievements": {
            "2": {"ID": "2", "Title": "Second", "Description": "b", "BadgeName": "00002", "NumAwarded": "40", "DisplayOrder": "2"},
            "1": {"ID": "1", "Title": "First", "Description": "a", "BadgeName": "00001", "NumAwarded": "300", "DisplayOrder": "1",
                  "DateEarned": "2022-05-01 12:00:00"}
        }
    })
}

/// Zip holding one file
pub fn write_zip(archive: &Path, entry_name: &str, data: &[u8]) {
    let file = std::fs::File::create(archive).expect("create zip");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file(entry_name, options).expect("start entry");
    zip.write_all(data).expect("write entry");
    zip.finish().expect("finish zip");
}
