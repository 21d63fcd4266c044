//! Configuration file loading
//!
//! Full and partial TOML files through the public loader, plus graceful
//! fallback when the file is absent.

use achievo_common::config::{load_or_default, load_toml_config, write_toml_config, AppConfig};
use achievo_common::models::RarityTier;
use std::path::PathBuf;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
root_folder = "/srv/achievo"

[logging]
level = "debug"
file = "/var/log/achievo.log"

[retroachievements]
enabled = true
user = "player"
api_key = "0123456789abcdef"

[genshin_impact]
enabled = true
language = "de_DE"

[cache]
hash_table_ttl_hours = 24

[network]
timeout_secs = 10
max_concurrent_requests = 8
min_request_interval_ms = 250

[rarity]
uncommon = 40
rare = 15
ultra_rare = 2
"#;

#[test]
fn test_full_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, FULL_CONFIG).unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/achievo")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/achievo.log")));
    assert!(config.retroachievements.has_credentials());
    assert!(config.genshin_impact.enabled);
    assert_eq!(config.genshin_impact.language, "de_DE");
    assert_eq!(config.cache.hash_table_ttl().as_secs(), 24 * 3600);
    assert_eq!(config.network.concurrency(), 8);
    assert_eq!(config.network.min_request_interval_ms, 250);
    assert_eq!(config.rarity.classify(1), RarityTier::UltraRare);
    assert_eq!(config.rarity.classify(10), RarityTier::Rare);
}

#[test]
fn test_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_or_default(Some(&temp_dir.path().join("missing.toml"))).unwrap();

    assert!(config.root_folder.is_none());
    assert!(!config.retroachievements.has_credentials());
    assert_eq!(config.cache.hash_table_ttl_hours, 72);
}

#[test]
fn test_written_config_reloads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    let mut config = AppConfig::default();
    config.network.timeout_secs = 5;
    config.genshin_impact.enabled = true;
    write_toml_config(&config, &path).unwrap();

    let reloaded = load_or_default(Some(&path)).unwrap();
    assert_eq!(reloaded.network.timeout_secs, 5);
    assert!(reloaded.genshin_impact.enabled);
}
