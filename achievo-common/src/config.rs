//! Configuration loading and root folder resolution
//!
//! Settings come from one TOML file. Provider credentials may be overridden
//! through the environment; everything else is read from TOML or falls back
//! to built-in defaults.

use crate::models::RarityThresholds;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ACHIEVO_ROOT_FOLDER";
/// Environment variable holding the RetroAchievements user name
pub const RA_USER_ENV: &str = "ACHIEVO_RA_USER";
/// Environment variable holding the RetroAchievements web API key
pub const RA_API_KEY_ENV: &str = "ACHIEVO_RA_API_KEY";

/// Complete configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Folder holding cache and scratch data
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub retroachievements: RetroAchievementsSettings,
    pub genshin_impact: GenshinImpactSettings,
    pub cache: CacheConfig,
    pub network: NetworkConfig,
    pub rarity: RarityThresholds,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log file path (logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// RetroAchievements account and toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetroAchievementsSettings {
    pub enabled: bool,
    pub user: String,
    pub api_key: String,
}

impl Default for RetroAchievementsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            user: String::new(),
            api_key: String::new(),
        }
    }
}

impl RetroAchievementsSettings {
    pub fn has_credentials(&self) -> bool {
        is_valid_key(&self.user) && is_valid_key(&self.api_key)
    }
}

/// Genshin Impact curated data set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenshinImpactSettings {
    pub enabled: bool,
    /// Host language code, e.g. `en_US`
    pub language: String,
}

impl Default for GenshinImpactSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            language: "en_US".to_string(),
        }
    }
}

/// Reference cache policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of the content hash table in hours
    pub hash_table_ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            hash_table_ttl_hours: 72,
        }
    }
}

impl CacheConfig {
    pub fn hash_table_ttl(&self) -> Duration {
        Duration::from_secs(self.hash_table_ttl_hours * 3600)
    }
}

/// Outbound HTTP behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Upper bound on concurrent sub-fetches
    pub max_concurrent_requests: usize,
    /// Minimum spacing between requests to one provider, in milliseconds
    pub min_request_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_concurrent_requests: 4,
            min_request_interval_ms: 0,
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn concurrency(&self) -> usize {
        self.max_concurrent_requests.max(1)
    }
}

/// Validate key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Default config file location (`<config dir>/achievo/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("achievo").join("config.toml"))
}

/// Load configuration from a TOML file
pub fn load_toml_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration, using defaults when the file does not exist
pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => return Ok(AppConfig::default()),
    };

    if path.exists() {
        info!("Loading configuration from {}", path.display());
        load_toml_config(&path)
    } else {
        info!("No configuration at {}, using defaults", path.display());
        Ok(AppConfig::default())
    }
}

/// Write configuration atomically (temp file + rename)
///
/// The file holds credentials, so on Unix it is created with mode 0600.
pub fn write_toml_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &AppConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("achievo"))
        .unwrap_or_else(|| PathBuf::from("./achievo_data"))
}

/// Directory layout under the root folder
#[derive(Debug, Clone)]
pub struct RootFolder {
    root: PathBuf,
}

impl RootFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Reference datasets
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Parent of per-call archive extraction directories
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join("scratch")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.cache_dir())?;
        std::fs::create_dir_all(self.scratch_dir())?;
        Ok(())
    }
}

/// Resolve RetroAchievements credentials
///
/// **Priority:** ENV → TOML. Both the user and the key must come from the
/// same tier.
pub fn resolve_retroachievements_settings(config: &AppConfig) -> RetroAchievementsSettings {
    let toml_settings = &config.retroachievements;
    let env_user = std::env::var(RA_USER_ENV).ok().filter(|v| is_valid_key(v));
    let env_key = std::env::var(RA_API_KEY_ENV).ok().filter(|v| is_valid_key(v));

    match (env_user, env_key) {
        (Some(user), Some(api_key)) => {
            if toml_settings.has_credentials() {
                warn!("RetroAchievements credentials found in environment and TOML. Using environment.");
            }
            info!("RetroAchievements credentials loaded from environment");
            RetroAchievementsSettings {
                enabled: toml_settings.enabled,
                user,
                api_key,
            }
        }
        (user, key) => {
            if user.is_some() != key.is_some() {
                warn!(
                    "Incomplete RetroAchievements credentials in environment ({} and {} must both be set)",
                    RA_USER_ENV, RA_API_KEY_ENV
                );
            }
            if toml_settings.has_credentials() {
                info!("RetroAchievements credentials loaded from TOML config");
            }
            toml_settings.clone()
        }
    }
}
