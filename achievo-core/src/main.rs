//! achievo - achievement lookup for a local game library
//!
//! Subcommands:
//! - `resolve` fetch achievements for one game and print them with a rarity
//!   summary as JSON
//! - `consoles` list the RetroAchievements console catalog
//! - `hash` print every identity hash of a ROM or archive
//! - `clear-cache` delete cached reference datasets

use std::path::PathBuf;

use achievo_common::config::{self, RootFolder};
use achievo_common::models::{GameAchievements, RarityThresholds, RaritySummary};
use achievo_common::Game;
use achievo_core::cache::ReferenceCache;
use achievo_core::catalog::ReferenceCatalog;
use achievo_core::clients::retroachievements::RetroAchievementsClient;
use achievo_core::hashing::{self, archive::HashSource};
use achievo_core::AchievementService;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Command-line arguments for achievo
#[derive(Parser, Debug)]
#[command(name = "achievo")]
#[command(about = "Achievement identity resolution and lookup")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder for cache and scratch data
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch achievements for one game
    Resolve {
        /// Game name
        name: String,

        /// Platform name, repeatable
        #[arg(short, long)]
        platform: Vec<String>,

        /// Local ROM or archive, repeatable
        #[arg(long)]
        rom: Vec<PathBuf>,
    },

    /// List the RetroAchievements console catalog
    Consoles,

    /// Print identity hashes of a file for every transform
    Hash {
        path: PathBuf,
    },

    /// Delete cached reference datasets
    ClearCache,
}

/// `resolve` output: the aggregate plus per-tier counts
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveReport<'a> {
    #[serde(flatten)]
    achievements: &'a GameAchievements,
    rarity_summary: RaritySummary,
}

impl<'a> ResolveReport<'a> {
    fn new(achievements: &'a GameAchievements, thresholds: &RarityThresholds) -> Self {
        Self {
            achievements,
            rarity_summary: achievements.rarity_summary(thresholds),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(config::default_config_path);
    let app_config = config::load_or_default(config_path.as_deref()).context("Failed to load configuration")?;
    achievo_common::logging::init_tracing(&app_config.logging).context("Failed to initialize logging")?;

    info!(
        "achievo {} ({} {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );

    let root = RootFolder::new(config::resolve_root_folder(args.root_folder.as_deref(), &app_config));
    root.ensure_directories().context("Failed to initialize root folder")?;
    info!("Root folder: {}", root.path().display());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling");
            trigger.cancel();
        }
    });

    match args.command {
        Command::Resolve { name, platform, rom } => {
            let game = platform
                .into_iter()
                .fold(Game::new(name), |g, p| g.with_platform(p));
            let game = rom.into_iter().fold(game, |g, r| g.with_rom(r));

            let service = AchievementService::from_config(&app_config, &root)?;
            let achievements = service.fetch(&game, &cancel).await?;
            let report = ResolveReport::new(&achievements, &app_config.rarity);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Consoles => {
            let client = RetroAchievementsClient::from_config(&app_config, &root)?;
            let consoles = client.catalog().consoles(&cancel).await?;
            for console in consoles.entries() {
                println!("{:>4}  {}", console.id, console.name);
            }
        }
        Command::Hash { path } => {
            let scratch = root.scratch_dir();
            let hashes = tokio::task::spawn_blocking(move || {
                let source = HashSource::prepare(&path, &scratch)?;
                hashing::compute_all(source.path())
            })
            .await??;
            for (transform, hash) in hashes {
                println!("{:<16}{}", transform.label(), hash);
            }
        }
        Command::ClearCache => {
            let cache = ReferenceCache::new(root.cache_dir(), app_config.cache.hash_table_ttl());
            let removed = cache.clear().await?;
            println!("Removed {} cache file(s) from {}", removed, cache.dir().display());
        }
    }

    Ok(())
}
