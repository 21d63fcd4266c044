//! # achievo common library
//!
//! Shared code for the achievo crates:
//! - Data model (games, achievement records, per-game aggregates)
//! - Error type
//! - Configuration loading
//! - Logging bootstrap

pub mod config;
pub mod error;
pub mod logging;
pub mod models;

pub use error::{Error, Result};
pub use models::{AchievementRecord, Game, GameAchievements, SourceLink, NO_MATCH_ID};
