//! achievo core library
//!
//! Resolves local games to provider catalog entries and fetches their
//! achievements:
//! - [`hashing`] content identity hashes of ROM/disc images
//! - [`cache`] on-disk reference dataset cache
//! - [`resolver`] hash, console and title matching
//! - [`clients`] provider implementations of [`types::SourceClient`]
//! - [`normalizer`] provider payloads to [`achievo_common::AchievementRecord`]
//! - [`service`] multi-provider orchestration

pub mod cache;
pub mod catalog;
pub mod clients;
pub mod filters;
pub mod hashing;
pub mod normalizer;
pub mod resolver;
pub mod service;
pub mod types;

pub use service::AchievementService;
pub use types::{FetchError, SourceClient};
