#![forbid(unsafe_code)]

//! Core domain model and progress engine for FitHub.
//!
//! This crate provides:
//! - Domain types (workouts, stats, badges, leaderboard entries)
//! - Stats engine (volume, streaks, personal records)
//! - Badge catalog and evaluator
//! - Leaderboard ranking
//! - Persistence (workout WAL, CSV archive, user profiles)

pub mod types;
pub mod error;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod stats;
pub mod badges;
pub mod leaderboard;
pub mod wal;
pub mod csv_rollup;
pub mod history;
pub mod profile;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, BadgeCatalog, BadgeDefinition};
pub use config::Config;
pub use stats::{compute_stats, compute_stats_as_of};
pub use badges::{award_message, BadgeEvaluator};
pub use leaderboard::{rank, rank_all};
pub use wal::{JsonlSink, WorkoutSink};
pub use history::{load_all_workouts, load_user_workouts};
pub use profile::UserProfile;
