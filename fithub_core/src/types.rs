//! Core domain types for the FitHub progress engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout records (exercises and sets) as logged by users
//! - Derived per-user statistics
//! - Badges and their categories
//! - Leaderboard metrics and entries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Workout Records
// ============================================================================

/// Kind of set as tagged by the user when logging
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SetKind {
    #[default]
    Normal,
    WarmUp,
    DropSet,
    Failure,
}

/// A single logged set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    pub reps: i32,
    /// Load in kilograms; `None` for bodyweight sets
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub kind: SetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
}

impl SetEntry {
    /// A normal set with the given reps and optional load
    pub fn new(reps: i32, weight_kg: Option<f64>) -> Self {
        Self {
            reps,
            weight_kg,
            kind: SetKind::Normal,
            duration_seconds: None,
            distance_meters: None,
        }
    }

    /// Training volume contributed by this set (reps x load)
    pub fn volume(&self) -> f64 {
        f64::from(self.reps) * self.weight_kg.unwrap_or(0.0)
    }
}

/// An exercise within a workout (e.g., "Bench Press" with its sets)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A logged workout. Owned by the workout log; read-only to the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ============================================================================
// Derived Statistics
// ============================================================================

/// Per-user statistics, always rebuildable from the user's workout records
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    pub total_workouts: u32,
    pub total_volume_lifted_kg: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_workout_date: Option<NaiveDate>,
    pub weekly_workouts: u32,
    pub monthly_workouts: u32,
    pub average_workouts_per_week: f64,
    /// Exercise name -> heaviest single set ever logged (kg)
    pub personal_records: BTreeMap<String, f64>,
    /// Sum of workout durations in minutes
    pub total_workout_duration: u64,
    pub favorite_exercises: Vec<String>,
}

// ============================================================================
// Badges
// ============================================================================

/// Badge grouping shown in the UI
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Consistency,
    Strength,
    Milestone,
    Achievement,
}

impl std::fmt::Display for BadgeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BadgeCategory::Consistency => "consistency",
            BadgeCategory::Strength => "strength",
            BadgeCategory::Milestone => "milestone",
            BadgeCategory::Achievement => "achievement",
        };
        f.write_str(label)
    }
}

/// An earned badge. Appended once to a user's profile and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Badge {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub earned_at: DateTime<Utc>,
}

// ============================================================================
// Users and Leaderboards
// ============================================================================

/// Public-facing identity shown next to leaderboard entries
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDisplay {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Input row for the leaderboard ranker
#[derive(Clone, Debug)]
pub struct RankedUser {
    pub display: UserDisplay,
    pub stats: UserStats,
    pub badge_count: usize,
}

/// Statistic a leaderboard is ordered by
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    CurrentStreak,
    TotalVolume,
    TotalWorkouts,
    LongestStreak,
}

impl LeaderboardMetric {
    /// Read this metric out of a user's stats
    pub fn value_of(&self, stats: &UserStats) -> MetricValue {
        match self {
            LeaderboardMetric::CurrentStreak => MetricValue::Count(stats.current_streak),
            LeaderboardMetric::TotalVolume => MetricValue::Kilograms(stats.total_volume_lifted_kg),
            LeaderboardMetric::TotalWorkouts => MetricValue::Count(stats.total_workouts),
            LeaderboardMetric::LongestStreak => MetricValue::Count(stats.longest_streak),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeaderboardMetric::CurrentStreak => "Current streak",
            LeaderboardMetric::TotalVolume => "Total volume (kg)",
            LeaderboardMetric::TotalWorkouts => "Total workouts",
            LeaderboardMetric::LongestStreak => "Longest streak",
        }
    }
}

/// Value of a leaderboard metric for one user
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u32),
    Kilograms(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Count(n) => f64::from(*n),
            MetricValue::Kilograms(kg) => *kg,
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Kilograms(kg) => write!(f, "{:.1}", kg),
        }
    }
}

/// One row of a ranked leaderboard
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user: UserDisplay,
    pub metric_value: MetricValue,
    pub badge_count: usize,
}

/// The four community leaderboards served together
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Leaderboards {
    pub weekly_streaks: Vec<LeaderboardEntry>,
    pub total_volume: Vec<LeaderboardEntry>,
    pub total_workouts: Vec<LeaderboardEntry>,
    pub consistency: Vec<LeaderboardEntry>,
}
