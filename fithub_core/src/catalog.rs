//! Built-in badge catalog.
//!
//! This module only knows about domain value types. Both the evaluator and the
//! definitions listing read the catalog by reference, and tests can build
//! their own [`BadgeCatalog`] to substitute for the default one.

use crate::calendar;
use crate::types::*;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Predicate deciding whether a badge is earned.
///
/// Receives the freshly computed stats, the user's full workout history and
/// the evaluation date.
pub type BadgePredicate = fn(&UserStats, &[WorkoutRecord], NaiveDate) -> bool;

/// Static description of an earnable badge
#[derive(Clone, Debug)]
pub struct BadgeDefinition {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub predicate: BadgePredicate,
}

impl BadgeDefinition {
    pub fn new(
        name: &str,
        description: &str,
        icon: &str,
        category: BadgeCategory,
        predicate: BadgePredicate,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            icon: icon.into(),
            category,
            predicate,
        }
    }

    /// Evaluate the predicate for one user
    pub fn is_satisfied(
        &self,
        stats: &UserStats,
        records: &[WorkoutRecord],
        today: NaiveDate,
    ) -> bool {
        (self.predicate)(stats, records, today)
    }
}

/// Ordered list of badge definitions. Declaration order is evaluation order.
#[derive(Clone, Debug, Default)]
pub struct BadgeCatalog {
    definitions: Vec<BadgeDefinition>,
}

impl BadgeCatalog {
    pub fn new(definitions: Vec<BadgeDefinition>) -> Self {
        Self { definitions }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BadgeDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&BadgeDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Check catalog invariants, returning one message per problem found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for def in &self.definitions {
            if def.name.trim().is_empty() {
                errors.push("Badge definition with empty name".to_string());
            }
            if !seen.insert(def.name.as_str()) {
                errors.push(format!("Duplicate badge name: {}", def.name));
            }
            if def.icon.is_empty() {
                errors.push(format!("Badge {} has no icon", def.name));
            }
        }

        errors
    }
}

/// Cached default catalog, built once per process
static DEFAULT_CATALOG: Lazy<BadgeCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static BadgeCatalog {
    &DEFAULT_CATALOG
}

/// Number of workouts needed inside one week for "Week Warrior"
pub const WEEK_WARRIOR_WORKOUTS: usize = 3;

/// Builds the default badge catalog
pub fn build_default_catalog() -> BadgeCatalog {
    BadgeCatalog::new(vec![
        // Consistency
        BadgeDefinition::new(
            "First Workout",
            "Completed your first workout",
            "🎯",
            BadgeCategory::Milestone,
            |stats, _, _| stats.total_workouts >= 1,
        ),
        BadgeDefinition::new(
            "Week Warrior",
            "Worked out 3 times in a week",
            "⚡",
            BadgeCategory::Consistency,
            |_, records, today| {
                records
                    .iter()
                    .filter(|r| calendar::same_iso_week(r.date, today))
                    .count()
                    >= WEEK_WARRIOR_WORKOUTS
            },
        ),
        BadgeDefinition::new(
            "Consistency King",
            "Maintained a 7-day workout streak",
            "👑",
            BadgeCategory::Consistency,
            |stats, _, _| stats.current_streak >= 7,
        ),
        BadgeDefinition::new(
            "Marathon Streaker",
            "Maintained a 30-day workout streak",
            "🔥",
            BadgeCategory::Consistency,
            |stats, _, _| stats.longest_streak >= 30,
        ),
        BadgeDefinition::new(
            "Dedication Master",
            "Completed 100 total workouts",
            "💎",
            BadgeCategory::Milestone,
            |stats, _, _| stats.total_workouts >= 100,
        ),
        // Strength
        BadgeDefinition::new(
            "Iron Lifter",
            "Lifted 1,000kg total volume",
            "🏋️",
            BadgeCategory::Strength,
            |stats, _, _| stats.total_volume_lifted_kg >= 1000.0,
        ),
        BadgeDefinition::new(
            "Beast Mode",
            "Lifted 10,000kg total volume",
            "🦍",
            BadgeCategory::Strength,
            |stats, _, _| stats.total_volume_lifted_kg >= 10000.0,
        ),
        BadgeDefinition::new(
            "Strength Legend",
            "Lifted 50,000kg total volume",
            "⚡",
            BadgeCategory::Strength,
            |stats, _, _| stats.total_volume_lifted_kg >= 50000.0,
        ),
        BadgeDefinition::new(
            "Personal Record",
            "Set a new personal record",
            "🎖️",
            BadgeCategory::Achievement,
            |stats, _, _| !stats.personal_records.is_empty(),
        ),
        // Time
        BadgeDefinition::new(
            "Time Master",
            "Completed 1,000 minutes of workouts",
            "⏰",
            BadgeCategory::Milestone,
            |stats, _, _| stats.total_workout_duration >= 1000,
        ),
        BadgeDefinition::new(
            "Endurance Champion",
            "Completed 5,000 minutes of workouts",
            "🏃",
            BadgeCategory::Milestone,
            |stats, _, _| stats.total_workout_duration >= 5000,
        ),
    ])
}
