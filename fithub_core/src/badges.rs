//! Badge evaluation.
//!
//! The evaluator is a pure function of stats, history and the set of badge
//! names the user already holds. It never persists anything; callers append
//! the returned badges to the user's profile (see [`crate::profile`]).

use crate::catalog::BadgeCatalog;
use crate::{Badge, UserStats, WorkoutRecord};
use chrono::{DateTime, Local, Utc};
use std::collections::HashSet;

/// Checks a user's stats against a badge catalog
#[derive(Clone, Copy, Debug)]
pub struct BadgeEvaluator<'a> {
    catalog: &'a BadgeCatalog,
}

impl<'a> BadgeEvaluator<'a> {
    pub fn new(catalog: &'a BadgeCatalog) -> Self {
        Self { catalog }
    }

    /// Evaluate using the wall clock for `earned_at` and the current week
    pub fn evaluate(
        &self,
        stats: &UserStats,
        records: &[WorkoutRecord],
        already_earned: &HashSet<String>,
    ) -> Vec<Badge> {
        self.evaluate_at(stats, records, already_earned, Utc::now())
    }

    /// Return the badges that newly qualify at `now`, in catalog order
    ///
    /// Definitions whose name is in `already_earned` are skipped, so feeding
    /// the result back in yields nothing on the next call.
    pub fn evaluate_at(
        &self,
        stats: &UserStats,
        records: &[WorkoutRecord],
        already_earned: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Vec<Badge> {
        let today = now.with_timezone(&Local).date_naive();

        let earned: Vec<Badge> = self
            .catalog
            .iter()
            .filter(|def| !already_earned.contains(&def.name))
            .filter(|def| def.is_satisfied(stats, records, today))
            .map(|def| Badge {
                name: def.name.clone(),
                description: def.description.clone(),
                icon: def.icon.clone(),
                category: def.category,
                earned_at: now,
            })
            .collect();

        if !earned.is_empty() {
            tracing::info!(
                "Newly qualified badges: {}",
                earned
                    .iter()
                    .map(|b| b.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        earned
    }
}

/// Message shown after a badge check
pub fn award_message(new_badges: usize) -> String {
    match new_badges {
        0 => "No new badges earned".to_string(),
        1 => "Congratulations! You earned 1 new badge!".to_string(),
        n => format!("Congratulations! You earned {} new badges!", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_default_catalog, BadgeDefinition};
    use crate::stats::compute_stats_as_of;
    use crate::{BadgeCategory, Exercise, SetEntry};
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    fn noon(date: NaiveDate) -> DateTime<Utc> {
        let local = Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
            .unwrap();
        local.with_timezone(&Utc)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn workout(date: NaiveDate, exercises: Vec<Exercise>) -> WorkoutRecord {
        WorkoutRecord {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            title: "Workout".into(),
            date,
            duration_minutes: 30,
            exercises,
            notes: None,
        }
    }

    fn names(badges: &[Badge]) -> Vec<&str> {
        badges.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn test_first_workout_awarded_once() {
        let catalog = build_default_catalog();
        let evaluator = BadgeEvaluator::new(&catalog);
        let today = d(2024, 1, 10);
        let records = vec![workout(today, vec![])];
        let stats = compute_stats_as_of(&records, today);

        let mut earned = HashSet::new();
        let first = evaluator.evaluate_at(&stats, &records, &earned, noon(today));
        assert_eq!(names(&first), vec!["First Workout"]);

        earned.extend(first.into_iter().map(|b| b.name));
        let second = evaluator.evaluate_at(&stats, &records, &earned, noon(today));
        assert!(second.is_empty());
    }

    #[test]
    fn test_volume_thresholds() {
        let catalog = build_default_catalog();
        let evaluator = BadgeEvaluator::new(&catalog);
        let today = d(2024, 1, 10);
        let records = vec![workout(
            today,
            vec![Exercise {
                name: "Leg Press".into(),
                sets: vec![SetEntry::new(100, Some(10.0))],
                notes: None,
            }],
        )];
        let stats = compute_stats_as_of(&records, today);
        assert_eq!(stats.total_volume_lifted_kg, 1000.0);

        let badges = evaluator.evaluate_at(&stats, &records, &HashSet::new(), noon(today));
        let got = names(&badges);
        assert!(got.contains(&"Iron Lifter"));
        assert!(!got.contains(&"Beast Mode"));
        assert!(got.contains(&"Personal Record"));
    }

    #[test]
    fn test_output_follows_catalog_order() {
        let catalog = build_default_catalog();
        let evaluator = BadgeEvaluator::new(&catalog);
        let stats = UserStats {
            total_workouts: 150,
            total_volume_lifted_kg: 60000.0,
            current_streak: 10,
            longest_streak: 40,
            total_workout_duration: 6000,
            ..UserStats::default()
        };

        let badges = evaluator.evaluate_at(&stats, &[], &HashSet::new(), Utc::now());
        assert_eq!(
            names(&badges),
            vec![
                "First Workout",
                "Consistency King",
                "Marathon Streaker",
                "Dedication Master",
                "Iron Lifter",
                "Beast Mode",
                "Strength Legend",
                "Time Master",
                "Endurance Champion",
            ]
        );
    }

    #[test]
    fn test_idempotent_over_union() {
        let catalog = build_default_catalog();
        let evaluator = BadgeEvaluator::new(&catalog);
        let today = d(2024, 3, 6);
        let records: Vec<_> = (0..8)
            .map(|i| {
                workout(
                    today - chrono::Duration::days(i),
                    vec![Exercise {
                        name: "Squat".into(),
                        sets: vec![SetEntry::new(5, Some(120.0)); 3],
                        notes: None,
                    }],
                )
            })
            .collect();
        let stats = compute_stats_as_of(&records, today);
        let now = noon(today);

        let mut earned: HashSet<String> = ["First Workout".to_string()].into_iter().collect();
        let first = evaluator.evaluate_at(&stats, &records, &earned, now);
        assert!(!first.is_empty());
        assert!(!names(&first).contains(&"First Workout"));

        earned.extend(first.iter().map(|b| b.name.clone()));
        assert!(evaluator.evaluate_at(&stats, &records, &earned, now).is_empty());
    }

    #[test]
    fn test_earned_at_is_evaluation_time() {
        let catalog = build_default_catalog();
        let evaluator = BadgeEvaluator::new(&catalog);
        let stats = UserStats {
            total_workouts: 1,
            ..UserStats::default()
        };
        let now = noon(d(2024, 5, 1));

        let badges = evaluator.evaluate_at(&stats, &[], &HashSet::new(), now);
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].earned_at, now);
        assert_eq!(badges[0].category, BadgeCategory::Milestone);
    }

    #[test]
    fn test_substituted_catalog() {
        let catalog = BadgeCatalog::new(vec![BadgeDefinition::new(
            "Always",
            "Always earned",
            "✅",
            BadgeCategory::Achievement,
            |_, _, _| true,
        )]);
        let evaluator = BadgeEvaluator::new(&catalog);

        let badges = evaluator.evaluate(&UserStats::default(), &[], &HashSet::new());
        assert_eq!(names(&badges), vec!["Always"]);
    }

    #[test]
    fn test_award_message() {
        assert_eq!(award_message(0), "No new badges earned");
        assert_eq!(award_message(1), "Congratulations! You earned 1 new badge!");
        assert_eq!(award_message(3), "Congratulations! You earned 3 new badges!");
    }
}
