//! Stats engine: derives [`UserStats`] from a user's workout history.
//!
//! Stats are never updated incrementally. Every call recomputes everything
//! from the full record set, so the result only depends on the records passed
//! in and the evaluation date.
//!
//! ## Streaks
//!
//! A streak tolerates up to [`STREAK_GAP_TOLERANCE_DAYS`] days between
//! consecutive workouts so rest days do not break it. Dates are walked one
//! entry per record: two workouts on the same day form a 0-day gap, which
//! keeps the run alive and adds one to it.

use crate::calendar;
use crate::{UserStats, WorkoutRecord};
use chrono::{Local, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Largest gap in days between two workouts that still continues a streak
pub const STREAK_GAP_TOLERANCE_DAYS: i64 = 2;

/// How many names `favorite_exercises` reports
pub const FAVORITE_EXERCISE_COUNT: usize = 3;

/// Current and longest streak for a history
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
}

/// Compute stats as of today's local date
pub fn compute_stats(records: &[WorkoutRecord]) -> UserStats {
    compute_stats_as_of(records, Local::now().date_naive())
}

/// Compute stats as of a given date
///
/// Records may arrive in any order. Empty input yields zero-valued stats with
/// no last workout date.
pub fn compute_stats_as_of(records: &[WorkoutRecord], today: NaiveDate) -> UserStats {
    if records.is_empty() {
        return UserStats::default();
    }

    let streak = calculate_streak(records, today);
    let total_workouts = records.len() as u32;

    let stats = UserStats {
        total_workouts,
        total_volume_lifted_kg: calculate_total_volume(records),
        current_streak: streak.current,
        longest_streak: streak.longest,
        last_workout_date: records.iter().map(|r| r.date).max(),
        weekly_workouts: count_where(records, |d| calendar::same_iso_week(d, today)),
        monthly_workouts: count_where(records, |d| calendar::same_month(d, today)),
        average_workouts_per_week: average_per_week(records, today),
        personal_records: calculate_personal_records(records),
        total_workout_duration: records.iter().map(|r| u64::from(r.duration_minutes)).sum(),
        favorite_exercises: favorite_exercises(records, FAVORITE_EXERCISE_COUNT),
    };

    tracing::debug!(
        "Computed stats: {} workouts, {:.1} kg, streak {}/{}",
        stats.total_workouts,
        stats.total_volume_lifted_kg,
        stats.current_streak,
        stats.longest_streak
    );

    stats
}

/// Sum of reps x weight over every set of every exercise
///
/// Unweighted sets contribute nothing, as do exercises without sets. An
/// empty history totals `+0.0`, matching users with no workouts at all.
pub fn calculate_total_volume(records: &[WorkoutRecord]) -> f64 {
    records
        .iter()
        .flat_map(|r| &r.exercises)
        .flat_map(|e| &e.sets)
        .fold(0.0, |total, s| total + s.volume())
}

/// Compute current and longest streak as of `today`
pub fn calculate_streak(records: &[WorkoutRecord], today: NaiveDate) -> Streak {
    if records.is_empty() {
        return Streak::default();
    }

    // Most recent first
    let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    let within_tolerance = |later: NaiveDate, earlier: NaiveDate| {
        calendar::days_between(later, earlier) <= STREAK_GAP_TOLERANCE_DAYS
    };

    let mut current = 0;
    if within_tolerance(today, dates[0]) {
        current = 1;
        for pair in dates.windows(2) {
            if within_tolerance(pair[0], pair[1]) {
                current += 1;
            } else {
                break;
            }
        }
    }

    let mut longest = 1;
    let mut run = 1;
    for pair in dates.windows(2) {
        if within_tolerance(pair[0], pair[1]) {
            run += 1;
        } else {
            longest = longest.max(run);
            run = 1;
        }
    }
    longest = longest.max(run).max(current);

    Streak { current, longest }
}

/// Heaviest single set per exercise name
///
/// Each exercise occurrence offers its heaviest set (unweighted sets count as
/// 0). A name only gets an entry once some set beats 0 kg, so bodyweight-only
/// exercises never appear.
pub fn calculate_personal_records(records: &[WorkoutRecord]) -> BTreeMap<String, f64> {
    let mut records_by_name: BTreeMap<String, f64> = BTreeMap::new();

    for exercise in records.iter().flat_map(|r| &r.exercises) {
        let heaviest = exercise
            .sets
            .iter()
            .map(|s| s.weight_kg.unwrap_or(0.0))
            .fold(f64::NEG_INFINITY, f64::max);

        let best = records_by_name.get(&exercise.name).copied().unwrap_or(0.0);
        if heaviest > best {
            records_by_name.insert(exercise.name.clone(), heaviest);
        }
    }

    records_by_name
}

/// Most frequently logged exercise names, by number of workouts containing them
pub fn favorite_exercises(records: &[WorkoutRecord], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let mut names: Vec<&str> = record.exercises.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        for name in names {
            *counts.entry(name).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn count_where(records: &[WorkoutRecord], pred: impl Fn(NaiveDate) -> bool) -> u32 {
    records.iter().filter(|r| pred(r.date)).count() as u32
}

/// Workouts per week from the first logged workout up to `today`
fn average_per_week(records: &[WorkoutRecord], today: NaiveDate) -> f64 {
    let Some(first) = records.iter().map(|r| r.date).min() else {
        return 0.0;
    };
    let days = calendar::days_between(today, first).max(0) + 1;
    let weeks = (days as f64 / 7.0).max(1.0);
    records.len() as f64 / weeks
}
