//! Leaderboard ranking across the user population.
//!
//! Boards are computed fresh on every call from already-computed stats.
//! Sorting is stable: users with equal metric values keep their input order.

use crate::{LeaderboardEntry, LeaderboardMetric, Leaderboards, RankedUser};

/// Entries per board when no limit is configured
pub const DEFAULT_LIMIT: usize = 10;

/// Rank users by `metric`, highest first, keeping the top `limit`
pub fn rank(
    users: &[RankedUser],
    metric: LeaderboardMetric,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut ordered: Vec<&RankedUser> = users.iter().collect();
    // sort_by is stable, so ties keep input order
    ordered.sort_by(|a, b| {
        let a = metric.value_of(&a.stats).as_f64();
        let b = metric.value_of(&b.stats).as_f64();
        b.total_cmp(&a)
    });

    ordered
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, user)| LeaderboardEntry {
            rank: idx + 1,
            user: user.display.clone(),
            metric_value: metric.value_of(&user.stats),
            badge_count: user.badge_count,
        })
        .collect()
}

/// Build all four community boards at once
pub fn rank_all(users: &[RankedUser], limit: usize) -> Leaderboards {
    tracing::debug!("Ranking {} users (limit {})", users.len(), limit);

    Leaderboards {
        weekly_streaks: rank(users, LeaderboardMetric::CurrentStreak, limit),
        total_volume: rank(users, LeaderboardMetric::TotalVolume, limit),
        total_workouts: rank(users, LeaderboardMetric::TotalWorkouts, limit),
        consistency: rank(users, LeaderboardMetric::LongestStreak, limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetricValue, UserDisplay, UserStats, WorkoutRecord};

    fn user(name: &str, current_streak: u32) -> RankedUser {
        RankedUser {
            display: UserDisplay {
                name: name.into(),
                avatar_url: None,
            },
            stats: UserStats {
                current_streak,
                ..UserStats::default()
            },
            badge_count: 0,
        }
    }

    fn ranked_names(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.user.name.as_str()).collect()
    }

    #[test]
    fn test_top_n_with_stable_ties() {
        let users = vec![
            user("a", 3),
            user("b", 7),
            user("c", 1),
            user("d", 7),
            user("e", 5),
        ];

        let board = rank(&users, LeaderboardMetric::CurrentStreak, 3);
        assert_eq!(ranked_names(&board), vec!["b", "d", "e"]);
        assert_eq!(
            board.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(board[0].metric_value, MetricValue::Count(7));
        assert_eq!(board[2].metric_value, MetricValue::Count(5));
    }

    #[test]
    fn test_rerun_is_identical() {
        let users = vec![user("a", 2), user("b", 2), user("c", 9)];
        let first = rank(&users, LeaderboardMetric::CurrentStreak, DEFAULT_LIMIT);
        let second = rank(&users, LeaderboardMetric::CurrentStreak, DEFAULT_LIMIT);
        assert_eq!(first, second);
        assert_eq!(ranked_names(&first), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_empty_population() {
        assert!(rank(&[], LeaderboardMetric::TotalVolume, 10).is_empty());
        assert_eq!(rank_all(&[], 10), Leaderboards::default());
    }

    #[test]
    fn test_volume_board_uses_kilograms() {
        let mut heavy = user("heavy", 0);
        heavy.stats.total_volume_lifted_kg = 12500.5;
        heavy.badge_count = 4;
        let mut light = user("light", 0);
        light.stats.total_volume_lifted_kg = 800.0;

        let board = rank(&[light, heavy], LeaderboardMetric::TotalVolume, 10);
        assert_eq!(ranked_names(&board), vec!["heavy", "light"]);
        assert_eq!(board[0].metric_value, MetricValue::Kilograms(12500.5));
        assert_eq!(board[0].badge_count, 4);
    }

    #[test]
    fn test_zero_volume_ties_keep_input_order() {
        // Logged a workout with no sets vs. never logged anything
        let set_less = vec![WorkoutRecord {
            id: uuid::Uuid::new_v4(),
            user_id: "active".into(),
            title: "Walk".into(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            duration_minutes: 30,
            exercises: vec![],
            notes: None,
        }];
        let mut active = user("active", 0);
        active.stats = crate::stats::compute_stats_as_of(&set_less, set_less[0].date);
        let idle = user("idle", 0);

        let board = rank(&[active, idle], LeaderboardMetric::TotalVolume, 10);
        assert_eq!(ranked_names(&board), vec!["active", "idle"]);

        let json = serde_json::to_string(&board[0].metric_value).unwrap();
        assert_eq!(json, "0.0");
    }

    #[test]
    fn test_rank_all_covers_each_metric() {
        let mut veteran = user("veteran", 1);
        veteran.stats.longest_streak = 40;
        veteran.stats.total_workouts = 200;
        let mut streaker = user("streaker", 12);
        streaker.stats.longest_streak = 12;
        streaker.stats.total_workouts = 20;

        let users = vec![veteran, streaker];
        let boards = rank_all(&users, 1);
        assert_eq!(ranked_names(&boards.weekly_streaks), vec!["streaker"]);
        assert_eq!(ranked_names(&boards.consistency), vec!["veteran"]);
        assert_eq!(ranked_names(&boards.total_workouts), vec!["veteran"]);
        assert_eq!(boards.total_volume.len(), 1);
        // Input untouched
        assert_eq!(users[0].display.name, "veteran");
    }
}
