//! Workout history loading.
//!
//! Loads records from both the live WAL and the CSV archive, so stats always
//! see a user's complete history regardless of when the last rollup ran.

use crate::csv_rollup::CsvRow;
use crate::{Error, Exercise, Result, SetEntry, WorkoutRecord};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use uuid::Uuid;

/// Load every workout from WAL and CSV
///
/// Returns records sorted by date (newest first). Records present in both
/// sources are only returned once.
pub fn load_all_workouts(wal_path: &Path, csv_path: &Path) -> Result<Vec<WorkoutRecord>> {
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    if wal_path.exists() {
        for record in crate::wal::read_workouts(wal_path)? {
            if seen_ids.insert(record.id) {
                records.push(record);
            }
        }
        tracing::debug!("Loaded {} workouts from WAL", records.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for record in load_workouts_from_csv(csv_path)? {
            if seen_ids.insert(record.id) {
                records.push(record);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} workouts from CSV", csv_count);
    }

    records.sort_by(|a, b| b.date.cmp(&a.date));

    tracing::info!("Loaded {} total workouts", records.len());
    Ok(records)
}

/// Load one user's workouts, newest first
pub fn load_user_workouts(
    wal_path: &Path,
    csv_path: &Path,
    user_id: &str,
) -> Result<Vec<WorkoutRecord>> {
    let mut records = load_all_workouts(wal_path, csv_path)?;
    records.retain(|r| r.user_id == user_id);
    Ok(records)
}

/// Split a population's workouts by user id
pub fn group_by_user(records: Vec<WorkoutRecord>) -> BTreeMap<String, Vec<WorkoutRecord>> {
    let mut by_user: BTreeMap<String, Vec<WorkoutRecord>> = BTreeMap::new();
    for record in records {
        by_user.entry(record.user_id.clone()).or_default().push(record);
    }
    by_user
}

/// Rebuild workouts from the per-set rows of a CSV archive
fn load_workouts_from_csv(path: &Path) -> Result<Vec<WorkoutRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut order: Vec<Uuid> = Vec::new();
    let mut by_id: HashMap<Uuid, WorkoutRecord> = HashMap::new();
    // Exercise index within each workout -> position in its exercises vec
    let mut exercise_slots: HashMap<(Uuid, usize), usize> = HashMap::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
                continue;
            }
        };

        let id = match parse_row_header(&row) {
            Ok((id, date)) => {
                by_id.entry(id).or_insert_with(|| {
                    order.push(id);
                    WorkoutRecord {
                        id,
                        user_id: row.user_id.clone(),
                        title: row.title.clone(),
                        date,
                        duration_minutes: row.duration_minutes,
                        exercises: Vec::new(),
                        notes: row.notes.clone(),
                    }
                });
                id
            }
            Err(e) => {
                tracing::warn!("Failed to parse CSV row: {}", e);
                continue;
            }
        };

        let (Some(idx), Some(name)) = (row.exercise_index, row.exercise.clone()) else {
            continue;
        };
        let Some(record) = by_id.get_mut(&id) else {
            continue;
        };

        let slot = *exercise_slots.entry((id, idx)).or_insert_with(|| {
            record.exercises.push(Exercise {
                name,
                sets: Vec::new(),
                notes: row.exercise_notes.clone(),
            });
            record.exercises.len() - 1
        });

        if let Some(reps) = row.reps {
            record.exercises[slot].sets.push(SetEntry {
                reps,
                weight_kg: row.weight_kg,
                kind: row.kind.unwrap_or_default(),
                duration_seconds: row.duration_seconds,
                distance_meters: row.distance_meters,
            });
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect())
}

fn parse_row_header(row: &CsvRow) -> Result<(Uuid, NaiveDate)> {
    let id = Uuid::parse_str(&row.workout_id)
        .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;
    let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
        .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?;
    Ok((id, date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::{JsonlSink, WorkoutSink};
    use crate::SetKind;

    fn create_test_workout(user: &str, date: NaiveDate) -> WorkoutRecord {
        WorkoutRecord {
            id: Uuid::new_v4(),
            user_id: user.into(),
            title: format!("{} on {}", user, date),
            date,
            duration_minutes: 35,
            exercises: vec![
                Exercise {
                    name: "Deadlift".into(),
                    sets: vec![
                        SetEntry::new(5, Some(120.0)),
                        SetEntry {
                            kind: SetKind::Failure,
                            ..SetEntry::new(3, Some(130.0))
                        },
                    ],
                    notes: Some("Mixed grip, \"hook\" on last set".into()),
                },
                Exercise {
                    name: "Plank".into(),
                    sets: vec![],
                    notes: Some("60s hold".into()),
                },
                Exercise {
                    name: "Chin Up".into(),
                    sets: vec![SetEntry::new(8, None)],
                    notes: None,
                },
            ],
            notes: Some(format!("{} felt good,\nback was fine", user)),
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_csv_archive_regroups_records() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");

        let original = create_test_workout("alice", d(3));
        JsonlSink::new(&wal_path).append(&original).unwrap();
        crate::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let loaded = load_all_workouts(&wal_path, &csv_path).unwrap();
        assert_eq!(loaded, vec![original]);
    }

    #[test]
    fn test_deduplication_across_wal_and_csv() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");

        let record = create_test_workout("alice", d(1));
        JsonlSink::new(&wal_path).append(&record).unwrap();
        crate::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        // Same record appears again in a fresh WAL
        JsonlSink::new(&wal_path).append(&record).unwrap();

        let loaded = load_all_workouts(&wal_path, &csv_path).unwrap();
        assert_eq!(loaded.iter().filter(|r| r.id == record.id).count(), 1);
    }

    #[test]
    fn test_user_filter_and_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_workout("alice", d(2))).unwrap();
        sink.append(&create_test_workout("bob", d(9))).unwrap();
        sink.append(&create_test_workout("alice", d(7))).unwrap();

        let alice = load_user_workouts(&wal_path, &csv_path, "alice").unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].date, d(7));
        assert_eq!(alice[1].date, d(2));
    }

    #[test]
    fn test_group_by_user() {
        let records = vec![
            create_test_workout("bob", d(1)),
            create_test_workout("alice", d(2)),
            create_test_workout("bob", d(3)),
        ];
        let grouped = group_by_user(records);
        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["alice", "bob"]);
        assert_eq!(grouped["bob"].len(), 2);
    }

    #[test]
    fn test_bad_csv_rows_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workouts.wal");
        let csv_path = temp_dir.path().join("workouts.csv");

        JsonlSink::new(&wal_path)
            .append(&create_test_workout("alice", d(4)))
            .unwrap();
        crate::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let mut content = std::fs::read_to_string(&csv_path).unwrap();
        content.push_str("not-a-uuid,alice,x,2024-06-05,10,,,,,,,,,\n");
        std::fs::write(&csv_path, content).unwrap();

        let loaded = load_all_workouts(&wal_path, &csv_path).unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
