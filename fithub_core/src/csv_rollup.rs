//! CSV rollup functionality for archiving the workout WAL.
//!
//! Workouts are flattened to one CSV row per set. Workouts without exercises
//! and exercises without sets still get a row (with the empty columns left
//! blank) so the archive can be regrouped into the same records later; see
//! [`crate::history`].

use crate::wal::WalLock;
use crate::{Exercise, Result, SetKind, WorkoutRecord};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct CsvRow {
    pub workout_id: String,
    pub user_id: String,
    pub title: String,
    pub date: String,
    pub duration_minutes: u32,
    pub notes: Option<String>,
    pub exercise_index: Option<usize>,
    pub exercise: Option<String>,
    pub exercise_notes: Option<String>,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub kind: Option<SetKind>,
    pub duration_seconds: Option<u32>,
    pub distance_meters: Option<f64>,
}

/// Flatten a workout into its CSV rows
pub(crate) fn rows_for(record: &WorkoutRecord) -> Vec<CsvRow> {
    let base = |exercise_index: Option<usize>, exercise: Option<&Exercise>| CsvRow {
        workout_id: record.id.to_string(),
        user_id: record.user_id.clone(),
        title: record.title.clone(),
        date: record.date.format("%Y-%m-%d").to_string(),
        duration_minutes: record.duration_minutes,
        notes: record.notes.clone(),
        exercise_index,
        exercise: exercise.map(|e| e.name.clone()),
        exercise_notes: exercise.and_then(|e| e.notes.clone()),
        reps: None,
        weight_kg: None,
        kind: None,
        duration_seconds: None,
        distance_meters: None,
    };

    if record.exercises.is_empty() {
        return vec![base(None, None)];
    }

    let mut rows = Vec::new();
    for (idx, exercise) in record.exercises.iter().enumerate() {
        if exercise.sets.is_empty() {
            rows.push(base(Some(idx), Some(exercise)));
            continue;
        }
        for set in &exercise.sets {
            rows.push(CsvRow {
                reps: Some(set.reps),
                weight_kg: set.weight_kg,
                kind: Some(set.kind),
                duration_seconds: set.duration_seconds,
                distance_meters: set.distance_meters,
                ..base(Some(idx), Some(exercise))
            });
        }
    }
    rows
}

/// Roll up WAL workouts into CSV and archive the WAL atomically
///
/// This function:
/// 1. Reads all workouts from the WAL
/// 2. Appends their rows to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to .processed
/// 5. Returns the number of workouts processed
///
/// The WAL's exclusive lock is held from the read until the rename, so
/// workouts appended meanwhile wait and land in a fresh WAL. The CSV is
/// fsynced before the WAL is renamed, and the WAL is renamed rather than
/// deleted so it can be recovered by hand.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let _lock = WalLock::exclusive(wal_path)?;
    let records = crate::wal::read_workouts_unlocked(wal_path)?;

    if records.is_empty() {
        tracing::info!("No workouts in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only a fresh file gets a header row
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut row_count = 0;
    for record in &records {
        for row in rows_for(record) {
            writer.serialize(row)?;
            row_count += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} workouts ({} rows) to CSV", records.len(), row_count);

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(records.len())
}

/// Remove all .wal.processed files in the given directory
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}
