use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use fithub_core::profile::{load_all_profiles, profile_path, validate_user_id};
use fithub_core::*;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fithub")]
#[command(about = "FitHub workout stats, badges and leaderboards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Act as this user (defaults to profile.default_user from config)
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a workout, then check for new badges
    Log {
        /// Workout title
        #[arg(long)]
        title: String,

        /// Workout date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Duration in minutes
        #[arg(long)]
        duration: u32,

        /// A set as "Exercise:REPS" or "Exercise:REPSxKG"; repeat for more sets
        #[arg(long = "set")]
        sets: Vec<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Skip the badge check after logging
        #[arg(long)]
        no_check: bool,
    },

    /// Show the user's stats
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// List the user's earned badges
    Badges {
        #[arg(long)]
        json: bool,
    },

    /// Check for and award newly earned badges
    Check,

    /// List every badge that can be earned
    Definitions,

    /// Show community leaderboards
    Leaderboard {
        /// Only show one board
        #[arg(long, value_enum)]
        metric: Option<MetricArg>,

        /// Entries per board
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Update the user's display name or avatar
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        avatar: Option<String>,
    },

    /// Roll up the workout WAL to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    CurrentStreak,
    TotalVolume,
    TotalWorkouts,
    LongestStreak,
}

impl From<MetricArg> for LeaderboardMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::CurrentStreak => LeaderboardMetric::CurrentStreak,
            MetricArg::TotalVolume => LeaderboardMetric::TotalVolume,
            MetricArg::TotalWorkouts => LeaderboardMetric::TotalWorkouts,
            MetricArg::LongestStreak => LeaderboardMetric::LongestStreak,
        }
    }
}

/// On-disk layout under the data directory
struct DataPaths {
    wal_dir: PathBuf,
    wal: PathBuf,
    csv: PathBuf,
    profiles: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            wal: wal_dir.join("workouts.wal"),
            wal_dir,
            csv: data_dir.join("workouts.csv"),
            profiles: data_dir.join("profiles"),
        }
    }

    fn profile(&self, user_id: &str) -> PathBuf {
        profile_path(&self.profiles, user_id)
    }
}

fn main() -> Result<()> {
    fithub_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let user_id = cli.user.unwrap_or_else(|| config.profile.default_user.clone());
    validate_user_id(&user_id)?;
    let paths = DataPaths::new(&data_dir);
    tracing::debug!("Using data dir {:?} as user {}", data_dir, user_id);

    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Badge catalog validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Other("Invalid badge catalog".into()));
    }

    match cli.command {
        Commands::Log {
            title,
            date,
            duration,
            sets,
            notes,
            no_check,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            cmd_log(&paths, &user_id, title, date, duration, &sets, notes)?;
            if !no_check {
                cmd_check(&paths, &user_id, catalog)?;
            }
            Ok(())
        }
        Commands::Stats { json } => cmd_stats(&paths, &user_id, json),
        Commands::Badges { json } => cmd_badges(&paths, &user_id, json),
        Commands::Check => cmd_check(&paths, &user_id, catalog),
        Commands::Definitions => cmd_definitions(catalog),
        Commands::Leaderboard {
            metric,
            limit,
            json,
        } => cmd_leaderboard(
            &paths,
            metric.map(LeaderboardMetric::from),
            limit.unwrap_or(config.leaderboard.limit),
            json,
        ),
        Commands::Profile { name, avatar } => cmd_profile(&paths, &user_id, name, avatar),
        Commands::Rollup { cleanup } => cmd_rollup(&paths, cleanup),
    }
}

fn cmd_log(
    paths: &DataPaths,
    user_id: &str,
    title: String,
    date: NaiveDate,
    duration: u32,
    sets: &[String],
    notes: Option<String>,
) -> Result<()> {
    if duration == 0 {
        return Err(Error::InvalidInput(
            "Duration must be at least 1 minute".into(),
        ));
    }

    let record = WorkoutRecord {
        id: uuid::Uuid::new_v4(),
        user_id: user_id.to_string(),
        title,
        date,
        duration_minutes: duration,
        exercises: parse_exercises(sets)?,
        notes,
    };

    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&record)?;

    println!(
        "✓ Logged \"{}\" on {} ({} min, {} exercises)",
        record.title,
        record.date,
        record.duration_minutes,
        record.exercises.len()
    );
    Ok(())
}

fn cmd_stats(paths: &DataPaths, user_id: &str, json: bool) -> Result<()> {
    let records = load_user_workouts(&paths.wal, &paths.csv, user_id)?;
    let stats = compute_stats(&records);
    let profile = UserProfile::load(&paths.profile(user_id), user_id)?;

    if json {
        let payload = serde_json::json!({
            "stats": stats,
            "badge_count": profile.badges.len(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Stats for {}", profile.display.name);
    println!("  Workouts:        {}", stats.total_workouts);
    println!("  Volume lifted:   {:.1} kg", stats.total_volume_lifted_kg);
    println!("  Current streak:  {}", stats.current_streak);
    println!("  Longest streak:  {}", stats.longest_streak);
    println!("  This week:       {}", stats.weekly_workouts);
    println!("  This month:      {}", stats.monthly_workouts);
    println!("  Avg per week:    {:.2}", stats.average_workouts_per_week);
    println!("  Total duration:  {} min", stats.total_workout_duration);
    if let Some(last) = stats.last_workout_date {
        println!("  Last workout:    {}", last);
    }
    if !stats.favorite_exercises.is_empty() {
        println!("  Favorites:       {}", stats.favorite_exercises.join(", "));
    }
    if !stats.personal_records.is_empty() {
        println!("  Personal records:");
        for (exercise, kg) in &stats.personal_records {
            println!("    {:<20} {:.1} kg", exercise, kg);
        }
    }
    println!("  Badges:          {}", profile.badges.len());
    Ok(())
}

fn cmd_badges(paths: &DataPaths, user_id: &str, json: bool) -> Result<()> {
    let profile = UserProfile::load(&paths.profile(user_id), user_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile.badges)?);
        return Ok(());
    }

    if profile.badges.is_empty() {
        println!("No badges earned yet.");
        return Ok(());
    }

    for badge in &profile.badges {
        println!(
            "{} {} [{}] - {} (earned {})",
            badge.icon,
            badge.name,
            badge.category,
            badge.description,
            badge.earned_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

fn cmd_check(paths: &DataPaths, user_id: &str, catalog: &BadgeCatalog) -> Result<()> {
    let records = load_user_workouts(&paths.wal, &paths.csv, user_id)?;
    let stats = compute_stats(&records);
    let profile_path = paths.profile(user_id);
    let already_earned: HashSet<String> =
        UserProfile::load(&profile_path, user_id)?.earned_names();

    let candidates = BadgeEvaluator::new(catalog).evaluate(&stats, &records, &already_earned);
    let added = UserProfile::award_badges(&profile_path, user_id, candidates)?;

    println!("{}", award_message(added.len()));
    for badge in &added {
        println!("  {} {} - {}", badge.icon, badge.name, badge.description);
    }
    Ok(())
}

fn cmd_definitions(catalog: &BadgeCatalog) -> Result<()> {
    for def in catalog.iter() {
        println!(
            "{} {:<20} [{}] {}",
            def.icon, def.name, def.category, def.description
        );
    }
    Ok(())
}

fn cmd_leaderboard(
    paths: &DataPaths,
    metric: Option<LeaderboardMetric>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let users = build_population(paths)?;

    match metric {
        Some(metric) => {
            let board = rank(&users, metric, limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                print_board(metric, &board);
            }
        }
        None => {
            let boards = rank_all(&users, limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&boards)?);
            } else {
                print_board(LeaderboardMetric::CurrentStreak, &boards.weekly_streaks);
                print_board(LeaderboardMetric::TotalVolume, &boards.total_volume);
                print_board(LeaderboardMetric::TotalWorkouts, &boards.total_workouts);
                print_board(LeaderboardMetric::LongestStreak, &boards.consistency);
            }
        }
    }
    Ok(())
}

/// Every known user (by profile or by logged workouts) with fresh stats
fn build_population(paths: &DataPaths) -> Result<Vec<RankedUser>> {
    let by_user = history::group_by_user(load_all_workouts(&paths.wal, &paths.csv)?);
    let mut profiles: BTreeMap<String, UserProfile> = load_all_profiles(&paths.profiles)?
        .into_iter()
        .map(|p| (p.user_id.clone(), p))
        .collect();

    let mut user_ids: Vec<String> = profiles.keys().cloned().collect();
    for user_id in by_user.keys() {
        if !profiles.contains_key(user_id) {
            user_ids.push(user_id.clone());
        }
    }
    user_ids.sort();

    let users = user_ids
        .into_iter()
        .map(|user_id| {
            let profile = profiles
                .remove(&user_id)
                .unwrap_or_else(|| UserProfile::new(&user_id));
            let records = by_user.get(&user_id).map(Vec::as_slice).unwrap_or(&[]);
            RankedUser {
                display: profile.display,
                stats: compute_stats(records),
                badge_count: profile.badges.len(),
            }
        })
        .collect();

    Ok(users)
}

fn print_board(metric: LeaderboardMetric, board: &[LeaderboardEntry]) {
    println!("\n{}", metric.label());
    println!("─────────────────────────────────────────");
    if board.is_empty() {
        println!("  (no users yet)");
        return;
    }
    for entry in board {
        println!(
            "  #{:<3} {:<20} {:>10}  🏅 {}",
            entry.rank, entry.user.name, entry.metric_value, entry.badge_count
        );
    }
}

fn cmd_profile(
    paths: &DataPaths,
    user_id: &str,
    name: Option<String>,
    avatar: Option<String>,
) -> Result<()> {
    let (profile, _) = UserProfile::update(&paths.profile(user_id), user_id, |profile| {
        if let Some(name) = name {
            profile.display.name = name;
        }
        if let Some(avatar) = avatar {
            profile.display.avatar_url = Some(avatar);
        }
        Ok(())
    })?;

    println!("✓ Profile saved for {}", profile.display.name);
    Ok(())
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = csv_rollup::wal_to_csv_and_archive(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} workouts to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

/// Parse `--set` values into exercises
///
/// Consecutive sets naming the same exercise are grouped into one exercise.
fn parse_exercises(specs: &[String]) -> Result<Vec<Exercise>> {
    let mut exercises: Vec<Exercise> = Vec::new();

    for spec in specs {
        let (name, set) = parse_set_spec(spec)?;
        match exercises.last_mut() {
            Some(last) if last.name == name => last.sets.push(set),
            _ => exercises.push(Exercise {
                name,
                sets: vec![set],
                notes: None,
            }),
        }
    }

    Ok(exercises)
}

/// Parse "Bench Press:8x60" or "Push Up:20"
fn parse_set_spec(spec: &str) -> Result<(String, SetEntry)> {
    let invalid = || {
        Error::InvalidInput(format!(
            "Expected \"Exercise:REPS\" or \"Exercise:REPSxKG\", got \"{}\"",
            spec
        ))
    };

    let (name, load) = spec.rsplit_once(':').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }

    let load = load.trim().to_lowercase();
    let (reps, weight) = match load.split_once('x') {
        Some((reps, kg)) => (reps, Some(kg)),
        None => (load.as_str(), None),
    };

    let reps: i32 = reps.trim().parse().map_err(|_| invalid())?;
    if reps < 0 {
        return Err(Error::InvalidInput(format!("Reps must not be negative in \"{}\"", spec)));
    }

    let weight_kg = match weight {
        Some(kg) => {
            let kg = kg.trim().parse::<f64>().map_err(|_| invalid())?;
            if !kg.is_finite() || kg < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "Weight must be a non-negative number of kg in \"{}\"",
                    spec
                )));
            }
            Some(kg)
        }
        None => None,
    };

    Ok((name.to_string(), SetEntry::new(reps, weight_kg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weighted_set() {
        let (name, set) = parse_set_spec("Bench Press:8x62.5").unwrap();
        assert_eq!(name, "Bench Press");
        assert_eq!(set.reps, 8);
        assert_eq!(set.weight_kg, Some(62.5));
    }

    #[test]
    fn test_parse_bodyweight_set() {
        let (name, set) = parse_set_spec("Push Up: 20").unwrap();
        assert_eq!(name, "Push Up");
        assert_eq!(set.reps, 20);
        assert_eq!(set.weight_kg, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_set_spec("Squat").is_err());
        assert!(parse_set_spec(":5x100").is_err());
        assert!(parse_set_spec("Squat:fivex100").is_err());
        assert!(parse_set_spec("Squat:5xheavy").is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_values() {
        for spec in ["Squat:-5x100", "Squat:5x-20", "Squat:5xNaN", "Squat:5xinf", "Push Up:-3"] {
            assert!(
                matches!(parse_set_spec(spec), Err(Error::InvalidInput(_))),
                "{} should be rejected",
                spec
            );
        }
        let (_, set) = parse_set_spec("Plank:1x0").unwrap();
        assert_eq!(set.weight_kg, Some(0.0));
    }

    #[test]
    fn test_consecutive_sets_group_into_exercises() {
        let specs: Vec<String> = ["Squat:5x100", "Squat:5x105", "Plank:1", "Squat:3x110"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let exercises = parse_exercises(&specs).unwrap();
        let shape: Vec<(&str, usize)> = exercises
            .iter()
            .map(|e| (e.name.as_str(), e.sets.len()))
            .collect();
        assert_eq!(shape, vec![("Squat", 2), ("Plank", 1), ("Squat", 1)]);
    }
}
