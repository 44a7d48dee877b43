//! User profile persistence with file locking.
//!
//! A profile holds the user's display info and their append-only badge set.
//! Badge awards go through [`UserProfile::award_badges`], which performs the
//! whole read-modify-write under an exclusive lock and inserts a badge only
//! if no badge of the same name is already stored. Two evaluations racing on
//! the same user therefore never persist a badge twice.

use crate::{Badge, Error, Result, UserDisplay};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persistent per-user document
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub display: UserDisplay,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

impl UserProfile {
    /// Empty profile whose display name defaults to the user id
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display: UserDisplay {
                name: user_id.to_string(),
                avatar_url: None,
            },
            badges: Vec::new(),
        }
    }

    /// Names of badges already earned
    pub fn earned_names(&self) -> HashSet<String> {
        self.badges.iter().map(|b| b.name.clone()).collect()
    }

    /// Append badges whose names are not yet present, returning those added
    pub fn merge_badges(&mut self, badges: Vec<Badge>) -> Vec<Badge> {
        let mut earned = self.earned_names();
        let mut added = Vec::new();
        for badge in badges {
            if earned.insert(badge.name.clone()) {
                self.badges.push(badge.clone());
                added.push(badge);
            } else {
                tracing::debug!("Badge {} already held by {}, skipping", badge.name, self.user_id);
            }
        }
        added
    }

    /// Load a profile with shared locking
    ///
    /// Returns a fresh profile if the file doesn't exist. A corrupted file is
    /// logged and treated as a fresh profile; only read-only callers should
    /// rely on that, see [`UserProfile::update`].
    pub fn load(path: &Path, user_id: &str) -> Result<Self> {
        match Self::read(path, user_id) {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => {
                tracing::info!("No profile for {}, starting fresh", user_id);
                Ok(Self::new(user_id))
            }
            Err(e @ Error::Profile(_)) => Err(e),
            Err(e) => {
                tracing::warn!("Unreadable profile {:?}: {}. Starting fresh.", path, e);
                Ok(Self::new(user_id))
            }
        }
    }

    /// Read a stored profile, `None` if there is no file yet
    ///
    /// Fails on I/O and parse errors, and with [`Error::Profile`] when the
    /// file belongs to another user.
    fn read(path: &Path, user_id: &str) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let profile: UserProfile = serde_json::from_str(&contents)?;
        if profile.user_id != user_id {
            return Err(Error::Profile(format!(
                "{:?} belongs to {}, not {}",
                path, profile.user_id, user_id
            )));
        }

        tracing::debug!("Loaded profile from {:?}", path);
        Ok(Some(profile))
    }

    /// Save the profile atomically
    ///
    /// Writes to a temp file in the same directory, syncs it, then renames it
    /// over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Profile(format!("{:?} has no parent directory", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile to {:?}", path);
        Ok(())
    }

    /// Load, modify and save a profile while holding the profile's lock
    ///
    /// Unlike [`UserProfile::load`], a profile that exists but cannot be read
    /// is an error: saving over it would drop every badge it holds.
    pub fn update<F, T>(path: &Path, user_id: &str, f: F) -> Result<(Self, T)>
    where
        F: FnOnce(&mut UserProfile) -> Result<T>,
    {
        let lock = acquire_update_lock(path)?;

        let mut profile = match Self::read(path, user_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => Self::new(user_id),
            Err(e @ Error::Profile(_)) => return Err(e),
            Err(e) => {
                return Err(Error::Profile(format!(
                    "{:?} is unreadable ({}); leaving it untouched",
                    path, e
                )))
            }
        };
        let out = f(&mut profile)?;
        profile.save(path)?;

        lock.unlock()?;
        Ok((profile, out))
    }

    /// Persist newly earned badges, skipping any already stored
    ///
    /// Returns the badges that were actually added.
    pub fn award_badges(path: &Path, user_id: &str, badges: Vec<Badge>) -> Result<Vec<Badge>> {
        if badges.is_empty() {
            return Ok(Vec::new());
        }

        let (_, added) = Self::update(path, user_id, |profile| Ok(profile.merge_badges(badges)))?;

        if !added.is_empty() {
            tracing::info!("Awarded {} badge(s) to {}", added.len(), user_id);
        }
        Ok(added)
    }
}

/// Reject user ids that cannot be used as a profile file name
///
/// Ids become `<id>.json` under the profiles directory, so separators and
/// `..` would let a profile land outside it.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::InvalidInput("user id must not be empty".into()));
    }
    if user_id.contains(&['/', '\\', '\0'][..]) || user_id.contains("..") {
        return Err(Error::InvalidInput(format!(
            "user id {:?} must not contain path separators or '..'",
            user_id
        )));
    }
    Ok(())
}

/// Location of a user's profile under the data directory
pub fn profile_path(profiles_dir: &Path, user_id: &str) -> PathBuf {
    profiles_dir.join(format!("{}.json", user_id))
}

/// Load every profile in a directory
///
/// Unreadable or corrupted files are skipped with a warning.
pub fn load_all_profiles(profiles_dir: &Path) -> Result<Vec<UserProfile>> {
    if !profiles_dir.exists() {
        return Ok(Vec::new());
    }

    let mut profiles = Vec::new();
    for entry in std::fs::read_dir(profiles_dir)? {
        let path = entry?.path();
        if path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let Some(user_id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match UserProfile::load(&path, user_id) {
            Ok(profile) => profiles.push(profile),
            Err(e) => tracing::warn!("Skipping profile {:?}: {}", path, e),
        }
    }

    profiles.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    Ok(profiles)
}

/// Exclusive lock on `<profile>.lock`, serialising read-modify-write cycles.
///
/// The profile itself is replaced by rename on save, so the lock lives on a
/// sidecar file whose inode stays stable.
fn acquire_update_lock(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let lock_path = path.with_extension("lock");
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;
    file.lock_exclusive()?;
    Ok(file)
}
