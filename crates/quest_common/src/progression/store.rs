//! Profile store - loads and saves the career profile as indented JSON.
//!
//! Loading never fails: a missing file yields a fresh profile and a corrupt
//! one is logged and replaced by a fresh profile. Saving goes through
//! `atomic_write`, so an interrupted save leaves the previous file intact.

use super::items::ItemRegistry;
use super::levels::level_from_xp;
use super::profile::CareerProfile;
use crate::state_io::atomic_write_json;
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Profile file name under the home directory
pub const PROFILE_FILE_NAME: &str = ".questline-profile.json";

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.questline-profile.json`, or the working directory when
    /// no home directory is known
    pub fn default_location() -> Self {
        Self::new(default_profile_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the profile, falling back to a fresh one. Starter items are
    /// re-granted on every load.
    pub fn load(&self, registry: &ItemRegistry) -> CareerProfile {
        let mut profile = match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<CareerProfile>(&content) {
                Ok(profile) => {
                    debug!("Loaded profile from {}", self.path.display());
                    profile
                }
                Err(e) => {
                    warn!(
                        "Profile at {} is corrupt, starting fresh: {}",
                        self.path.display(),
                        e
                    );
                    CareerProfile::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No profile at {}, starting fresh", self.path.display());
                CareerProfile::default()
            }
            Err(e) => {
                warn!(
                    "Could not read profile at {}, starting fresh: {}",
                    self.path.display(),
                    e
                );
                CareerProfile::default()
            }
        };

        let derived = level_from_xp(profile.xp);
        if profile.level != derived {
            warn!(
                "Profile level {} does not match {} XP, using level {}",
                profile.level, profile.xp, derived
            );
            profile.level = derived;
        }

        profile.grant_starter_items(registry);
        profile
    }

    /// Stamp last-seen and write the profile atomically
    pub fn save(&self, profile: &mut CareerProfile) -> crate::Result<()> {
        profile.last_seen = Utc::now();
        atomic_write_json(&self.path, profile)
    }
}

pub fn default_profile_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(PROFILE_FILE_NAME),
        None => PathBuf::from(PROFILE_FILE_NAME),
    }
}
