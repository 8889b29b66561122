//! Questline configuration.
//!
//! Lives in `~/.config/questline/config.toml`. Every key is optional; a
//! missing or unreadable file gives the defaults.

use crate::error::QuestError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const CONFIG_DIR_NAME: &str = "questline";
const CONFIG_FILE: &str = "config.toml";

/// Transcript watcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Live tail poll interval (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay between replayed events (milliseconds)
    #[serde(default = "default_replay_delay_ms")]
    pub replay_delay_ms: u64,

    /// Look for a newer transcript every N polls (0 disables)
    #[serde(default = "default_rescan_every_polls")]
    pub rescan_every_polls: u32,

    /// Event queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Where per-project transcript directories live.
    /// Defaults to `~/.claude/projects`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcripts_root: Option<PathBuf>,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_replay_delay_ms() -> u64 {
    200
}

fn default_rescan_every_polls() -> u32 {
    20 // ~2s at the default interval
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            replay_delay_ms: default_replay_delay_ms(),
            rescan_every_polls: default_rescan_every_polls(),
            queue_capacity: default_queue_capacity(),
            transcripts_root: None,
        }
    }
}

impl WatcherConfig {
    /// Poll interval clamped to 10ms - 5s
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(10, 5000))
    }

    pub fn replay_delay(&self) -> Duration {
        Duration::from_millis(self.replay_delay_ms)
    }

    /// tokio channels reject a zero capacity
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    pub fn effective_transcripts_root(&self) -> PathBuf {
        match &self.transcripts_root {
            Some(root) => root.clone(),
            None => default_transcripts_root(),
        }
    }
}

/// `~/.claude/projects`, relative to the working directory without a home
pub fn default_transcripts_root() -> PathBuf {
    let base = dirs::home_dir().unwrap_or_default();
    base.join(".claude").join("projects")
}

/// Companion session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionConfig {
    /// Walk instead of idling while events keep coming
    #[serde(default)]
    pub walk_mode: bool,

    /// Seconds without events before the companion counts as inactive
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    /// Frame loop rate for the headless driver
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Seconds between saves of a changed profile
    #[serde(default = "default_autosave_secs")]
    pub autosave_secs: u64,
}

fn default_inactivity_timeout_secs() -> u64 {
    60
}

fn default_frame_rate() -> u32 {
    60
}

fn default_autosave_secs() -> u64 {
    5
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            walk_mode: false,
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            frame_rate: default_frame_rate(),
            autosave_secs: default_autosave_secs(),
        }
    }
}

impl CompanionConfig {
    /// Frame rate clamped to 1-240
    pub fn effective_frame_rate(&self) -> u32 {
        self.frame_rate.clamp(1, 240)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.effective_frame_rate() as f64)
    }
}

/// Profile location override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestConfig {
    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub companion: CompanionConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

impl QuestConfig {
    /// Load from `path` (or the default location), falling back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path(),
        };

        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from_path(path: &Path) -> crate::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| QuestError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| QuestError::Config(e.to_string()))
    }

    /// Configured profile path or `~/.questline-profile.json`
    pub fn profile_path(&self) -> PathBuf {
        match &self.profile.path {
            Some(path) => path.clone(),
            None => crate::progression::default_profile_path(),
        }
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_default();
    base.join(CONFIG_DIR_NAME).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = QuestConfig::default();
        assert_eq!(config.watcher.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.watcher.replay_delay(), Duration::from_millis(200));
        assert_eq!(config.watcher.rescan_every_polls, 20);
        assert_eq!(config.watcher.queue_capacity, 100);
        assert!(!config.companion.walk_mode);
        assert_eq!(config.companion.inactivity_timeout_secs, 60);
        assert_eq!(config.companion.autosave_secs, 5);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = QuestConfig::parse(
            r#"
[watcher]
replay_delay_ms = 50

[companion]
walk_mode = true
"#,
        )
        .unwrap();

        assert_eq!(config.watcher.replay_delay_ms, 50);
        assert_eq!(config.watcher.poll_interval_ms, 100);
        assert!(config.companion.walk_mode);
        assert_eq!(config.companion.frame_rate, 60);
        assert!(config.profile.path.is_none());
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[watcher\npoll_interval_ms = ").unwrap();

        assert!(matches!(QuestConfig::load_from_path(&path), Err(QuestError::Config(_))));
        assert_eq!(QuestConfig::load(Some(&path)), QuestConfig::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = QuestConfig::load(Some(&dir.path().join("absent.toml")));
        assert_eq!(config, QuestConfig::default());
    }

    #[test]
    fn test_clamping() {
        let mut config = QuestConfig::default();
        config.watcher.poll_interval_ms = 0;
        config.watcher.queue_capacity = 0;
        config.companion.frame_rate = 0;
        assert_eq!(config.watcher.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.watcher.effective_queue_capacity(), 1);
        assert_eq!(config.companion.effective_frame_rate(), 1);
    }

    #[test]
    fn test_toml_roundtrip_has_sections() {
        let mut config = QuestConfig::default();
        config.profile.path = Some(PathBuf::from("/tmp/p.json"));
        let text = config.to_toml().unwrap();
        assert!(text.contains("[watcher]"));
        assert!(text.contains("[companion]"));
        assert_eq!(QuestConfig::parse(&text).unwrap(), config);
    }
}
