//! Questline Common - transcript-driven companion state and progression.
//!
//! Turns a coding-assistant session transcript into two coupled state
//! machines: the companion's animation and a persistent RPG career (XP,
//! levels, cosmetics, bonus loot). Rendering is left to consumers; this
//! crate only produces state.

pub mod animation;
pub mod chest;
pub mod companion;
pub mod config;
pub mod error;
pub mod event;
pub mod progression;
pub mod rewards;
pub mod state_io;
pub mod transcript;
pub mod watcher;

pub use animation::{AnimationState, AnimationSystem, AnimationType, FRAME_DURATION};
pub use chest::{ChestState, ChestType, TreasureChest};
pub use companion::{ChestSettlement, CompanionSession, EventOutcome, EMPTY_CHEST_XP};
pub use config::{CompanionConfig, ProfileConfig, QuestConfig, WatcherConfig};
pub use error::{QuestError, Result};
pub use event::{Event, EventKind, ThinkLevel, TodoItem, TokenUsage};
pub use progression::{CareerProfile, Item, ItemRegistry, ItemSlot, ProfileStore, SessionStats};
pub use rewards::{BonusTrigger, RewardEngine, BONUS_TRIGGERS};
pub use state_io::{atomic_write, atomic_write_json};
pub use transcript::TranscriptParser;
pub use watcher::{find_newest_transcript, EventSource, TranscriptTail};
