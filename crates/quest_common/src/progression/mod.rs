//! Progression Module
//!
//! RPG-style career for the companion: XP, levels, unlockable cosmetics and
//! the per-session stats that feed bonus loot.
//!
//! ## Level System
//!
//! - Quadratic curve, 100 * L^2 total XP for level L
//! - Level is always derived from XP, never stored independently
//!
//! ## Items
//!
//! - Immutable registry of hats, faces, auras and trails
//! - Starter items are owned by every profile
//! - Everything else unlocks by level and is claimed from chests
//!
//! ## Persistence
//!
//! - `ProfileStore` keeps the profile in `~/.questline-profile.json`
//! - `SessionStats` are never written to disk

pub mod items;
pub mod levels;
pub mod profile;
pub mod session;
pub mod store;

pub use items::{Item, ItemRegistry, ItemSlot, ITEM_CATALOG};
pub use levels::{level_from_xp, level_progress, xp_for_level, xp_to_next_level, BASE_XP};
pub use profile::{bash_xp, thinking_xp, CareerProfile};
pub use session::SessionStats;
pub use store::{default_profile_path, ProfileStore};
