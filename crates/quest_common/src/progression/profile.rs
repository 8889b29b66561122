//! Career profile - the persistent progression record.
//!
//! Every recording call bumps a lifetime counter, awards XP through
//! `add_xp` and reports whether a level-up happened. The profile only
//! signals level-ups (via `pending_choice`); chest ceremonies live elsewhere.

use super::items::{Item, ItemRegistry, ItemSlot};
use super::levels::{level_from_xp, level_progress, xp_to_next_level};
use crate::event::ThinkLevel;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// XP Awards
// ============================================================================

pub const XP_READ: u64 = 5;
pub const XP_WRITE: u64 = 10;
pub const XP_BASH_SUCCESS: u64 = 15;
pub const XP_BASH_FAIL: u64 = 5;
/// Added to a successful bash run when the streak is above 1
pub const XP_STREAK_BONUS: u64 = 5;
pub const XP_THINK_NORMAL: u64 = 10;
pub const XP_THINK_HARD: u64 = 25;
/// Per tier above Hard
pub const XP_THINK_BONUS: u64 = 10;
pub const XP_TODO_COMPLETE: u64 = 20;
pub const XP_AGENT_COMPLETE: u64 = 30;
pub const XP_FLOW_PEAK: u64 = 100;

/// XP for one bash run
pub fn bash_xp(success: bool, streak: u32) -> u64 {
    if !success {
        return XP_BASH_FAIL;
    }
    if streak > 1 {
        XP_BASH_SUCCESS + XP_STREAK_BONUS
    } else {
        XP_BASH_SUCCESS
    }
}

/// XP for a thinking event of the given tier. `None` counts as normal.
pub fn thinking_xp(level: ThinkLevel) -> u64 {
    match level {
        ThinkLevel::None | ThinkLevel::Normal => XP_THINK_NORMAL,
        ThinkLevel::Hard => XP_THINK_HARD,
        ThinkLevel::Harder => XP_THINK_HARD + XP_THINK_BONUS,
        ThinkLevel::Ultra => XP_THINK_HARD + XP_THINK_BONUS * 2,
    }
}

// ============================================================================
// Career Profile
// ============================================================================

/// Persistent progression data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerProfile {
    pub xp: u64,
    /// Always `level_from_xp(xp)` after `add_xp`
    pub level: u32,

    pub owned_items: BTreeSet<String>,
    /// A level-up choice awaits
    pub pending_choice: bool,

    // Lifetime stats
    pub total_reads: u64,
    pub total_writes: u64,
    pub total_bash: u64,
    pub bash_successes: u64,
    /// Keyed by tier name ("normal", "hard", ...)
    pub total_thinking: BTreeMap<String, u64>,
    pub todos_completed: u64,
    pub agents_completed: u64,
    pub tokens_consumed: u64,
    pub sessions_started: u64,

    // Achievements
    pub peak_flow_count: u64,
    pub best_bash_streak: u32,
    pub bonus_chests_found: u64,

    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Default for CareerProfile {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            xp: 0,
            level: 0,
            owned_items: BTreeSet::new(),
            pending_choice: false,
            total_reads: 0,
            total_writes: 0,
            total_bash: 0,
            bash_successes: 0,
            total_thinking: BTreeMap::new(),
            todos_completed: 0,
            agents_completed: 0,
            tokens_consumed: 0,
            sessions_started: 0,
            peak_flow_count: 0,
            best_bash_streak: 0,
            bonus_chests_found: 0,
            first_seen: now,
            last_seen: now,
        }
    }
}

impl CareerProfile {
    /// Fresh profile owning the registry's starter items
    pub fn new(registry: &ItemRegistry) -> Self {
        let mut profile = Self::default();
        profile.grant_starter_items(registry);
        profile
    }

    /// Idempotent union with the starter set. Safe to call on every load.
    pub fn grant_starter_items(&mut self, registry: &ItemRegistry) {
        for item in registry.starters() {
            self.owned_items.insert(item.id.to_string());
        }
    }

    /// Grant XP. Returns true if the level went up.
    pub fn add_xp(&mut self, amount: u64) -> bool {
        let old_level = self.level;
        self.xp = self.xp.saturating_add(amount);
        self.level = level_from_xp(self.xp);

        if self.level > old_level {
            self.pending_choice = true;
            return true;
        }
        false
    }

    pub fn xp_to_next_level(&self) -> u64 {
        xp_to_next_level(self.level, self.xp)
    }

    /// Progress toward the next level (0.0 - 1.0)
    pub fn level_progress(&self) -> f32 {
        level_progress(self.level, self.xp)
    }

    pub fn record_read(&mut self) -> bool {
        self.total_reads += 1;
        self.add_xp(XP_READ)
    }

    pub fn record_write(&mut self) -> bool {
        self.total_writes += 1;
        self.add_xp(XP_WRITE)
    }

    /// `streak` is the current session streak including this run
    pub fn record_bash(&mut self, success: bool, streak: u32) -> bool {
        self.total_bash += 1;
        if success {
            self.bash_successes += 1;
            self.best_bash_streak = self.best_bash_streak.max(streak);
        }
        self.add_xp(bash_xp(success, streak))
    }

    pub fn record_thinking(&mut self, level: ThinkLevel) -> bool {
        let tier = match level {
            ThinkLevel::None => ThinkLevel::Normal,
            other => other,
        };
        *self.total_thinking.entry(tier.name().to_string()).or_insert(0) += 1;
        self.add_xp(thinking_xp(tier))
    }

    pub fn record_todo_complete(&mut self) -> bool {
        self.todos_completed += 1;
        self.add_xp(XP_TODO_COMPLETE)
    }

    pub fn record_agent_complete(&mut self) -> bool {
        self.agents_completed += 1;
        self.add_xp(XP_AGENT_COMPLETE)
    }

    pub fn record_flow_peak(&mut self) -> bool {
        self.peak_flow_count += 1;
        self.add_xp(XP_FLOW_PEAK)
    }

    /// Token consumption is tracked but earns nothing
    pub fn record_tokens(&mut self, count: u64) {
        self.tokens_consumed = self.tokens_consumed.saturating_add(count);
    }

    pub fn record_session_start(&mut self) {
        self.sessions_started += 1;
    }

    pub fn record_bonus_chest(&mut self) {
        self.bonus_chests_found += 1;
    }

    // ------------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------------

    /// Take ownership of an item and settle the pending choice
    pub fn claim_item(&mut self, item_id: &str) {
        self.owned_items.insert(item_id.to_string());
        self.pending_choice = false;
    }

    pub fn is_owned(&self, item_id: &str) -> bool {
        self.owned_items.contains(item_id)
    }

    /// Items eligible for a random offer: not starter, unlocked by level, not owned
    pub fn choice_pool(&self, registry: &ItemRegistry) -> Vec<Item> {
        registry
            .items()
            .iter()
            .filter(|item| !item.starter && item.min_level <= self.level && !self.is_owned(item.id))
            .copied()
            .collect()
    }

    /// Up to `n` distinct items from the choice pool, each equally likely.
    /// Returns the whole pool when it has `n` items or fewer.
    pub fn random_choices<R: Rng>(
        &self,
        registry: &ItemRegistry,
        n: usize,
        rng: &mut R,
    ) -> Vec<Item> {
        let mut pool = self.choice_pool(registry);
        if pool.len() <= n {
            return pool;
        }

        // Fisher-Yates
        for i in (1..pool.len()).rev() {
            let j = rng.gen_range(0..=i);
            pool.swap(i, j);
        }
        pool.truncate(n);
        pool
    }

    pub fn owned_in_slot(&self, registry: &ItemRegistry, slot: ItemSlot) -> Vec<Item> {
        registry.in_slot(slot).filter(|item| self.is_owned(item.id)).copied().collect()
    }

    pub fn locked_in_slot(&self, registry: &ItemRegistry, slot: ItemSlot) -> Vec<Item> {
        registry.in_slot(slot).filter(|item| !self.is_owned(item.id)).copied().collect()
    }
}
