//! Companion session - routes events into the career profile.
//!
//! One `CompanionSession` lives for the whole process. It owns the profile
//! and its store, the session stats, the reward engine and the active chest.
//! The caller feeds it events and calls `update` once per frame.
//!
//! The profile is saved at session start, on level-up, on a bonus award,
//! when a chest settles, and otherwise every few seconds while it has
//! unsaved changes. A failed save keeps the in-memory profile and retries.

use crate::chest::TreasureChest;
use crate::config::CompanionConfig;
use crate::event::{Event, EventKind, TodoItem, TokenUsage};
use crate::progression::{CareerProfile, Item, ProfileStore, SessionStats};
use crate::rewards::RewardEngine;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

/// Flat XP granted when a chest had nothing to offer
pub const EMPTY_CHEST_XP: u64 = 500;

/// What one event did to the profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOutcome {
    pub xp_gained: u64,
    pub leveled_up: bool,
    /// Flow meter saturated for the first time this session
    pub flow_peaked: bool,
    /// Name of the trigger that awarded the bonus chest
    pub bonus_chest: Option<&'static str>,
    /// A checkpoint ran for this event and could not write the profile
    pub save_failed: bool,
}

/// How a finished chest was resolved
#[derive(Debug, Clone, PartialEq)]
pub enum ChestSettlement {
    Claimed(Item),
    /// Pool was empty, flat XP instead
    FallbackXp(u64),
}

pub struct CompanionSession<R: Rng = StdRng> {
    profile: CareerProfile,
    store: ProfileStore,
    stats: SessionStats,
    rewards: RewardEngine<R>,

    pending_level_up: bool,
    pending_bonus: Option<String>,
    active_chest: Option<TreasureChest>,

    active: bool,
    idle_secs: f32,
    inactivity_timeout: f32,

    dirty: bool,
    autosave_timer: f32,
    autosave_secs: f32,

    last_save_error: Option<String>,

    last_todos: Vec<TodoItem>,
    last_token_usage: Option<TokenUsage>,
}

impl<R: Rng> CompanionSession<R> {
    /// Load the profile, count the session and save once. A failed save is
    /// logged and retried later; it never prevents the session from starting.
    pub fn start(store: ProfileStore, rewards: RewardEngine<R>, config: &CompanionConfig) -> Self {
        let mut profile = store.load(rewards.registry());
        profile.record_session_start();
        info!(
            "Session {} started at level {} ({} XP)",
            profile.sessions_started, profile.level, profile.xp
        );

        let mut session = Self {
            // a level-up from last time that never got its chest
            pending_level_up: profile.pending_choice,
            profile,
            store,
            stats: SessionStats::new(),
            rewards,
            pending_bonus: None,
            active_chest: None,
            active: false,
            idle_secs: 0.0,
            inactivity_timeout: config.inactivity_timeout_secs as f32,
            dirty: true,
            autosave_timer: 0.0,
            autosave_secs: config.autosave_secs as f32,
            last_save_error: None,
            last_todos: Vec::new(),
            last_token_usage: None,
        };
        let _ = session.checkpoint();
        session
    }

    pub fn profile(&self) -> &CareerProfile {
        &self.profile
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn active_chest(&self) -> Option<&TreasureChest> {
        self.active_chest.as_ref()
    }

    /// Events arrived within the inactivity timeout
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Unsaved profile changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Error from the most recent checkpoint, cleared by the next good save
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// A chest is showing or waiting to be shown
    pub fn has_pending_rewards(&self) -> bool {
        self.active_chest.is_some() || self.pending_level_up || self.pending_bonus.is_some()
    }

    pub fn handle_event(&mut self, event: &Event) -> EventOutcome {
        let xp_before = self.profile.xp;
        let mut outcome = EventOutcome::default();
        let mut leveled_up = false;
        let mut touched = false;

        if event.is_activity() {
            self.idle_secs = 0.0;
            self.active = true;
            self.stats.total_tool_calls += 1;

            if self.stats.record_activity() {
                info!("Flow peak reached");
                outcome.flow_peaked = true;
                leveled_up |= self.profile.record_flow_peak();
                touched = true;
            }
        }

        // every event after an assistant record repeats its usage
        if event.token_usage.is_some() && event.token_usage != self.last_token_usage {
            self.last_token_usage = event.token_usage;
            if let Some(usage) = event.token_usage {
                self.profile.record_tokens(usage.total());
                touched = true;
            }
        }

        match event.kind {
            EventKind::Reading => {
                self.stats.reads += 1;
                leveled_up |= self.profile.record_read();
                touched = true;
            }
            EventKind::Writing => {
                self.stats.writes += 1;
                leveled_up |= self.profile.record_write();
                touched = true;
            }
            EventKind::Bash => {
                let success = !event.is_error;
                self.stats.record_bash_result(success);
                leveled_up |= self.profile.record_bash(success, self.stats.current_bash_streak);
                touched = true;
            }
            EventKind::ThinkHard => {
                leveled_up |= self.profile.record_thinking(event.think_level);
                touched = true;
            }
            EventKind::TodoUpdate => {
                if let Some(todos) = &event.todos {
                    let newly_done = self.newly_completed(todos);
                    for _ in 0..newly_done {
                        self.stats.todos_completed += 1;
                        leveled_up |= self.profile.record_todo_complete();
                    }
                    touched |= newly_done > 0;
                    self.last_todos = todos.clone();
                }
            }
            _ => {}
        }

        if leveled_up {
            info!("Level up! Now level {}", self.profile.level);
            self.pending_level_up = true;
            outcome.leveled_up = true;
        }

        if let Some(reason) = self.rewards.check_bonus_chest(&mut self.stats) {
            self.pending_bonus = Some(reason.to_string());
            self.profile.record_bonus_chest();
            outcome.bonus_chest = Some(reason);
            touched = true;
        }

        outcome.xp_gained = self.profile.xp - xp_before;
        if touched {
            self.dirty = true;
        }
        if outcome.leveled_up || outcome.bonus_chest.is_some() {
            outcome.save_failed = self.checkpoint().is_err();
        }
        outcome
    }

    /// Todos completed in `todos` that were not completed in the last snapshot
    fn newly_completed(&self, todos: &[TodoItem]) -> usize {
        todos
            .iter()
            .filter(|todo| todo.is_completed())
            .filter(|todo| {
                !self
                    .last_todos
                    .iter()
                    .any(|old| old.content == todo.content && old.is_completed())
            })
            .count()
    }

    /// Advance timers and the chest ceremony. Returns the settlement when a
    /// chest finished during this tick.
    pub fn update(&mut self, dt: f32) -> Option<ChestSettlement> {
        let dt = if dt > 0.0 { dt } else { 0.0 };

        if self.active {
            self.idle_secs += dt;
            if self.idle_secs > self.inactivity_timeout {
                debug!("No events for {:.0}s, going inactive", self.idle_secs);
                self.active = false;
            }
        }

        self.stats.tick_flow(dt);

        if self.dirty {
            self.autosave_timer += dt;
            if self.autosave_timer >= self.autosave_secs {
                self.autosave_timer = 0.0;
                let _ = self.checkpoint();
            }
        }

        if self.active_chest.is_none() {
            self.spawn_pending_chest();
        }

        let chest = self.active_chest.as_mut()?;
        chest.update(dt);
        if !chest.is_done() {
            return None;
        }

        let chest = self.active_chest.take()?;
        let settlement = match chest.claimed_item {
            Some(item) => {
                info!("Claimed {} ({})", item.name, item.slot.name());
                self.profile.claim_item(item.id);
                ChestSettlement::Claimed(item)
            }
            None => {
                info!("Chest was empty, granting {} XP", EMPTY_CHEST_XP);
                self.profile.pending_choice = false;
                if self.profile.add_xp(EMPTY_CHEST_XP) {
                    self.pending_level_up = true;
                }
                ChestSettlement::FallbackXp(EMPTY_CHEST_XP)
            }
        };
        self.dirty = true;
        let _ = self.checkpoint();
        Some(settlement)
    }

    fn spawn_pending_chest(&mut self) {
        if self.pending_level_up {
            self.pending_level_up = false;
            let chest = self.rewards.level_up_chest(&self.profile);
            debug!("Level-up chest with {} items", chest.items.len());
            self.active_chest = Some(chest);
        } else if let Some(reason) = self.pending_bonus.take() {
            let chest = self.rewards.bonus_chest(&self.profile, &reason);
            debug!("Bonus chest ({}) with {} items", reason, chest.items.len());
            self.active_chest = Some(chest);
        }
    }

    pub fn select_next(&mut self) {
        if let Some(chest) = self.active_chest.as_mut() {
            chest.select_next();
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(chest) = self.active_chest.as_mut() {
            chest.select_prev();
        }
    }

    pub fn confirm_selection(&mut self) {
        if let Some(chest) = self.active_chest.as_mut() {
            chest.confirm_selection();
        }
    }

    pub fn skip_to_reveal(&mut self) {
        if let Some(chest) = self.active_chest.as_mut() {
            chest.skip_to_reveal();
        }
    }

    /// Agent completions are not visible in the transcript stream; callers
    /// that learn about one report it here.
    pub fn record_agent_complete(&mut self) -> bool {
        let leveled_up = self.profile.record_agent_complete();
        self.dirty = true;
        if leveled_up {
            self.pending_level_up = true;
            let _ = self.checkpoint();
        }
        leveled_up
    }

    /// Save now. On failure the profile stays dirty and the next
    /// checkpoint retries.
    pub fn checkpoint(&mut self) -> crate::Result<()> {
        match self.store.save(&mut self.profile) {
            Ok(()) => {
                self.dirty = false;
                self.autosave_timer = 0.0;
                self.last_save_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to save profile to {}: {}", self.store.path().display(), e);
                self.dirty = true;
                self.last_save_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
