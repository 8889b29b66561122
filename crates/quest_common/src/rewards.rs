//! Reward engine - bonus loot triggers and chest contents.
//!
//! The trigger table is evaluated in order. The first trigger that is both
//! satisfied and wins its own random draw awards the session's single bonus
//! chest, so earlier entries take priority when several are satisfied at
//! once.

use crate::chest::TreasureChest;
use crate::progression::{CareerProfile, ItemRegistry, SessionStats};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Items offered by a level-up chest
pub const LEVEL_UP_CHOICES: usize = 3;
/// Items offered by a bonus chest
pub const BONUS_CHOICES: usize = 1;

/// A named bonus predicate with its own award probability
#[derive(Clone, Copy)]
pub struct BonusTrigger {
    pub name: &'static str,
    pub check: fn(&SessionStats) -> bool,
    /// Probability in 0.0 - 1.0
    pub chance: f32,
}

fn flow_peak(stats: &SessionStats) -> bool {
    stats.flow_peak_reached
}

fn bash_streak(stats: &SessionStats) -> bool {
    stats.best_bash_streak >= 10
}

fn todo_master(stats: &SessionStats) -> bool {
    stats.todos_completed >= 5
}

fn marathon(stats: &SessionStats) -> bool {
    stats.total_tool_calls >= 200
}

/// Built-in trigger table, in priority order
pub const BONUS_TRIGGERS: &[BonusTrigger] = &[
    BonusTrigger { name: "Flow Peak", check: flow_peak, chance: 0.30 },
    BonusTrigger { name: "Bash Streak", check: bash_streak, chance: 0.20 },
    BonusTrigger { name: "Todo Master", check: todo_master, chance: 0.25 },
    BonusTrigger { name: "Marathon", check: marathon, chance: 0.40 },
];

/// Builds chests and rolls bonus triggers from immutable tables and an
/// injectable random source
pub struct RewardEngine<R: Rng = StdRng> {
    registry: ItemRegistry,
    triggers: Vec<BonusTrigger>,
    rng: R,
}

impl RewardEngine<StdRng> {
    /// Built-in triggers, entropy-seeded
    pub fn new(registry: ItemRegistry) -> Self {
        Self::with_rng(registry, StdRng::from_entropy())
    }

    /// Built-in triggers with a fixed seed
    pub fn with_seed(registry: ItemRegistry, seed: u64) -> Self {
        Self::with_rng(registry, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RewardEngine<R> {
    pub fn with_rng(registry: ItemRegistry, rng: R) -> Self {
        Self {
            registry,
            triggers: BONUS_TRIGGERS.to_vec(),
            rng,
        }
    }

    /// Replace the trigger table
    pub fn with_triggers(mut self, triggers: Vec<BonusTrigger>) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn triggers(&self) -> &[BonusTrigger] {
        &self.triggers
    }

    /// Roll for the session's bonus chest. Returns the winning trigger name
    /// and sets the session latch. Does nothing once the latch is set.
    pub fn check_bonus_chest(&mut self, stats: &mut SessionStats) -> Option<&'static str> {
        if stats.bonus_chest_awarded {
            return None;
        }

        for trigger in &self.triggers {
            if !(trigger.check)(stats) {
                continue;
            }
            let roll: f32 = self.rng.gen();
            if roll < trigger.chance {
                stats.bonus_chest_awarded = true;
                info!("Bonus chest earned: {}", trigger.name);
                return Some(trigger.name);
            }
            debug!("Bonus trigger {} satisfied, roll {:.2} missed", trigger.name, roll);
        }
        None
    }

    /// Level-up chest with up to three choices from the profile's pool
    pub fn level_up_chest(&mut self, profile: &CareerProfile) -> TreasureChest {
        let items = profile.random_choices(&self.registry, LEVEL_UP_CHOICES, &mut self.rng);
        TreasureChest::level_up(items)
    }

    /// Bonus chest holding a single random item
    pub fn bonus_chest(&mut self, profile: &CareerProfile, reason: &str) -> TreasureChest {
        let items = profile.random_choices(&self.registry, BONUS_CHOICES, &mut self.rng);
        TreasureChest::bonus(items, reason)
    }
}
