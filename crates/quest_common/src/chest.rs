//! Treasure chest ceremony.
//!
//! Closed -> Wobble -> Opening -> Revealing -> [Choosing] -> Claiming -> Done
//!
//! Every state except Choosing advances on its own after a fixed duration.
//! Choosing only happens when there is more than one item and waits for
//! `confirm_selection`. At most one state change happens per `update` call.

use crate::progression::Item;
use serde::Serialize;

pub const CLOSED_SECS: f32 = 0.5;
pub const WOBBLE_SECS: f32 = 0.8;
pub const OPENING_SECS: f32 = 0.5;
pub const REVEALING_SECS: f32 = 0.6;
pub const CLAIMING_SECS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChestType {
    LevelUp,
    Bonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChestState {
    Closed,
    Wobble,
    Opening,
    Revealing,
    Choosing,
    Claiming,
    Done,
}

impl ChestState {
    pub fn name(&self) -> &'static str {
        match self {
            ChestState::Closed => "closed",
            ChestState::Wobble => "wobble",
            ChestState::Opening => "opening",
            ChestState::Revealing => "revealing",
            ChestState::Choosing => "choosing",
            ChestState::Claiming => "claiming",
            ChestState::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreasureChest {
    pub chest_type: ChestType,
    pub state: ChestState,
    /// 3 for level-up, 1 for bonus, fewer (possibly 0) when the pool ran dry
    pub items: Vec<Item>,
    pub selected_idx: usize,
    pub claimed_item: Option<Item>,
    /// Seconds spent in the current state
    pub timer: f32,
    /// Bonus trigger name, empty for level-up chests
    pub reason: String,
}

impl TreasureChest {
    fn new(chest_type: ChestType, items: Vec<Item>, reason: String) -> Self {
        Self {
            chest_type,
            state: ChestState::Closed,
            items,
            selected_idx: 0,
            claimed_item: None,
            timer: 0.0,
            reason,
        }
    }

    pub fn level_up(items: Vec<Item>) -> Self {
        Self::new(ChestType::LevelUp, items, String::new())
    }

    pub fn bonus(items: Vec<Item>, reason: impl Into<String>) -> Self {
        Self::new(ChestType::Bonus, items, reason.into())
    }

    fn enter(&mut self, state: ChestState) {
        self.state = state;
        self.timer = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        if dt > 0.0 {
            self.timer += dt;
        }

        match self.state {
            ChestState::Closed if self.timer > CLOSED_SECS => self.enter(ChestState::Wobble),
            ChestState::Wobble if self.timer > WOBBLE_SECS => self.enter(ChestState::Opening),
            ChestState::Opening if self.timer > OPENING_SECS => self.enter(ChestState::Revealing),
            ChestState::Revealing if self.timer > REVEALING_SECS => {
                if self.items.len() > 1 {
                    self.enter(ChestState::Choosing);
                } else {
                    // single item (or none) is claimed without asking
                    self.claimed_item = self.items.first().copied();
                    self.enter(ChestState::Claiming);
                }
            }
            ChestState::Claiming if self.timer > CLAIMING_SECS => self.enter(ChestState::Done),
            _ => {}
        }
    }

    pub fn select_next(&mut self) {
        if self.state != ChestState::Choosing || self.items.is_empty() {
            return;
        }
        self.selected_idx = (self.selected_idx + 1) % self.items.len();
    }

    pub fn select_prev(&mut self) {
        if self.state != ChestState::Choosing || self.items.is_empty() {
            return;
        }
        self.selected_idx = match self.selected_idx {
            0 => self.items.len() - 1,
            idx => idx - 1,
        };
    }

    /// Claim the highlighted item and move on to Claiming
    pub fn confirm_selection(&mut self) {
        if self.state != ChestState::Choosing {
            return;
        }
        if let Some(item) = self.items.get(self.selected_idx) {
            self.claimed_item = Some(*item);
            self.enter(ChestState::Claiming);
        }
    }

    /// Jump from Closed or Wobble straight to Opening
    pub fn skip_to_reveal(&mut self) {
        if matches!(self.state, ChestState::Closed | ChestState::Wobble) {
            self.enter(ChestState::Opening);
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == ChestState::Done
    }

    /// Waiting for a choice
    pub fn is_interactive(&self) -> bool {
        self.state == ChestState::Choosing
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.items.get(self.selected_idx)
    }

    fn progress_in(&self, state: ChestState, duration: f32) -> f32 {
        if self.state == state {
            (self.timer / duration).clamp(0.0, 1.0)
        } else if self.state > state {
            1.0
        } else {
            0.0
        }
    }

    pub fn open_progress(&self) -> f32 {
        self.progress_in(ChestState::Opening, OPENING_SECS)
    }

    pub fn reveal_progress(&self) -> f32 {
        self.progress_in(ChestState::Revealing, REVEALING_SECS)
    }

    pub fn claim_progress(&self) -> f32 {
        self.progress_in(ChestState::Claiming, CLAIMING_SECS)
    }

    /// Horizontal shake for the chest sprite, growing through Wobble
    pub fn wobble_offset(&self) -> f32 {
        if self.state != ChestState::Wobble {
            return 0.0;
        }
        let intensity = (self.timer / WOBBLE_SECS).min(1.0);
        (self.timer * 20.0).sin() * intensity * 3.0
    }
}
