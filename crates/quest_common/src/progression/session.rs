//! Per-session stats and the flow meter.
//!
//! Nothing here is persisted. A `SessionStats` lives for one process run.

use serde::Serialize;

/// Flow gained per qualifying event
pub const FLOW_STEP: f32 = 0.05;
/// Flow lost per idle second once the grace period is over
pub const FLOW_DECAY_PER_SEC: f32 = 0.03;
/// Idle seconds before the meter starts to drain
pub const FLOW_GRACE_SECS: f32 = 5.0;

/// Ephemeral counters for the running session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub reads: u32,
    pub writes: u32,
    pub bash_total: u32,
    pub bash_successes: u32,
    pub todos_completed: u32,
    pub total_tool_calls: u32,

    /// 0.0 - 1.0
    pub flow_meter: f32,
    /// Seconds since the last qualifying event
    pub flow_idle_secs: f32,
    /// Hit 1.0 at least once this session
    pub flow_peak_reached: bool,

    pub current_bash_streak: u32,
    pub best_bash_streak: u32,

    /// At most one bonus chest per session
    pub bonus_chest_awarded: bool,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the flow meter. Returns true exactly once per session: the
    /// first time the meter saturates.
    pub fn record_activity(&mut self) -> bool {
        self.flow_idle_secs = 0.0;
        self.flow_meter = (self.flow_meter + FLOW_STEP).min(1.0);

        if self.flow_meter >= 1.0 && !self.flow_peak_reached {
            self.flow_peak_reached = true;
            return true;
        }
        false
    }

    /// Advance the idle clock and drain the meter after the grace period
    pub fn tick_flow(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        self.flow_idle_secs += dt;
        if self.flow_idle_secs > FLOW_GRACE_SECS {
            self.flow_meter = (self.flow_meter - dt * FLOW_DECAY_PER_SEC).max(0.0);
        }
    }

    pub fn record_bash_result(&mut self, success: bool) {
        self.bash_total += 1;

        if success {
            self.bash_successes += 1;
            self.current_bash_streak += 1;
            self.best_bash_streak = self.best_bash_streak.max(self.current_bash_streak);
        } else {
            self.current_bash_streak = 0;
        }
    }
}
