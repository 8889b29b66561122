//! Frame loop - drains events into the animation and the companion session.
//!
//! Runs at the configured frame rate. Each frame:
//! 1. drain every queued event without waiting
//! 2. sync the activity flag into the animation system
//! 3. advance the animation and the session (chest ceremony included)
//!
//! Headless runs cannot answer a chest prompt, so the loop confirms the
//! highlighted item as soon as a ceremony starts asking.

use quest_common::{
    AnimationSystem, AnimationType, ChestSettlement, CompanionSession, Event, EventOutcome,
    EventSource,
};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

pub struct FrameLoop<R: Rng = StdRng> {
    animation: AnimationSystem,
    session: CompanionSession<R>,
    last_anim: AnimationType,
}

impl<R: Rng> FrameLoop<R> {
    pub fn new(animation: AnimationSystem, session: CompanionSession<R>) -> Self {
        let last_anim = animation.current();
        Self {
            animation,
            session,
            last_anim,
        }
    }

    pub fn animation(&self) -> &AnimationSystem {
        &self.animation
    }

    pub fn session(&self) -> &CompanionSession<R> {
        &self.session
    }

    pub fn handle_event(&mut self, event: &Event) -> EventOutcome {
        debug!("Event {}: {}", event.kind, event.details);
        self.animation.handle_event(event);
        let outcome = self.session.handle_event(event);

        if outcome.xp_gained > 0 {
            debug!(
                "+{} XP (level {}, {} to next)",
                outcome.xp_gained,
                self.session.profile().level,
                self.session.profile().xp_to_next_level()
            );
        }
        if let Some(reason) = outcome.bonus_chest {
            info!("Bonus chest incoming: {}", reason);
        }
        if outcome.save_failed {
            warn!("Progress kept in memory, next autosave retries");
        }
        outcome
    }

    /// Handle every queued event. Returns how many there were.
    pub fn drain(&mut self, source: &mut EventSource) -> usize {
        let mut count = 0;
        while let Some(event) = source.try_next() {
            self.handle_event(&event);
            count += 1;
        }
        count
    }

    pub fn tick(&mut self, dt: f32) -> Option<ChestSettlement> {
        self.animation.set_active(self.session.is_active());
        self.animation.update(dt);

        let current = self.animation.current();
        if current != self.last_anim {
            debug!("Animation {} -> {}", self.last_anim, current);
            self.last_anim = current;
        }

        if self.session.active_chest().map_or(false, |c| c.is_interactive()) {
            if let Some(item) = self.session.active_chest().and_then(|c| c.selected_item()) {
                info!("Choosing {}", item.name);
            }
            self.session.confirm_selection();
        }

        let settlement = self.session.update(dt);
        match &settlement {
            Some(ChestSettlement::Claimed(item)) => info!("Unlocked {} ({})", item.name, item.slot.name()),
            Some(ChestSettlement::FallbackXp(xp)) => info!("Nothing left to unlock, +{} XP", xp),
            None => {}
        }
        settlement
    }

    /// Final save
    pub fn shutdown(&mut self) -> quest_common::Result<()> {
        let profile = self.session.profile();
        info!(
            "Session over: level {}, {} XP, {} items",
            profile.level,
            profile.xp,
            profile.owned_items.len()
        );
        self.session.checkpoint()
    }
}

/// Drive `frame_loop` from `source` until ctrl-c. With `stop_when_finished`
/// the loop also ends once the source task is done, its queue is drained
/// and no chest is left to settle.
pub async fn run<R: Rng>(
    mut source: EventSource,
    mut frame_loop: FrameLoop<R>,
    frame_interval: Duration,
    stop_when_finished: bool,
) -> anyhow::Result<FrameLoop<R>> {
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last = Instant::now();
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let finished = source.is_finished();
        frame_loop.drain(&mut source);
        frame_loop.tick(dt);

        if stop_when_finished && finished && !frame_loop.session().has_pending_rewards() {
            info!("Source finished");
            break;
        }
    }

    source.stop();
    if let Err(e) = frame_loop.shutdown() {
        warn!("Final save failed: {}", e);
    }
    Ok(frame_loop)
}
