//! Companion animation state machine.
//!
//! Events map through a fixed table to an animation. Idle is interrupted
//! immediately; anything else finishes first and the new animation waits in
//! a FIFO queue. Frames advance on a fixed cadence with the timer remainder
//! carried over, so slow frames catch up instead of drifting.

use crate::event::{Event, EventKind};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

/// Seconds per animation frame (24 fps)
pub const FRAME_DURATION: f32 = 0.042;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    Idle,
    Enter,
    Casting,
    Attack,
    Writing,
    Victory,
    Hurt,
    Thinking,
    Walk,
}

impl AnimationType {
    /// Frames in one pass of the animation
    pub fn frame_count(&self) -> u32 {
        match self {
            AnimationType::Idle => 16,
            AnimationType::Enter => 20,
            AnimationType::Casting => 16,
            AnimationType::Attack => 16,
            AnimationType::Writing => 16,
            AnimationType::Victory => 20,
            AnimationType::Hurt => 16,
            AnimationType::Thinking => 12,
            AnimationType::Walk => 16,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnimationType::Idle => "Idle",
            AnimationType::Enter => "Enter",
            AnimationType::Casting => "Casting",
            AnimationType::Attack => "Attack",
            AnimationType::Writing => "Writing",
            AnimationType::Victory => "Victory",
            AnimationType::Hurt => "Hurt",
            AnimationType::Thinking => "Thinking",
            AnimationType::Walk => "Walk",
        }
    }

    /// Transition table. `None` means the event leaves the animation alone.
    pub fn for_event(kind: EventKind) -> Option<Self> {
        let anim = match kind {
            EventKind::SessionStart => AnimationType::Enter,
            EventKind::Reading => AnimationType::Casting,
            EventKind::Bash => AnimationType::Attack,
            EventKind::Writing => AnimationType::Writing,
            EventKind::Success => AnimationType::Victory,
            EventKind::Error => AnimationType::Hurt,
            EventKind::Thinking => AnimationType::Thinking,
            EventKind::Idle => AnimationType::Idle,
            EventKind::Compact => AnimationType::Idle,
            EventKind::ThinkHard => AnimationType::Thinking,
            EventKind::SpawnAgent => AnimationType::Casting,
            EventKind::TodoUpdate => AnimationType::Writing,
            EventKind::AskUser => AnimationType::Thinking,
            EventKind::Quest => return None,
        };
        Some(anim)
    }
}

impl std::fmt::Display for AnimationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Snapshot handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationState {
    pub current: AnimationType,
    /// Always below `current.frame_count()`
    pub frame: u32,
    pub timer: f32,
    pub queue: VecDeque<AnimationType>,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            current: AnimationType::Idle,
            frame: 0,
            timer: 0.0,
            queue: VecDeque::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnimationSystem {
    state: AnimationState,
    walk_mode: bool,
    active: bool,
}

impl AnimationSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_walk_mode(mut self, enabled: bool) -> Self {
        self.walk_mode = enabled;
        self
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn current(&self) -> AnimationType {
        self.state.current
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn walk_mode(&self) -> bool {
        self.walk_mode
    }

    pub fn handle_event(&mut self, event: &Event) {
        if let Some(anim) = AnimationType::for_event(event.kind) {
            self.play(anim);
        }
    }

    /// Start `anim` now if idle, otherwise queue it
    pub fn play(&mut self, anim: AnimationType) {
        if self.state.current == AnimationType::Idle {
            self.switch_to(anim);
        } else {
            debug!("Queued {} behind {}", anim, self.state.current);
            self.state.queue.push_back(anim);
        }
    }

    fn switch_to(&mut self, anim: AnimationType) {
        self.state.current = anim;
        self.state.frame = 0;
        self.state.timer = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        self.state.timer += dt;

        while self.state.timer >= FRAME_DURATION {
            self.state.timer -= FRAME_DURATION;
            self.state.frame += 1;
            if self.state.frame >= self.state.current.frame_count() {
                self.on_complete();
            }
        }
    }

    fn on_complete(&mut self) {
        let next = match self.state.queue.pop_front() {
            Some(next) => next,
            None if self.walk_mode && self.active => AnimationType::Walk,
            None => AnimationType::Idle,
        };
        self.state.current = next;
        self.state.frame = 0;
    }

    pub fn set_walk_mode(&mut self, enabled: bool) {
        self.walk_mode = enabled;
    }

    /// Activity flag. Going inactive stops a walk, going active starts one
    /// from idle when walk mode is on.
    pub fn set_active(&mut self, active: bool) {
        let was_active = self.active;
        self.active = active;

        if was_active && !active && self.state.current == AnimationType::Walk {
            self.state.current = AnimationType::Idle;
            self.state.frame = 0;
        }
        if !was_active && active && self.walk_mode && self.state.current == AnimationType::Idle {
            self.state.current = AnimationType::Walk;
            self.state.frame = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind) -> Event {
        Event::new(kind, "")
    }

    fn finish(system: &mut AnimationSystem) {
        let frames = system.current().frame_count();
        for _ in 0..frames {
            system.update(FRAME_DURATION);
        }
    }

    #[test]
    fn test_idle_switches_immediately() {
        let mut system = AnimationSystem::new();
        system.handle_event(&event(EventKind::Bash));
        assert_eq!(system.current(), AnimationType::Attack);
        assert_eq!(system.state().frame, 0);
        assert!(system.state().queue.is_empty());
    }

    #[test]
    fn test_busy_animation_is_not_interrupted() {
        let mut system = AnimationSystem::new();
        system.handle_event(&event(EventKind::Reading));
        system.update(FRAME_DURATION * 3.5);
        let frame = system.state().frame;

        system.handle_event(&event(EventKind::Error));
        system.handle_event(&event(EventKind::Success));
        assert_eq!(system.current(), AnimationType::Casting);
        assert_eq!(system.state().frame, frame);
        assert_eq!(
            system.state().queue,
            VecDeque::from(vec![AnimationType::Hurt, AnimationType::Victory])
        );
    }

    #[test]
    fn test_queue_drains_in_order_then_idles() {
        let mut system = AnimationSystem::new();
        system.handle_event(&event(EventKind::Writing));
        system.handle_event(&event(EventKind::Thinking));

        finish(&mut system);
        assert_eq!(system.current(), AnimationType::Thinking);
        finish(&mut system);
        assert_eq!(system.current(), AnimationType::Idle);
    }

    #[test]
    fn test_quest_has_no_transition() {
        let mut system = AnimationSystem::new();
        system.handle_event(&event(EventKind::Quest));
        assert_eq!(system.current(), AnimationType::Idle);
        assert!(AnimationType::for_event(EventKind::Quest).is_none());
    }

    #[test]
    fn test_large_dt_catches_up_and_stays_in_range() {
        let mut system = AnimationSystem::new();
        system.handle_event(&event(EventKind::SessionStart));
        system.update(FRAME_DURATION * 25.0 + 0.01);
        // Enter (20 frames) finished, idle advanced ~5 frames
        assert_eq!(system.current(), AnimationType::Idle);
        assert!(system.state().frame < AnimationType::Idle.frame_count());
        assert!(system.state().timer < FRAME_DURATION);
    }

    #[test]
    fn test_frame_always_in_range() {
        let mut system = AnimationSystem::new();
        let kinds = [EventKind::Bash, EventKind::Reading, EventKind::Success, EventKind::Idle];
        for step in 0..2000 {
            if step % 7 == 0 {
                system.handle_event(&event(kinds[step % kinds.len()]));
            }
            system.update(0.013 * (1 + step % 5) as f32);
            assert!(system.state().frame < system.current().frame_count());
        }
    }

    #[test]
    fn test_walk_mode_follows_activity() {
        let mut system = AnimationSystem::new().with_walk_mode(true);
        system.set_active(true);
        assert_eq!(system.current(), AnimationType::Walk);

        system.set_active(false);
        assert_eq!(system.current(), AnimationType::Idle);

        // finished animation falls back to walk while active
        system.set_active(true);
        system.set_active(false);
        system.handle_event(&event(EventKind::Bash));
        system.set_active(true);
        finish(&mut system);
        assert_eq!(system.current(), AnimationType::Walk);
    }

    #[test]
    fn test_non_positive_dt_ignored() {
        let mut system = AnimationSystem::new();
        system.handle_event(&event(EventKind::Bash));
        system.update(0.0);
        system.update(-1.0);
        assert_eq!(system.state().frame, 0);
        assert_eq!(system.state().timer, 0.0);
    }
}
