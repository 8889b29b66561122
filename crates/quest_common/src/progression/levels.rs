//! Level System
//!
//! RPG-style levels with a quadratic XP curve.
//!
//! ## XP Curve
//!
//! Total XP required to reach level L: 100 * L^2
//!
//! This means:
//! - Level 1: 100 XP
//! - Level 10: 10,000 XP total
//! - Level 50: 250,000 XP total
//!
//! Level 0 is the starting level and needs no XP.

/// XP needed to reach level 1
pub const BASE_XP: u64 = 100;

/// Total XP required to reach `level` from 0. Saturates at `u64::MAX`.
pub fn xp_for_level(level: u32) -> u64 {
    u64::try_from(threshold(level)).unwrap_or(u64::MAX)
}

fn threshold(level: u32) -> u128 {
    let l = level as u128;
    BASE_XP as u128 * l * l
}

/// Largest level whose threshold is covered by `total_xp`
pub fn level_from_xp(total_xp: u64) -> u32 {
    let xp = total_xp as u128;

    // sqrt gets within one level; the loops settle float rounding
    let mut level = ((total_xp / BASE_XP) as f64).sqrt() as u32;
    while level > 0 && threshold(level) > xp {
        level -= 1;
    }
    while threshold(level + 1) <= xp {
        level += 1;
    }
    level
}

/// XP still missing to reach the level after `level`
pub fn xp_to_next_level(level: u32, total_xp: u64) -> u64 {
    xp_for_level(level.saturating_add(1)).saturating_sub(total_xp)
}

/// Progress within the current level (0.0 - 1.0)
pub fn level_progress(level: u32, total_xp: u64) -> f32 {
    let current = xp_for_level(level);
    let next = xp_for_level(level.saturating_add(1));
    if next <= current {
        return 1.0;
    }
    let progress = total_xp.saturating_sub(current) as f64 / (next - current) as f64;
    progress.clamp(0.0, 1.0) as f32
}
