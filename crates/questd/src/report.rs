//! Plain-text career summary for `questd profile`.

use quest_common::{CareerProfile, ItemRegistry, ItemSlot};
use std::fmt::Write;

pub fn profile_summary(profile: &CareerProfile, registry: &ItemRegistry) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Level {}  ({} XP, {} to next, {:.0}% through level)",
        profile.level,
        profile.xp,
        profile.xp_to_next_level(),
        profile.level_progress() * 100.0
    );
    let _ = writeln!(
        out,
        "Sessions {}  since {}",
        profile.sessions_started,
        profile.first_seen.format("%Y-%m-%d")
    );
    let _ = writeln!(
        out,
        "Reads {}  Writes {}  Bash {}/{}  Todos {}  Agents {}  Tokens {}",
        profile.total_reads,
        profile.total_writes,
        profile.bash_successes,
        profile.total_bash,
        profile.todos_completed,
        profile.agents_completed,
        profile.tokens_consumed
    );
    let _ = writeln!(
        out,
        "Flow peaks {}  Best bash streak {}  Bonus chests {}",
        profile.peak_flow_count, profile.best_bash_streak, profile.bonus_chests_found
    );

    for slot in ItemSlot::ALL {
        let owned = profile.owned_in_slot(registry, slot);
        let locked = profile.locked_in_slot(registry, slot);
        let names: Vec<&str> = owned.iter().map(|item| item.name).collect();
        let shown = if names.is_empty() { "-".to_string() } else { names.join(", ") };
        let _ = writeln!(
            out,
            "{:<6} {}/{}  {}",
            slot.name(),
            owned.len(),
            owned.len() + locked.len(),
            shown
        );
    }

    if profile.pending_choice {
        let _ = writeln!(out, "A chest is waiting for the next session");
    }
    out
}
