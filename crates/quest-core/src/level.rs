//! Level engine: pure arithmetic from total XP to level and progress.
//!
//! The single level formula used everywhere in the workspace:
//!
//! ```text
//! level = total_xp / 100 + 1      (integer division)
//! ```
//!
//! Level 1 starts at 0 XP and every level is exactly [`XP_PER_LEVEL`] wide.
//! Total XP is unsigned, so the "reject negative XP" input contract is
//! discharged by the type system. The same expression is mirrored in the
//! store's atomic XP-award statement so `player.level` can never drift from
//! `player.total_xp`.

use quest_types::LevelProgress;

/// XP span of every level. The next-level threshold is always this far
/// from the start of the current level.
pub const XP_PER_LEVEL: u64 = 100;

/// Compute the level for a lifetime XP total.
///
/// Monotone non-decreasing in `total_xp` and always at least 1.
/// Saturates at `u32::MAX` for totals beyond any reachable play time.
pub const fn level_for_xp(total_xp: u64) -> u32 {
    let levels = (total_xp / XP_PER_LEVEL).saturating_add(1);
    if levels > u32::MAX as u64 {
        u32::MAX
    } else {
        // Truncation impossible: guarded above.
        #[allow(clippy::cast_possible_truncation)]
        {
            levels as u32
        }
    }
}

/// XP accumulated since the start of the current level.
pub const fn xp_into_current_level(total_xp: u64) -> u64 {
    total_xp % XP_PER_LEVEL
}

/// Derive the full progress view (level, XP into level, XP to next level)
/// for a lifetime XP total.
pub const fn progress_for_xp(total_xp: u64) -> LevelProgress {
    let xp_into_level = xp_into_current_level(total_xp);
    LevelProgress {
        level: level_for_xp(total_xp),
        xp_into_level,
        xp_to_next: XP_PER_LEVEL.saturating_sub(xp_into_level),
    }
}
