//! Quest completion: flat XP award with at-most-once semantics.
//!
//! The `is_completed` flag on the quest row is the idempotency guard. The
//! store flips it with a compare-and-set (`UPDATE ... WHERE is_completed =
//! FALSE`), so only the call that performs the false-to-true transition
//! receives the XP reward to apply. Re-invoking on a completed quest is a
//! no-op that reports the player's current level with no level-up.
//!
//! Ordering: the flag is flipped first, then the XP is awarded through the
//! store's atomic increment. If the award write fails after the flip, the
//! error is surfaced and a retry of the operation will be a no-op rather
//! than a double award; the caller decides whether to re-drive the award.

use tracing::{info, warn};

use quest_types::{PlayerId, QuestId};

use crate::error::CoreError;
use crate::level::level_for_xp;
use crate::ports::ProgressStore;

/// The result of a quest completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// The player's level after the award.
    pub new_level: u32,
    /// True when the award crossed a level boundary. Drives the
    /// celebratory UI; it is a notification, not a state transition.
    pub leveled_up: bool,
    /// XP actually applied by this call. Zero for the no-op path.
    pub awarded_xp: u64,
}

/// Complete a quest for the active player and award its XP.
///
/// Preconditions: the quest exists and belongs to `player`. An
/// already-completed quest is a no-op, not an error.
///
/// # Errors
///
/// [`CoreError::WrongPlayer`] if the quest belongs to someone else,
/// [`CoreError::Storage`] if any write fails.
pub async fn complete_quest<S: ProgressStore>(
    store: &S,
    player: PlayerId,
    quest_id: QuestId,
) -> Result<CompletionOutcome, CoreError> {
    let quest = store.get_quest(quest_id).await?;
    if quest.player_id != player {
        return Err(CoreError::WrongPlayer {
            quest: quest_id,
            player,
        });
    }

    let Some(xp_reward) = store.complete_quest(quest_id).await? else {
        // Someone already completed it (possibly a double-tap). The XP
        // was awarded exactly once back then; report current state.
        warn!(quest_id = %quest_id, "quest already completed, skipping award");
        let current = store.get_player(player).await?;
        return Ok(CompletionOutcome {
            new_level: current.level,
            leveled_up: false,
            awarded_xp: 0,
        });
    };

    let updated = store.award_xp(player, xp_reward).await?;

    // The store returns the post-award row; the pre-award level falls out
    // of the total minus the delta we just applied.
    let prior_total = updated.total_xp.saturating_sub(xp_reward);
    let leveled_up = updated.level > level_for_xp(prior_total);

    info!(
        player_id = %player,
        quest_id = %quest_id,
        awarded_xp = xp_reward,
        new_level = updated.level,
        leveled_up = leveled_up,
        "quest completed"
    );

    Ok(CompletionOutcome {
        new_level: updated.level,
        leveled_up,
        awarded_xp: xp_reward,
    })
}
