//! Error taxonomy for the progression core.
//!
//! External-call failures are caught at the port boundary and mapped here;
//! the pure engines (level, rank policy, rewards, quota, gate) never see a
//! transport error. Programming errors -- a quest handed to the wrong
//! player, a submission without a recording -- get their own variants and
//! fail the operation fast instead of being silently coerced.

use quest_types::{PlayerId, QuestId};

use crate::ports::StorageError;

/// Errors that can occur in core progression operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The platform refused microphone access. Recovered locally: the
    /// session returns to idle and no quota is consumed.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The audio device failed while recording.
    #[error("audio capture failed: {0}")]
    Capture(String),

    /// Today's grading attempts are spent. No state was mutated.
    #[error("daily grading quota exhausted (limit {limit})")]
    QuotaExceeded {
        /// The configured daily limit.
        limit: u32,
    },

    /// No authenticated parent session exists; the operation refuses to
    /// run. The caller must redirect to the authentication flow.
    #[error("no authenticated parent session")]
    Unauthorized,

    /// A grading attempt is already in flight for this player; at most
    /// one grading session may be submitted at a time.
    #[error("a grading attempt is already in flight")]
    SessionBusy,

    /// The session was asked to submit without an active recording.
    #[error("no recording in progress")]
    NotRecording,

    /// A quest was handed to a player who does not own it.
    #[error("quest {quest} does not belong to player {player}")]
    WrongPlayer {
        /// The quest in question.
        quest: QuestId,
        /// The player that attempted the completion.
        player: PlayerId,
    },

    /// A storage operation failed. In-memory effects must not be treated
    /// as final until storage confirms.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
