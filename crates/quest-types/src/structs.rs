//! Core entity structs for the Solo Quest progression core.
//!
//! These mirror the backing store's `players`, `quests`, `rewards`, and
//! `appraisal_logs` tables plus the device-local quota counter. They are
//! exported to TypeScript via `ts-rs` so the mobile UI consumes the same
//! shapes the core persists.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Rank;
use crate::ids::{AppraisalId, ParentId, PlayerId, QuestId, RewardId};

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A child's hero profile.
///
/// `level` is always derived from `total_xp` by the level engine
/// (`level = total_xp / 100 + 1`); the two are persisted together in a
/// single atomic update so the invariant holds between writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Unique identifier.
    pub id: PlayerId,
    /// The parent account that owns this player.
    pub parent_id: ParentId,
    /// Display name chosen at onboarding.
    pub name: String,
    /// Theme color token ("mana color") chosen at onboarding.
    pub mana_color: String,
    /// Current level, derived from `total_xp`. Always at least 1.
    pub level: u32,
    /// Lifetime accumulated experience. Monotonically non-decreasing.
    pub total_xp: u64,
    /// Optional free-text yearly goal.
    pub goal_yearly: Option<String>,
    /// Optional free-text monthly goal.
    pub goal_monthly: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A new player profile to create at onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewPlayer {
    /// The parent account creating the hero.
    pub parent_id: ParentId,
    /// Display name.
    pub name: String,
    /// Theme color token.
    pub mana_color: String,
}

// ---------------------------------------------------------------------------
// Quest
// ---------------------------------------------------------------------------

/// A discrete assignable task with a fixed XP reward.
///
/// `is_completed` transitions one way, false to true. The transition is the
/// idempotency guard for the XP award: once true, the reward has been
/// applied exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Quest {
    /// Unique identifier.
    pub id: QuestId,
    /// The player this quest is assigned to.
    pub player_id: PlayerId,
    /// Quest title, e.g. "tidy the bookshelf".
    pub title: String,
    /// XP granted on completion. Parent-assigned, strictly positive.
    pub xp_reward: u64,
    /// Whether the quest has been completed (and its XP awarded).
    pub is_completed: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Reward
// ---------------------------------------------------------------------------

/// A level-gated unlockable configured by a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Reward {
    /// Unique identifier.
    pub id: RewardId,
    /// The player this reward belongs to.
    pub player_id: PlayerId,
    /// Reward title, e.g. "trip to the aquarium".
    pub title: String,
    /// The level at which the reward unlocks.
    pub target_level: u32,
    /// Creation timestamp. Used as the stable tie-break when several
    /// rewards share a `target_level`.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Appraisal log
// ---------------------------------------------------------------------------

/// A persisted record of one terminal voice-grading outcome.
///
/// Append-only. Written exactly once per graded report; retry-requested
/// attempts are not logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AppraisalLog {
    /// Unique identifier.
    pub id: AppraisalId,
    /// The player who made the report.
    pub player_id: PlayerId,
    /// What the grading model heard.
    pub transcript: String,
    /// The terminal rank. Never [`Rank::Retry`].
    pub rank: Rank,
    /// The guild master's comment back to the child.
    pub comment: String,
    /// XP awarded for this report.
    pub xp_awarded: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A new appraisal log entry to append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewAppraisal {
    /// The player who made the report.
    pub player_id: PlayerId,
    /// What the grading model heard.
    pub transcript: String,
    /// The terminal rank. Never [`Rank::Retry`].
    pub rank: Rank,
    /// The guild master's comment.
    pub comment: String,
    /// XP awarded.
    pub xp_awarded: u64,
}

// ---------------------------------------------------------------------------
// Graded report (grading backend output)
// ---------------------------------------------------------------------------

/// The raw result of one grading call, before the retry policy is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GradedReport {
    /// Transcription of the child's report.
    pub transcript: String,
    /// The rank the model assigned, possibly [`Rank::Retry`].
    pub rank: Rank,
    /// The model's comment back to the child.
    pub comment: String,
}

// ---------------------------------------------------------------------------
// Daily quota counter (device-local)
// ---------------------------------------------------------------------------

/// The device-local (calendar day, attempt count) pair behind the daily
/// grading quota.
///
/// Lives on the device, never synced. The count is meaningful only while
/// `date` equals the current calendar day; on any other day the effective
/// count is zero (lazy rollover reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QuotaCounter {
    /// Calendar day the count applies to.
    pub date: NaiveDate,
    /// Grading attempts recorded on `date`.
    pub count: u32,
}

impl QuotaCounter {
    /// A fresh counter for the given day with no attempts recorded.
    pub const fn fresh(date: NaiveDate) -> Self {
        Self { date, count: 0 }
    }
}

// ---------------------------------------------------------------------------
// Level progress (derived, display-oriented)
// ---------------------------------------------------------------------------

/// Progress within the current level, derived from total XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LevelProgress {
    /// Current level.
    pub level: u32,
    /// XP accumulated since the start of the current level.
    pub xp_into_level: u64,
    /// XP remaining until the next level.
    pub xp_to_next: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn quota_counter_round_trips_through_json() {
        let counter = QuotaCounter {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            count: 2,
        };
        let json = serde_json::to_string(&counter).unwrap();
        let back: QuotaCounter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, counter);
    }

    #[test]
    fn fresh_counter_has_zero_count() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let counter = QuotaCounter::fresh(day);
        assert_eq!(counter.count, 0);
        assert_eq!(counter.date, day);
    }
}
