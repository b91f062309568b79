//! Row structs mirroring the progression tables, and their conversions
//! into the shared domain types.
//!
//! DB integers are signed (`BIGINT`/`INTEGER`); the domain uses unsigned
//! XP and levels. Conversions clamp rather than panic: the migrations
//! carry `CHECK` constraints that keep the stored values non-negative, so
//! a clamp only ever fires on a hand-edited row.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use quest_types::{AppraisalLog, Player, Quest, Rank, Reward};

/// A row from the `players` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning parent account.
    pub parent_id: Uuid,
    /// Display name.
    pub name: String,
    /// Theme color token.
    pub mana_color: String,
    /// Derived level.
    pub level: i32,
    /// Lifetime XP.
    pub total_xp: i64,
    /// Optional yearly goal text.
    pub goal_yearly: Option<String>,
    /// Optional monthly goal text.
    pub goal_monthly: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Self {
            id: row.id.into(),
            parent_id: row.parent_id.into(),
            name: row.name,
            mana_color: row.mana_color,
            level: u32::try_from(row.level).unwrap_or(1),
            total_xp: u64::try_from(row.total_xp).unwrap_or(0),
            goal_yearly: row.goal_yearly,
            goal_monthly: row.goal_monthly,
            created_at: row.created_at,
        }
    }
}

/// A row from the `quests` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning player.
    pub player_id: Uuid,
    /// Quest title.
    pub title: String,
    /// XP granted on completion.
    pub xp_reward: i64,
    /// One-way completion flag.
    pub is_completed: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<QuestRow> for Quest {
    fn from(row: QuestRow) -> Self {
        Self {
            id: row.id.into(),
            player_id: row.player_id.into(),
            title: row.title,
            xp_reward: u64::try_from(row.xp_reward).unwrap_or(0),
            is_completed: row.is_completed,
            created_at: row.created_at,
        }
    }
}

/// A row from the `rewards` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RewardRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning player.
    pub player_id: Uuid,
    /// Reward title.
    pub title: String,
    /// Unlock threshold.
    pub target_level: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<RewardRow> for Reward {
    fn from(row: RewardRow) -> Self {
        Self {
            id: row.id.into(),
            player_id: row.player_id.into(),
            title: row.title,
            target_level: u32::try_from(row.target_level).unwrap_or(1),
            created_at: row.created_at,
        }
    }
}

/// A row from the `appraisal_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppraisalRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning player.
    pub player_id: Uuid,
    /// Transcribed report.
    pub transcript: String,
    /// Terminal rank, stored as text.
    pub rank: String,
    /// Guild-master comment.
    pub comment: String,
    /// XP awarded for the report.
    pub xp_awarded: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<AppraisalRow> for AppraisalLog {
    fn from(row: AppraisalRow) -> Self {
        Self {
            id: row.id.into(),
            player_id: row.player_id.into(),
            transcript: row.transcript,
            // The CHECK constraint limits stored values to terminal
            // ranks; an unknown value degrades to C rather than failing
            // a whole history query.
            rank: rank_from_db(&row.rank).unwrap_or(Rank::C),
            comment: row.comment,
            xp_awarded: u64::try_from(row.xp_awarded).unwrap_or(0),
            created_at: row.created_at,
        }
    }
}

/// Terminal rank to its stored text value.
///
/// Only terminal ranks are persistable; callers guard against
/// [`Rank::Retry`] before insert.
pub(crate) const fn rank_to_db(rank: Rank) -> &'static str {
    match rank {
        Rank::S => "S",
        Rank::A => "A",
        Rank::B => "B",
        Rank::C => "C",
        Rank::Retry => "RETRY",
    }
}

/// Stored text value back to a rank.
pub(crate) fn rank_from_db(value: &str) -> Option<Rank> {
    match value {
        "S" => Some(Rank::S),
        "A" => Some(Rank::A),
        "B" => Some(Rank::B),
        "C" => Some(Rank::C),
        _ => None,
    }
}
