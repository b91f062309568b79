//! The `quest_core` storage port implemented on [`PostgresPool`].
//!
//! Two statements carry the concurrency-sensitive semantics:
//!
//! - `award_xp` applies the delta and recomputes the level inside one
//!   `UPDATE`, so concurrent quest completion and voice grading serialize
//!   per player row. The level expression mirrors the core level engine
//!   (`total_xp / 100 + 1`); keep the two in sync.
//! - `complete_quest` flips `is_completed` with a compare-and-set
//!   (`WHERE ... is_completed = FALSE`), so exactly one caller receives
//!   the XP reward to apply.

use quest_core::ports::{ProgressStore, StorageError};
use quest_types::{
    AppraisalLog, NewAppraisal, NewPlayer, Player, PlayerId, Quest, QuestId, Reward,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::to_storage;
use crate::postgres::PostgresPool;
use crate::rows::{AppraisalRow, PlayerRow, QuestRow, RewardRow, rank_to_db};

/// Clamp an unsigned domain value into a signed DB bind.
fn to_db_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl ProgressStore for PostgresPool {
    async fn get_player(&self, id: PlayerId) -> Result<Player, StorageError> {
        let row = sqlx::query_as::<_, PlayerRow>(
            r"SELECT id, parent_id, name, mana_color, level, total_xp,
                     goal_yearly, goal_monthly, created_at
              FROM players
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool())
        .await
        .map_err(to_storage)?
        .ok_or_else(|| StorageError::NotFound(format!("player {id}")))?;

        Ok(row.into())
    }

    async fn create_player(
        &self,
        new: NewPlayer,
        child_cap: u32,
    ) -> Result<Player, StorageError> {
        // The cap check and the insert are one statement, so two racing
        // onboardings cannot both slip under the cap.
        let row = sqlx::query_as::<_, PlayerRow>(
            r"INSERT INTO players (parent_id, name, mana_color)
              SELECT $1, $2, $3
              WHERE (SELECT COUNT(*) FROM players WHERE parent_id = $1) < $4
              RETURNING id, parent_id, name, mana_color, level, total_xp,
                        goal_yearly, goal_monthly, created_at",
        )
        .bind(Uuid::from(new.parent_id))
        .bind(&new.name)
        .bind(&new.mana_color)
        .bind(i64::from(child_cap))
        .fetch_optional(self.pool())
        .await
        .map_err(to_storage)?;

        row.map(Player::from)
            .ok_or(StorageError::ChildCapReached { cap: child_cap })
    }

    async fn update_goals(
        &self,
        id: PlayerId,
        goal_yearly: Option<String>,
        goal_monthly: Option<String>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"UPDATE players SET goal_yearly = $2, goal_monthly = $3 WHERE id = $1",
        )
        .bind(id.into_inner())
        .bind(goal_yearly)
        .bind(goal_monthly)
        .execute(self.pool())
        .await
        .map_err(to_storage)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("player {id}")));
        }
        Ok(())
    }

    async fn award_xp(&self, id: PlayerId, delta: u64) -> Result<Player, StorageError> {
        // Server-side increment: the read-modify-write happens inside the
        // UPDATE, and the level is recomputed from the post-update total
        // with the same linear formula as quest_core::level.
        let row = sqlx::query_as::<_, PlayerRow>(
            r"UPDATE players
              SET total_xp = total_xp + $2,
                  level = ((total_xp + $2) / 100 + 1)::INTEGER
              WHERE id = $1
              RETURNING id, parent_id, name, mana_color, level, total_xp,
                        goal_yearly, goal_monthly, created_at",
        )
        .bind(id.into_inner())
        .bind(to_db_i64(delta))
        .fetch_optional(self.pool())
        .await
        .map_err(to_storage)?
        .ok_or_else(|| StorageError::NotFound(format!("player {id}")))?;

        debug!(player_id = %id, delta, "awarded XP");
        Ok(row.into())
    }

    async fn get_quest(&self, id: QuestId) -> Result<Quest, StorageError> {
        let row = sqlx::query_as::<_, QuestRow>(
            r"SELECT id, player_id, title, xp_reward, is_completed, created_at
              FROM quests
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool())
        .await
        .map_err(to_storage)?
        .ok_or_else(|| StorageError::NotFound(format!("quest {id}")))?;

        Ok(row.into())
    }

    async fn list_quests(
        &self,
        player: PlayerId,
        completed: Option<bool>,
    ) -> Result<Vec<Quest>, StorageError> {
        let rows = match completed {
            Some(flag) => {
                sqlx::query_as::<_, QuestRow>(
                    r"SELECT id, player_id, title, xp_reward, is_completed, created_at
                      FROM quests
                      WHERE player_id = $1 AND is_completed = $2
                      ORDER BY created_at",
                )
                .bind(player.into_inner())
                .bind(flag)
                .fetch_all(self.pool())
                .await
            }
            None => {
                sqlx::query_as::<_, QuestRow>(
                    r"SELECT id, player_id, title, xp_reward, is_completed, created_at
                      FROM quests
                      WHERE player_id = $1
                      ORDER BY created_at",
                )
                .bind(player.into_inner())
                .fetch_all(self.pool())
                .await
            }
        }
        .map_err(to_storage)?;

        Ok(rows.into_iter().map(Quest::from).collect())
    }

    async fn insert_quest(
        &self,
        player: PlayerId,
        title: String,
        xp_reward: u64,
    ) -> Result<Quest, StorageError> {
        let row = sqlx::query_as::<_, QuestRow>(
            r"INSERT INTO quests (player_id, title, xp_reward)
              VALUES ($1, $2, $3)
              RETURNING id, player_id, title, xp_reward, is_completed, created_at",
        )
        .bind(player.into_inner())
        .bind(&title)
        .bind(to_db_i64(xp_reward))
        .fetch_one(self.pool())
        .await
        .map_err(to_storage)?;

        Ok(row.into())
    }

    async fn complete_quest(&self, id: QuestId) -> Result<Option<u64>, StorageError> {
        // CAS on the completion flag. No row back means the transition
        // already happened (or the quest is gone); either way the XP must
        // not be applied again by this caller.
        let reward: Option<i64> = sqlx::query_scalar(
            r"UPDATE quests
              SET is_completed = TRUE
              WHERE id = $1 AND is_completed = FALSE
              RETURNING xp_reward",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool())
        .await
        .map_err(to_storage)?;

        Ok(reward.map(|xp| u64::try_from(xp).unwrap_or(0)))
    }

    async fn completed_quest_count(&self, player: PlayerId) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM quests WHERE player_id = $1 AND is_completed = TRUE",
        )
        .bind(player.into_inner())
        .fetch_one(self.pool())
        .await
        .map_err(to_storage)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn list_rewards(&self, player: PlayerId) -> Result<Vec<Reward>, StorageError> {
        // Ordered by (target_level, created_at): the stable tie-break
        // order the reward evaluator relies on.
        let rows = sqlx::query_as::<_, RewardRow>(
            r"SELECT id, player_id, title, target_level, created_at
              FROM rewards
              WHERE player_id = $1
              ORDER BY target_level, created_at",
        )
        .bind(player.into_inner())
        .fetch_all(self.pool())
        .await
        .map_err(to_storage)?;

        Ok(rows.into_iter().map(Reward::from).collect())
    }

    async fn insert_reward(
        &self,
        player: PlayerId,
        title: String,
        target_level: u32,
    ) -> Result<Reward, StorageError> {
        let row = sqlx::query_as::<_, RewardRow>(
            r"INSERT INTO rewards (player_id, title, target_level)
              VALUES ($1, $2, $3)
              RETURNING id, player_id, title, target_level, created_at",
        )
        .bind(player.into_inner())
        .bind(&title)
        .bind(i64::from(target_level))
        .fetch_one(self.pool())
        .await
        .map_err(to_storage)?;

        Ok(row.into())
    }

    async fn insert_appraisal(&self, log: NewAppraisal) -> Result<AppraisalLog, StorageError> {
        if !log.rank.is_terminal() {
            // Input-contract violation: retry attempts are never logged.
            return Err(StorageError::Unavailable(
                "refusing to persist a RETRY rank".to_owned(),
            ));
        }

        let row = sqlx::query_as::<_, AppraisalRow>(
            r"INSERT INTO appraisal_logs (player_id, transcript, rank, comment, xp_awarded)
              VALUES ($1, $2, $3, $4, $5)
              RETURNING id, player_id, transcript, rank, comment, xp_awarded, created_at",
        )
        .bind(Uuid::from(log.player_id))
        .bind(&log.transcript)
        .bind(rank_to_db(log.rank))
        .bind(&log.comment)
        .bind(to_db_i64(log.xp_awarded))
        .fetch_one(self.pool())
        .await
        .map_err(to_storage)?;

        Ok(row.into())
    }

    async fn list_recent_appraisals(
        &self,
        player: PlayerId,
        limit: u32,
    ) -> Result<Vec<AppraisalLog>, StorageError> {
        let rows = sqlx::query_as::<_, AppraisalRow>(
            r"SELECT id, player_id, transcript, rank, comment, xp_awarded, created_at
              FROM appraisal_logs
              WHERE player_id = $1
              ORDER BY created_at DESC
              LIMIT $2",
        )
        .bind(player.into_inner())
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(to_storage)?;

        Ok(rows.into_iter().map(AppraisalLog::from).collect())
    }
}
