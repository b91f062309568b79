//! Persistence layer for the Solo Quest progression core.
//!
//! Two stores live here, matching the two kinds of state the core keeps:
//!
//! - [`PostgresPool`] implements `quest_core::ports::ProgressStore`
//!   against the hosted `PostgreSQL` database (players, quests, rewards,
//!   appraisal logs). The concurrency-sensitive writes -- the atomic XP
//!   increment and the quest-completion compare-and-set -- are single SQL
//!   statements.
//! - [`QuotaFile`] implements `quest_core::ports::QuotaStore` as a small
//!   device-local JSON file holding the daily grading counter.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration, migrations
//! - [`progress`] -- The `ProgressStore` port implementation
//! - [`quota_file`] -- The device-local `QuotaStore` implementation
//! - [`rows`] -- Table row structs and domain conversions
//! - [`error`] -- Infrastructure error types

pub mod error;
pub mod postgres;
pub mod progress;
pub mod quota_file;
pub mod rows;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use quota_file::QuotaFile;
