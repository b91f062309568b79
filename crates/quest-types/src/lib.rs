//! Shared type definitions for the Solo Quest progression core.
//!
//! This crate is the single source of truth for all types used across the
//! workspace. Types defined here flow downstream to TypeScript via `ts-rs`
//! for the mobile UI.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- The appraisal [`Rank`] enumeration
//! - [`structs`] -- Core entity structs (players, quests, rewards, logs)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::Rank;
pub use ids::{AppraisalId, ParentId, PlayerId, QuestId, RewardId};
pub use structs::{
    AppraisalLog, GradedReport, LevelProgress, NewAppraisal, NewPlayer, Player, Quest,
    QuotaCounter, Reward,
};
