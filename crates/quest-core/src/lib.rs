//! Progression and grading core for Solo Quest.
//!
//! Everything that turns a raw event -- a completed quest or an AI-graded
//! voice report -- into a deterministic change of player level, XP, and
//! reward state lives here. Screens, navigation, and vendor SDKs stay
//! outside; they reach the core through the traits in [`ports`].
//!
//! # Modules
//!
//! - [`level`] -- Pure XP-to-level arithmetic
//! - [`rank_policy`] -- Rank-to-XP mapping and the inaudible-retry rule
//! - [`rewards`] -- Reward unlock evaluation
//! - [`quota`] -- Daily grading-attempt quota (pure value semantics)
//! - [`parental_gate`] -- Arithmetic challenge for parent-only screens
//! - [`session`] -- The grading session state machine
//! - [`completion`] -- Quest completion with at-most-once XP award
//! - [`onboarding`] -- Hero creation under the per-parent child cap
//! - [`ports`] -- Collaborator traits (storage, grader, microphone, identity)
//! - [`config`] -- Game-tuning configuration (YAML)
//! - [`error`] -- The core error taxonomy

pub mod completion;
pub mod config;
pub mod error;
pub mod level;
pub mod onboarding;
pub mod parental_gate;
pub mod ports;
pub mod quota;
pub mod rank_policy;
pub mod rewards;
pub mod session;

// Re-export primary types at crate root.
pub use completion::{CompletionOutcome, complete_quest};
pub use config::{ConfigError, FamilyConfig, GradingConfig, QuestConfig};
pub use error::CoreError;
pub use level::{XP_PER_LEVEL, level_for_xp, progress_for_xp, xp_into_current_level};
pub use onboarding::onboard_player;
pub use parental_gate::Challenge;
pub use quota::{DEFAULT_DAILY_LIMIT, can_attempt, effective_count, record_attempt};
pub use rank_policy::{RankResolution, resolve_rank, xp_for_rank};
pub use rewards::{is_unlocked, next_reward, partition_unlocked};
pub use session::{ActiveSessions, GradedOutcome, GradingSession, SessionPhase, SubmitOutcome};
