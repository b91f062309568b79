//! Collaborator traits the progression core consumes.
//!
//! The core never talks to a vendor SDK directly. Storage, identity, the
//! grading model, and the microphone are all reached through the traits
//! here, so the orchestration logic in [`crate::session`] and
//! [`crate::completion`] can be exercised against in-memory fakes and the
//! production implementations live in their own crates (`quest-store`,
//! `quest-grader`).
//!
//! All methods are async; every external call is a suspension point and
//! may fail. Implementations map their driver errors into the error types
//! defined here -- raw transport errors never reach the pure engines.

use quest_types::{
    AppraisalLog, GradedReport, NewAppraisal, NewPlayer, ParentId, Player, PlayerId, Quest,
    QuestId, QuotaCounter, Reward,
};

// ---------------------------------------------------------------------------
// Error types at the port boundary
// ---------------------------------------------------------------------------

/// Errors surfaced by storage implementations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing store could not be reached or the operation failed
    /// transiently.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Creating another player would exceed the per-parent child cap.
    #[error("child cap reached: this account already has {cap} heroes")]
    ChildCapReached {
        /// The configured cap that was hit.
        cap: u32,
    },
}

/// Errors surfaced by grading backends.
#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    /// The grading service was unreachable or returned a failure status.
    #[error("grading backend unavailable: {0}")]
    Unavailable(String),

    /// The grading response could not be parsed into a graded report.
    #[error("grading response malformed: {0}")]
    Malformed(String),
}

/// Errors surfaced by the audio capture device.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The platform refused microphone access.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The device failed while recording.
    #[error("audio device error: {0}")]
    Device(String),
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Persistent player/quest/reward/log storage.
///
/// `award_xp` is the single write path for XP: implementations must apply
/// the delta as an atomic read-modify-write (e.g. a server-side increment)
/// and recompute the level from the post-update total, so concurrent quest
/// completion and voice grading serialize per player.
pub trait ProgressStore {
    /// Fetch a player by id.
    fn get_player(
        &self,
        id: PlayerId,
    ) -> impl Future<Output = Result<Player, StorageError>> + Send;

    /// Create a player for a parent, refusing once the parent already has
    /// `child_cap` players.
    fn create_player(
        &self,
        new: NewPlayer,
        child_cap: u32,
    ) -> impl Future<Output = Result<Player, StorageError>> + Send;

    /// Update a player's free-text goals.
    fn update_goals(
        &self,
        id: PlayerId,
        goal_yearly: Option<String>,
        goal_monthly: Option<String>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Atomically add XP to a player and recompute the level, returning
    /// the updated row.
    fn award_xp(
        &self,
        id: PlayerId,
        delta: u64,
    ) -> impl Future<Output = Result<Player, StorageError>> + Send;

    /// Fetch a quest by id.
    fn get_quest(
        &self,
        id: QuestId,
    ) -> impl Future<Output = Result<Quest, StorageError>> + Send;

    /// List a player's quests, optionally filtered by completion state.
    fn list_quests(
        &self,
        player: PlayerId,
        completed: Option<bool>,
    ) -> impl Future<Output = Result<Vec<Quest>, StorageError>> + Send;

    /// Create a quest for a player.
    fn insert_quest(
        &self,
        player: PlayerId,
        title: String,
        xp_reward: u64,
    ) -> impl Future<Output = Result<Quest, StorageError>> + Send;

    /// Flip a quest's completed flag, returning `Some(xp_reward)` only
    /// when this call performed the false-to-true transition. Returns
    /// `None` when the quest was already completed: the caller must treat
    /// that as a no-op, never a second award.
    fn complete_quest(
        &self,
        id: QuestId,
    ) -> impl Future<Output = Result<Option<u64>, StorageError>> + Send;

    /// Number of completed quests for a player (profile history).
    fn completed_quest_count(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// List a player's rewards ordered by `(target_level, created_at)`.
    fn list_rewards(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<Vec<Reward>, StorageError>> + Send;

    /// Create a reward for a player.
    fn insert_reward(
        &self,
        player: PlayerId,
        title: String,
        target_level: u32,
    ) -> impl Future<Output = Result<Reward, StorageError>> + Send;

    /// Append a terminal grading outcome to the appraisal log.
    fn insert_appraisal(
        &self,
        log: NewAppraisal,
    ) -> impl Future<Output = Result<AppraisalLog, StorageError>> + Send;

    /// Most recent appraisal log entries for a player, newest first.
    fn list_recent_appraisals(
        &self,
        player: PlayerId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<AppraisalLog>, StorageError>> + Send;
}

// ---------------------------------------------------------------------------
// Device-local quota storage
// ---------------------------------------------------------------------------

/// Persistence for the device-local daily quota counter.
pub trait QuotaStore {
    /// Read the stored counter, `None` if nothing has been written yet.
    fn read(&self) -> impl Future<Output = Result<Option<QuotaCounter>, StorageError>> + Send;

    /// Overwrite the stored counter.
    fn write(
        &self,
        counter: QuotaCounter,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

// ---------------------------------------------------------------------------
// Voice grading
// ---------------------------------------------------------------------------

/// The generative-AI grading call.
///
/// Takes the recorded audio, the quest title for prompt context, and
/// whether this is already the retry attempt (which changes the
/// inaudible-handling instruction in the prompt).
pub trait VoiceGrader {
    /// Grade one voice report.
    fn grade(
        &self,
        audio: &[u8],
        quest_title: &str,
        is_retry: bool,
    ) -> impl Future<Output = Result<GradedReport, GradeError>> + Send;
}

// ---------------------------------------------------------------------------
// Audio capture
// ---------------------------------------------------------------------------

/// Microphone acquisition and recording, implemented by the platform shell.
pub trait AudioCapture {
    /// Request microphone access and begin recording.
    fn acquire(&mut self) -> impl Future<Output = Result<(), CaptureError>> + Send;

    /// Stop recording and return the encoded audio payload.
    fn stop(&mut self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send;

    /// Discard an in-progress recording without producing audio.
    fn discard(&mut self) -> impl Future<Output = Result<(), CaptureError>> + Send;
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The external identity provider, reduced to what the core needs.
pub trait Identity {
    /// The authenticated parent account, or `None` when signed out.
    /// Core operations refuse to run without one.
    fn current_parent(&self) -> Option<ParentId>;
}
