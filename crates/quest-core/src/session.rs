//! Grading session state machine: one voice report from microphone to
//! terminal rank.
//!
//! A session walks `Idle → Recording → Submitted → Graded`, with one
//! optional detour `Submitted → RetryRequested → Recording` when the first
//! attempt is inaudible. The rank policy caps the detour at a single
//! cycle: a second consecutive inaudible result is forced to rank C, so
//! every session that reaches `Submitted` ends in a terminal outcome with
//! a rank, a comment, and an XP delta.
//!
//! Per report the mandated order is: quota check, quota increment,
//! grading call, XP award, appraisal log. The retry detour rides on the
//! quota count the first attempt already spent; it never costs a second
//! one. Re-entry is guarded twice: the phase rejects starting or
//! cancelling while `Submitted` with `SessionBusy`, and the shared
//! [`ActiveSessions`] registry holds a per-player in-flight flag so a
//! second session for the same player cannot start recording while one
//! is underway.
//!
//! The grading call is bounded by a timeout. Timeouts, transport errors,
//! and unparseable responses all degrade to a forced rank C with a
//! failure comment instead of wedging the session -- the child always
//! gets an answer.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use quest_types::{AppraisalLog, GradedReport, NewAppraisal, PlayerId, QuotaCounter, Rank};

use crate::config::GradingConfig;
use crate::error::CoreError;
use crate::level::level_for_xp;
use crate::ports::{AudioCapture, CaptureError, ProgressStore, QuotaStore, VoiceGrader};
use crate::quota::{can_attempt, record_attempt};
use crate::rank_policy::{RankResolution, resolve_rank, xp_for_rank};

/// Transcript recorded when the grading call itself failed.
const DEGRADED_TRANSCRIPT: &str = "(the appraisal could not be heard)";

/// Comment shown to the child when the grading call failed. Still phrased
/// in the guild master's voice so the failure reads as an outcome, not a
/// crash.
const DEGRADED_COMMENT: &str = "Hmm, the guild's crystal is acting up and I could not \
     hear your report properly. I will record this one as rank C -- come back and \
     tell me again tomorrow!";

/// Shared registry of players with a grading session in flight.
///
/// Cheap to clone; the app shell keeps one and hands a clone to every
/// session it constructs. A session claims its player's slot when
/// recording starts and releases it on a terminal outcome, a cancel, or
/// drop, so two sessions for the same player can never interleave
/// attempts. Sessions for different players are independent.
#[derive(Clone, Default)]
pub struct ActiveSessions {
    inner: Arc<Mutex<HashSet<PlayerId>>>,
}

impl ActiveSessions {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the player has a session in flight.
    pub fn is_active(&self, player: PlayerId) -> bool {
        self.lock().contains(&player)
    }

    fn try_claim(&self, player: PlayerId) -> bool {
        self.lock().insert(player)
    }

    fn release(&self, player: PlayerId) {
        self.lock().remove(&player);
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PlayerId>> {
        // A panicked holder cannot leave the set mid-mutation; recover.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Where a grading session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing in progress.
    Idle,
    /// Microphone acquired, audio being captured.
    Recording,
    /// Audio handed to the grading backend; awaiting a result.
    Submitted,
    /// First attempt was inaudible; waiting for the child to record again.
    RetryRequested,
    /// Terminal: the report has been graded, awarded, and logged.
    Graded,
}

/// The terminal result of a graded session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedOutcome {
    /// The persisted appraisal record (rank, comment, XP awarded).
    pub log: AppraisalLog,
    /// The player's level after the award.
    pub new_level: u32,
    /// True when the award crossed a level boundary.
    pub leveled_up: bool,
}

/// What a submission resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Terminal outcome; XP awarded and logged.
    Graded(GradedOutcome),
    /// First inaudible attempt: show the comment and let the child record
    /// once more. No XP, no log entry, but the attempt did spend quota.
    RetryRequested(GradedReport),
}

/// One player's voice-grading session.
///
/// Owns its collaborators for the duration of the report. Construct a new
/// session per report screen; the phase survives the retry detour so the
/// second attempt is graded with the retry instruction.
pub struct GradingSession<S, Q, G, A> {
    store: S,
    quota: Q,
    grader: G,
    capture: A,
    sessions: ActiveSessions,
    player_id: PlayerId,
    quest_title: String,
    daily_limit: u32,
    grading_timeout: Duration,
    phase: SessionPhase,
    is_retry: bool,
    holds_slot: bool,
}

impl<S, Q, G, A> GradingSession<S, Q, G, A> {
    /// Give the player's in-flight slot back to the registry.
    fn release_slot(&mut self) {
        if self.holds_slot {
            self.sessions.release(self.player_id);
            self.holds_slot = false;
        }
    }
}

impl<S, Q, G, A> Drop for GradingSession<S, Q, G, A> {
    fn drop(&mut self) {
        self.release_slot();
    }
}

impl<S, Q, G, A> GradingSession<S, Q, G, A>
where
    S: ProgressStore,
    Q: QuotaStore,
    G: VoiceGrader,
    A: AudioCapture,
{
    /// Create an idle session for one player's report.
    ///
    /// `sessions` is the app-wide [`ActiveSessions`] registry; the slot is
    /// claimed lazily when recording starts, not here.
    pub fn new(
        store: S,
        quota: Q,
        grader: G,
        capture: A,
        sessions: ActiveSessions,
        player_id: PlayerId,
        quest_title: String,
        config: &GradingConfig,
    ) -> Self {
        Self {
            store,
            quota,
            grader,
            capture,
            sessions,
            player_id,
            quest_title,
            daily_limit: config.daily_limit,
            grading_timeout: Duration::from_millis(config.timeout_ms),
            phase: SessionPhase::Idle,
            is_retry: false,
            holds_slot: false,
        }
    }

    /// The session's current phase.
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// True while the next submission will be graded as a retry attempt.
    pub const fn is_retry(&self) -> bool {
        self.is_retry
    }

    /// Acquire the microphone and begin recording.
    ///
    /// Allowed from `Idle`, `Graded` (starting a fresh report), and
    /// `RetryRequested` (the second attempt). Rejected with
    /// [`CoreError::SessionBusy`] while recording or awaiting a grade, or
    /// when another session already holds this player's in-flight slot.
    ///
    /// # Errors
    ///
    /// [`CoreError::PermissionDenied`] if the platform refuses the
    /// microphone; the session stays idle and no quota is consumed.
    pub async fn start_recording(&mut self) -> Result<(), CoreError> {
        match self.phase {
            SessionPhase::Recording | SessionPhase::Submitted => {
                return Err(CoreError::SessionBusy);
            }
            SessionPhase::Idle | SessionPhase::Graded => {
                // A fresh report; any previous retry state is stale.
                self.is_retry = false;
            }
            SessionPhase::RetryRequested => {}
        }

        if !self.holds_slot {
            if !self.sessions.try_claim(self.player_id) {
                return Err(CoreError::SessionBusy);
            }
            self.holds_slot = true;
        }

        match self.capture.acquire().await {
            Ok(()) => {
                debug!(player_id = %self.player_id, is_retry = self.is_retry, "recording started");
                self.phase = SessionPhase::Recording;
                Ok(())
            }
            Err(CaptureError::PermissionDenied) => {
                self.phase = SessionPhase::Idle;
                self.release_slot();
                Err(CoreError::PermissionDenied)
            }
            Err(CaptureError::Device(message)) => {
                self.phase = SessionPhase::Idle;
                self.release_slot();
                Err(CoreError::Capture(message))
            }
        }
    }

    /// Cancel an in-progress recording or abandon a pending retry, with no
    /// side effects.
    ///
    /// A no-op from `Idle` and `Graded`; rejected once the attempt has
    /// been submitted (a dispatched grading call cannot be recalled).
    pub async fn cancel(&mut self) -> Result<(), CoreError> {
        match self.phase {
            SessionPhase::Submitted => Err(CoreError::SessionBusy),
            SessionPhase::Recording => {
                if let Err(CaptureError::Device(message)) = self.capture.discard().await {
                    warn!(error = message, "discarding recording failed");
                }
                self.phase = SessionPhase::Idle;
                self.is_retry = false;
                self.release_slot();
                Ok(())
            }
            SessionPhase::RetryRequested => {
                self.phase = SessionPhase::Idle;
                self.is_retry = false;
                self.release_slot();
                Ok(())
            }
            SessionPhase::Idle | SessionPhase::Graded => Ok(()),
        }
    }

    /// Stop recording, spend quota, grade the report, and resolve it.
    ///
    /// `today` is the device's current calendar day (normally
    /// `chrono::Local::now().date_naive()`), injected so the quota gate is
    /// testable across date rollovers.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotRecording`] outside the `Recording` phase,
    /// [`CoreError::QuotaExceeded`] when today's attempts are spent (the
    /// session returns to idle, nothing is mutated), and
    /// [`CoreError::Storage`] when a persistence write fails.
    pub async fn submit(&mut self, today: NaiveDate) -> Result<SubmitOutcome, CoreError> {
        match self.phase {
            SessionPhase::Recording => {}
            SessionPhase::Submitted => return Err(CoreError::SessionBusy),
            _ => return Err(CoreError::NotRecording),
        }

        let audio = match self.capture.stop().await {
            Ok(audio) => audio,
            Err(CaptureError::PermissionDenied) => {
                self.phase = SessionPhase::Idle;
                self.release_slot();
                return Err(CoreError::PermissionDenied);
            }
            Err(CaptureError::Device(message)) => {
                self.phase = SessionPhase::Idle;
                self.release_slot();
                return Err(CoreError::Capture(message));
            }
        };

        // Quota gate: check, then consume, before the grading call. The
        // retry detour rides on the count its first attempt spent.
        if !self.is_retry {
            let counter = match self.quota.read().await {
                Ok(stored) => stored.unwrap_or(QuotaCounter::fresh(today)),
                Err(e) => {
                    self.phase = SessionPhase::Idle;
                    self.release_slot();
                    return Err(e.into());
                }
            };
            if !can_attempt(counter, today, self.daily_limit) {
                info!(
                    player_id = %self.player_id,
                    limit = self.daily_limit,
                    "daily grading quota exhausted"
                );
                self.phase = SessionPhase::Idle;
                self.is_retry = false;
                self.release_slot();
                return Err(CoreError::QuotaExceeded {
                    limit: self.daily_limit,
                });
            }
            if let Err(e) = self.quota.write(record_attempt(counter, today)).await {
                self.phase = SessionPhase::Idle;
                self.release_slot();
                return Err(e.into());
            }
        }

        self.phase = SessionPhase::Submitted;
        let report = self.grade_with_deadline(&audio).await;

        match resolve_rank(report.rank, self.is_retry) {
            RankResolution::RetryRequested => {
                info!(player_id = %self.player_id, "report inaudible, requesting retry");
                self.phase = SessionPhase::RetryRequested;
                self.is_retry = true;
                Ok(SubmitOutcome::RetryRequested(report))
            }
            RankResolution::Terminal(rank) => self.finalize(report, rank).await,
        }
    }

    /// Run the grading call under the configured deadline, degrading any
    /// failure to a forced rank C report.
    async fn grade_with_deadline(&self, audio: &[u8]) -> GradedReport {
        let call = self
            .grader
            .grade(audio, &self.quest_title, self.is_retry);
        match tokio::time::timeout(self.grading_timeout, call).await {
            Ok(Ok(report)) => report,
            Ok(Err(error)) => {
                warn!(error = %error, "grading call failed, degrading to rank C");
                degraded_report()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.grading_timeout.as_millis(),
                    "grading call timed out, degrading to rank C"
                );
                degraded_report()
            }
        }
    }

    /// Award XP for a terminal rank, log the appraisal, and finish.
    async fn finalize(
        &mut self,
        report: GradedReport,
        rank: Rank,
    ) -> Result<SubmitOutcome, CoreError> {
        let xp = xp_for_rank(rank);

        let player = match self.store.award_xp(self.player_id, xp).await {
            Ok(player) => player,
            Err(e) => {
                // Nothing persisted; the attempt spent quota but the
                // outcome is not final until storage confirms.
                self.phase = SessionPhase::Idle;
                self.is_retry = false;
                self.release_slot();
                return Err(e.into());
            }
        };

        let log = match self
            .store
            .insert_appraisal(NewAppraisal {
                player_id: self.player_id,
                transcript: report.transcript,
                rank,
                comment: report.comment,
                xp_awarded: xp,
            })
            .await
        {
            Ok(log) => log,
            Err(e) => {
                // The XP award stands; only the history entry is lost.
                self.phase = SessionPhase::Idle;
                self.is_retry = false;
                self.release_slot();
                return Err(e.into());
            }
        };

        let prior_total = player.total_xp.saturating_sub(xp);
        let leveled_up = player.level > level_for_xp(prior_total);

        info!(
            player_id = %self.player_id,
            rank = %rank,
            xp_awarded = xp,
            new_level = player.level,
            leveled_up = leveled_up,
            "report graded"
        );

        self.phase = SessionPhase::Graded;
        self.is_retry = false;
        self.release_slot();

        Ok(SubmitOutcome::Graded(GradedOutcome {
            log,
            new_level: player.level,
            leveled_up,
        }))
    }
}

/// The forced rank C report used when the grading call fails or times out.
fn degraded_report() -> GradedReport {
    GradedReport {
        transcript: DEGRADED_TRANSCRIPT.to_owned(),
        rank: Rank::C,
        comment: DEGRADED_COMMENT.to_owned(),
    }
}
