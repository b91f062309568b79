//! End-to-end tests for the grading session and quest completion flows,
//! driven against in-memory implementations of the collaborator ports.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};

use quest_core::config::GradingConfig;
use quest_core::error::CoreError;
use quest_core::ports::{
    AudioCapture, CaptureError, GradeError, Identity, ProgressStore, QuotaStore, StorageError,
    VoiceGrader,
};
use quest_core::session::{ActiveSessions, GradingSession, SessionPhase, SubmitOutcome};
use quest_core::{complete_quest, level_for_xp, onboard_player};
use quest_types::{
    AppraisalId, AppraisalLog, GradedReport, NewAppraisal, NewPlayer, ParentId, Player, PlayerId,
    Quest, QuestId, QuotaCounter, Rank, Reward,
};

// ---------------------------------------------------------------------------
// In-memory port implementations
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreInner {
    players: BTreeMap<PlayerId, Player>,
    quests: BTreeMap<QuestId, Quest>,
    rewards: Vec<Reward>,
    appraisals: Vec<AppraisalLog>,
}

/// Cheap-clone in-memory store, mirroring the contracts the Postgres
/// implementation provides (CAS quest completion, atomic XP award).
#[derive(Clone, Default)]
struct MemStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemStore {
    fn seed_player(&self, total_xp: u64) -> PlayerId {
        let player = Player {
            id: PlayerId::new(),
            parent_id: ParentId::new(),
            name: "Taro".to_owned(),
            mana_color: "#00D4FF".to_owned(),
            level: level_for_xp(total_xp),
            total_xp,
            goal_yearly: None,
            goal_monthly: None,
            created_at: Utc::now(),
        };
        let id = player.id;
        self.inner.lock().unwrap().players.insert(id, player);
        id
    }

    fn seed_quest(&self, player_id: PlayerId, xp_reward: u64) -> QuestId {
        let quest = Quest {
            id: QuestId::new(),
            player_id,
            title: "tidy the bookshelf".to_owned(),
            xp_reward,
            is_completed: false,
            created_at: Utc::now(),
        };
        let id = quest.id;
        self.inner.lock().unwrap().quests.insert(id, quest);
        id
    }

    fn appraisal_count(&self) -> usize {
        self.inner.lock().unwrap().appraisals.len()
    }

    fn player(&self, id: PlayerId) -> Player {
        self.inner.lock().unwrap().players.get(&id).unwrap().clone()
    }
}

impl ProgressStore for MemStore {
    async fn get_player(&self, id: PlayerId) -> Result<Player, StorageError> {
        self.inner
            .lock()
            .unwrap()
            .players
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("player {id}")))
    }

    async fn create_player(&self, new: NewPlayer, child_cap: u32) -> Result<Player, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let siblings = inner
            .players
            .values()
            .filter(|p| p.parent_id == new.parent_id)
            .count();
        if siblings >= child_cap as usize {
            return Err(StorageError::ChildCapReached { cap: child_cap });
        }
        let player = Player {
            id: PlayerId::new(),
            parent_id: new.parent_id,
            name: new.name,
            mana_color: new.mana_color,
            level: 1,
            total_xp: 0,
            goal_yearly: None,
            goal_monthly: None,
            created_at: Utc::now(),
        };
        inner.players.insert(player.id, player.clone());
        Ok(player)
    }

    async fn update_goals(
        &self,
        id: PlayerId,
        goal_yearly: Option<String>,
        goal_monthly: Option<String>,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let player = inner
            .players
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("player {id}")))?;
        player.goal_yearly = goal_yearly;
        player.goal_monthly = goal_monthly;
        Ok(())
    }

    async fn award_xp(&self, id: PlayerId, delta: u64) -> Result<Player, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let player = inner
            .players
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("player {id}")))?;
        player.total_xp = player.total_xp.saturating_add(delta);
        player.level = level_for_xp(player.total_xp);
        Ok(player.clone())
    }

    async fn get_quest(&self, id: QuestId) -> Result<Quest, StorageError> {
        self.inner
            .lock()
            .unwrap()
            .quests
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("quest {id}")))
    }

    async fn list_quests(
        &self,
        player: PlayerId,
        completed: Option<bool>,
    ) -> Result<Vec<Quest>, StorageError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .quests
            .values()
            .filter(|q| q.player_id == player)
            .filter(|q| completed.is_none_or(|c| q.is_completed == c))
            .cloned()
            .collect())
    }

    async fn insert_quest(
        &self,
        player: PlayerId,
        title: String,
        xp_reward: u64,
    ) -> Result<Quest, StorageError> {
        let quest = Quest {
            id: QuestId::new(),
            player_id: player,
            title,
            xp_reward,
            is_completed: false,
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .quests
            .insert(quest.id, quest.clone());
        Ok(quest)
    }

    async fn complete_quest(&self, id: QuestId) -> Result<Option<u64>, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let quest = inner
            .quests
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("quest {id}")))?;
        if quest.is_completed {
            return Ok(None);
        }
        quest.is_completed = true;
        Ok(Some(quest.xp_reward))
    }

    async fn completed_quest_count(&self, player: PlayerId) -> Result<u64, StorageError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .quests
            .values()
            .filter(|q| q.player_id == player && q.is_completed)
            .count() as u64)
    }

    async fn list_rewards(&self, player: PlayerId) -> Result<Vec<Reward>, StorageError> {
        let mut rewards: Vec<Reward> = self
            .inner
            .lock()
            .unwrap()
            .rewards
            .iter()
            .filter(|r| r.player_id == player)
            .cloned()
            .collect();
        rewards.sort_by_key(|r| (r.target_level, r.created_at));
        Ok(rewards)
    }

    async fn insert_reward(
        &self,
        player: PlayerId,
        title: String,
        target_level: u32,
    ) -> Result<Reward, StorageError> {
        let reward = Reward {
            id: quest_types::RewardId::new(),
            player_id: player,
            title,
            target_level,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().rewards.push(reward.clone());
        Ok(reward)
    }

    async fn insert_appraisal(&self, log: NewAppraisal) -> Result<AppraisalLog, StorageError> {
        let row = AppraisalLog {
            id: AppraisalId::new(),
            player_id: log.player_id,
            transcript: log.transcript,
            rank: log.rank,
            comment: log.comment,
            xp_awarded: log.xp_awarded,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().appraisals.push(row.clone());
        Ok(row)
    }

    async fn list_recent_appraisals(
        &self,
        player: PlayerId,
        limit: u32,
    ) -> Result<Vec<AppraisalLog>, StorageError> {
        let mut logs: Vec<AppraisalLog> = self
            .inner
            .lock()
            .unwrap()
            .appraisals
            .iter()
            .filter(|a| a.player_id == player)
            .cloned()
            .collect();
        logs.reverse();
        logs.truncate(limit as usize);
        Ok(logs)
    }
}

/// In-memory quota counter.
#[derive(Clone, Default)]
struct MemQuota {
    counter: Arc<Mutex<Option<QuotaCounter>>>,
}

impl MemQuota {
    fn with(counter: QuotaCounter) -> Self {
        Self {
            counter: Arc::new(Mutex::new(Some(counter))),
        }
    }

    fn stored(&self) -> Option<QuotaCounter> {
        *self.counter.lock().unwrap()
    }
}

impl QuotaStore for MemQuota {
    async fn read(&self) -> Result<Option<QuotaCounter>, StorageError> {
        Ok(*self.counter.lock().unwrap())
    }

    async fn write(&self, counter: QuotaCounter) -> Result<(), StorageError> {
        *self.counter.lock().unwrap() = Some(counter);
        Ok(())
    }
}

/// A grader that replays a script of results.
#[derive(Clone, Default)]
struct ScriptedGrader {
    script: Arc<Mutex<VecDeque<Result<GradedReport, GradeError>>>>,
    calls: Arc<Mutex<Vec<bool>>>,
    hang: bool,
}

impl ScriptedGrader {
    fn with(results: Vec<Result<GradedReport, GradeError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(results.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
            hang: false,
        }
    }

    fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn retry_flags(&self) -> Vec<bool> {
        self.calls.lock().unwrap().clone()
    }
}

impl VoiceGrader for ScriptedGrader {
    async fn grade(
        &self,
        _audio: &[u8],
        _quest_title: &str,
        is_retry: bool,
    ) -> Result<GradedReport, GradeError> {
        self.calls.lock().unwrap().push(is_retry);
        if self.hang {
            // Longer than any configured deadline; paused-clock tests
            // auto-advance past the session timeout.
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GradeError::Unavailable("script exhausted".to_owned())))
    }
}

/// A microphone that yields a fixed payload, or refuses permission.
#[derive(Clone)]
struct FakeMic {
    deny: bool,
}

impl FakeMic {
    const fn granted() -> Self {
        Self { deny: false }
    }

    const fn denied() -> Self {
        Self { deny: true }
    }
}

impl AudioCapture for FakeMic {
    async fn acquire(&mut self) -> Result<(), CaptureError> {
        if self.deny {
            Err(CaptureError::PermissionDenied)
        } else {
            Ok(())
        }
    }

    async fn stop(&mut self) -> Result<Vec<u8>, CaptureError> {
        Ok(vec![0x0a; 64])
    }

    async fn discard(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }
}

struct FakeIdentity(Option<ParentId>);

impl Identity for FakeIdentity {
    fn current_parent(&self) -> Option<ParentId> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn report(rank: Rank) -> GradedReport {
    GradedReport {
        transcript: "I finished everything!".to_owned(),
        rank,
        comment: "Well done, young hero.".to_owned(),
    }
}

fn session(
    store: &MemStore,
    quota: &MemQuota,
    grader: &ScriptedGrader,
    player_id: PlayerId,
) -> GradingSession<MemStore, MemQuota, ScriptedGrader, FakeMic> {
    session_in(
        &ActiveSessions::new(),
        store,
        quota,
        grader,
        FakeMic::granted(),
        player_id,
    )
}

fn session_in(
    sessions: &ActiveSessions,
    store: &MemStore,
    quota: &MemQuota,
    grader: &ScriptedGrader,
    mic: FakeMic,
    player_id: PlayerId,
) -> GradingSession<MemStore, MemQuota, ScriptedGrader, FakeMic> {
    GradingSession::new(
        store.clone(),
        quota.clone(),
        grader.clone(),
        mic,
        sessions.clone(),
        player_id,
        "today's good deeds".to_owned(),
        &GradingConfig::default(),
    )
}

// ---------------------------------------------------------------------------
// Quest completion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quest_completion_awards_xp_and_detects_level_up() {
    let store = MemStore::default();
    let player_id = store.seed_player(450);
    let quest_id = store.seed_quest(player_id, 60);

    let outcome = complete_quest(&store, player_id, quest_id).await.unwrap();
    assert_eq!(outcome.new_level, 6);
    assert!(outcome.leveled_up);
    assert_eq!(outcome.awarded_xp, 60);

    let player = store.player(player_id);
    assert_eq!(player.total_xp, 510);
    assert_eq!(player.level, 6);
}

#[tokio::test]
async fn completing_twice_applies_xp_exactly_once() {
    let store = MemStore::default();
    let player_id = store.seed_player(100);
    let quest_id = store.seed_quest(player_id, 30);

    let first = complete_quest(&store, player_id, quest_id).await.unwrap();
    assert_eq!(first.awarded_xp, 30);

    let second = complete_quest(&store, player_id, quest_id).await.unwrap();
    assert_eq!(second.awarded_xp, 0);
    assert!(!second.leveled_up);
    assert_eq!(second.new_level, first.new_level);

    assert_eq!(store.player(player_id).total_xp, 130);
}

#[tokio::test]
async fn quest_of_another_player_is_refused() {
    let store = MemStore::default();
    let owner = store.seed_player(0);
    let intruder = store.seed_player(0);
    let quest_id = store.seed_quest(owner, 10);

    let result = complete_quest(&store, intruder, quest_id).await;
    assert!(matches!(result, Err(CoreError::WrongPlayer { .. })));
    assert_eq!(store.player(owner).total_xp, 0);
}

// ---------------------------------------------------------------------------
// Grading session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn graded_report_awards_rank_xp_and_logs_once() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::default();
    let grader = ScriptedGrader::with(vec![Ok(report(Rank::A))]);
    let mut session = session(&store, &quota, &grader, player_id);

    session.start_recording().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Recording);

    let outcome = session.submit(day(2025, 1, 1)).await.unwrap();
    let SubmitOutcome::Graded(graded) = outcome else {
        panic!("expected a terminal outcome");
    };

    assert_eq!(graded.log.rank, Rank::A);
    assert_eq!(graded.log.xp_awarded, 50);
    assert_eq!(graded.new_level, 1);
    assert!(!graded.leveled_up);
    assert_eq!(session.phase(), SessionPhase::Graded);
    assert_eq!(store.appraisal_count(), 1);
    assert_eq!(store.player(player_id).total_xp, 50);

    // The attempt consumed quota.
    assert_eq!(quota.stored().unwrap().count, 1);
}

#[tokio::test]
async fn double_inaudible_is_forced_to_c_with_one_log() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::default();
    let grader = ScriptedGrader::with(vec![Ok(report(Rank::Retry)), Ok(report(Rank::Retry))]);
    let mut session = session(&store, &quota, &grader, player_id);
    let today = day(2025, 1, 1);

    session.start_recording().await.unwrap();
    let first = session.submit(today).await.unwrap();
    assert!(matches!(first, SubmitOutcome::RetryRequested(_)));
    assert_eq!(session.phase(), SessionPhase::RetryRequested);
    assert!(session.is_retry());
    assert_eq!(store.appraisal_count(), 0);

    session.start_recording().await.unwrap();
    let second = session.submit(today).await.unwrap();
    let SubmitOutcome::Graded(graded) = second else {
        panic!("second inaudible attempt must be terminal");
    };

    assert_eq!(graded.log.rank, Rank::C);
    assert_eq!(graded.log.xp_awarded, 10);
    assert_eq!(store.appraisal_count(), 1);
    assert_eq!(store.player(player_id).total_xp, 10);

    // The backend saw a non-retry then a retry attempt.
    assert_eq!(grader.retry_flags(), vec![false, true]);
}

#[tokio::test]
async fn retry_then_success_awards_the_new_rank() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::default();
    let grader = ScriptedGrader::with(vec![Ok(report(Rank::Retry)), Ok(report(Rank::S))]);
    let mut session = session(&store, &quota, &grader, player_id);
    let today = day(2025, 1, 1);

    session.start_recording().await.unwrap();
    assert!(matches!(
        session.submit(today).await.unwrap(),
        SubmitOutcome::RetryRequested(_)
    ));

    session.start_recording().await.unwrap();
    let SubmitOutcome::Graded(graded) = session.submit(today).await.unwrap() else {
        panic!("expected a terminal outcome");
    };
    assert_eq!(graded.log.rank, Rank::S);
    assert_eq!(graded.log.xp_awarded, 100);
    assert!(graded.leveled_up);

    // The retry rode on the first attempt's count.
    assert_eq!(quota.stored().unwrap().count, 1);
}

#[tokio::test]
async fn retry_still_works_when_the_first_attempt_spent_the_last_slot() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let today = day(2025, 1, 1);
    // Two of the three daily attempts already used; the first submission
    // takes the last one.
    let quota = MemQuota::with(QuotaCounter { date: today, count: 2 });
    let grader = ScriptedGrader::with(vec![Ok(report(Rank::Retry)), Ok(report(Rank::A))]);
    let mut session = session(&store, &quota, &grader, player_id);

    session.start_recording().await.unwrap();
    assert!(matches!(
        session.submit(today).await.unwrap(),
        SubmitOutcome::RetryRequested(_)
    ));
    assert_eq!(quota.stored().unwrap().count, 3);

    // The promised retry must not be turned away at the quota gate.
    session.start_recording().await.unwrap();
    let SubmitOutcome::Graded(graded) = session.submit(today).await.unwrap() else {
        panic!("the retry attempt must reach a terminal grade");
    };
    assert_eq!(graded.log.rank, Rank::A);
    assert_eq!(quota.stored().unwrap().count, 3);
    assert_eq!(store.appraisal_count(), 1);
}

#[tokio::test]
async fn exhausted_quota_blocks_submission_without_mutation() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let today = day(2025, 1, 1);
    let quota = MemQuota::with(QuotaCounter { date: today, count: 3 });
    let grader = ScriptedGrader::with(vec![Ok(report(Rank::S))]);
    let mut session = session(&store, &quota, &grader, player_id);

    session.start_recording().await.unwrap();
    let result = session.submit(today).await;
    assert!(matches!(result, Err(CoreError::QuotaExceeded { limit: 3 })));

    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(grader.call_count(), 0);
    assert_eq!(store.appraisal_count(), 0);
    assert_eq!(quota.stored().unwrap().count, 3);
}

#[tokio::test]
async fn quota_resets_lazily_after_midnight() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::with(QuotaCounter {
        date: day(2025, 1, 1),
        count: 3,
    });
    let grader = ScriptedGrader::with(vec![Ok(report(Rank::B))]);
    let mut session = session(&store, &quota, &grader, player_id);

    session.start_recording().await.unwrap();
    let outcome = session.submit(day(2025, 1, 2)).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Graded(_)));

    let stored = quota.stored().unwrap();
    assert_eq!(stored.date, day(2025, 1, 2));
    assert_eq!(stored.count, 1);
}

#[tokio::test]
async fn grading_failure_degrades_to_rank_c() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::default();
    let grader =
        ScriptedGrader::with(vec![Err(GradeError::Unavailable("503".to_owned()))]);
    let mut session = session(&store, &quota, &grader, player_id);

    session.start_recording().await.unwrap();
    let SubmitOutcome::Graded(graded) = session.submit(day(2025, 1, 1)).await.unwrap() else {
        panic!("a failed grading call must still terminate");
    };

    assert_eq!(graded.log.rank, Rank::C);
    assert_eq!(graded.log.xp_awarded, 10);
    assert!(!graded.log.comment.is_empty());
    assert_eq!(store.appraisal_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn hanging_grading_call_times_out_to_rank_c() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::default();
    let grader = ScriptedGrader::hanging();
    let mut session = session(&store, &quota, &grader, player_id);

    session.start_recording().await.unwrap();
    let SubmitOutcome::Graded(graded) = session.submit(day(2025, 1, 1)).await.unwrap() else {
        panic!("a hung grading call must still terminate");
    };
    assert_eq!(graded.log.rank, Rank::C);
    assert_eq!(session.phase(), SessionPhase::Graded);
}

#[tokio::test]
async fn denied_microphone_returns_to_idle_without_spending_quota() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::default();
    let grader = ScriptedGrader::default();
    let sessions = ActiveSessions::new();
    let mut session = session_in(&sessions, &store, &quota, &grader, FakeMic::denied(), player_id);

    let result = session.start_recording().await;
    assert!(matches!(result, Err(CoreError::PermissionDenied)));
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(quota.stored().is_none());
    // The failed start released the in-flight slot.
    assert!(!sessions.is_active(player_id));
}

#[tokio::test]
async fn starting_while_recording_is_rejected() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::default();
    let grader = ScriptedGrader::default();
    let mut session = session(&store, &quota, &grader, player_id);

    session.start_recording().await.unwrap();
    assert!(matches!(
        session.start_recording().await,
        Err(CoreError::SessionBusy)
    ));
}

#[tokio::test]
async fn second_session_for_the_same_player_is_rejected() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let other_player = store.seed_player(0);
    let quota = MemQuota::default();
    let grader = ScriptedGrader::with(vec![Ok(report(Rank::B)), Ok(report(Rank::B))]);
    let sessions = ActiveSessions::new();

    let mut first = session_in(
        &sessions, &store, &quota, &grader, FakeMic::granted(), player_id,
    );
    let mut second = session_in(
        &sessions, &store, &quota, &grader, FakeMic::granted(), player_id,
    );

    first.start_recording().await.unwrap();
    assert!(sessions.is_active(player_id));
    assert!(matches!(
        second.start_recording().await,
        Err(CoreError::SessionBusy)
    ));

    // Another player is unaffected.
    let mut elsewhere = session_in(
        &sessions, &store, &quota, &grader, FakeMic::granted(), other_player,
    );
    elsewhere.start_recording().await.unwrap();

    // Once the first session reaches a terminal grade, the slot is free.
    let outcome = first.submit(day(2025, 1, 1)).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Graded(_)));
    assert!(!sessions.is_active(player_id));
    second.start_recording().await.unwrap();
}

#[tokio::test]
async fn dropping_a_session_frees_the_players_slot() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::default();
    let grader = ScriptedGrader::default();
    let sessions = ActiveSessions::new();

    let mut abandoned = session_in(
        &sessions, &store, &quota, &grader, FakeMic::granted(), player_id,
    );
    abandoned.start_recording().await.unwrap();
    assert!(sessions.is_active(player_id));
    drop(abandoned);
    assert!(!sessions.is_active(player_id));

    let mut fresh = session_in(
        &sessions, &store, &quota, &grader, FakeMic::granted(), player_id,
    );
    fresh.start_recording().await.unwrap();
}

#[tokio::test]
async fn cancelling_a_recording_has_no_side_effects() {
    let store = MemStore::default();
    let player_id = store.seed_player(0);
    let quota = MemQuota::default();
    let grader = ScriptedGrader::default();
    let mut session = session(&store, &quota, &grader, player_id);

    session.start_recording().await.unwrap();
    session.cancel().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(quota.stored().is_none());
    assert_eq!(store.appraisal_count(), 0);

    // Submitting after a cancel is an error, not a grading attempt.
    assert!(matches!(
        session.submit(day(2025, 1, 1)).await,
        Err(CoreError::NotRecording)
    ));
}

// ---------------------------------------------------------------------------
// Onboarding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn onboarding_respects_the_child_cap() {
    let store = MemStore::default();
    let parent = ParentId::new();
    let identity = FakeIdentity(Some(parent));

    let first = onboard_player(&store, &identity, "Hana".to_owned(), "#FF6B6B".to_owned(), 2)
        .await
        .unwrap();
    assert_eq!(first.level, 1);
    assert_eq!(first.total_xp, 0);

    onboard_player(&store, &identity, "Taro".to_owned(), "#00D4FF".to_owned(), 2)
        .await
        .unwrap();

    let third =
        onboard_player(&store, &identity, "Jiro".to_owned(), "#1A1A2E".to_owned(), 2).await;
    assert!(matches!(
        third,
        Err(CoreError::Storage(StorageError::ChildCapReached { cap: 2 }))
    ));
}

#[tokio::test]
async fn onboarding_requires_a_signed_in_parent() {
    let store = MemStore::default();
    let identity = FakeIdentity(None);

    let result =
        onboard_player(&store, &identity, "Hana".to_owned(), "#FF6B6B".to_owned(), 2).await;
    assert!(matches!(result, Err(CoreError::Unauthorized)));
}
