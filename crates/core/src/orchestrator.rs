//! Interview session orchestrator.
//!
//! The state machine that owns session progress: it sequences calls to
//! the question generator and answer evaluator, guarantees at most one
//! in-flight turn per session, and decides when a session completes.
//! Every operation is an explicit awaited sequence inside one method;
//! the store is the source of truth and nothing is rolled back once
//! written, so an interrupted turn is always resumable.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::engine::{
    AnswerEvaluator, EvaluateRequest, NextRequest, QuestionGenerator, StartRequest,
    TranscriptEntry,
};
use crate::error::CoachError;
use crate::gamification::GamificationNotifier;
use crate::guard::SessionGuard;
use crate::retry::{RetryPolicy, retry};
use crate::session::{
    Answer, DEFAULT_QUESTION_TIME_LIMIT, Message, MessageRole, Session, SessionSetup,
    SessionStatus,
};
use crate::store::{SessionPatch, SessionStore};
use crate::summary::SummaryGenerator;
use crate::timer::{QuestionTimer, TimerState};

/// Answer text recorded when the question timer expires without input.
pub const NO_ANSWER_SENTINEL: &str = "(no answer within the time limit)";

/// Tuning knobs for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// An overall score at or above this asks for harder questions.
    pub difficulty_threshold: f32,
    /// Sub-scores below this become focus tags for follow-up questions.
    pub weak_score_threshold: f32,
    /// Transcript turns forwarded to the generator as context.
    pub transcript_tail: usize,
    pub max_focus_tags: usize,
    /// Per-question countdown in seconds, stamped onto new sessions.
    pub question_time_limit: u32,
    pub retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            difficulty_threshold: 4.0,
            weak_score_threshold: 3.0,
            transcript_tail: 8,
            max_focus_tags: 3,
            question_time_limit: DEFAULT_QUESTION_TIME_LIMIT,
            retry: RetryPolicy::default(),
        }
    }
}

/// The session and the question now awaiting an answer.
#[derive(Debug, Clone)]
pub struct TurnState {
    pub session: Session,
    pub question: Message,
}

/// Result of a successful answer submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The interview continues with a freshly generated question.
    Next {
        session: Session,
        answer: Answer,
        question: Message,
    },
    /// That was the last question; the session is completed.
    Completed { session: Session, answer: Answer },
}

/// Read-only view of a session for resuming after a reload.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session: Session,
    pub messages: Vec<Message>,
    pub answers: Vec<Answer>,
    /// Reconstructed from the persisted question start instant; absent
    /// when no question is pending.
    pub timer: Option<TimerState>,
}

/// Owns the session lifecycle and sequences all collaborator calls.
pub struct SessionOrchestrator {
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn QuestionGenerator>,
    evaluator: Arc<dyn AnswerEvaluator>,
    summarizer: Arc<dyn SummaryGenerator>,
    gamification: Arc<dyn GamificationNotifier>,
    guard: SessionGuard,
    config: OrchestratorConfig,
}

impl SessionOrchestrator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        generator: Arc<dyn QuestionGenerator>,
        evaluator: Arc<dyn AnswerEvaluator>,
        summarizer: Arc<dyn SummaryGenerator>,
        gamification: Arc<dyn GamificationNotifier>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            generator,
            evaluator,
            summarizer,
            gamification,
            guard: SessionGuard::new(),
            config,
        }
    }

    /// Validates the setup and records a new session in `Setup`. No
    /// question is generated yet; that is deferred to `start_interview`.
    #[instrument(skip(self, setup), fields(%owner_id))]
    pub async fn create_session(
        &self,
        owner_id: &str,
        setup: SessionSetup,
    ) -> Result<Session, CoachError> {
        let valid = setup.validate()?;
        let session = Session::new(owner_id, valid, self.config.question_time_limit);
        self.store.create_session(session.clone()).await?;
        info!(session_id = %session.id, role = %session.role, level = %session.level, "session created");
        Ok(session)
    }

    /// Moves the session to `InProgress` and asks the opening question.
    ///
    /// Idempotent against a failed first attempt: if the status update
    /// landed but the generator call did not, calling again re-checks
    /// that no question is recorded for index 0 before inserting one.
    #[instrument(skip(self), fields(%session_id))]
    pub async fn start_interview(&self, session_id: Uuid) -> Result<TurnState, CoachError> {
        let _permit = self.guard.try_acquire(session_id)?;
        let session = self.fetch(session_id).await?;

        match session.status {
            SessionStatus::Setup | SessionStatus::InProgress => {}
            other => return Err(invalid_state("setup", other)),
        }
        let messages = self.store.list_messages(session_id).await?;
        let has_opening = messages
            .iter()
            .any(|m| m.role == MessageRole::Interviewer && m.question_index == Some(0));
        if has_opening {
            return Err(invalid_state("setup", session.status));
        }

        if session.status == SessionStatus::Setup {
            self.store
                .update_session(
                    session_id,
                    SessionPatch {
                        status: Some(SessionStatus::InProgress),
                        started_at: Some(Utc::now()),
                        ..Default::default()
                    },
                )
                .await?;
        }

        // On exhausted retries the session stays in progress with no
        // question recorded; the caller may retry this operation.
        let response = retry(
            self.config.retry,
            |attempt| warn!(%session_id, attempt, "retrying question generator (start)"),
            || {
                self.generator.start(StartRequest {
                    session_id,
                    role: session.role,
                    level: session.level,
                    mode: session.mode,
                    language: session.language,
                    jd_text: session.jd_text.clone(),
                })
            },
        )
        .await?;

        let question = self
            .store
            .append_message(Message::new(
                session_id,
                MessageRole::Interviewer,
                response.question,
                Some(0),
            ))
            .await?;
        let session = self
            .store
            .update_session(
                session_id,
                SessionPatch {
                    current_question_index: Some(Some(0)),
                    difficulty_score: Some(response.difficulty),
                    focus_tags: Some(response.focus_tags),
                    question_started_at: Some(Some(Utc::now())),
                    ..Default::default()
                },
            )
            .await?;

        info!(%session_id, "interview started");
        Ok(TurnState { session, question })
    }

    /// Records and scores one candidate answer, then either asks the
    /// next question or completes the session.
    #[instrument(skip(self, answer_text), fields(%session_id))]
    pub async fn submit_answer(
        &self,
        session_id: Uuid,
        answer_text: &str,
        time_taken_seconds: Option<u32>,
    ) -> Result<SubmitOutcome, CoachError> {
        // Rejects overlapping turns outright instead of queueing them;
        // released on every exit path below.
        let _permit = self.guard.try_acquire(session_id)?;

        let session = self.fetch(session_id).await?;
        if session.status != SessionStatus::InProgress {
            return Err(invalid_state("in_progress", session.status));
        }
        let index = session
            .current_question_index
            .ok_or(CoachError::NoActiveQuestion)?;

        let messages = self.store.list_messages(session_id).await?;
        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Interviewer && m.question_index == Some(index))
            .cloned()
            .ok_or(CoachError::NoActiveQuestion)?;

        let answers = self.store.list_answers(session_id).await?;
        if answers.iter().any(|a| a.question_index == index) {
            return Err(CoachError::DuplicateAnswer {
                question_index: index,
            });
        }

        // A previous attempt may have persisted the candidate message
        // before evaluation failed; reuse it instead of duplicating.
        let answer_text = match messages
            .iter()
            .find(|m| m.role == MessageRole::Candidate && m.question_index == Some(index))
        {
            Some(existing) => existing.content.clone(),
            None => {
                let message =
                    Message::new(session_id, MessageRole::Candidate, answer_text, Some(index));
                self.store.append_message(message).await?;
                answer_text.to_string()
            }
        };

        // The candidate message above is never rolled back: a failed
        // evaluation leaves the submission resumable.
        let evaluation = retry(
            self.config.retry,
            |attempt| warn!(%session_id, attempt, "retrying answer evaluator"),
            || {
                self.evaluator.evaluate(EvaluateRequest {
                    session_id,
                    question: question.content.clone(),
                    answer: answer_text.clone(),
                    role: session.role,
                    level: session.level,
                    mode: session.mode,
                    language: session.language,
                    question_index: index,
                })
            },
        )
        .await
        .map_err(|err| match err {
            CoachError::Recoverable(message) => CoachError::EvaluationFailed(message),
            other => other,
        })?;

        let answer = self
            .store
            .append_answer(Answer {
                id: Uuid::new_v4(),
                session_id,
                question_index: index,
                question_text: question.content.clone(),
                answer_text,
                scores: evaluation.scores,
                feedback: evaluation.feedback,
                time_taken_seconds,
                created_at: Utc::now(),
            })
            .await?;
        self.gamification.on_answer_submitted(&session.owner_id).await;

        let next_index = index + 1;
        if next_index >= session.total_questions {
            let session = self.complete(session).await?;
            return Ok(SubmitOutcome::Completed { session, answer });
        }

        let should_increase = answer.scores.overall >= self.config.difficulty_threshold;
        let mut scored = answers;
        scored.push(answer.clone());
        let focus_tags = rolling_focus_tags(
            &scored,
            self.config.max_focus_tags,
            self.config.weak_score_threshold,
        );
        let transcript = self.store.list_messages(session_id).await?;
        let tail: Vec<TranscriptEntry> = transcript
            .iter()
            .rev()
            .take(self.config.transcript_tail)
            .rev()
            .map(|m| TranscriptEntry {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        let response = retry(
            self.config.retry,
            |attempt| warn!(%session_id, attempt, "retrying question generator (next)"),
            || {
                self.generator.next(NextRequest {
                    session_id,
                    role: session.role,
                    level: session.level,
                    mode: session.mode,
                    language: session.language,
                    previous_answer: answer.answer_text.clone(),
                    previous_scores: answer.scores.clone(),
                    should_increase_difficulty: should_increase,
                    focus_tags: focus_tags.clone(),
                    question_index: next_index,
                    transcript_tail: tail.clone(),
                })
            },
        )
        .await?;

        let question = self
            .store
            .append_message(Message::new(
                session_id,
                MessageRole::Interviewer,
                response.question,
                Some(next_index),
            ))
            .await?;
        let session = self
            .store
            .update_session(
                session_id,
                SessionPatch {
                    current_question_index: Some(Some(next_index)),
                    difficulty_score: Some(response.difficulty),
                    focus_tags: Some(response.focus_tags),
                    question_started_at: Some(Some(Utc::now())),
                    ..Default::default()
                },
            )
            .await?;

        Ok(SubmitOutcome::Next {
            session,
            answer,
            question,
        })
    }

    /// Ends the interview early through the same completion path as the
    /// last answer. Fails once the session is already finished.
    #[instrument(skip(self), fields(%session_id))]
    pub async fn end_interview(&self, session_id: Uuid) -> Result<Session, CoachError> {
        let _permit = self.guard.try_acquire(session_id)?;
        let session = self.fetch(session_id).await?;
        if session.status != SessionStatus::InProgress {
            return Err(invalid_state("in_progress", session.status));
        }
        self.complete(session).await
    }

    /// Marks a not-yet-finished session as abandoned.
    #[instrument(skip(self), fields(%session_id))]
    pub async fn abandon_session(&self, session_id: Uuid) -> Result<Session, CoachError> {
        let _permit = self.guard.try_acquire(session_id)?;
        let session = self.fetch(session_id).await?;
        if !session.status.can_transition_to(SessionStatus::Abandoned) {
            return Err(invalid_state("setup or in_progress", session.status));
        }
        self.store
            .update_session(
                session_id,
                SessionPatch {
                    status: Some(SessionStatus::Abandoned),
                    ended_at: Some(Utc::now()),
                    current_question_index: Some(None),
                    question_started_at: Some(None),
                    ..Default::default()
                },
            )
            .await
    }

    /// Pure read used for resuming a session. The timer is rebuilt from
    /// the persisted start instant rather than assumed fresh.
    pub async fn load_session(&self, session_id: Uuid) -> Result<SessionSnapshot, CoachError> {
        let session = self.fetch(session_id).await?;
        let messages = self.store.list_messages(session_id).await?;
        let answers = self.store.list_answers(session_id).await?;
        let timer = session.current_question_started_at.map(|started_at| {
            QuestionTimer::from_persisted(Utc::now(), started_at, session.question_time_limit)
                .state()
        });
        Ok(SessionSnapshot {
            session,
            messages,
            answers,
            timer,
        })
    }

    /// Wires a timer's time-up callback to a sentinel submission for
    /// this session. The countdown never ends the interview by itself.
    pub fn attach_time_up(self: &Arc<Self>, timer: &mut QuestionTimer, session_id: Uuid) {
        let orchestrator = Arc::clone(self);
        timer.on_time_up(move || {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                if let Err(err) = orchestrator
                    .submit_answer(session_id, NO_ANSWER_SENTINEL, None)
                    .await
                {
                    warn!(%session_id, error = %err, "time-up submission failed");
                }
            });
        });
    }

    async fn fetch(&self, session_id: Uuid) -> Result<Session, CoachError> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or(CoachError::SessionNotFound(session_id))
    }

    /// Shared completion path. Summary generation and gamification are
    /// best-effort: their failure never fails the completion.
    async fn complete(&self, session: Session) -> Result<Session, CoachError> {
        if !session.status.can_transition_to(SessionStatus::Completed) {
            return Err(invalid_state("in_progress", session.status));
        }
        let updated = self
            .store
            .update_session(
                session.id,
                SessionPatch {
                    status: Some(SessionStatus::Completed),
                    ended_at: Some(Utc::now()),
                    current_question_index: Some(None),
                    question_started_at: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        info!(session_id = %session.id, "interview completed");

        if let Err(err) = self.summarizer.generate(session.id).await {
            warn!(session_id = %session.id, error = %err, "summary generation failed; retryable from the report view");
        }
        self.gamification
            .on_interview_completed(&session.owner_id)
            .await;
        self.gamification.on_streak_touch(&session.owner_id).await;
        Ok(updated)
    }
}

fn invalid_state(expected: &str, actual: SessionStatus) -> CoachError {
    CoachError::InvalidState {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Focus tags for the next question: rubric dimensions that scored weak
/// in the last one or two answers, most recent first, deduplicated and
/// capped.
fn rolling_focus_tags(answers: &[Answer], cap: usize, weak_threshold: f32) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for answer in answers.iter().rev().take(2) {
        for dimension in answer.scores.weak_dimensions(weak_threshold) {
            if tags.iter().all(|t| t != dimension) {
                tags.push(dimension.to_string());
            }
            if tags.len() == cap {
                return tags;
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Evaluation, InterviewerResponse, QuestionType};
    use crate::error::CoachError;
    use crate::session::{Feedback, Scores};
    use crate::store::MemoryStore;
    use crate::summary::SessionSummary;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct StubGenerator {
        failures_left: AtomicU32,
        starts: AtomicU32,
        nexts: AtomicU32,
        last_next: Mutex<Option<NextRequest>>,
    }

    impl StubGenerator {
        fn new() -> Self {
            Self::failing(0)
        }

        fn failing(failures: u32) -> Self {
            Self {
                failures_left: AtomicU32::new(failures),
                starts: AtomicU32::new(0),
                nexts: AtomicU32::new(0),
                last_next: Mutex::new(None),
            }
        }

        fn take_failure(&self) -> bool {
            self.failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    #[async_trait]
    impl QuestionGenerator for StubGenerator {
        async fn start(&self, _request: StartRequest) -> Result<InterviewerResponse, CoachError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.take_failure() {
                return Err(CoachError::Recoverable("generator down".into()));
            }
            Ok(InterviewerResponse {
                question: "Question 1: tell me about yourself.".into(),
                question_type: QuestionType::Opening,
                difficulty: 2.0,
                focus_tags: vec!["communication".into()],
            })
        }

        async fn next(&self, request: NextRequest) -> Result<InterviewerResponse, CoachError> {
            self.nexts.fetch_add(1, Ordering::SeqCst);
            if self.take_failure() {
                return Err(CoachError::Recoverable("generator down".into()));
            }
            let question = format!("Question {}: go deeper.", request.question_index + 1);
            let difficulty = if request.should_increase_difficulty {
                3.0
            } else {
                2.0
            };
            *self.last_next.lock().unwrap() = Some(request);
            Ok(InterviewerResponse {
                question,
                question_type: QuestionType::Followup,
                difficulty,
                focus_tags: vec![],
            })
        }
    }

    struct StubEvaluator {
        overall: Mutex<f32>,
        failures_left: AtomicU32,
        calls: AtomicU32,
        delay: Duration,
    }

    impl StubEvaluator {
        fn scoring(overall: f32) -> Self {
            Self {
                overall: Mutex::new(overall),
                failures_left: AtomicU32::new(0),
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
            }
        }

        fn failing(failures: u32) -> Self {
            let mut stub = Self::scoring(3.0);
            stub.failures_left = AtomicU32::new(failures);
            stub
        }

        fn slow(overall: f32, delay: Duration) -> Self {
            let mut stub = Self::scoring(overall);
            stub.delay = delay;
            stub
        }

        fn set_overall(&self, overall: f32) {
            *self.overall.lock().unwrap() = overall;
        }
    }

    #[async_trait]
    impl AnswerEvaluator for StubEvaluator {
        async fn evaluate(&self, _request: EvaluateRequest) -> Result<Evaluation, CoachError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(CoachError::Recoverable("evaluator timeout".into()));
            }
            let overall = *self.overall.lock().unwrap();
            Ok(Evaluation {
                scores: Scores {
                    relevance: overall,
                    structure: overall,
                    depth: overall,
                    clarity: overall,
                    overall,
                },
                feedback: Feedback::default(),
            })
        }
    }

    struct StubSummarizer {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SummaryGenerator for StubSummarizer {
        async fn generate(&self, session_id: Uuid) -> Result<SessionSummary, CoachError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SessionSummary::empty(session_id))
        }
    }

    struct StubNotifier {
        answers: AtomicU32,
        completions: AtomicU32,
        streaks: AtomicU32,
    }

    #[async_trait]
    impl GamificationNotifier for StubNotifier {
        async fn on_answer_submitted(&self, _user_id: &str) {
            self.answers.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_interview_completed(&self, _user_id: &str) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_streak_touch(&self, _user_id: &str) {
            self.streaks.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        orchestrator: Arc<SessionOrchestrator>,
        store: Arc<MemoryStore>,
        generator: Arc<StubGenerator>,
        evaluator: Arc<StubEvaluator>,
        summarizer: Arc<StubSummarizer>,
        notifier: Arc<StubNotifier>,
    }

    fn harness(generator: StubGenerator, evaluator: StubEvaluator) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(generator);
        let evaluator = Arc::new(evaluator);
        let summarizer = Arc::new(StubSummarizer {
            calls: AtomicU32::new(0),
        });
        let notifier = Arc::new(StubNotifier {
            answers: AtomicU32::new(0),
            completions: AtomicU32::new(0),
            streaks: AtomicU32::new(0),
        });
        let config = OrchestratorConfig {
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::ZERO,
                exponential: false,
            },
            ..Default::default()
        };
        let orchestrator = Arc::new(SessionOrchestrator::new(
            store.clone(),
            generator.clone(),
            evaluator.clone(),
            summarizer.clone(),
            notifier.clone(),
            config,
        ));
        Harness {
            orchestrator,
            store,
            generator,
            evaluator,
            summarizer,
            notifier,
        }
    }

    fn setup(total_questions: u32) -> SessionSetup {
        SessionSetup {
            role: "backend".into(),
            level: "junior".into(),
            mode: "mixed".into(),
            language: "vi".into(),
            total_questions,
            jd_text: None,
        }
    }

    async fn started_session(harness: &Harness, total_questions: u32) -> Uuid {
        let session = harness
            .orchestrator
            .create_session("user-1", setup(total_questions))
            .await
            .unwrap();
        harness
            .orchestrator
            .start_interview(session.id)
            .await
            .unwrap();
        session.id
    }

    #[tokio::test]
    async fn scenario_a_created_session_is_in_setup() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let session = harness
            .orchestrator
            .create_session("user-1", setup(5))
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Setup);
        assert!(session.current_question_index.is_none());
        assert_eq!(harness.generator.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_session_surfaces_every_invalid_field() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let bad = SessionSetup {
            role: "wizard".into(),
            level: "expert".into(),
            mode: "mixed".into(),
            language: "vi".into(),
            total_questions: 0,
            jd_text: None,
        };
        let err = harness
            .orchestrator
            .create_session("user-1", bad)
            .await
            .unwrap_err();
        match err {
            CoachError::Validation { errors } => assert_eq!(errors.len(), 3),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scenario_b_start_asks_the_opening_question() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let session = harness
            .orchestrator
            .create_session("user-1", setup(5))
            .await
            .unwrap();
        let turn = harness
            .orchestrator
            .start_interview(session.id)
            .await
            .unwrap();

        assert_eq!(turn.session.status, SessionStatus::InProgress);
        assert_eq!(turn.session.current_question_index, Some(0));
        assert!(turn.session.current_question_started_at.is_some());
        assert!(turn.session.started_at.is_some());
        assert_eq!(turn.session.focus_tags, vec!["communication"]);
        assert_eq!(turn.question.question_index, Some(0));

        let messages = harness.store.list_messages(session.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::Interviewer);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let id = started_session(&harness, 5).await;
        let err = harness.orchestrator.start_interview(id).await.unwrap_err();
        assert!(matches!(err, CoachError::InvalidState { .. }));
        assert_eq!(
            harness.store.list_messages(id).await.unwrap().len(),
            1,
            "no duplicate opening question"
        );
    }

    #[tokio::test]
    async fn start_is_retryable_after_generator_outage() {
        // Two failures exhaust both attempts of the first call.
        let harness = harness(StubGenerator::failing(2), StubEvaluator::scoring(3.0));
        let session = harness
            .orchestrator
            .create_session("user-1", setup(5))
            .await
            .unwrap();

        let err = harness
            .orchestrator
            .start_interview(session.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::Recoverable(_)));

        // Limbo: in progress, but no question recorded yet.
        let stored = harness.store.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::InProgress);
        assert!(harness.store.list_messages(session.id).await.unwrap().is_empty());

        let turn = harness
            .orchestrator
            .start_interview(session.id)
            .await
            .unwrap();
        assert_eq!(turn.session.current_question_index, Some(0));
        assert_eq!(harness.store.list_messages(session.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submit_advances_the_index_by_exactly_one() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let id = started_session(&harness, 5).await;

        let outcome = harness
            .orchestrator
            .submit_answer(id, "I built a payments API.", Some(45))
            .await
            .unwrap();
        let SubmitOutcome::Next {
            session, question, answer,
        } = outcome
        else {
            panic!("expected Next");
        };
        assert_eq!(session.current_question_index, Some(1));
        assert_eq!(question.question_index, Some(1));
        assert_eq!(answer.question_index, 0);
        assert_eq!(answer.time_taken_seconds, Some(45));
        assert_eq!(harness.notifier.answers.load(Ordering::SeqCst), 1);

        // interviewer q0, candidate a0, interviewer q1
        let messages = harness.store.list_messages(id).await.unwrap();
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::Interviewer,
                MessageRole::Candidate,
                MessageRole::Interviewer
            ]
        );
    }

    #[tokio::test]
    async fn scenario_c_last_answer_completes_and_summarizes_once() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let id = started_session(&harness, 1).await;

        let outcome = harness
            .orchestrator
            .submit_answer(id, "final answer", None)
            .await
            .unwrap();
        let SubmitOutcome::Completed { session, .. } = outcome else {
            panic!("expected Completed");
        };
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.ended_at.is_some());
        assert!(session.current_question_index.is_none());
        assert!(session.current_question_started_at.is_none());

        assert_eq!(harness.summarizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.notifier.completions.load(Ordering::SeqCst), 1);
        assert_eq!(harness.notifier.streaks.load(Ordering::SeqCst), 1);
        assert_eq!(harness.generator.nexts.load(Ordering::SeqCst), 0);
        // q0 + candidate answer only; no further question generated.
        assert_eq!(harness.store.list_messages(id).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn scenario_d_concurrent_submits_yield_one_answer() {
        let harness = harness(
            StubGenerator::new(),
            StubEvaluator::slow(3.0, Duration::from_millis(100)),
        );
        let id = started_session(&harness, 5).await;

        let first = {
            let orchestrator = harness.orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit_answer(id, "answer one", None).await })
        };
        // Give the first submission time to take the guard.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = harness.orchestrator.submit_answer(id, "answer two", None).await;

        assert!(matches!(second, Err(CoachError::AlreadyInFlight)));
        assert!(first.await.unwrap().is_ok());

        let answers = harness.store.list_answers(id).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_text, "answer one");
    }

    #[tokio::test]
    async fn scenario_e_failed_evaluation_preserves_the_candidate_message() {
        // Two failures exhaust both attempts; the third call succeeds.
        let harness = harness(StubGenerator::new(), StubEvaluator::failing(2));
        let id = started_session(&harness, 5).await;

        let err = harness
            .orchestrator
            .submit_answer(id, "my answer", Some(30))
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::EvaluationFailed(_)));
        assert_eq!(harness.evaluator.calls.load(Ordering::SeqCst), 2);

        let messages = harness.store.list_messages(id).await.unwrap();
        assert_eq!(messages.len(), 2, "candidate message is kept");
        assert!(harness.store.list_answers(id).await.unwrap().is_empty());
        let stored = harness.store.get_session(id).await.unwrap().unwrap();
        assert_eq!(stored.current_question_index, Some(0));

        // Retrying detects the persisted candidate message and does not
        // append it again.
        let outcome = harness
            .orchestrator
            .submit_answer(id, "my answer", Some(30))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Next { .. }));
        let messages = harness.store.list_messages(id).await.unwrap();
        let candidates = messages
            .iter()
            .filter(|m| m.role == MessageRole::Candidate && m.question_index == Some(0))
            .count();
        assert_eq!(candidates, 1);
        assert_eq!(harness.store.list_answers(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submit_without_a_question_is_rejected() {
        // Generator outage leaves the session in progress with no
        // question recorded.
        let harness = harness(StubGenerator::failing(2), StubEvaluator::scoring(3.0));
        let session = harness
            .orchestrator
            .create_session("user-1", setup(5))
            .await
            .unwrap();
        let _ = harness.orchestrator.start_interview(session.id).await;

        let err = harness
            .orchestrator
            .submit_answer(session.id, "anything", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::NoActiveQuestion));
    }

    #[tokio::test]
    async fn duplicate_answer_for_the_current_index_is_rejected() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let id = started_session(&harness, 5).await;

        // A racing writer already recorded an answer for index 0.
        harness
            .store
            .append_answer(Answer {
                id: Uuid::new_v4(),
                session_id: id,
                question_index: 0,
                question_text: "Q".into(),
                answer_text: "A".into(),
                scores: Scores {
                    relevance: 3.0,
                    structure: 3.0,
                    depth: 3.0,
                    clarity: 3.0,
                    overall: 3.0,
                },
                feedback: Feedback::default(),
                time_taken_seconds: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let err = harness
            .orchestrator
            .submit_answer(id, "late answer", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::DuplicateAnswer { question_index: 0 }));
    }

    #[tokio::test]
    async fn difficulty_signal_follows_the_threshold() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(4.5));
        let id = started_session(&harness, 5).await;

        harness
            .orchestrator
            .submit_answer(id, "strong answer", None)
            .await
            .unwrap();
        let request = harness.generator.last_next.lock().unwrap().take().unwrap();
        assert!(request.should_increase_difficulty);
        assert!(request.focus_tags.is_empty(), "no weak dimensions");

        harness.evaluator.set_overall(2.0);
        harness
            .orchestrator
            .submit_answer(id, "weak answer", None)
            .await
            .unwrap();
        let request = harness.generator.last_next.lock().unwrap().take().unwrap();
        assert!(!request.should_increase_difficulty);
        // All four dimensions are weak; the tags are capped at three.
        assert_eq!(request.focus_tags.len(), 3);
        assert_eq!(request.question_index, 2);
    }

    #[tokio::test]
    async fn end_interview_completes_once() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let id = started_session(&harness, 5).await;

        let session = harness.orchestrator.end_interview(id).await.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(harness.summarizer.calls.load(Ordering::SeqCst), 1);

        let err = harness.orchestrator.end_interview(id).await.unwrap_err();
        assert!(matches!(err, CoachError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn abandon_is_reachable_from_setup_and_in_progress_only() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let session = harness
            .orchestrator
            .create_session("user-1", setup(5))
            .await
            .unwrap();
        let abandoned = harness
            .orchestrator
            .abandon_session(session.id)
            .await
            .unwrap();
        assert_eq!(abandoned.status, SessionStatus::Abandoned);

        let id = started_session(&harness, 5).await;
        harness.orchestrator.end_interview(id).await.unwrap();
        let err = harness.orchestrator.abandon_session(id).await.unwrap_err();
        assert!(matches!(err, CoachError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn load_session_is_idempotent_and_rebuilds_the_timer() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let id = started_session(&harness, 5).await;

        let first = harness.orchestrator.load_session(id).await.unwrap();
        let second = harness.orchestrator.load_session(id).await.unwrap();
        assert_eq!(
            serde_json::to_value(&first.session).unwrap(),
            serde_json::to_value(&second.session).unwrap()
        );
        assert_eq!(
            serde_json::to_value(&first.messages).unwrap(),
            serde_json::to_value(&second.messages).unwrap()
        );
        assert_eq!(
            serde_json::to_value(&first.answers).unwrap(),
            serde_json::to_value(&second.answers).unwrap()
        );

        let timer = first.timer.expect("a question is pending");
        let limit = first.session.question_time_limit;
        assert!(timer.remaining_seconds <= limit && timer.remaining_seconds >= limit - 1);

        harness.orchestrator.end_interview(id).await.unwrap();
        let done = harness.orchestrator.load_session(id).await.unwrap();
        assert!(done.timer.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn time_up_submits_the_sentinel_answer() {
        let harness = harness(StubGenerator::new(), StubEvaluator::scoring(3.0));
        let id = started_session(&harness, 5).await;

        let mut timer = QuestionTimer::new(1);
        harness.orchestrator.attach_time_up(&mut timer, id);
        timer.start();
        timer.tick();

        // The sentinel submission runs on a spawned task.
        let mut answers = Vec::new();
        for _ in 0..50 {
            answers = harness.store.list_answers(id).await.unwrap();
            if !answers.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_text, NO_ANSWER_SENTINEL);
    }

    #[test]
    fn rolling_tags_look_at_the_last_two_answers_only() {
        let answer = |index: u32, relevance: f32, depth: f32, clarity: f32| Answer {
            id: Uuid::new_v4(),
            session_id: Uuid::nil(),
            question_index: index,
            question_text: "Q".into(),
            answer_text: "A".into(),
            scores: Scores {
                relevance,
                structure: 4.0,
                depth,
                clarity,
                overall: 3.0,
            },
            feedback: Feedback::default(),
            time_taken_seconds: None,
            created_at: Utc::now(),
        };
        // The oldest answer's weak clarity must not leak in.
        let answers = vec![
            answer(0, 4.0, 4.0, 1.0),
            answer(1, 2.0, 4.0, 4.0),
            answer(2, 4.0, 2.0, 4.0),
        ];
        let tags = rolling_focus_tags(&answers, 3, 3.0);
        assert_eq!(tags, vec!["depth", "relevance"]);
        assert!(!tags.iter().any(|t| t == "clarity"));
    }
}
