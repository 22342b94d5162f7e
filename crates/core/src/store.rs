//! Session store facade.
//!
//! The orchestrator's only channel to durable state. Each call is atomic;
//! the orchestrator relies on that and on `append_answer` rejecting a
//! second answer for the same question index. The production deployment
//! plugs a database behind this trait; `MemoryStore` backs tests and
//! single-process setups.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::CoachError;
use crate::session::{Answer, Message, Session, SessionStatus};
use crate::summary::SessionSummary;

/// Partial update of the mutable session fields.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// `Some(None)` clears the index once the session leaves `InProgress`.
    pub current_question_index: Option<Option<u32>>,
    pub difficulty_score: Option<f32>,
    pub focus_tags: Option<Vec<String>>,
    /// `Some(None)` clears the question start instant.
    pub question_started_at: Option<Option<DateTime<Utc>>>,
}

/// Durable state behind the orchestrator. All writes are atomic per call.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: Session) -> Result<(), CoachError>;
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, CoachError>;
    async fn update_session(&self, id: Uuid, patch: SessionPatch) -> Result<Session, CoachError>;
    /// Appends a message to the transcript. Ordering is append order.
    async fn append_message(&self, message: Message) -> Result<Message, CoachError>;
    /// Records an answer; at most one per `(session, question_index)`.
    async fn append_answer(&self, answer: Answer) -> Result<Answer, CoachError>;
    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<Message>, CoachError>;
    /// Answers ordered by question index.
    async fn list_answers(&self, session_id: Uuid) -> Result<Vec<Answer>, CoachError>;
    /// Stores a summary, replacing any previous one for the session.
    async fn put_summary(&self, summary: SessionSummary) -> Result<(), CoachError>;
    async fn get_summary(&self, session_id: Uuid) -> Result<Option<SessionSummary>, CoachError>;
}

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<Uuid, Session>,
    messages: HashMap<Uuid, Vec<Message>>,
    answers: HashMap<Uuid, Vec<Answer>>,
    summaries: HashMap<Uuid, SessionSummary>,
}

/// In-memory `SessionStore` over a `tokio::sync::RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, session: Session) -> Result<(), CoachError> {
        let mut inner = self.inner.write().await;
        inner.sessions.insert(session.id, session);
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, CoachError> {
        let inner = self.inner.read().await;
        Ok(inner.sessions.get(&id).cloned())
    }

    async fn update_session(&self, id: Uuid, patch: SessionPatch) -> Result<Session, CoachError> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or(CoachError::SessionNotFound(id))?;
        if let Some(status) = patch.status {
            session.status = status;
        }
        if let Some(at) = patch.started_at {
            session.started_at = Some(at);
        }
        if let Some(at) = patch.ended_at {
            session.ended_at = Some(at);
        }
        if let Some(index) = patch.current_question_index {
            session.current_question_index = index;
        }
        if let Some(score) = patch.difficulty_score {
            session.difficulty_score = score;
        }
        if let Some(tags) = patch.focus_tags {
            session.focus_tags = tags;
        }
        if let Some(at) = patch.question_started_at {
            session.current_question_started_at = at;
        }
        Ok(session.clone())
    }

    async fn append_message(&self, message: Message) -> Result<Message, CoachError> {
        let mut inner = self.inner.write().await;
        if !inner.sessions.contains_key(&message.session_id) {
            return Err(CoachError::SessionNotFound(message.session_id));
        }
        inner
            .messages
            .entry(message.session_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn append_answer(&self, answer: Answer) -> Result<Answer, CoachError> {
        let mut inner = self.inner.write().await;
        if !inner.sessions.contains_key(&answer.session_id) {
            return Err(CoachError::SessionNotFound(answer.session_id));
        }
        let answers = inner.answers.entry(answer.session_id).or_default();
        if answers.iter().any(|a| a.question_index == answer.question_index) {
            return Err(CoachError::DuplicateAnswer {
                question_index: answer.question_index,
            });
        }
        answers.push(answer.clone());
        Ok(answer)
    }

    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<Message>, CoachError> {
        let inner = self.inner.read().await;
        Ok(inner.messages.get(&session_id).cloned().unwrap_or_default())
    }

    async fn list_answers(&self, session_id: Uuid) -> Result<Vec<Answer>, CoachError> {
        let inner = self.inner.read().await;
        let mut answers = inner.answers.get(&session_id).cloned().unwrap_or_default();
        answers.sort_by_key(|a| a.question_index);
        Ok(answers)
    }

    async fn put_summary(&self, summary: SessionSummary) -> Result<(), CoachError> {
        let mut inner = self.inner.write().await;
        inner.summaries.insert(summary.session_id, summary);
        Ok(())
    }

    async fn get_summary(&self, session_id: Uuid) -> Result<Option<SessionSummary>, CoachError> {
        let inner = self.inner.read().await;
        Ok(inner.summaries.get(&session_id).cloned())
    }
}
