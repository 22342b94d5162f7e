//! Typed error taxonomy for the session orchestrator.
//!
//! Callers are expected to branch on these variants: validation and
//! state errors are terminal for the request, `AlreadyInFlight` and
//! `Recoverable` are retryable by the caller, `Config` fails fast.

use uuid::Uuid;

/// All failures surfaced by the core.
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    /// Malformed session setup; carries every violated field.
    #[error("invalid session setup: {}", errors.join(", "))]
    Validation { errors: Vec<String> },

    /// Operation invoked against a session in the wrong status.
    #[error("invalid session state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },

    /// Another turn for this session is still being processed.
    #[error("another submission for this session is still in flight")]
    AlreadyInFlight,

    /// No interviewer question is recorded for the current index.
    #[error("no active question to answer")]
    NoActiveQuestion,

    /// An answer for this question index already exists.
    #[error("answer for question {question_index} already recorded")]
    DuplicateAnswer { question_index: u32 },

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    /// Transport-level failure after retries were exhausted. The caller
    /// may retry the whole operation; partial state is preserved.
    #[error("collaborator call failed: {0}")]
    Recoverable(String),

    /// The answer evaluator failed after retries. The candidate message
    /// is already persisted and the submission can be retried.
    #[error("answer evaluation failed: {0}")]
    EvaluationFailed(String),

    /// A collaborator returned a payload that does not match the
    /// expected schema. Not retried.
    #[error("malformed collaborator response: {0}")]
    Schema(String),

    #[error("store error: {0}")]
    Store(String),

    /// Missing credentials or other startup misconfiguration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CoachError {
    /// Whether the retry layer may re-attempt the failed call.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoachError::Recoverable(_))
    }
}
