//! API Models
//!
//! This module defines the wire representations of the core session types
//! and the request payloads, annotated with `utoipa` for OpenAPI
//! documentation. Enumerated fields travel as their lowercase string
//! forms so the payloads match what `SessionSetup::validate` accepts.

use chrono::{DateTime, Utc};
use coach_core::orchestrator::{SessionSnapshot, SubmitOutcome, TurnState};
use coach_core::session::{Answer, Feedback, Message, Scores, Session, SessionSetup};
use coach_core::summary::{ImprovementDay, SessionSummary};
use coach_core::timer::TimerState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct SessionDto {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub owner_id: String,
    #[schema(example = "backend")]
    pub role: String,
    #[schema(example = "junior")]
    pub level: String,
    #[schema(example = "mixed")]
    pub mode: String,
    #[schema(example = "vi")]
    pub language: String,
    pub jd_text: Option<String>,
    #[schema(example = "in_progress")]
    pub status: String,
    pub total_questions: u32,
    pub current_question_index: Option<u32>,
    pub difficulty_score: f32,
    pub focus_tags: Vec<String>,
    pub question_time_limit: u32,
    pub current_question_started_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionDto {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            owner_id: session.owner_id,
            role: session.role.to_string(),
            level: session.level.to_string(),
            mode: session.mode.to_string(),
            language: session.language.to_string(),
            jd_text: session.jd_text,
            status: session.status.to_string(),
            total_questions: session.total_questions,
            current_question_index: session.current_question_index,
            difficulty_score: session.difficulty_score,
            focus_tags: session.focus_tags,
            question_time_limit: session.question_time_limit,
            current_question_started_at: session.current_question_started_at,
            started_at: session.started_at,
            ended_at: session.ended_at,
            created_at: session.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct MessageDto {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    #[schema(example = "interviewer")]
    pub role: String,
    pub content: String,
    pub question_index: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            role: message.role.to_string(),
            content: message.content,
            question_index: message.question_index,
            created_at: message.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct ScoresDto {
    pub relevance: f32,
    pub structure: f32,
    pub depth: f32,
    pub clarity: f32,
    pub overall: f32,
}

impl From<Scores> for ScoresDto {
    fn from(scores: Scores) -> Self {
        Self {
            relevance: scores.relevance,
            structure: scores.structure,
            depth: scores.depth,
            clarity: scores.clarity,
            overall: scores.overall,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct FeedbackDto {
    pub evidence: Vec<String>,
    pub suggestions: Vec<String>,
    pub improved_answer: Option<String>,
}

impl From<Feedback> for FeedbackDto {
    fn from(feedback: Feedback) -> Self {
        Self {
            evidence: feedback.evidence,
            suggestions: feedback.suggestions,
            improved_answer: feedback.improved_answer,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct AnswerDto {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub question_index: u32,
    pub question_text: String,
    pub answer_text: String,
    pub scores: ScoresDto,
    pub feedback: FeedbackDto,
    pub time_taken_seconds: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl From<Answer> for AnswerDto {
    fn from(answer: Answer) -> Self {
        Self {
            id: answer.id,
            question_index: answer.question_index,
            question_text: answer.question_text,
            answer_text: answer.answer_text,
            scores: answer.scores.into(),
            feedback: answer.feedback.into(),
            time_taken_seconds: answer.time_taken_seconds,
            created_at: answer.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct TimerDto {
    pub remaining_seconds: u32,
    pub running: bool,
    pub warning: bool,
    pub danger: bool,
    #[schema(example = "01:30")]
    pub formatted: String,
}

impl From<TimerState> for TimerDto {
    fn from(state: TimerState) -> Self {
        Self {
            remaining_seconds: state.remaining_seconds,
            running: state.running,
            warning: state.warning,
            danger: state.danger,
            formatted: state.formatted,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct ImprovementDayDto {
    pub day: u32,
    pub focus: String,
    pub tasks: Vec<String>,
}

impl From<ImprovementDay> for ImprovementDayDto {
    fn from(day: ImprovementDay) -> Self {
        Self {
            day: day.day,
            focus: day.focus,
            tasks: day.tasks,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct SummaryDto {
    #[schema(value_type = String, format = Uuid)]
    pub session_id: Uuid,
    pub overall_score: f32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_plan: Vec<ImprovementDayDto>,
    pub skill_breakdown: HashMap<String, f32>,
    pub created_at: DateTime<Utc>,
}

impl From<SessionSummary> for SummaryDto {
    fn from(summary: SessionSummary) -> Self {
        Self {
            session_id: summary.session_id,
            overall_score: summary.overall_score,
            strengths: summary.strengths,
            weaknesses: summary.weaknesses,
            improvement_plan: summary
                .improvement_plan
                .into_iter()
                .map(Into::into)
                .collect(),
            skill_breakdown: summary.skill_breakdown,
            created_at: summary.created_at,
        }
    }
}

/// Session plus the question now awaiting an answer.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct TurnDto {
    pub session: SessionDto,
    pub question: MessageDto,
}

impl From<TurnState> for TurnDto {
    fn from(turn: TurnState) -> Self {
        Self {
            session: turn.session.into(),
            question: turn.question.into(),
        }
    }
}

/// Result of submitting an answer. `question` is absent when the
/// submission completed the session.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct SubmitOutcomeDto {
    pub session: SessionDto,
    pub answer: AnswerDto,
    pub question: Option<MessageDto>,
    pub completed: bool,
}

impl From<SubmitOutcome> for SubmitOutcomeDto {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Next {
                session,
                answer,
                question,
            } => Self {
                session: session.into(),
                answer: answer.into(),
                question: Some(question.into()),
                completed: false,
            },
            SubmitOutcome::Completed { session, answer } => Self {
                session: session.into(),
                answer: answer.into(),
                question: None,
                completed: true,
            },
        }
    }
}

/// Everything a client needs to resume a session after a reload.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct SnapshotDto {
    pub session: SessionDto,
    pub messages: Vec<MessageDto>,
    pub answers: Vec<AnswerDto>,
    pub timer: Option<TimerDto>,
}

impl From<SessionSnapshot> for SnapshotDto {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            session: snapshot.session.into(),
            messages: snapshot.messages.into_iter().map(Into::into).collect(),
            answers: snapshot.answers.into_iter().map(Into::into).collect(),
            timer: snapshot.timer.map(Into::into),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionPayload {
    #[schema(example = "backend")]
    pub role: String,
    #[schema(example = "junior")]
    pub level: String,
    #[schema(example = "mixed")]
    pub mode: String,
    #[schema(example = "vi")]
    pub language: String,
    #[schema(example = 5)]
    pub total_questions: u32,
    pub jd_text: Option<String>,
}

impl From<CreateSessionPayload> for SessionSetup {
    fn from(payload: CreateSessionPayload) -> Self {
        Self {
            role: payload.role,
            level: payload.level,
            mode: payload.mode,
            language: payload.language,
            total_questions: payload.total_questions,
            jd_text: payload.jd_text,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitAnswerPayload {
    pub answer_text: String,
    pub time_taken_seconds: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    /// Field-level validation messages, present for 400 responses only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }
}
