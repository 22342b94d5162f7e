//! Post-completion session summary.
//!
//! A summary aggregates every answer of a completed session into
//! strengths, weaknesses and a short improvement plan. Generation is
//! idempotent: regenerating simply overwrites the stored summary, so the
//! report view can retry it independently of the completion transition.

use std::collections::HashMap;
use std::sync::Arc;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::map_openai_err;
use crate::error::CoachError;
use crate::store::SessionStore;

/// One day of the improvement plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementDay {
    pub day: u32,
    pub focus: String,
    pub tasks: Vec<String>,
}

/// Aggregate produced after a session completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    /// Mean of the per-answer overall scores.
    pub overall_score: f32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_plan: Vec<ImprovementDay>,
    /// Average score per rubric dimension.
    pub skill_breakdown: HashMap<String, f32>,
    pub created_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Placeholder summary for a session without any scored answers.
    pub fn empty(session_id: Uuid) -> Self {
        Self {
            session_id,
            overall_score: 0.0,
            strengths: vec!["No data to analyze yet".into()],
            weaknesses: vec!["The session has no recorded answers".into()],
            improvement_plan: Vec::new(),
            skill_breakdown: HashMap::new(),
            created_at: Utc::now(),
        }
    }
}

/// Generates and stores the summary for a session. Idempotent.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(&self, session_id: Uuid) -> Result<SessionSummary, CoachError>;
}

#[derive(Deserialize)]
struct RawSummary {
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    improvement_plan: Vec<ImprovementDay>,
    #[serde(default)]
    skill_breakdown: HashMap<String, f32>,
}

/// LLM-backed `SummaryGenerator` over an OpenAI-compatible API.
pub struct LlmSummaryService {
    client: Client<OpenAIConfig>,
    model: String,
    store: Arc<dyn SessionStore>,
}

impl LlmSummaryService {
    pub fn new(config: OpenAIConfig, model: String, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            store,
        }
    }
}

#[async_trait]
impl SummaryGenerator for LlmSummaryService {
    async fn generate(&self, session_id: Uuid) -> Result<SessionSummary, CoachError> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(CoachError::SessionNotFound(session_id))?;
        let answers = self.store.list_answers(session_id).await?;

        if answers.is_empty() {
            let summary = SessionSummary::empty(session_id);
            self.store.put_summary(summary.clone()).await?;
            return Ok(summary);
        }

        let overall_score =
            answers.iter().map(|a| a.scores.overall).sum::<f32>() / answers.len() as f32;

        let mut breakdown = HashMap::new();
        let n = answers.len() as f32;
        breakdown.insert(
            "relevance".to_string(),
            answers.iter().map(|a| a.scores.relevance).sum::<f32>() / n,
        );
        breakdown.insert(
            "structure".to_string(),
            answers.iter().map(|a| a.scores.structure).sum::<f32>() / n,
        );
        breakdown.insert(
            "depth".to_string(),
            answers.iter().map(|a| a.scores.depth).sum::<f32>() / n,
        );
        breakdown.insert(
            "clarity".to_string(),
            answers.iter().map(|a| a.scores.clarity).sum::<f32>() / n,
        );

        let transcript: String = answers
            .iter()
            .map(|a| {
                format!(
                    "Q{} ({:.1}/5): {}\nAnswer: {}\n",
                    a.question_index + 1,
                    a.scores.overall,
                    a.question_text,
                    a.answer_text,
                )
            })
            .collect();

        let system = format!(
            "You are a career coach summarizing a mock interview for a {} position \
             at {} level. Based on the scored answers, produce JSON with keys: \
             \"strengths\" (2-4 short bullet strings), \"weaknesses\" (2-4 short \
             bullet strings), \"improvement_plan\" (array of {{\"day\": n, \"focus\": \
             \"...\", \"tasks\": [..]}} for a 7-day plan) and \"skill_breakdown\" \
             (object mapping skill names to 0-5 scores).",
            session.role, session.level,
        );
        let user = format!(
            "Average overall score: {overall_score:.2}/5\n\nScored answers:\n{transcript}"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(map_openai_err)?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()
                    .map_err(map_openai_err)?
                    .into(),
            ])
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.4)
            .build()
            .map_err(map_openai_err)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_err)?;
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| CoachError::Schema("no content in completion".into()))?;
        let raw: RawSummary = serde_json::from_str(&content)
            .map_err(|e| CoachError::Schema(format!("summary payload: {e}")))?;

        let summary = SessionSummary {
            session_id,
            overall_score,
            strengths: raw.strengths,
            weaknesses: raw.weaknesses,
            improvement_plan: raw.improvement_plan,
            skill_breakdown: if raw.skill_breakdown.is_empty() {
                breakdown
            } else {
                raw.skill_breakdown
            },
            created_at: Utc::now(),
        };
        self.store.put_summary(summary.clone()).await?;
        Ok(summary)
    }
}

/// Deterministic summary built purely from stored scores, for
/// deployments and tests without an LLM.
pub struct StaticSummaryService {
    store: Arc<dyn SessionStore>,
}

impl StaticSummaryService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SummaryGenerator for StaticSummaryService {
    async fn generate(&self, session_id: Uuid) -> Result<SessionSummary, CoachError> {
        let answers = self.store.list_answers(session_id).await?;
        if answers.is_empty() {
            let summary = SessionSummary::empty(session_id);
            self.store.put_summary(summary.clone()).await?;
            return Ok(summary);
        }

        let n = answers.len() as f32;
        let overall_score = answers.iter().map(|a| a.scores.overall).sum::<f32>() / n;
        let mut skill_breakdown = HashMap::new();
        skill_breakdown.insert(
            "relevance".to_string(),
            answers.iter().map(|a| a.scores.relevance).sum::<f32>() / n,
        );
        skill_breakdown.insert(
            "structure".to_string(),
            answers.iter().map(|a| a.scores.structure).sum::<f32>() / n,
        );
        skill_breakdown.insert(
            "depth".to_string(),
            answers.iter().map(|a| a.scores.depth).sum::<f32>() / n,
        );
        skill_breakdown.insert(
            "clarity".to_string(),
            answers.iter().map(|a| a.scores.clarity).sum::<f32>() / n,
        );

        let mut pairs: Vec<_> = skill_breakdown.iter().collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        let strengths = pairs
            .iter()
            .take(2)
            .map(|(skill, score)| format!("{skill} ({score:.1}/5)"))
            .collect();
        let weaknesses = pairs
            .iter()
            .rev()
            .take(2)
            .map(|(skill, score)| format!("{skill} ({score:.1}/5)"))
            .collect();

        let summary = SessionSummary {
            session_id,
            overall_score,
            strengths,
            weaknesses,
            improvement_plan: Vec::new(),
            skill_breakdown,
            created_at: Utc::now(),
        };
        self.store.put_summary(summary.clone()).await?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Answer, Feedback, Scores, SessionSetup};
    use crate::store::MemoryStore;

    fn scored_answer(session_id: Uuid, index: u32, overall: f32) -> Answer {
        Answer {
            id: Uuid::new_v4(),
            session_id,
            question_index: index,
            question_text: format!("Q{index}"),
            answer_text: "answer".into(),
            scores: Scores {
                relevance: overall,
                structure: overall,
                depth: overall,
                clarity: overall,
                overall,
            },
            feedback: Feedback::default(),
            time_taken_seconds: None,
            created_at: Utc::now(),
        }
    }

    async fn session_with_answers(store: &MemoryStore, overalls: &[f32]) -> Uuid {
        let setup = SessionSetup {
            role: "backend".into(),
            level: "junior".into(),
            mode: "mixed".into(),
            language: "en".into(),
            total_questions: 5,
            jd_text: None,
        };
        let session = crate::session::Session::new("user-1", setup.validate().unwrap(), 90);
        let id = session.id;
        store.create_session(session).await.unwrap();
        for (i, overall) in overalls.iter().enumerate() {
            store
                .append_answer(scored_answer(id, i as u32, *overall))
                .await
                .unwrap();
        }
        id
    }

    #[tokio::test]
    async fn static_summary_averages_scores_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let id = session_with_answers(&store, &[2.0, 4.0]).await;

        let service = StaticSummaryService::new(store.clone());
        let summary = service.generate(id).await.unwrap();
        assert!((summary.overall_score - 3.0).abs() < f32::EPSILON);
        assert_eq!(summary.skill_breakdown.len(), 4);
        assert!(store.get_summary(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_session_gets_placeholder_summary() {
        let store = Arc::new(MemoryStore::new());
        let id = session_with_answers(&store, &[]).await;

        let service = StaticSummaryService::new(store.clone());
        let summary = service.generate(id).await.unwrap();
        assert_eq!(summary.overall_score, 0.0);
        assert!(summary.improvement_plan.is_empty());
    }

    #[tokio::test]
    async fn regeneration_overwrites_previous_summary() {
        let store = Arc::new(MemoryStore::new());
        let id = session_with_answers(&store, &[3.0]).await;
        let service = StaticSummaryService::new(store.clone());

        service.generate(id).await.unwrap();
        store
            .append_answer(scored_answer(id, 1, 5.0))
            .await
            .unwrap();
        let second = service.generate(id).await.unwrap();
        let stored = store.get_summary(id).await.unwrap().unwrap();
        assert!((stored.overall_score - second.overall_score).abs() < f32::EPSILON);
        assert!((stored.overall_score - 4.0).abs() < f32::EPSILON);
    }
}
