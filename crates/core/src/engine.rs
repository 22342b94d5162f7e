//! Question generation and answer evaluation collaborators.
//!
//! The orchestrator only sees the `QuestionGenerator` and
//! `AnswerEvaluator` traits. `LlmEngine` implements both against any
//! OpenAI-compatible chat API (Groq in the default deployment) with JSON
//! response format; `StaticEngine` is a deterministic stand-in for
//! development and tests. Collaborator payloads are parsed into fixed
//! structs and validated before they are accepted; a malformed payload
//! is a `Schema` error and is never retried.

use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::CoachError;
use crate::session::{Feedback, Language, Level, MessageRole, Mode, Role, Scores};

/// Inputs for the opening question of a session.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub session_id: Uuid,
    pub role: Role,
    pub level: Level,
    pub mode: Mode,
    pub language: Language,
    pub jd_text: Option<String>,
}

/// One transcript turn passed as context to the generator.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub role: MessageRole,
    pub content: String,
}

/// Inputs for a follow-up question.
#[derive(Debug, Clone)]
pub struct NextRequest {
    pub session_id: Uuid,
    pub role: Role,
    pub level: Level,
    pub mode: Mode,
    pub language: Language,
    pub previous_answer: String,
    pub previous_scores: Scores,
    pub should_increase_difficulty: bool,
    pub focus_tags: Vec<String>,
    /// 0-based index of the question being generated.
    pub question_index: u32,
    pub transcript_tail: Vec<TranscriptEntry>,
}

/// Inputs for scoring one answer.
#[derive(Debug, Clone)]
pub struct EvaluateRequest {
    pub session_id: Uuid,
    pub question: String,
    pub answer: String,
    pub role: Role,
    pub level: Level,
    pub mode: Mode,
    pub language: Language,
    pub question_index: u32,
}

/// Kind of question the interviewer chose to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Opening,
    Followup,
    NewTopic,
    Clarification,
}

/// A generated interview question with its difficulty and focus tags.
#[derive(Debug, Clone)]
pub struct InterviewerResponse {
    pub question: String,
    pub question_type: QuestionType,
    /// Difficulty on the 1..=5 scale.
    pub difficulty: f32,
    pub focus_tags: Vec<String>,
}

/// Scores and feedback for one answer.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub scores: Scores,
    pub feedback: Feedback,
}

/// Produces interview questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn start(&self, request: StartRequest) -> Result<InterviewerResponse, CoachError>;
    async fn next(&self, request: NextRequest) -> Result<InterviewerResponse, CoachError>;
}

/// Scores candidate answers against the rubric.
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    async fn evaluate(&self, request: EvaluateRequest) -> Result<Evaluation, CoachError>;
}

// --- Wire payloads ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInterviewer {
    question: String,
    #[serde(default)]
    question_type: QuestionType,
    difficulty: f32,
    #[serde(default)]
    focus_tags: Vec<String>,
}

impl RawInterviewer {
    fn validate(self) -> Result<InterviewerResponse, CoachError> {
        if self.question.trim().is_empty() {
            return Err(CoachError::Schema("empty question".into()));
        }
        if !(1.0..=5.0).contains(&self.difficulty) {
            return Err(CoachError::Schema(format!(
                "difficulty {} out of range 1..=5",
                self.difficulty
            )));
        }
        Ok(InterviewerResponse {
            question: self.question,
            question_type: self.question_type,
            difficulty: self.difficulty,
            focus_tags: self.focus_tags,
        })
    }
}

#[derive(Deserialize)]
struct RawScores {
    relevance: f32,
    structure: f32,
    depth: f32,
    clarity: f32,
    overall: Option<f32>,
}

#[derive(Deserialize, Default)]
struct RawFeedback {
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
    improved_answer: Option<String>,
}

#[derive(Deserialize)]
struct RawEvaluation {
    scores: RawScores,
    #[serde(default)]
    feedback: RawFeedback,
}

impl RawEvaluation {
    fn validate(self) -> Result<Evaluation, CoachError> {
        let mut scores = Scores {
            relevance: self.scores.relevance,
            structure: self.scores.structure,
            depth: self.scores.depth,
            clarity: self.scores.clarity,
            overall: 0.0,
        };
        // The evaluator's own overall wins when present; otherwise the
        // arithmetic mean of the sub-scores.
        scores.overall = self.scores.overall.unwrap_or_else(|| scores.mean());
        if !scores.in_range() {
            return Err(CoachError::Schema("score outside 0..=5".into()));
        }
        Ok(Evaluation {
            scores,
            feedback: Feedback {
                evidence: self.feedback.evidence,
                suggestions: self.feedback.suggestions,
                improved_answer: self.feedback.improved_answer,
            },
        })
    }
}

fn parse_interviewer(content: &str) -> Result<InterviewerResponse, CoachError> {
    let raw: RawInterviewer = serde_json::from_str(content)
        .map_err(|e| CoachError::Schema(format!("interviewer payload: {e}")))?;
    raw.validate()
}

fn parse_evaluation(content: &str) -> Result<Evaluation, CoachError> {
    let raw: RawEvaluation = serde_json::from_str(content)
        .map_err(|e| CoachError::Schema(format!("evaluation payload: {e}")))?;
    raw.validate()
}

// --- Prompt content ---

/// Technical topic pool per role, used to steer question generation.
fn role_topics(role: Role) -> &'static [&'static str] {
    match role {
        Role::Frontend => &[
            "React/Vue/Angular", "JavaScript/TypeScript", "CSS/Responsive Design",
            "State Management", "Performance Optimization", "Testing", "API Integration",
            "Accessibility",
        ],
        Role::Backend => &[
            "API Design", "Database", "System Design", "Security", "Caching",
            "Message Queues", "Authentication", "Microservices",
        ],
        Role::Fullstack => &[
            "Full-stack Architecture", "Database Design", "Frontend Frameworks",
            "Backend Frameworks", "DevOps Basics", "API Design", "Security",
        ],
        Role::Data => &[
            "SQL/NoSQL", "Data Pipelines", "Machine Learning", "Data Visualization",
            "Statistics", "Big Data", "ETL Processes",
        ],
        Role::Qa => &[
            "Test Strategies", "Automation", "Bug Tracking", "Performance Testing",
            "API Testing", "CI/CD", "Test Coverage",
        ],
        Role::Ba => &[
            "Requirements Gathering", "Stakeholder Management", "Documentation",
            "Process Modeling", "User Stories", "Agile/Scrum",
        ],
        Role::Devops => &[
            "CI/CD", "Cloud Services", "Container/Docker", "Kubernetes", "Monitoring",
            "Infrastructure as Code", "Security",
        ],
        Role::Mobile => &[
            "iOS/Android", "React Native/Flutter", "Mobile UX", "App Performance",
            "Push Notifications", "Offline Storage", "App Security",
        ],
        Role::Marketing => &[
            "Digital Marketing", "SEO/SEM", "Content Marketing", "Social Media",
            "Analytics", "Brand Strategy", "Campaign Management", "Email Marketing",
        ],
        Role::Sales => &[
            "Sales Process", "Lead Generation", "Negotiation", "CRM",
            "Pipeline Management", "Customer Relationship", "Closing Techniques",
            "B2B/B2C Sales",
        ],
        Role::Hr => &[
            "Recruitment", "Employee Relations", "Performance Management",
            "Training & Development", "Labor Law", "Compensation & Benefits",
            "HR Policies", "Talent Management",
        ],
        Role::Finance => &[
            "Financial Analysis", "Budgeting", "Accounting Principles",
            "Financial Reporting", "Tax", "Auditing", "Cash Flow Management",
            "Investment Analysis",
        ],
        Role::Product => &[
            "Product Strategy", "Roadmap Planning", "User Research", "Agile/Scrum",
            "Stakeholder Management", "Metrics & KPIs", "Competitive Analysis",
            "Go-to-Market",
        ],
        Role::Design => &[
            "UI Design", "UX Research", "Prototyping", "Design Systems", "User Testing",
            "Figma/Sketch", "Interaction Design", "Visual Design",
        ],
        Role::Content => &[
            "Content Strategy", "Copywriting", "SEO Writing", "Social Media Content",
            "Video Content", "Editorial Planning", "Brand Voice", "Content Analytics",
        ],
        Role::CustomerService => &[
            "Customer Communication", "Problem Resolution", "CRM Tools",
            "Service Quality", "Complaint Handling", "Customer Retention",
            "Empathy & Patience", "Product Knowledge",
        ],
    }
}

fn level_expectation(level: Level) -> &'static str {
    match level {
        Level::Intern => "basic concepts, willingness to learn, problem-solving approach",
        Level::Junior => "fundamental knowledge, some practical experience, eagerness to grow",
        Level::Mid => "solid experience, independent work capability, good technical depth",
        Level::Senior => "deep expertise, leadership, system design, mentoring ability",
    }
}

const VI_INTERVIEWER_NAMES: [&str; 8] =
    ["Hương", "Lan", "Tuấn", "Hải", "Linh", "Đức", "Mai", "Phong"];
const EN_INTERVIEWER_NAMES: [&str; 8] =
    ["Alex", "Sarah", "Michael", "Emily", "David", "Jessica", "Chris", "Amanda"];

/// Interviewer persona name, stable per session.
fn interviewer_name(session_id: Uuid, language: Language) -> &'static str {
    let names = match language {
        Language::Vi => &VI_INTERVIEWER_NAMES,
        Language::En => &EN_INTERVIEWER_NAMES,
    };
    let sum: u32 = session_id.as_bytes().iter().map(|b| *b as u32).sum();
    names[(sum as usize) % names.len()]
}

fn interviewer_system_prompt(
    session_id: Uuid,
    role: Role,
    level: Level,
    mode: Mode,
    language: Language,
    jd_text: Option<&str>,
) -> String {
    let name = interviewer_name(session_id, language);
    let topics = role_topics(role).join(", ");
    let expectation = level_expectation(level);
    let mode_hint = match mode {
        Mode::Behavioral => "Focus on experience and real situations (STAR method).",
        Mode::Technical => "Focus on technical knowledge and problem-solving.",
        Mode::Mixed => "Combine behavioral and technical questions.",
    };
    let jd_section = jd_text
        .map(|jd| format!("\n## REFERENCE JOB DESCRIPTION\n{jd}\n"))
        .unwrap_or_default();
    let language_rule = match language {
        Language::Vi => "Ask all questions in Vietnamese.",
        Language::En => "Ask all questions in English.",
    };

    format!(
        "You are a professional interviewer with 10+ years of experience hiring \
         {role}s. You are interviewing a {level}-level candidate.\n\
         \n\
         ## PERSONA\n\
         - Name: {name}\n\
         - Style: friendly but professional, creates a comfortable atmosphere\n\
         - Skills: good at probing answers, asks smart follow-ups\n\
         \n\
         ## CRITICAL RULES\n\
         1. ONE QUESTION PER TURN - never ask multiple questions at once\n\
         2. ACKNOWLEDGE - acknowledge the previous answer before asking the next\n\
         3. NATURAL FLOW - the next question should relate to the previous answer\n\
         4. NO LECTURING - do not give answers, do not teach\n\
         5. REALISTIC - ask like a real interviewer, not like a test\n\
         6. {language_rule}\n\
         \n\
         ## EXPECTATIONS FOR {level} LEVEL\n{expectation}\n\
         \n\
         ## TOPICS FOR {role}\n{topics}\n\
         \n\
         ## INTERVIEW MODE: {mode}\n{mode_hint}\n\
         {jd_section}\n\
         ## OUTPUT FORMAT (JSON)\n\
         {{\"question\": \"...\", \"questionType\": \
         \"opening|followup|new_topic|clarification\", \"difficulty\": 1-5, \
         \"focusTags\": [\"tag1\", \"tag2\"]}}"
    )
}

fn evaluator_system_prompt(role: Role, level: Level, language: Language) -> String {
    let language_rule = match language {
        Language::Vi => "Write evidence, suggestions and the improved answer in Vietnamese.",
        Language::En => "Write evidence, suggestions and the improved answer in English.",
    };
    format!(
        "You are an evaluator assessing interview answers for a {role} position at \
         {level} level.\n\
         \n\
         ## SCORING RUBRIC (0-5 each)\n\
         1. RELEVANCE - 5: directly addresses the question; 3: related but misses key \
         points; 1: off-topic.\n\
         2. STRUCTURE - 5: clear and logical, uses STAR or a fitting framework; 3: \
         basic structure; 1: disorganized.\n\
         3. DEPTH - 5: deep insight, real examples, knows trade-offs; 3: generic \
         examples; 1: surface level.\n\
         4. CLARITY - 5: professional and easy to understand; 3: understandable; 1: \
         hard to follow.\n\
         \n\
         ## EXPECTATIONS FOR {level} LEVEL\n{expectation}\n\
         \n\
         ## FEEDBACK GUIDELINES\n\
         - evidence: point out SPECIFIC weaknesses, quote if needed\n\
         - suggestions: ACTIONABLE tips the candidate can apply immediately\n\
         - improved_answer: a CONCISE model answer appropriate for {level} level\n\
         - {language_rule}\n\
         \n\
         ## OUTPUT FORMAT (JSON)\n\
         {{\"scores\": {{\"relevance\": 0-5, \"structure\": 0-5, \"depth\": 0-5, \
         \"clarity\": 0-5, \"overall\": 0-5}}, \"feedback\": {{\"evidence\": [..], \
         \"suggestions\": [..], \"improved_answer\": \"...\"}}}}",
        expectation = level_expectation(level),
    )
}

// --- LLM-backed implementation ---

/// `QuestionGenerator` + `AnswerEvaluator` over an OpenAI-compatible API.
pub struct LlmEngine {
    client: Client<OpenAIConfig>,
    model: String,
}

impl LlmEngine {
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    async fn chat_json(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        temperature: f32,
    ) -> Result<String, CoachError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .temperature(temperature)
            .build()
            .map_err(map_openai_err)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_err)?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| CoachError::Schema("no content in completion".into()))
    }
}

pub(crate) fn map_openai_err(err: OpenAIError) -> CoachError {
    match err {
        OpenAIError::JSONDeserialize(e) => CoachError::Schema(e.to_string()),
        OpenAIError::InvalidArgument(e) => CoachError::Schema(e),
        other => CoachError::Recoverable(other.to_string()),
    }
}

fn system_message(content: String) -> Result<ChatCompletionRequestMessage, CoachError> {
    Ok(ChatCompletionRequestSystemMessageArgs::default()
        .content(content)
        .build()
        .map_err(map_openai_err)?
        .into())
}

fn user_message(content: String) -> Result<ChatCompletionRequestMessage, CoachError> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content)
        .build()
        .map_err(map_openai_err)?
        .into())
}

/// Interviewer turns map to assistant messages, candidate turns to user
/// messages; system transcript entries are not forwarded.
fn transcript_messages(
    tail: &[TranscriptEntry],
) -> Result<Vec<ChatCompletionRequestMessage>, CoachError> {
    let mut messages = Vec::with_capacity(tail.len());
    for entry in tail {
        match entry.role {
            MessageRole::Interviewer => messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(entry.content.clone())
                    .build()
                    .map_err(map_openai_err)?
                    .into(),
            ),
            MessageRole::Candidate => messages.push(user_message(entry.content.clone())?),
            MessageRole::System => {}
        }
    }
    Ok(messages)
}

#[async_trait]
impl QuestionGenerator for LlmEngine {
    async fn start(&self, request: StartRequest) -> Result<InterviewerResponse, CoachError> {
        let system = interviewer_system_prompt(
            request.session_id,
            request.role,
            request.level,
            request.mode,
            request.language,
            request.jd_text.as_deref(),
        );
        let opening = match request.language {
            Language::Vi => {
                "Bắt đầu buổi phỏng vấn với lời chào và câu hỏi mở đầu tự nhiên. \
                 Giới thiệu bản thân ngắn gọn trước."
            }
            Language::En => {
                "Start the interview with a greeting and a natural opening question. \
                 Briefly introduce yourself first."
            }
        };
        let messages = vec![system_message(system)?, user_message(opening.to_string())?];
        let content = self.chat_json(messages, 0.7).await?;
        parse_interviewer(&content)
    }

    async fn next(&self, request: NextRequest) -> Result<InterviewerResponse, CoachError> {
        let system = interviewer_system_prompt(
            request.session_id,
            request.role,
            request.level,
            request.mode,
            request.language,
            None,
        );
        let difficulty_hint = if request.should_increase_difficulty {
            "The candidate answered well, you can increase difficulty."
        } else {
            "Maintain or decrease difficulty."
        };
        let focus = if request.focus_tags.is_empty() {
            "general".to_string()
        } else {
            request.focus_tags.join(", ")
        };
        let user = format!(
            "Candidate's answer: \"{}\"\n\nAssessment: overall {:.1}/5\n{}\n\nFocus \
             tags: {}\nThis is question {}.\n\nAcknowledge the answer and provide the \
             next appropriate question.",
            request.previous_answer,
            request.previous_scores.overall,
            difficulty_hint,
            focus,
            request.question_index + 1,
        );

        let mut messages = vec![system_message(system)?];
        messages.extend(transcript_messages(&request.transcript_tail)?);
        messages.push(user_message(user)?);

        let content = self.chat_json(messages, 0.7).await?;
        parse_interviewer(&content)
    }
}

#[async_trait]
impl AnswerEvaluator for LlmEngine {
    async fn evaluate(&self, request: EvaluateRequest) -> Result<Evaluation, CoachError> {
        let system = evaluator_system_prompt(request.role, request.level, request.language);
        let user = format!(
            "Interview question: \"{}\"\n\nCandidate's answer: \"{}\"\n\nEvaluate in \
             detail using the rubric and provide helpful feedback.",
            request.question, request.answer,
        );
        let messages = vec![system_message(system)?, user_message(user)?];
        let content = self.chat_json(messages, 0.3).await?;
        parse_evaluation(&content)
    }
}

// --- Deterministic implementation for development and tests ---

/// Canned generator/evaluator with predictable output and no external
/// dependency, in the spirit of a scripted interviewer.
pub struct StaticEngine;

#[async_trait]
impl QuestionGenerator for StaticEngine {
    async fn start(&self, request: StartRequest) -> Result<InterviewerResponse, CoachError> {
        Ok(InterviewerResponse {
            question: format!(
                "Hello, I'm {}. To get us started: why did you choose {} work?",
                interviewer_name(request.session_id, request.language),
                request.role,
            ),
            question_type: QuestionType::Opening,
            difficulty: 2.0,
            focus_tags: vec![],
        })
    }

    async fn next(&self, request: NextRequest) -> Result<InterviewerResponse, CoachError> {
        let difficulty = if request.should_increase_difficulty {
            (request.previous_scores.overall + 1.0).min(5.0)
        } else {
            request.previous_scores.overall.max(1.0)
        };
        Ok(InterviewerResponse {
            question: format!(
                "Thanks for that. Question {}: tell me more about {}.",
                request.question_index + 1,
                role_topics(request.role)[request.question_index as usize
                    % role_topics(request.role).len()],
            ),
            question_type: QuestionType::Followup,
            difficulty,
            focus_tags: request.focus_tags,
        })
    }
}

#[async_trait]
impl AnswerEvaluator for StaticEngine {
    async fn evaluate(&self, request: EvaluateRequest) -> Result<Evaluation, CoachError> {
        // Longer answers score a little higher, bounded by the rubric.
        let base = 2.0 + (request.answer.split_whitespace().count() as f32 / 40.0).min(3.0);
        let scores = Scores {
            relevance: base,
            structure: base,
            depth: (base - 0.5).max(0.0),
            clarity: base,
            overall: 0.0,
        };
        let overall = scores.mean();
        Ok(Evaluation {
            scores: Scores { overall, ..scores },
            feedback: Feedback {
                evidence: vec!["Scripted evaluation.".into()],
                suggestions: vec!["Add a concrete example.".into()],
                improved_answer: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interviewer_payload_round_trip() {
        let content = r#"{
            "question": "Tell me about yourself.",
            "questionType": "opening",
            "difficulty": 2,
            "focusTags": ["communication"]
        }"#;
        let parsed = parse_interviewer(content).unwrap();
        assert_eq!(parsed.question, "Tell me about yourself.");
        assert_eq!(parsed.question_type, QuestionType::Opening);
        assert_eq!(parsed.focus_tags, vec!["communication"]);
    }

    #[test]
    fn interviewer_payload_rejects_out_of_range_difficulty() {
        let content = r#"{"question": "Q?", "difficulty": 9}"#;
        assert!(matches!(
            parse_interviewer(content),
            Err(CoachError::Schema(_))
        ));
    }

    #[test]
    fn interviewer_payload_rejects_empty_question() {
        let content = r#"{"question": "  ", "difficulty": 3}"#;
        assert!(matches!(
            parse_interviewer(content),
            Err(CoachError::Schema(_))
        ));
    }

    #[test]
    fn evaluation_uses_evaluator_overall_when_present() {
        let content = r#"{
            "scores": {"relevance": 4, "structure": 3, "depth": 3, "clarity": 4, "overall": 3.9},
            "feedback": {"evidence": ["e"], "suggestions": ["s"], "improved_answer": "better"}
        }"#;
        let eval = parse_evaluation(content).unwrap();
        assert!((eval.scores.overall - 3.9).abs() < f32::EPSILON);
        assert_eq!(eval.feedback.improved_answer.as_deref(), Some("better"));
    }

    #[test]
    fn evaluation_falls_back_to_mean_overall() {
        let content = r#"{
            "scores": {"relevance": 4, "structure": 2, "depth": 3, "clarity": 3}
        }"#;
        let eval = parse_evaluation(content).unwrap();
        assert!((eval.scores.overall - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn evaluation_rejects_out_of_range_scores() {
        let content = r#"{
            "scores": {"relevance": 6, "structure": 2, "depth": 3, "clarity": 3}
        }"#;
        assert!(matches!(
            parse_evaluation(content),
            Err(CoachError::Schema(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_schema_error() {
        assert!(matches!(
            parse_interviewer("not json"),
            Err(CoachError::Schema(_))
        ));
    }

    #[test]
    fn interviewer_name_is_stable_per_session() {
        let id = Uuid::new_v4();
        let first = interviewer_name(id, Language::En);
        assert_eq!(first, interviewer_name(id, Language::En));
        assert!(EN_INTERVIEWER_NAMES.contains(&first));
    }

    #[test]
    fn system_prompt_mentions_role_topics_and_jd() {
        let prompt = interviewer_system_prompt(
            Uuid::new_v4(),
            Role::Backend,
            Level::Senior,
            Mode::Technical,
            Language::En,
            Some("Own the payments platform"),
        );
        assert!(prompt.contains("API Design"));
        assert!(prompt.contains("Own the payments platform"));
        assert!(prompt.contains("senior"));
    }

    #[tokio::test]
    async fn static_engine_is_deterministic() {
        let request = StartRequest {
            session_id: Uuid::new_v4(),
            role: Role::Backend,
            level: Level::Junior,
            mode: Mode::Mixed,
            language: Language::En,
            jd_text: None,
        };
        let a = StaticEngine.start(request.clone()).await.unwrap();
        let b = StaticEngine.start(request).await.unwrap();
        assert_eq!(a.question, b.question);
        assert_eq!(a.question_type, QuestionType::Opening);
    }
}
