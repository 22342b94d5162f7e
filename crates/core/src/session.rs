//! Interview session data model.
//!
//! A `Session` is one interview attempt from setup to completion or
//! abandonment. It owns an append-only transcript of `Message`s and one
//! scored `Answer` per question index. All mutation goes through the
//! orchestrator; these types only encode the shape and the status lattice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoachError;

/// Maximum length of a job-description text after sanitization.
pub const MAX_JD_LEN: usize = 10_000;
/// Upper bound on the number of questions in one session.
pub const MAX_QUESTIONS: u32 = 50;
/// Default per-question time limit in seconds.
pub const DEFAULT_QUESTION_TIME_LIMIT: u32 = 90;

/// Target position the candidate is practicing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Frontend,
    Backend,
    Fullstack,
    Data,
    Qa,
    Ba,
    Devops,
    Mobile,
    Marketing,
    Sales,
    Hr,
    Finance,
    Product,
    Design,
    Content,
    CustomerService,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frontend" => Ok(Role::Frontend),
            "backend" => Ok(Role::Backend),
            "fullstack" => Ok(Role::Fullstack),
            "data" => Ok(Role::Data),
            "qa" => Ok(Role::Qa),
            "ba" => Ok(Role::Ba),
            "devops" => Ok(Role::Devops),
            "mobile" => Ok(Role::Mobile),
            "marketing" => Ok(Role::Marketing),
            "sales" => Ok(Role::Sales),
            "hr" => Ok(Role::Hr),
            "finance" => Ok(Role::Finance),
            "product" => Ok(Role::Product),
            "design" => Ok(Role::Design),
            "content" => Ok(Role::Content),
            "customer_service" => Ok(Role::CustomerService),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Frontend => "frontend",
            Role::Backend => "backend",
            Role::Fullstack => "fullstack",
            Role::Data => "data",
            Role::Qa => "qa",
            Role::Ba => "ba",
            Role::Devops => "devops",
            Role::Mobile => "mobile",
            Role::Marketing => "marketing",
            Role::Sales => "sales",
            Role::Hr => "hr",
            Role::Finance => "finance",
            Role::Product => "product",
            Role::Design => "design",
            Role::Content => "content",
            Role::CustomerService => "customer_service",
        };
        write!(f, "{s}")
    }
}

/// Seniority level being interviewed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Intern,
    Junior,
    Mid,
    Senior,
}

impl FromStr for Level {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intern" => Ok(Level::Intern),
            "junior" => Ok(Level::Junior),
            "mid" => Ok(Level::Mid),
            "senior" => Ok(Level::Senior),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Intern => "intern",
            Level::Junior => "junior",
            Level::Mid => "mid",
            Level::Senior => "senior",
        };
        write!(f, "{s}")
    }
}

/// Question style of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Behavioral,
    Technical,
    Mixed,
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "behavioral" => Ok(Mode::Behavioral),
            "technical" => Ok(Mode::Technical),
            "mixed" => Ok(Mode::Mixed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Behavioral => "behavioral",
            Mode::Technical => "technical",
            Mode::Mixed => "mixed",
        };
        write!(f, "{s}")
    }
}

/// Interview language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Vi,
    En,
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vi" => Ok(Language::Vi),
            "en" => Ok(Language::En),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Language::Vi => "vi",
                Language::En => "en",
            }
        )
    }
}

/// Lifecycle status of a session.
///
/// Only `Setup -> InProgress -> Completed` is a legal forward path;
/// `Abandoned` is reachable from `Setup` or `InProgress` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Setup,
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// Whether transitioning from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Setup, InProgress) | (InProgress, Completed) | (Setup, Abandoned) | (InProgress, Abandoned)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Setup => "setup",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        };
        write!(f, "{s}")
    }
}

/// Raw session parameters as submitted by the caller.
///
/// Fields are kept as strings so validation can report every violated
/// field at once instead of failing on the first bad enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSetup {
    pub role: String,
    pub level: String,
    pub mode: String,
    pub language: String,
    pub total_questions: u32,
    pub jd_text: Option<String>,
}

/// A `SessionSetup` that passed validation, with enums parsed and the
/// job description sanitized.
#[derive(Debug, Clone)]
pub struct ValidSetup {
    pub role: Role,
    pub level: Level,
    pub mode: Mode,
    pub language: Language,
    pub total_questions: u32,
    pub jd_text: Option<String>,
}

impl SessionSetup {
    /// Validates every field, collecting all violations.
    pub fn validate(&self) -> Result<ValidSetup, CoachError> {
        let mut errors = Vec::new();

        let role = Role::from_str(&self.role);
        if role.is_err() {
            errors.push(format!("invalid role: {}", self.role));
        }
        let level = Level::from_str(&self.level);
        if level.is_err() {
            errors.push(format!("invalid level: {}", self.level));
        }
        let mode = Mode::from_str(&self.mode);
        if mode.is_err() {
            errors.push(format!("invalid mode: {}", self.mode));
        }
        let language = Language::from_str(&self.language);
        if language.is_err() {
            errors.push(format!("invalid language: {}", self.language));
        }
        if self.total_questions < 1 || self.total_questions > MAX_QUESTIONS {
            errors.push(format!(
                "total_questions must be between 1 and {MAX_QUESTIONS}"
            ));
        }
        // Length is checked on the raw text in characters, before
        // sanitization shortens it.
        if self.jd_text.as_deref().map_or(0, |s| s.chars().count()) > MAX_JD_LEN {
            errors.push(format!("jd_text too long (max {MAX_JD_LEN} chars)"));
        }
        let jd_text = self.jd_text.as_deref().map(sanitize_text);

        if !errors.is_empty() {
            return Err(CoachError::Validation { errors });
        }

        Ok(ValidSetup {
            role: role.unwrap(),
            level: level.unwrap(),
            mode: mode.unwrap(),
            language: language.unwrap(),
            total_questions: self.total_questions,
            jd_text: jd_text.filter(|s| !s.is_empty()),
        })
    }
}

/// Strips HTML tags and dangerous characters and bounds the length.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            '\'' | '"' => {}
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    let trimmed = out.trim();
    trimmed.chars().take(MAX_JD_LEN).collect()
}

/// One interview attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub owner_id: String,
    pub role: Role,
    pub level: Level,
    pub mode: Mode,
    pub language: Language,
    pub jd_text: Option<String>,
    pub status: SessionStatus,
    pub total_questions: u32,
    /// 0-based index of the question currently awaiting an answer.
    /// Defined only while `status == InProgress`.
    pub current_question_index: Option<u32>,
    pub difficulty_score: f32,
    pub focus_tags: Vec<String>,
    /// Per-question countdown limit in seconds.
    pub question_time_limit: u32,
    /// When the current question was asked. Non-null iff the session is
    /// in progress and a question has been recorded; together with
    /// `question_time_limit` this makes the timer reconstructible.
    pub current_question_started_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh session in `Setup` from a validated setup.
    pub fn new(owner_id: &str, setup: ValidSetup, question_time_limit: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            role: setup.role,
            level: setup.level,
            mode: setup.mode,
            language: setup.language,
            jd_text: setup.jd_text,
            status: SessionStatus::Setup,
            total_questions: setup.total_questions,
            current_question_index: None,
            difficulty_score: 0.0,
            focus_tags: Vec::new(),
            question_time_limit,
            current_question_started_at: None,
            started_at: None,
            ended_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Who produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Interviewer,
    Candidate,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageRole::Interviewer => "interviewer",
            MessageRole::Candidate => "candidate",
            MessageRole::System => "system",
        };
        write!(f, "{s}")
    }
}

/// One turn utterance in the transcript. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// Question this message belongs to; `None` for system messages.
    pub question_index: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        session_id: Uuid,
        role: MessageRole,
        content: impl Into<String>,
        question_index: Option<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            role,
            content: content.into(),
            question_index,
            created_at: Utc::now(),
        }
    }
}

/// Structured rubric scores, each sub-score in `[0, 5]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub relevance: f32,
    pub structure: f32,
    pub depth: f32,
    pub clarity: f32,
    pub overall: f32,
}

impl Scores {
    /// Arithmetic mean of the four sub-scores.
    pub fn mean(&self) -> f32 {
        (self.relevance + self.structure + self.depth + self.clarity) / 4.0
    }

    /// Names of the rubric dimensions scoring below `threshold`, in a
    /// fixed order. Feeds the rolling focus tags.
    pub fn weak_dimensions(&self, threshold: f32) -> Vec<&'static str> {
        let mut weak = Vec::new();
        if self.relevance < threshold {
            weak.push("relevance");
        }
        if self.structure < threshold {
            weak.push("structure");
        }
        if self.depth < threshold {
            weak.push("depth");
        }
        if self.clarity < threshold {
            weak.push("clarity");
        }
        weak
    }

    /// Whether every score is inside the rubric range.
    pub fn in_range(&self) -> bool {
        [
            self.relevance,
            self.structure,
            self.depth,
            self.clarity,
            self.overall,
        ]
        .iter()
        .all(|s| (0.0..=5.0).contains(s))
    }
}

/// Evaluator feedback for one answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub evidence: Vec<String>,
    pub suggestions: Vec<String>,
    pub improved_answer: Option<String>,
}

/// One scored candidate turn. Created once per question index and never
/// mutated afterwards. `question_text` is a snapshot, not a reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_index: u32,
    pub question_text: String,
    pub answer_text: String,
    pub scores: Scores,
    pub feedback: Feedback,
    pub time_taken_seconds: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lattice_allows_only_forward_transitions() {
        use SessionStatus::*;
        let all = [Setup, InProgress, Completed, Abandoned];
        for from in all {
            for to in all {
                let allowed = matches!(
                    (from, to),
                    (Setup, InProgress)
                        | (InProgress, Completed)
                        | (Setup, Abandoned)
                        | (InProgress, Abandoned)
                );
                assert_eq!(
                    from.can_transition_to(to),
                    allowed,
                    "{from} -> {to} should be {allowed}"
                );
            }
        }
    }

    #[test]
    fn validate_reports_all_violations() {
        let setup = SessionSetup {
            role: "astronaut".into(),
            level: "guru".into(),
            mode: "mixed".into(),
            language: "fr".into(),
            total_questions: 0,
            jd_text: None,
        };
        let err = setup.validate().unwrap_err();
        match err {
            CoachError::Validation { errors } => {
                assert_eq!(errors.len(), 4);
                assert!(errors.iter().any(|e| e.contains("role")));
                assert!(errors.iter().any(|e| e.contains("level")));
                assert!(errors.iter().any(|e| e.contains("language")));
                assert!(errors.iter().any(|e| e.contains("total_questions")));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_good_setup_and_sanitizes_jd() {
        let setup = SessionSetup {
            role: "backend".into(),
            level: "junior".into(),
            mode: "mixed".into(),
            language: "vi".into(),
            total_questions: 5,
            jd_text: Some("<b>Build</b> \"great\" APIs".into()),
        };
        let valid = setup.validate().unwrap();
        assert_eq!(valid.role, Role::Backend);
        assert_eq!(valid.level, Level::Junior);
        assert_eq!(valid.jd_text.as_deref(), Some("Build great APIs"));
    }

    #[test]
    fn sanitize_strips_tags_and_bounds_length() {
        assert_eq!(sanitize_text("<script>x</script>hi"), "xhi");
        let long = "a".repeat(MAX_JD_LEN + 500);
        assert_eq!(sanitize_text(&long).len(), MAX_JD_LEN);
    }

    #[test]
    fn jd_length_is_counted_in_characters() {
        // Multibyte text within the character limit must pass even
        // though its byte length is far above it.
        let setup = SessionSetup {
            role: "backend".into(),
            level: "junior".into(),
            mode: "mixed".into(),
            language: "vi".into(),
            total_questions: 5,
            jd_text: Some("ứ".repeat(6_000)),
        };
        let valid = setup.validate().unwrap();
        assert_eq!(valid.jd_text.unwrap().chars().count(), 6_000);

        let over = SessionSetup {
            jd_text: Some("ứ".repeat(MAX_JD_LEN + 1)),
            ..setup
        };
        let err = over.validate().unwrap_err();
        match err {
            CoachError::Validation { errors } => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("jd_text too long"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn scores_mean_and_weak_dimensions() {
        let scores = Scores {
            relevance: 4.0,
            structure: 2.0,
            depth: 2.5,
            clarity: 5.0,
            overall: 3.4,
        };
        assert!((scores.mean() - 3.375).abs() < f32::EPSILON);
        assert_eq!(scores.weak_dimensions(3.0), vec!["structure", "depth"]);
        assert!(scores.in_range());
    }

    #[test]
    fn new_session_starts_in_setup_with_no_question() {
        let setup = SessionSetup {
            role: "frontend".into(),
            level: "mid".into(),
            mode: "technical".into(),
            language: "en".into(),
            total_questions: 10,
            jd_text: None,
        };
        let session = Session::new("user-1", setup.validate().unwrap(), 90);
        assert_eq!(session.status, SessionStatus::Setup);
        assert!(session.current_question_index.is_none());
        assert!(session.current_question_started_at.is_none());
        assert_eq!(session.question_time_limit, 90);
    }
}
