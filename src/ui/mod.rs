pub mod render;
pub mod session;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::QuizSettings;
use crate::dto::quiz_dto::{QuizPlan, QuizRequest, QuizResponse};
use crate::error::{Error, Result};
use crate::utils::{time, token};

pub const QUIZ_ID_LEN: usize = 8;

pub const SUBJECT_AREAS: [&str; 20] = [
    "General",
    "Biology",
    "Chemistry",
    "Physics",
    "Mathematics",
    "Computer Science",
    "History",
    "Literature",
    "Economics",
    "Psychology",
    "Philosophy",
    "Engineering",
    "Business",
    "Art & Design",
    "Medicine",
    "Law",
    "Environmental Science",
    "Sociology",
    "Political Science",
    "Linguistics",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Teacher,
    Student,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Teacher => "teacher",
            Mode::Student => "student",
        }
    }
}

/// Prefixes the objective with its subject for extra model context.
/// "General" and unknown subjects leave the objective untouched.
pub fn compose_objective(subject_area: &str, objective: &str) -> String {
    let objective = objective.trim();
    let subject = subject_area.trim();
    if subject.is_empty() || subject == "General" || !SUBJECT_AREAS.contains(&subject) {
        return objective.to_string();
    }
    format!("[{}] {}", subject, objective)
}

/// Fields posted by the generation form. Everything arrives as text, so the
/// count is parsed here rather than by the form extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizForm {
    #[serde(default)]
    pub learning_objective: String,
    #[serde(default)]
    pub num_questions: String,
    /// Checkbox; present only when ticked.
    #[serde(default)]
    pub validate: Option<String>,
    #[serde(default)]
    pub subject_area: String,
    #[serde(default)]
    pub mode: Mode,
}

impl QuizForm {
    pub fn into_plan(self, settings: &QuizSettings) -> Result<QuizPlan> {
        let count = self.num_questions.trim();
        let num_questions = if count.is_empty() {
            None
        } else {
            Some(count.parse::<i64>().map_err(|_| {
                Error::BadRequest("Number of questions must be a whole number".to_string())
            })?)
        };
        let validate_answers = self
            .validate
            .as_deref()
            .is_some_and(|v| matches!(v, "on" | "true" | "1"));

        QuizRequest {
            learning_objective: compose_objective(&self.subject_area, &self.learning_objective),
            num_questions,
            validate_answers,
        }
        .into_plan(settings)
    }
}

/// A generated quiz as the UI shows it. Serialized into the student form so
/// grading needs no server-side storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyQuiz {
    pub id: String,
    pub objective: String,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub response: QuizResponse,
}

impl ReadyQuiz {
    pub fn new(objective: String, response: QuizResponse) -> Self {
        Self {
            id: token::generate_quiz_id(QUIZ_ID_LEN),
            objective,
            generated_at: time::now(),
            response,
        }
    }
}

/// A failed attempt: the message shown above the form and the status the
/// page is served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    pub message: String,
    pub status: StatusCode,
}

/// Where the page is in its lifecycle. Answering a question is tracked by
/// [`session::StudentSession`] once a quiz is ready.
#[derive(Debug, Clone, PartialEq)]
pub enum UiPhase {
    Idle { error: Option<UiError> },
    Generating { plan: QuizPlan },
    Ready(ReadyQuiz),
}

impl Default for UiPhase {
    fn default() -> Self {
        UiPhase::Idle { error: None }
    }
}

impl UiPhase {
    pub fn failed(message: impl Into<String>, status: StatusCode) -> Self {
        UiPhase::Idle {
            error: Some(UiError {
                message: message.into(),
                status,
            }),
        }
    }

    /// Idle → Generating once the form checks out, Idle with a message
    /// otherwise.
    pub fn start(form: QuizForm, settings: &QuizSettings) -> Self {
        match form.into_plan(settings) {
            Ok(plan) => UiPhase::Generating { plan },
            Err(e) => UiPhase::failed(format!("Error: {}", e.public_message(false)), e.status()),
        }
    }

    /// Generating → Ready or back to Idle. Other phases are left as they are.
    pub fn complete(self, outcome: Result<QuizResponse>, verbose: bool) -> Self {
        let UiPhase::Generating { plan } = self else {
            return self;
        };
        match outcome {
            Ok(response) if response.questions.is_empty() => UiPhase::failed(
                "No questions were generated. Please try a different learning objective.",
                StatusCode::BAD_GATEWAY,
            ),
            Ok(response) => UiPhase::Ready(ReadyQuiz::new(plan.learning_objective, response)),
            Err(e) => UiPhase::failed(
                format!("Error generating quiz: {}", e.public_message(verbose)),
                e.status(),
            ),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UiPhase::Idle { error: Some(e) } => e.status,
            _ => StatusCode::OK,
        }
    }

    pub fn plan(&self) -> Option<&QuizPlan> {
        match self {
            UiPhase::Generating { plan } => Some(plan),
            _ => None,
        }
    }
}
