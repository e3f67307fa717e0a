use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::config::QuizSettings;
use crate::error::{Error, Result};
use crate::models::quiz::QuizQuestion;
use crate::models::validation::ValidationResult;
use crate::utils::validation::not_blank;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuizRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Learning objective is required"))]
    #[schema(example = "Balance chemical equations using the law of conservation of mass")]
    pub learning_objective: String,

    /// Defaults to the configured `DEFAULT_NUM_QUESTIONS` when omitted.
    #[serde(default)]
    #[schema(example = 3)]
    pub num_questions: Option<i64>,

    /// Cross-check every correct answer against web search.
    #[serde(default, rename = "validate")]
    pub validate_answers: bool,
}

/// A request that passed input checks; safe to hand to the providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPlan {
    pub learning_objective: String,
    pub num_questions: usize,
    pub validate_answers: bool,
}

impl QuizRequest {
    pub fn into_plan(self, settings: &QuizSettings) -> Result<QuizPlan> {
        self.validate()?;

        let requested = self
            .num_questions
            .unwrap_or(settings.default_num_questions as i64);
        let in_bounds = usize::try_from(requested)
            .ok()
            .filter(|n| settings.contains(*n));
        let Some(num_questions) = in_bounds else {
            return Err(Error::OutOfRange {
                requested,
                min: settings.min_num_questions,
                max: settings.max_num_questions,
            });
        };

        Ok(QuizPlan {
            learning_objective: self.learning_objective.trim().to_string(),
            num_questions,
            validate_answers: self.validate_answers,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
    /// Present only when validation was requested; aligned by position with
    /// `questions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Vec<ValidationResult>>,
}

impl QuizResponse {
    pub fn validation_for(&self, question_index: usize) -> Option<&ValidationResult> {
        self.validations
            .as_ref()
            .and_then(|v| v.iter().find(|r| r.question_index == question_index))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}
