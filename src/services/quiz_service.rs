use std::sync::Arc;

use crate::config::Config;
use crate::dto::quiz_dto::{QuizPlan, QuizResponse};
use crate::error::Result;
use crate::services::generator_service::QuizGenerator;
use crate::services::llm_service::LanguageModel;
use crate::services::search_service::SearchProvider;
use crate::services::verification_service::AnswerValidator;

/// Generation followed by optional answer validation; shared by the JSON API
/// and the browser UI.
#[derive(Clone)]
pub struct QuizService {
    generator: QuizGenerator,
    validator: AnswerValidator,
}

impl QuizService {
    pub fn new(generator: QuizGenerator, validator: AnswerValidator) -> Self {
        Self {
            generator,
            validator,
        }
    }

    pub fn from_config(
        config: &Config,
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        let generator = QuizGenerator::new(
            llm.clone(),
            config.openai.model.clone(),
            config.quiz.clone(),
        );
        let validator = AnswerValidator::new(
            llm,
            search,
            config.openai.validator_model.clone(),
            config.search.max_snippets,
            config.debug_mode,
        );
        Self::new(generator, validator)
    }

    pub async fn create_quiz(&self, plan: QuizPlan) -> Result<QuizResponse> {
        let questions = self
            .generator
            .generate(&plan.learning_objective, plan.num_questions)
            .await?;

        let validations = if plan.validate_answers {
            Some(self.validator.validate_all(&questions).await)
        } else {
            None
        };

        Ok(QuizResponse {
            questions,
            validations,
        })
    }
}
