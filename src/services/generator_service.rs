use std::collections::BTreeMap;
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::config::QuizSettings;
use crate::error::{Error, Result};
use crate::models::quiz::{GeneratedQuiz, QuizQuestion, OPTION_LABELS};
use crate::services::llm_service::{LanguageModel, StructuredPrompt};

const SYSTEM_PROMPT: &str = r#"You are an expert educational quiz generator specializing in high-quality, university-level multiple-choice questions for higher education students.

For every question:
1. Identify key concepts, theories, models or methodologies behind the learning objective that require critical thinking, application or synthesis rather than simple recall.
2. Write one specific, challenging question with four answer options (option_a, option_b, option_c, option_d), exactly one of them correct, the others plausible distractors.
3. Check that the question is directly relevant to the learning objective, avoids generic content, and meets university-level standards.
4. Write a brief explanation of why the correct answer is right, referencing the relevant concepts or theories.

Rules:
- Generate exactly the requested number of questions.
- correct_answer must be exactly one of: a, b, c, d (lowercase).
- Avoid "All of the above" or "None of the above" options.
- Do NOT include your reasoning process in the output.
- Ensure every answer is factually correct and can be verified by academic sources.
- Write in clear, professional English."#;

/// Turns a learning objective into a set of multiple-choice questions.
#[derive(Clone)]
pub struct QuizGenerator {
    llm: Arc<dyn LanguageModel>,
    model: String,
    settings: QuizSettings,
}

impl QuizGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, model: String, settings: QuizSettings) -> Self {
        Self {
            llm,
            model,
            settings,
        }
    }

    pub async fn generate(
        &self,
        learning_objective: &str,
        num_questions: usize,
    ) -> Result<Vec<QuizQuestion>> {
        let objective = learning_objective.trim();
        if objective.is_empty() {
            return Err(Error::BadRequest("Learning objective is required".to_string()));
        }
        if !self.settings.contains(num_questions) {
            return Err(Error::OutOfRange {
                requested: num_questions as i64,
                min: self.settings.min_num_questions,
                max: self.settings.max_num_questions,
            });
        }

        tracing::info!("Generating quiz: {} questions on '{}'", num_questions, objective);
        let prompt = StructuredPrompt {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            user: format!(
                "Generate {} questions for the learning objective: '{}'.",
                num_questions, objective
            ),
            schema_name: GeneratedQuiz::SCHEMA_NAME,
            schema: GeneratedQuiz::json_schema(),
            temperature: 0.7,
        };

        let raw = self
            .llm
            .complete_json(prompt)
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        let generated: GeneratedQuiz = serde_json::from_value(raw).map_err(|e| {
            Error::Generation(format!("model output did not match the quiz schema: {}", e))
        })?;

        let mut questions = generated
            .questions
            .into_iter()
            .enumerate()
            .map(|(idx, g)| {
                QuizQuestion::try_from(g)
                    .map_err(|e| Error::Generation(format!("question {} is invalid: {}", idx + 1, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        if questions.len() < num_questions {
            return Err(Error::Generation(format!(
                "model returned {} questions, {} were requested",
                questions.len(),
                num_questions
            )));
        }
        if questions.len() > num_questions {
            tracing::warn!(
                "Model returned {} questions, truncating to {}",
                questions.len(),
                num_questions
            );
            questions.truncate(num_questions);
        }

        if self.settings.shuffle_options {
            let mut rng = rand::thread_rng();
            questions = questions
                .into_iter()
                .map(|q| shuffle_options(q, &mut rng))
                .collect();
        }

        tracing::info!("Finalized {} questions.", questions.len());
        Ok(questions)
    }
}

/// Reassigns option texts to random labels and moves the answer key with
/// its text.
pub fn shuffle_options(question: QuizQuestion, rng: &mut impl rand::Rng) -> QuizQuestion {
    let correct_text = question.correct_option_text().to_string();
    let mut texts: Vec<String> = question
        .labelled_options()
        .map(|(_, text)| text.to_string())
        .collect();
    texts.shuffle(rng);

    let correct_idx = texts.iter().position(|t| *t == correct_text).unwrap_or(0);
    let options: BTreeMap<String, String> = OPTION_LABELS
        .iter()
        .map(|l| l.to_string())
        .zip(texts)
        .collect();

    QuizQuestion {
        question: question.question,
        options,
        correct_answer: OPTION_LABELS[correct_idx].to_string(),
        explanation: question.explanation,
    }
}
