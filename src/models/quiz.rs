use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Labels every question is expected to carry, in display order.
pub const OPTION_LABELS: [&str; 4] = ["a", "b", "c", "d"];
pub const OPTION_COUNT: usize = OPTION_LABELS.len();

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionError {
    #[error("expected {expected} options, found {found}")]
    OptionCount { expected: usize, found: usize },

    #[error("unknown option label '{0}'")]
    UnknownLabel(String),

    #[error("correct_answer '{0}' is not one of the option labels")]
    CorrectAnswerNotAnOption(String),

    #[error("{0} must not be empty")]
    Blank(&'static str),
}

/// A multiple-choice question as it travels over the wire.
///
/// Deserialization goes through [`QuizQuestion::new`], so a value of this
/// type always satisfies the structural invariants: exactly
/// [`OPTION_COUNT`] options labelled `a`..`d`, non-blank texts and a
/// `correct_answer` that names one of the options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "WireQuestion")]
pub struct QuizQuestion {
    pub question: String,
    pub options: BTreeMap<String, String>,
    #[schema(example = "a")]
    pub correct_answer: String,
    pub explanation: String,
}

#[derive(Deserialize)]
struct WireQuestion {
    question: String,
    options: BTreeMap<String, String>,
    correct_answer: String,
    explanation: String,
}

impl TryFrom<WireQuestion> for QuizQuestion {
    type Error = QuestionError;

    fn try_from(w: WireQuestion) -> Result<Self, Self::Error> {
        QuizQuestion::new(w.question, w.options, w.correct_answer, w.explanation)
    }
}

impl QuizQuestion {
    pub fn new(
        question: impl Into<String>,
        options: BTreeMap<String, String>,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let options = options
            .into_iter()
            .map(|(label, text)| (label.trim().to_ascii_lowercase(), text.trim().to_string()))
            .collect();
        let q = Self {
            question: question.into().trim().to_string(),
            options,
            correct_answer: correct_answer.into().trim().to_ascii_lowercase(),
            explanation: explanation.into().trim().to_string(),
        };
        q.check()?;
        Ok(q)
    }

    pub fn check(&self) -> Result<(), QuestionError> {
        if self.question.trim().is_empty() {
            return Err(QuestionError::Blank("question"));
        }
        if self.explanation.trim().is_empty() {
            return Err(QuestionError::Blank("explanation"));
        }
        if self.options.len() != OPTION_COUNT {
            return Err(QuestionError::OptionCount {
                expected: OPTION_COUNT,
                found: self.options.len(),
            });
        }
        for (label, text) in &self.options {
            if !OPTION_LABELS.contains(&label.as_str()) {
                return Err(QuestionError::UnknownLabel(label.clone()));
            }
            if text.trim().is_empty() {
                return Err(QuestionError::Blank("option text"));
            }
        }
        if !self.options.contains_key(&self.correct_answer) {
            return Err(QuestionError::CorrectAnswerNotAnOption(
                self.correct_answer.clone(),
            ));
        }
        Ok(())
    }

    pub fn correct_option_text(&self) -> &str {
        self.options
            .get(&self.correct_answer)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Compares a chosen label against the answer key, ignoring case.
    pub fn is_correct(&self, label: &str) -> bool {
        label.trim().eq_ignore_ascii_case(&self.correct_answer)
    }

    /// Options in label order.
    pub fn labelled_options(&self) -> impl Iterator<Item = (&str, &str)> {
        OPTION_LABELS
            .iter()
            .filter_map(|label| self.options.get(*label).map(|text| (*label, text.as_str())))
    }
}

/// Flat record the model is asked to emit for each question.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedQuestion {
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedQuiz {
    pub questions: Vec<GeneratedQuestion>,
}

impl TryFrom<GeneratedQuestion> for QuizQuestion {
    type Error = QuestionError;

    fn try_from(g: GeneratedQuestion) -> Result<Self, Self::Error> {
        let options = OPTION_LABELS
            .iter()
            .map(|l| l.to_string())
            .zip([g.option_a, g.option_b, g.option_c, g.option_d])
            .collect();
        QuizQuestion::new(g.question, options, g.correct_answer, g.explanation)
    }
}

impl GeneratedQuiz {
    pub const SCHEMA_NAME: &'static str = "quiz_questions";

    /// JSON schema handed to the provider's structured-output mode.
    pub fn json_schema() -> JsonValue {
        let text = serde_json::json!({ "type": "string" });
        serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["questions"],
            "properties": {
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": [
                            "question", "option_a", "option_b", "option_c",
                            "option_d", "correct_answer", "explanation"
                        ],
                        "properties": {
                            "question": text,
                            "option_a": text,
                            "option_b": text,
                            "option_c": text,
                            "option_d": text,
                            "correct_answer": { "type": "string", "enum": OPTION_LABELS },
                            "explanation": text
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn four() -> BTreeMap<String, String> {
        options(&[("a", "Paris"), ("b", "London"), ("c", "Berlin"), ("d", "Madrid")])
    }

    #[test]
    fn accepts_well_formed_question() {
        let q = QuizQuestion::new(" Capital of France? ", four(), "A", "Paris is.").unwrap();
        assert_eq!(q.question, "Capital of France?");
        assert_eq!(q.correct_answer, "a");
        assert_eq!(q.correct_option_text(), "Paris");
        assert!(q.is_correct("A"));
        assert!(!q.is_correct("b"));
    }

    #[test]
    fn rejects_correct_answer_outside_options() {
        let err = QuizQuestion::new("Q?", four(), "e", "x").unwrap_err();
        assert_eq!(err, QuestionError::CorrectAnswerNotAnOption("e".into()));
    }

    #[test]
    fn rejects_wrong_option_count() {
        let three = options(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let err = QuizQuestion::new("Q?", three, "a", "x").unwrap_err();
        assert_eq!(
            err,
            QuestionError::OptionCount {
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_unknown_labels_and_blank_text() {
        let odd = options(&[("a", "1"), ("b", "2"), ("c", "3"), ("z", "4")]);
        assert_eq!(
            QuizQuestion::new("Q?", odd, "a", "x").unwrap_err(),
            QuestionError::UnknownLabel("z".into())
        );
        let blank = options(&[("a", "1"), ("b", "  "), ("c", "3"), ("d", "4")]);
        assert_eq!(
            QuizQuestion::new("Q?", blank, "a", "x").unwrap_err(),
            QuestionError::Blank("option text")
        );
        assert_eq!(
            QuizQuestion::new("  ", four(), "a", "x").unwrap_err(),
            QuestionError::Blank("question")
        );
    }

    #[test]
    fn wire_shape_matches_api_contract() {
        let q = QuizQuestion::new("Q?", four(), "c", "Because.").unwrap();
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(
            value,
            json!({
                "question": "Q?",
                "options": {"a": "Paris", "b": "London", "c": "Berlin", "d": "Madrid"},
                "correct_answer": "c",
                "explanation": "Because."
            })
        );
    }

    #[test]
    fn deserialization_fails_closed() {
        let bad = json!({
            "question": "Q?",
            "options": {"a": "1", "b": "2", "c": "3", "d": "4"},
            "correct_answer": "x",
            "explanation": "e"
        });
        assert!(serde_json::from_value::<QuizQuestion>(bad).is_err());
    }

    #[test]
    fn generated_record_converts_to_question() {
        let raw = json!({
            "questions": [{
                "question": "What is the capital of France?",
                "option_a": "Paris",
                "option_b": "London",
                "option_c": "Berlin",
                "option_d": "Madrid",
                "correct_answer": "a",
                "explanation": "Paris is the capital of France."
            }]
        });
        let quiz: GeneratedQuiz = serde_json::from_value(raw).unwrap();
        let q = QuizQuestion::try_from(quiz.questions[0].clone()).unwrap();
        assert_eq!(q.options.len(), OPTION_COUNT);
        assert_eq!(q.correct_option_text(), "Paris");
        let labels: Vec<&str> = q.labelled_options().map(|(l, _)| l).collect();
        assert_eq!(labels, OPTION_LABELS);
    }

    #[test]
    fn generated_record_rejects_extra_fields() {
        let raw = json!({
            "questions": [{
                "question": "Q?",
                "option_a": "1", "option_b": "2", "option_c": "3", "option_d": "4",
                "option_e": "5",
                "correct_answer": "a",
                "explanation": "e"
            }]
        });
        assert!(serde_json::from_value::<GeneratedQuiz>(raw).is_err());
    }
}
