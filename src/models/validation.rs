use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Confirmed,
    Contradicted,
    Inconclusive,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Confirmed => "confirmed",
            Verdict::Contradicted => "contradicted",
            Verdict::Inconclusive => "inconclusive",
        }
    }
}

/// Outcome of cross-checking one question's answer against search evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationResult {
    /// Position of the validated question in the response's `questions`.
    pub question_index: usize,
    pub verdict: Verdict,
    pub snippets: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ValidationResult {
    pub fn inconclusive(question_index: usize, explanation: impl Into<String>) -> Self {
        Self {
            question_index,
            verdict: Verdict::Inconclusive,
            snippets: vec![],
            sources: vec![],
            explanation: explanation.into(),
            confidence: None,
        }
    }
}

/// What the judgment model returns about one claim.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Judgment {
    pub verdict: Verdict,
    pub explanation: String,
    pub confidence: f32,
    /// Zero-based indexes into the evidence list the verdict relies on.
    pub supporting_snippets: Vec<usize>,
}

impl Judgment {
    pub const SCHEMA_NAME: &'static str = "answer_judgment";

    pub fn json_schema() -> JsonValue {
        serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["verdict", "explanation", "confidence", "supporting_snippets"],
            "properties": {
                "verdict": {
                    "type": "string",
                    "enum": ["confirmed", "contradicted", "inconclusive"]
                },
                "explanation": { "type": "string" },
                "confidence": { "type": "number" },
                "supporting_snippets": {
                    "type": "array",
                    "items": { "type": "integer" }
                }
            }
        })
    }
}
