use std::sync::Arc;

use url::Url;

use crate::models::quiz::QuizQuestion;
use crate::models::validation::{Judgment, ValidationResult};
use crate::services::llm_service::{LanguageModel, StructuredPrompt};
use crate::services::search_service::{SearchHit, SearchProvider};

const JUDGE_PROMPT: &str = r#"You are a validation agent for educational quiz questions. Decide whether the stated correct answer to a quiz question is factually accurate using ONLY the numbered search results provided. Do not rely on prior knowledge.

- "confirmed": the search results support the stated answer.
- "contradicted": the search results clearly state something incompatible with the answer.
- "inconclusive": the results are unrelated, too thin, or contradictory among themselves.

List in supporting_snippets the numbers of the results your verdict relies on. Give a confidence between 0 and 1 and a brief explanation of your findings based on the search results."#;

const MAX_QUERY_CHARS: usize = 300;

const SEARCH_UNAVAILABLE: &str = "search unavailable";
const NO_RESULTS: &str = "no search results found";
const JUDGMENT_UNAVAILABLE: &str = "judgment unavailable";

/// Why a question could not be judged. `note` is safe to show to clients,
/// `detail` may carry provider output.
#[derive(Debug)]
struct Degraded {
    note: &'static str,
    detail: String,
}

impl Degraded {
    fn new(note: &'static str, detail: impl ToString) -> Self {
        Self {
            note,
            detail: detail.to_string(),
        }
    }
}

/// Cross-checks generated answers against web search evidence.
#[derive(Clone)]
pub struct AnswerValidator {
    llm: Arc<dyn LanguageModel>,
    search: Arc<dyn SearchProvider>,
    model: String,
    max_snippets: usize,
    verbose: bool,
}

impl AnswerValidator {
    /// With `verbose` set, degraded verdicts include the provider error in
    /// their explanation.
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
        model: String,
        max_snippets: usize,
        verbose: bool,
    ) -> Self {
        Self {
            llm,
            search,
            model,
            max_snippets: max_snippets.max(1),
            verbose,
        }
    }

    /// Validates one question. Provider failures never escape: they turn
    /// into an inconclusive verdict.
    pub async fn validate(&self, question_index: usize, question: &QuizQuestion) -> ValidationResult {
        match self.try_validate(question_index, question).await {
            Ok(result) => result,
            Err(Degraded { note, detail }) => {
                tracing::warn!(question_index, reason = note, error = %detail, "Validation degraded to inconclusive");
                let explanation = if self.verbose {
                    format!("Could not validate the answer: {} ({})", note, detail)
                } else {
                    format!("Could not validate the answer: {}.", note)
                };
                ValidationResult::inconclusive(question_index, explanation)
            }
        }
    }

    /// Validates each question in turn, one provider round-trip at a time.
    pub async fn validate_all(&self, questions: &[QuizQuestion]) -> Vec<ValidationResult> {
        tracing::info!("Validating correct answers for {} quiz questions", questions.len());
        let mut results = Vec::with_capacity(questions.len());
        for (idx, question) in questions.iter().enumerate() {
            results.push(self.validate(idx, question).await);
        }
        results
    }

    /// Searches the whole claim first, then only the answer's key terms when
    /// the long query finds nothing.
    async fn gather_evidence(&self, question: &QuizQuestion) -> Result<Vec<SearchHit>, Degraded> {
        let full = search_query(question);
        let mut hits = self
            .search
            .search(&full, self.max_snippets)
            .await
            .map_err(|e| Degraded::new(SEARCH_UNAVAILABLE, e))?;

        if hits.is_empty() {
            let short = key_term_query(question);
            if !short.is_empty() && short != full {
                tracing::debug!("No results for the full claim, retrying with '{}'", short);
                hits = self
                    .search
                    .search(&short, self.max_snippets)
                    .await
                    .map_err(|e| Degraded::new(SEARCH_UNAVAILABLE, e))?;
            }
        }

        if hits.is_empty() {
            return Err(Degraded::new(NO_RESULTS, "search returned no results"));
        }
        hits.truncate(self.max_snippets);
        Ok(hits)
    }

    async fn try_validate(
        &self,
        question_index: usize,
        question: &QuizQuestion,
    ) -> Result<ValidationResult, Degraded> {
        let hits = self.gather_evidence(question).await?;

        let prompt = StructuredPrompt {
            model: self.model.clone(),
            system: JUDGE_PROMPT.to_string(),
            user: claim_with_evidence(question, &hits),
            schema_name: Judgment::SCHEMA_NAME,
            schema: Judgment::json_schema(),
            temperature: 0.0,
        };
        let raw = self
            .llm
            .complete_json(prompt)
            .await
            .map_err(|e| Degraded::new(JUDGMENT_UNAVAILABLE, e))?;
        let judgment: Judgment = serde_json::from_value(raw).map_err(|e| {
            Degraded::new(
                JUDGMENT_UNAVAILABLE,
                format!("judgment did not match schema: {}", e),
            )
        })?;

        let cited = cited_hits(&hits, &judgment.supporting_snippets);
        let evidence: Vec<&SearchHit> = if cited.is_empty() {
            hits.iter().collect()
        } else {
            cited
        };

        Ok(ValidationResult {
            question_index,
            verdict: judgment.verdict,
            snippets: evidence.iter().map(|h| h.snippet.clone()).collect(),
            sources: clean_sources(evidence.iter().map(|h| h.url.as_str())),
            explanation: judgment.explanation.trim().to_string(),
            confidence: Some(judgment.confidence.clamp(0.0, 1.0)),
        })
    }
}

fn search_query(question: &QuizQuestion) -> String {
    let query = format!("{} {}", question.question, question.correct_option_text());
    query.trim().chars().take(MAX_QUERY_CHARS).collect()
}

fn key_term_query(question: &QuizQuestion) -> String {
    question
        .correct_option_text()
        .trim()
        .chars()
        .take(MAX_QUERY_CHARS)
        .collect()
}

fn claim_with_evidence(question: &QuizQuestion, hits: &[SearchHit]) -> String {
    let mut out = format!(
        "Question: '{}'\nCorrect answer: '{}'\nExplanation: {}\n\nSearch results:\n",
        question.question,
        question.correct_option_text(),
        question.explanation
    );
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!("[{}] {} ({})\n{}\n", i, hit.title, hit.url, hit.snippet));
    }
    out
}

/// Hits named by the judgment, in citation order, ignoring bad or repeated
/// indexes.
fn cited_hits<'a>(hits: &'a [SearchHit], indexes: &[usize]) -> Vec<&'a SearchHit> {
    let mut seen = Vec::new();
    for &i in indexes {
        if i < hits.len() && !seen.contains(&i) {
            seen.push(i);
        }
    }
    seen.into_iter().map(|i| &hits[i]).collect()
}

/// Keeps http(s) URLs only, deduplicated.
fn clean_sources<'a>(urls: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in urls {
        let Ok(url) = Url::parse(raw.trim()) else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            continue;
        }
        let s = url.to_string();
        if !out.contains(&s) {
            out.push(s);
        }
    }
    out
}
