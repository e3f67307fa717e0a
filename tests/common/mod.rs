#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use quiz_generator::{
    app,
    config::Config,
    error::{Error, Result},
    models::validation::Judgment,
    services::{
        llm_service::{LanguageModel, StructuredPrompt},
        search_service::{SearchHit, SearchProvider},
    },
    AppState,
};

pub fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("OPENAI_API_KEY".into(), "sk-test".into());
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(move |name| vars.get(name).cloned()).expect("test config")
}

pub fn question_record(i: usize) -> JsonValue {
    json!({
        "question": format!("Which statement about mass in reaction {} is true?", i),
        "option_a": "Mass is created",
        "option_b": "Mass is conserved",
        "option_c": "Mass is destroyed",
        "option_d": "Mass doubles",
        "correct_answer": "b",
        "explanation": "The law of conservation of mass."
    })
}

/// Language model stand-in: answers quiz prompts with `questions` fixed
/// records and judgment prompts with `judgment`.
pub struct StubLlm {
    pub questions: usize,
    pub fail: bool,
    pub judgment: Option<JsonValue>,
    pub calls: AtomicUsize,
}

impl StubLlm {
    pub fn returning(questions: usize) -> Arc<Self> {
        Arc::new(Self {
            questions,
            fail: false,
            judgment: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            questions: 0,
            fail: true,
            judgment: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn judging(questions: usize, judgment: JsonValue) -> Arc<Self> {
        Arc::new(Self {
            questions,
            fail: false,
            judgment: Some(judgment),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for StubLlm {
    async fn complete_json(&self, prompt: StructuredPrompt) -> Result<JsonValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Provider("OpenAI API Error 500: upstream exploded".into()));
        }
        if prompt.schema_name == Judgment::SCHEMA_NAME {
            return self
                .judgment
                .clone()
                .ok_or_else(|| Error::Provider("no judgment configured".into()));
        }
        let questions: Vec<JsonValue> = (1..=self.questions).map(question_record).collect();
        Ok(json!({ "questions": questions }))
    }
}

pub struct StubSearch {
    pub hits: Option<Vec<SearchHit>>,
    pub calls: AtomicUsize,
}

impl StubSearch {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            hits: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with_hits(hits: Vec<SearchHit>) -> Arc<Self> {
        Arc::new(Self {
            hits: Some(hits),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hits
            .clone()
            .ok_or_else(|| Error::Provider("Search API Error 503".into()))
    }
}

pub fn router(config: Config, llm: Arc<StubLlm>, search: Arc<StubSearch>) -> Router {
    app(AppState::with_providers(config, llm, search))
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.oneshot(req).await.expect("router responds");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    (status, bytes.to_vec())
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, req).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, json)
}

pub async fn post_form(app: Router, uri: &str, body: String) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let (status, bytes) = send(app, req).await;
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}
