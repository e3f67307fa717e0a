pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod ui;
pub mod utils;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    llm_service::{LanguageModel, OpenAiClient},
    quiz_service::QuizService,
    search_service::{self, SearchProvider},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub quiz_service: QuizService,
}

impl AppState {
    /// Wires the OpenAI client and the configured search backend.
    pub fn new(config: Config) -> Result<Self> {
        let llm = Arc::new(OpenAiClient::new(&config.openai)?);
        let search = search_service::search_provider(&config.search)?;
        Ok(Self::with_providers(config, llm, search))
    }

    pub fn with_providers(
        config: Config,
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        let quiz_service = QuizService::from_config(&config, llm, search);
        Self {
            config: Arc::new(config),
            quiz_service,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = middleware::cors::cors_layer(&state.config.allowed_origins);

    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/generate-quiz", post(routes::quiz::generate_quiz))
        .route("/api-docs/openapi.json", get(routes::docs::openapi_json));

    let ui = Router::new()
        .route("/", get(routes::ui::root))
        .route("/ui", get(routes::ui::index))
        .route("/ui/quiz", post(routes::ui::generate))
        .route("/ui/results", post(routes::ui::results));

    api.merge(ui)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
