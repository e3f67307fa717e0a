use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;

use crate::{
    ui::{
        render,
        session::StudentSession,
        Mode, QuizForm, ReadyQuiz, UiPhase,
    },
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct UiQuery {
    #[serde(default)]
    pub mode: Mode,
}

pub async fn root() -> Redirect {
    Redirect::to("/ui")
}

#[axum::debug_handler]
pub async fn index(State(state): State<AppState>, Query(query): Query<UiQuery>) -> Html<String> {
    Html(render::index(query.mode, &state.config.quiz, None))
}

/// Runs the form through Idle → Generating → Ready (or back to Idle) and
/// renders the view for the chosen mode.
#[axum::debug_handler]
pub async fn generate(
    State(state): State<AppState>,
    Form(form): Form<QuizForm>,
) -> (StatusCode, Html<String>) {
    let mode = form.mode;
    let phase = UiPhase::start(form, &state.config.quiz);

    let phase = match phase.plan().cloned() {
        Some(plan) => {
            let outcome = state.quiz_service.create_quiz(plan).await;
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, "Quiz generation from the UI failed");
            }
            phase.complete(outcome, state.config.debug_mode)
        }
        None => phase,
    };

    if let UiPhase::Ready(quiz) = &phase {
        tracing::info!(quiz_id = %quiz.id, mode = mode.as_str(), "Quiz ready");
    }
    (phase.status(), Html(render::phase(&phase, mode, &state.config.quiz)))
}

/// Grades a submitted student quiz. The quiz itself comes back in the hidden
/// `quiz` field, answers in `q0`, `q1`, ...
#[axum::debug_handler]
pub async fn results(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    let quiz = fields
        .get("quiz")
        .and_then(|raw| serde_json::from_str::<ReadyQuiz>(raw).ok());

    let Some(quiz) = quiz else {
        return (
            StatusCode::BAD_REQUEST,
            Html(render::index(
                Mode::Student,
                &state.config.quiz,
                Some("No active quiz. Please generate a quiz first."),
            )),
        );
    };

    let session = StudentSession::from_form(quiz.response.questions.clone(), &fields);
    let card = session.scorecard();
    tracing::info!(quiz_id = %quiz.id, correct = card.correct, total = card.total, "Quiz graded");
    (StatusCode::OK, Html(render::results_view(&quiz, &session)))
}
