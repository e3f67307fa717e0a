use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};

use crate::{
    dto::quiz_dto::{QuizRequest, QuizResponse},
    error::{ApiError, Error},
    AppState,
};

#[utoipa::path(
    post,
    path = "/generate-quiz",
    request_body = QuizRequest,
    responses(
        (status = 200, description = "Quiz generated", body = QuizResponse),
        (status = 400, description = "Missing objective, bad types or out-of-range count", body = crate::dto::quiz_dto::ErrorBody),
        (status = 502, description = "Language model provider failed", body = crate::dto::quiz_dto::ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn generate_quiz(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QuizRequest>, JsonRejection>,
) -> std::result::Result<Json<QuizResponse>, ApiError> {
    let verbose = state.config.debug_mode;
    let fail = |e: Error| ApiError::new(e, verbose);

    let Json(request) = payload.map_err(|rejection| fail(Error::BadRequest(rejection.body_text())))?;
    let plan = request.into_plan(&state.config.quiz).map_err(fail)?;

    tracing::info!(
        num_questions = plan.num_questions,
        validate = plan.validate_answers,
        "Received quiz generation request"
    );
    let response = state.quiz_service.create_quiz(plan).await.map_err(fail)?;
    Ok(Json(response))
}
