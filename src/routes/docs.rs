use axum::Json;
use utoipa::OpenApi;

use crate::dto::quiz_dto::{ErrorBody, QuizRequest, QuizResponse};
use crate::models::quiz::QuizQuestion;
use crate::models::validation::{ValidationResult, Verdict};

#[derive(OpenApi)]
#[openapi(
    paths(super::health::health, super::quiz::generate_quiz),
    components(schemas(QuizRequest, QuizResponse, QuizQuestion, ValidationResult, Verdict, ErrorBody)),
    tags((name = "quiz", description = "Multiple-choice quiz generation"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
