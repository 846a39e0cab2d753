use axum::extract::State;

use crate::api::v1::dto::{AskRequest, AskResponse};
use crate::api::v1::response::{ApiResponse, ErrorCode};
use crate::api::AppState;

/// `POST /api/v1/ask`
///
/// Routes the question through the fast-path cascade and the
/// retrieval-augmented fallback, returning the answer plus the full
/// conversation history.
#[utoipa::path(
    post,
    path = "/api/v1/ask",
    tag = "ask",
    operation_id = "ask.question",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer produced", body = AskResponse),
        (status = 400, description = "Invalid request", body = crate::api::v1::response::ApiError),
    )
)]
pub async fn ask(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<AskRequest>,
) -> ApiResponse<AskResponse> {
    let question = req.question.trim();
    if question.is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Question cannot be empty");
    }

    let answer = state.router.route(question).await;

    ApiResponse::success(AskResponse {
        answer,
        history: state.conversation.history(),
    })
}
