use axum::extract::State;

use crate::api::v1::dto::RefreshResponse;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;

/// `POST /api/v1/admin/refresh`
///
/// Forces a mirror sync and a full index rebuild.
#[utoipa::path(
    post,
    path = "/api/v1/admin/refresh",
    tag = "admin",
    operation_id = "admin.refresh",
    responses(
        (status = 200, description = "Refresh completed", body = RefreshResponse),
        (status = 401, description = "Missing or invalid password", body = crate::api::v1::response::ApiError),
    )
)]
pub async fn run_refresh(State(state): State<AppState>) -> ApiResponse<RefreshResponse> {
    match state.indexer.refresh(true).await {
        Ok(summary) => ApiResponse::success(summary.into()),
        Err(e) => e.into(),
    }
}
