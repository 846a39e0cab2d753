use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::v1::response::ApiResponse;
use crate::api::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub llm_available: bool,
    pub index_ready: bool,
    pub documents: usize,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    operation_id = "health.check",
    responses(
        (status = 200, description = "Service is alive", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let snapshot = state.index.current();
    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        llm_available: state.llm.is_available(),
        index_ready: snapshot.is_some(),
        documents: state.mirror.list_paths().len(),
    })
}
