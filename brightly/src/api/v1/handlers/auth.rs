use axum::extract::State;

use crate::api::v1::dto::{
    ChangePasswordRequest, ChangePasswordResponse, PasswordCheckRequest, PasswordCheckResponse,
};
use crate::api::v1::response::{ApiResponse, ErrorCode};
use crate::api::AppState;

/// `POST /api/v1/auth/check`
#[utoipa::path(
    post,
    path = "/api/v1/auth/check",
    tag = "auth",
    operation_id = "auth.check",
    request_body = PasswordCheckRequest,
    responses(
        (status = 200, description = "Password verdict", body = PasswordCheckResponse),
    )
)]
pub async fn check_password(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<PasswordCheckRequest>,
) -> ApiResponse<PasswordCheckResponse> {
    ApiResponse::success(PasswordCheckResponse {
        success: req.password == state.current_password(),
    })
}

/// `POST /api/v1/auth/password`
///
/// Rotates the dashboard password. The old password is validated in the
/// body; the new one is kept in memory and persisted to the state file so
/// it survives restarts.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password",
    tag = "auth",
    operation_id = "auth.change_password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ChangePasswordResponse),
        (status = 400, description = "New password too short", body = crate::api::v1::response::ApiError),
        (status = 401, description = "Old password incorrect", body = crate::api::v1::response::ApiError),
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<ChangePasswordRequest>,
) -> ApiResponse<ChangePasswordResponse> {
    let old_password = req.old_password.trim();
    let new_password = req.new_password.trim();

    if old_password.is_empty() || old_password != state.current_password() {
        tracing::warn!("Password change rejected: incorrect old password");
        return ApiResponse::error(ErrorCode::Unauthorized, "Current password is incorrect");
    }

    if new_password.len() < 4 {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            "New password must be at least 4 characters",
        );
    }

    *state
        .dashboard_password
        .write()
        .expect("password lock poisoned") = new_password.to_string();

    if let Err(e) = std::fs::write(&state.config.storage.password_path, new_password) {
        tracing::warn!(error = %e, "Failed to persist new password; it will last until restart");
    }

    tracing::info!("Dashboard password changed");
    ApiResponse::success(ChangePasswordResponse {
        success: true,
        message: "Password changed successfully".to_string(),
    })
}
