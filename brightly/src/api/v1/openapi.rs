use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use crate::models;

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Brightly API",
        version = "1.0.0",
        description = "School Q&A assistant. Document CRUD, index refresh, and the /ask question pipeline.",
    ),
    paths(
        handlers::health::health_check,
        handlers::ask::ask,
        handlers::documents::list_documents,
        handlers::documents::get_document,
        handlers::documents::create_document,
        handlers::documents::update_document,
        handlers::documents::delete_document,
        handlers::admin::run_refresh,
        handlers::auth::check_password,
        handlers::auth::change_password,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        // Ask
        dto::ask::AskRequest,
        dto::ask::AskResponse,
        models::ConversationTurn,
        // Documents
        dto::documents::CreateDocumentRequest,
        dto::documents::CreateDocumentResponse,
        dto::documents::UpdateDocumentRequest,
        dto::documents::UpdateDocumentResponse,
        dto::documents::DeleteDocumentResponse,
        dto::documents::DocumentResponse,
        dto::documents::ListDocumentsResponse,
        // Admin
        dto::admin::RefreshResponse,
        // Auth
        dto::auth::PasswordCheckRequest,
        dto::auth::PasswordCheckResponse,
        dto::auth::ChangePasswordRequest,
        dto::auth::ChangePasswordResponse,
        // Health
        handlers::health::HealthData,
    )),
    tags(
        (name = "health", description = "Liveness and component availability"),
        (name = "ask", description = "Question answering"),
        (name = "documents", description = "Document store CRUD"),
        (name = "admin", description = "Index administration (auth required)"),
        (name = "auth", description = "Dashboard password"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
