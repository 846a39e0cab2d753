//! v1 document handlers: CRUD against the remote store, with the mirror
//! and index refreshed after every mutation (fire-and-forget, so the
//! response never blocks on embedding I/O).

use axum::extract::{Path, State};

use crate::api::v1::dto::{
    CreateDocumentRequest, CreateDocumentResponse, DeleteDocumentResponse, DocumentResponse,
    ListDocumentsResponse, UpdateDocumentRequest, UpdateDocumentResponse,
};
use crate::api::v1::response::{ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::store::normalize_object_name;

fn spawn_refresh(state: &AppState) {
    let indexer = state.indexer.clone();
    tokio::spawn(async move {
        if let Err(e) = indexer.refresh(false).await {
            tracing::error!(error = %e, "Post-mutation refresh failed");
        }
    });
}

/// `GET /api/v1/documents`
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    tag = "documents",
    operation_id = "documents.list",
    responses(
        (status = 200, description = "Mirrored document paths", body = ListDocumentsResponse),
    )
)]
pub async fn list_documents(State(state): State<AppState>) -> ApiResponse<ListDocumentsResponse> {
    let documents = state.mirror.list_paths();
    let total = documents.len();
    ApiResponse::success(ListDocumentsResponse { documents, total })
}

/// `GET /api/v1/documents/{path}`
#[utoipa::path(
    get,
    path = "/api/v1/documents/{path}",
    tag = "documents",
    operation_id = "documents.get",
    params(("path" = String, Path, description = "Document path within the store")),
    responses(
        (status = 200, description = "Document content", body = DocumentResponse),
        (status = 404, description = "Unknown document", body = crate::api::v1::response::ApiError),
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResponse<DocumentResponse> {
    match state.store.fetch(&path).await {
        Ok(content) => ApiResponse::success(DocumentResponse { path, content }),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/documents`
///
/// Creates a document under a normalized object name and triggers a
/// sync + conditional rebuild.
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    tag = "documents",
    operation_id = "documents.create",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document stored", body = CreateDocumentResponse),
        (status = 400, description = "Invalid request", body = crate::api::v1::response::ApiError),
    )
)]
pub async fn create_document(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<CreateDocumentRequest>,
) -> ApiResponse<CreateDocumentResponse> {
    if req.title.trim().is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Title required");
    }

    let path = normalize_object_name(&req.title);
    if let Err(e) = state.store.put(&path, &req.content).await {
        return e.into();
    }

    spawn_refresh(&state);
    ApiResponse::created(CreateDocumentResponse { path })
}

/// `PUT /api/v1/documents/{path}`
#[utoipa::path(
    put,
    path = "/api/v1/documents/{path}",
    tag = "documents",
    operation_id = "documents.update",
    params(("path" = String, Path, description = "Document path within the store")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Document updated", body = UpdateDocumentResponse),
    )
)]
pub async fn update_document(
    State(state): State<AppState>,
    Path(path): Path<String>,
    axum::Json(req): axum::Json<UpdateDocumentRequest>,
) -> ApiResponse<UpdateDocumentResponse> {
    let path = normalize_object_name(&path);
    if let Err(e) = state.store.put(&path, &req.content).await {
        return e.into();
    }

    spawn_refresh(&state);
    ApiResponse::success(UpdateDocumentResponse { path })
}

/// `DELETE /api/v1/documents/{path}`
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{path}",
    tag = "documents",
    operation_id = "documents.delete",
    params(("path" = String, Path, description = "Document path within the store")),
    responses(
        (status = 200, description = "Document removed", body = DeleteDocumentResponse),
        (status = 404, description = "Unknown document", body = crate::api::v1::response::ApiError),
    )
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResponse<DeleteDocumentResponse> {
    let path = normalize_object_name(&path);
    if let Err(e) = state.store.delete(&path).await {
        return e.into();
    }

    spawn_refresh(&state);
    ApiResponse::success(DeleteDocumentResponse {
        path,
        deleted: true,
    })
}
