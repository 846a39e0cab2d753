use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::write_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    // Reads pass through the middleware untouched; mutations need the
    // shared secret.
    let documents = Router::new()
        .route(
            "/",
            get(handlers::documents::list_documents).post(handlers::documents::create_document),
        )
        .route(
            "/{*path}",
            get(handlers::documents::get_document)
                .put(handlers::documents::update_document)
                .delete(handlers::documents::delete_document),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            write_auth_middleware,
        ));

    let admin = Router::new()
        .route("/refresh", post(handlers::admin::run_refresh))
        .route_layer(middleware::from_fn_with_state(
            state,
            write_auth_middleware,
        ));

    let auth = Router::new()
        .route("/check", post(handlers::auth::check_password))
        .route("/password", post(handlers::auth::change_password));

    let public = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ask", post(handlers::ask::ask))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    Router::new()
        .merge(public)
        .nest("/documents", documents)
        .nest("/admin", admin)
        .nest("/auth", auth)
}
