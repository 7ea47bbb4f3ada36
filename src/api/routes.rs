use crate::api::{handlers, ApiDoc};
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Multipart framing on top of the largest accepted document.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the full application router, mounted under `/api`.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .server
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD);

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    let protected_routes = Router::new()
        .route(
            "/subjects",
            get(handlers::subjects::list_subjects).post(handlers::subjects::create_subject),
        )
        .route(
            "/subjects/{subject_id}",
            get(handlers::subjects::get_subject)
                .put(handlers::subjects::update_subject)
                .delete(handlers::subjects::delete_subject),
        )
        .route(
            "/student/subjects",
            get(handlers::subjects::list_class_subjects),
        )
        .route("/chat", post(handlers::chat::chat))
        .layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            crate::auth::middleware::auth_middleware,
        ));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
