use crate::api::handlers::{health, research};
use crate::api::ApiDoc;
use crate::AppState;
use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Routes mounted under `/api`
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/research", post(research::research_stream))
        .route("/research/sync", post(research::research_sync))
}

/// Complete application: API routes, OpenAPI document, tracing and CORS
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_router())
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            },
        ))
}
