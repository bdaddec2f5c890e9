use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.mutation_body_limit();
    let cors = cors_layer(&state.config.server.cors_allow_origin);

    Router::new()
        // Portfolio functions
        .route(
            "/storage-list",
            get(handlers::storage_list).fallback(handlers::method_not_allowed),
        )
        .route(
            "/storage-upload",
            post(handlers::storage_mutation)
                .layer(DefaultBodyLimit::max(body_limit))
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/notify-access",
            post(handlers::notify_access).fallback(handlers::method_not_allowed),
        )
        // Object bytes (local backend public URLs)
        .route(
            "/files/*path",
            get(handlers::serve_object).fallback(handlers::method_not_allowed),
        )
        // Internal
        .route("/_internal/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(origin, "Invalid CORS_ALLOW_ORIGIN, allowing any origin");
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}
