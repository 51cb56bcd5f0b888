use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Personal lists
        .route("/list", get(handlers::get_list))
        .route("/list/add", post(handlers::add_to_list))
        .route("/list/remove", post(handlers::remove_from_list))
        // Catalog
        .route("/search", get(handlers::search))
        .layer(
            ServiceBuilder::new()
                // Outermost, so the trace span can read the request id.
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}
