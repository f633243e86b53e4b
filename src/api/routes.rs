use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes
///
/// The request ID middleware is the outer layer so the trace span can pick the ID up.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Conversation
        .route("/chat/message", post(handlers::chat_message))
        .route("/chat/reset", post(handlers::reset_conversation))
        // Direct recommendations
        .route("/recommendations", post(handlers::recommend_by_emotion))
        .route("/recommendations/mix", post(handlers::recommend_by_mix))
        .route("/movies/emotion/:emotion", get(handlers::movies_by_emotion))
        .route("/movies/trending", get(handlers::trending))
        .route("/emotions/supported", get(handlers::supported_emotions))
}
