use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/interviews/start", post(handlers::start_interview))
        .route(
            "/interviews/:session_id/disconnect",
            post(handlers::disconnect_interview),
        )
        // Session queries
        .route(
            "/interviews/:session_id/status",
            get(handlers::get_interview_status),
        )
        .route(
            "/interviews/:session_id/transcript",
            get(handlers::get_interview_transcript),
        )
        // Candidate input relayed by the client
        .route(
            "/interviews/:session_id/speech",
            post(handlers::post_speech_event),
        )
        .route("/interviews/:session_id/answer", post(handlers::post_answer))
        // Follow-up service contract
        .route("/followup", post(handlers::followup))
        // Browser clients run speech recognition and call back in
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
