// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{lesson, progress, publish, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Wires the upload/authoring/scoring/publishing endpoints.
/// * Applies global middleware (Trace, CORS, body limit for uploads).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    // The frontend is a static bundle; the API itself is open (no auth),
    // so CORS is fully permissive like the reference deployment.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(lesson::upload_lesson))
        .route("/lessons", get(lesson::list_lessons))
        .route("/lessons/{id}", get(lesson::get_lesson))
        .route("/quizzes", post(quiz::create_quiz))
        .route("/quizzes/{id}", get(quiz::get_quiz))
        .route("/quizzes/submit", post(quiz::submit_quiz))
        .route("/publish", post(publish::publish_manifest))
        .route("/manifest/{subject}/{week}", get(publish::get_manifest))
        .route("/progress", post(progress::save_progress))
        // Static dashboard bundle; unmatched paths fall through here.
        .fallback_service(ServeDir::new("frontend"))
        // Documents can run large once images are embedded.
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
