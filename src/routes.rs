// src/routes.rs

use axum::{
    Json, Router,
    http::Method,
    middleware,
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{exam, session},
    state::AppState,
    utils::jwt::session_middleware,
};

/// Assembles the main application router.
///
/// * Opening a session is public; everything else needs the session token.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (config, session store, model, submitter).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let current_session = get(session::current_session)
        .delete(session::end_session)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    let exam_routes = Router::new()
        .route("/start", post(exam::start_exam))
        .route("/answers", put(exam::save_answers))
        .route("/submit", post(exam::submit_exam))
        .route("/results", get(exam::get_results))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route("/api/sessions", post(session::create_session))
        .route("/api/sessions/current", current_session)
        .nest("/api/exam", exam_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
