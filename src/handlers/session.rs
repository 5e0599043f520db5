// src/handlers/session.rs

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::session::{CreateSessionRequest, ExamSession},
    state::AppState,
    utils::{
        jwt::{Claims, sign_session_token},
        store::SessionStore,
    },
};

/// Opens a new exam session.
///
/// Validates the inbound parameters, stores a fresh session in `NOT_STARTED`
/// and returns a bearer token bound to it.
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let profile = payload.into_profile()?;
    let session = ExamSession::new(profile);
    let view = session.view();
    let id = state.sessions.insert(session);

    let token = sign_session_token(id, &state.config.jwt_secret, state.config.session_ttl_secs)?;

    tracing::info!(
        "Session {} opened for {} ({})",
        id,
        view.profile.keywords,
        view.profile.experience
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "type": "Bearer",
            "expires_in": state.config.session_ttl_secs,
            "session": view,
        })),
    ))
}

/// Returns the caller's session: phase, profile, questions and saved answers.
pub async fn current_session(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let id = claims.session_id()?;
    let view = sessions.with_session(&id, |s| s.view())?;
    Ok(Json(view))
}

/// Ends the caller's session and discards its state.
pub async fn end_session(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let id = claims.session_id()?;
    sessions
        .remove(&id)
        .ok_or_else(|| AppError::NotFound("Session not found or expired".to_string()))?;
    tracing::info!("Session {} ended", id);
    Ok(StatusCode::NO_CONTENT)
}
