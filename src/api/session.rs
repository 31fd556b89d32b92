//! Sign-in and sign-out.

use std::sync::Arc;

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{events, CurrentUser};
use crate::remote::log_event_detached;
use crate::AppState;

/// GET /api/session - The signed-in user, if any.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<Option<CurrentUser>> {
    success(state.queries.session.current())
}

/// POST /api/session - Sign in with the identity projection from the auth
/// provider.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(user): Json<CurrentUser>,
) -> ApiResult<CurrentUser> {
    if user.uid.trim().is_empty() {
        return Err(AppError::Validation("uid is required".to_string()));
    }

    start_session(&state, user.clone());

    tracing::info!("Signed in as {}", user.uid);
    log_event_detached(
        Arc::clone(&state.queries.backend),
        events::SIGN_IN,
        serde_json::json!({ "uid": user.uid }),
    );
    success(user)
}

/// DELETE /api/session - Sign out and drop all client state.
pub async fn sign_out(State(state): State<AppState>) -> ApiResult<()> {
    let previous = end_session(&state);

    if let Some(user) = previous {
        tracing::info!("Signed out {}", user.uid);
        log_event_detached(
            Arc::clone(&state.queries.backend),
            events::SIGN_OUT,
            serde_json::json!({ "uid": user.uid }),
        );
    }
    success(())
}

/// Make `user` the signed-in identity and hand the client state to them.
pub(crate) fn start_session(state: &AppState, user: CurrentUser) {
    // Nothing cached for one identity may be served to another
    if state.queries.session.uid().as_deref() != Some(user.uid.as_str()) {
        reset_client_state(state);
    }
    state.queries.store.begin_session(&user.uid);
    state.queries.session.sign_in(user);
    state.queries.pin_session();
}

/// Sign out and drop all client state. Returns who was signed in.
pub(crate) fn end_session(state: &AppState) -> Option<CurrentUser> {
    let previous = state.queries.session.sign_out();
    reset_client_state(state);
    previous
}

fn reset_client_state(state: &AppState) {
    state.autosave.discard();
    state.queries.unpin_session();
    state.queries.cache.clear();
    state.queries.store.reset();
}
