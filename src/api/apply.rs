//! Application form: draft editing, autosave and submission.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{report_write_error, success, ApiResponse, ApiResult};
use crate::errors::AppError;
use crate::forms::options::{form_options, FormOptions};
use crate::forms::{new_application, validate_for_submission, PhoneInput};
use crate::models::{events, Application, CurrentUser, SaveDraftRequest};
use crate::remote::log_event_detached;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyView {
    pub draft: Application,
    pub phone_country: String,
    pub phone_digits: String,
    /// True while an autosave is waiting to be written
    pub unsaved: bool,
    pub autosave_ms: u64,
    pub options: FormOptions,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveDraftParams {
    #[serde(default)]
    pub autosave: bool,
}

fn stored_or_new(state: &AppState, user: &CurrentUser, stored: &Option<Application>) -> Application {
    match stored {
        Some(draft) => draft.clone(),
        None => new_application(user, state.queries.year),
    }
}

/// The draft as the user last saw it: unsaved edits first, then the stored
/// draft, then a fresh one. A failed read is an error, never a fresh draft,
/// so an edit cannot fork a second draft off a backend outage.
async fn current_draft(state: &AppState, user: &CurrentUser) -> Result<Application, AppError> {
    if let Some(pending) = state.autosave.pending(&user.uid) {
        return Ok(pending);
    }
    let stored = state.queries.draft().try_fetch().await?;
    Ok(stored_or_new(state, user, &stored))
}

/// Merge the phone selector and digits into the composed phone value.
fn compose_phone(draft: &mut Application, request: &SaveDraftRequest) -> Result<(), AppError> {
    if request.phone_country.is_none() && request.phone_digits.is_none() {
        return Ok(());
    }

    let mut phone = PhoneInput::from_value(&draft.phone);
    if let Some(country) = &request.phone_country {
        if !phone.select_country(country) {
            return Err(AppError::Validation(format!("Unknown country code: {}", country)));
        }
    }
    if let Some(digits) = &request.phone_digits {
        if !phone.input_digits(digits) {
            return Err(AppError::Validation(
                "Phone number may only contain digits and hyphens".to_string(),
            ));
        }
    }
    draft.phone = phone.value();
    Ok(())
}

/// GET /api/apply - Draft form with option lists.
pub async fn get_apply(State(state): State<AppState>) -> ApiResult<ApplyView> {
    let user = state.queries.session.require()?;
    let pending = state.autosave.pending(&user.uid);
    let unsaved = pending.is_some();
    let draft = match pending {
        Some(draft) => draft,
        None => stored_or_new(&state, &user, &*state.queries.draft().fetch().await),
    };
    let phone = PhoneInput::from_value(&draft.phone);

    success(ApplyView {
        phone_country: phone.country().to_string(),
        phone_digits: phone.digits().to_string(),
        draft,
        unsaved,
        autosave_ms: state.config.draft_autosave.as_millis() as u64,
        options: form_options(),
    })
}

/// PUT /api/apply/draft - Save a partial edit. With `?autosave=true` the
/// write is debounced and the merged draft is returned with `202`.
pub async fn save_draft(
    State(state): State<AppState>,
    Query(params): Query<SaveDraftParams>,
    Json(request): Json<SaveDraftRequest>,
) -> ApiResult<Application> {
    let user = state.queries.session.require()?;
    let mut draft = current_draft(&state, &user).await?;
    if draft.status.is_submitted() {
        return Err(AppError::Validation(
            "Submitted applications cannot be edited".to_string(),
        ));
    }

    request.apply_to(&mut draft);
    compose_phone(&mut draft, &request)?;
    draft.updated_at = Utc::now().to_rfc3339();

    if params.autosave {
        state.autosave.schedule(&state.queries, draft.clone());
        return Ok(ApiResponse::new(draft).with_status(StatusCode::ACCEPTED));
    }

    // The merged draft already includes any pending edits
    state.autosave.discard();
    let saved = state
        .queries
        .backend
        .save_draft(&draft)
        .await
        .map_err(|e| report_write_error(&state, "save-draft", e))?;
    state.queries.draft().refresh();
    success(saved)
}

/// POST /api/apply/submit - Submit the draft for this year.
pub async fn submit_application(State(state): State<AppState>) -> ApiResult<Application> {
    let user = state.queries.session.require()?;

    state
        .autosave
        .flush_now(&state.queries)
        .await
        .map_err(|e| report_write_error(&state, "save-draft", e))?;

    let draft = state.queries.draft().try_fetch().await?;
    let draft = (*draft)
        .as_ref()
        .ok_or_else(|| AppError::NotFound("No draft to submit".to_string()))?;
    validate_for_submission(draft)?;

    let submitted = state
        .queries
        .backend
        .submit_application(&user.uid, state.queries.year)
        .await
        .map_err(|e| report_write_error(&state, "submit-application", e))?;

    state.queries.applications().refresh();
    state.queries.draft().refresh();

    tracing::info!("Application {} submitted by {}", submitted.id, user.uid);
    log_event_detached(
        Arc::clone(&state.queries.backend),
        events::APPLICATION_SUBMITTED,
        serde_json::json!({ "applicationId": submitted.id, "year": submitted.year }),
    );
    success(submitted)
}
