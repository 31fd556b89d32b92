//! Admin check-in scanning and review decisions.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::{report_write_error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{events, Application, ApplicationStatus, SetStatusRequest};
use crate::queries::entities;
use crate::remote::log_event_detached;
use crate::AppState;

/// GET /api/admin/scan/:id - Look up a scanned application.
pub async fn scan_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Application> {
    let admin = state.queries.session.require()?;

    let application = state
        .queries
        .backend
        .get_application(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {} not found", id)))?;

    log_event_detached(
        Arc::clone(&state.queries.backend),
        events::ADMIN_SCAN,
        serde_json::json!({ "applicationId": id, "admin": admin.uid }),
    );
    success(application)
}

/// PUT /api/admin/applications/:id/status
pub async fn set_application_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetStatusRequest>,
) -> ApiResult<Application> {
    if request.status == ApplicationStatus::Draft {
        return Err(AppError::Validation(
            "Applications cannot be returned to draft".to_string(),
        ));
    }

    let updated = state
        .queries
        .backend
        .set_application_status(&id, request.status)
        .await
        .map_err(|e| report_write_error(&state, "set-application-status", e))?;

    // Any cached list holding this record is now out of date
    state.queries.cache.invalidate_entity(entities::APPLICATIONS);
    tracing::info!("Application {} marked {}", id, request.status.as_str());
    success(updated)
}
