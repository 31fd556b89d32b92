//! Application status page.

use axum::extract::State;
use serde::Serialize;

use super::{success, ApiResult};
use crate::models::{Application, ApplicationStatus};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub application: Option<Application>,
    pub status: Option<ApplicationStatus>,
    /// Confirmation form link, only for accepted applicants
    pub mjv_url: Option<String>,
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> ApiResult<StatusView> {
    let applications = state.queries.applications().fetch().await;
    let application = applications
        .iter()
        .filter(|a| a.year == state.queries.year)
        .max_by(|a, b| a.updated_at.cmp(&b.updated_at))
        .cloned();

    let status = application.as_ref().map(|a| a.status);
    let mjv_url = if status == Some(ApplicationStatus::Accepted) {
        match state.queries.backend.get_typeform_links().await {
            Ok(links) => links.map(|l| l.mjv_url),
            Err(e) => {
                tracing::warn!("Failed to load typeform links: {}", e);
                None
            }
        }
    } else {
        None
    };

    success(StatusView {
        application,
        status,
        mjv_url,
    })
}
