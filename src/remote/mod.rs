//! Remote data accessors.
//!
//! Each method performs a single logical read or write against the document
//! store or one of its callable procedures. Accessors own no state.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{
    Application, ApplicationStatus, EmergencyContact, Socials, Team, TypeformLinks,
};

/// Document store collections and callable procedures used by the portal.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    // ==================== APPLICATIONS ====================

    /// Submitted (non-draft) applications owned by `uid` for `year`.
    async fn list_applications(&self, uid: &str, year: i32) -> Result<Vec<Application>, AppError>;

    /// The caller's draft for `year`, if one exists.
    async fn get_draft(&self, uid: &str, year: i32) -> Result<Option<Application>, AppError>;

    /// Insert or replace a draft. Fails if the record is already submitted.
    async fn save_draft(&self, draft: &Application) -> Result<Application, AppError>;

    /// Promote the draft for `year` to `pending`.
    async fn submit_application(&self, uid: &str, year: i32) -> Result<Application, AppError>;

    /// Look up any application by id.
    async fn get_application(&self, id: &str) -> Result<Option<Application>, AppError>;

    /// Record a review decision on a submitted application.
    async fn set_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application, AppError>;

    // ==================== PROFILE DOCUMENTS ====================

    async fn get_emergency_contact(&self, uid: &str)
        -> Result<Option<EmergencyContact>, AppError>;

    async fn set_emergency_contact(
        &self,
        uid: &str,
        contact: &EmergencyContact,
    ) -> Result<(), AppError>;

    /// The `hackathon-metadata/typeforms` document.
    async fn get_typeform_links(&self) -> Result<Option<TypeformLinks>, AppError>;

    async fn get_profile_picture_url(&self, uid: &str) -> Result<Option<String>, AppError>;

    async fn set_profile_picture_url(&self, uid: &str, url: &str) -> Result<(), AppError>;

    /// The team `uid` owns or belongs to.
    async fn get_team(&self, uid: &str) -> Result<Option<Team>, AppError>;

    async fn save_team(&self, team: &Team) -> Result<Team, AppError>;

    // ==================== CALLABLE PROCEDURES ====================

    /// `logEvent({type, data})`.
    async fn log_event(&self, kind: &str, data: serde_json::Value) -> Result<(), AppError>;

    /// `verifyGitHubEmail({token, email})`.
    async fn verify_github_email(&self, token: &str, email: &str) -> Result<bool, AppError>;

    /// `requestSocials()`.
    async fn request_socials(&self, uid: &str) -> Result<Socials, AppError>;

    /// `updateSocials(socials)`.
    async fn update_socials(&self, uid: &str, socials: &Socials) -> Result<Socials, AppError>;
}

/// Send a telemetry event without waiting on it; failures are only traced.
pub fn log_event_detached(
    backend: std::sync::Arc<dyn Backend>,
    kind: &'static str,
    data: serde_json::Value,
) {
    tokio::spawn(async move {
        if let Err(e) = backend.log_event(kind, data).await {
            tracing::warn!("Failed to log {} event: {}", kind, e);
        }
    });
}

#[cfg(test)]
pub mod mock;
