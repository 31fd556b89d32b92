//! Profile page: picture, socials, team, emergency contact.
//!
//! Team and socials live only in the portal store. Reads hydrate the store
//! on first use; writes update it after the backend accepts them, except
//! socials, which are applied optimistically and rolled back on failure.
//! Every store write names the user it was made for, so a request that
//! resolves after sign-out cannot land in the next user's state.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use super::{report_write_error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    CurrentUser, EmergencyContact, ProfilePictureRequest, SaveTeamRequest, Socials, Team,
    VerifyGithubRequest,
};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub user: CurrentUser,
    pub profile_picture_url: Option<String>,
    pub socials: Socials,
    pub team: Option<Team>,
    pub emergency_contact: Option<EmergencyContact>,
}

#[derive(Debug, Serialize)]
pub struct VerifyGithubView {
    pub verified: bool,
}

async fn hydrate_store(state: &AppState, uid: &str) {
    let store = &state.queries.store;
    let snapshot = store.snapshot();

    if snapshot.socials.is_none() {
        match state.queries.backend.request_socials(uid).await {
            Ok(socials) => {
                // A write that landed meanwhile wins
                store.replace_socials_if(uid, &None, Some(socials));
            }
            Err(e) => tracing::warn!("Failed to load socials: {}", e),
        }
    }

    if snapshot.team.is_none() {
        match state.queries.backend.get_team(uid).await {
            Ok(team) => {
                store.set_team(uid, team);
            }
            Err(e) => tracing::warn!("Failed to load team: {}", e),
        }
    }
}

/// GET /api/profile
pub async fn get_profile(State(state): State<AppState>) -> ApiResult<ProfileView> {
    let user = state.queries.session.require()?;
    hydrate_store(&state, &user.uid).await;

    let profile_picture_url = state.queries.profile_picture().fetch().await;
    let emergency_contact = state
        .queries
        .backend
        .get_emergency_contact(&user.uid)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load emergency contact: {}", e);
            None
        });

    let snapshot = state.queries.store.snapshot();
    success(ProfileView {
        user,
        profile_picture_url,
        socials: snapshot.socials.clone().unwrap_or_default(),
        team: snapshot.team.clone(),
        emergency_contact,
    })
}

/// PUT /api/profile/socials
pub async fn update_socials(
    State(state): State<AppState>,
    Json(socials): Json<Socials>,
) -> ApiResult<Socials> {
    let user = state.queries.session.require()?;
    let store = &state.queries.store;

    let previous = store.snapshot().socials.clone();
    let optimistic = Some(socials.clone());
    store.set_socials(&user.uid, optimistic.clone());

    match state.queries.backend.update_socials(&user.uid, &socials).await {
        Ok(saved) => {
            store.replace_socials_if(&user.uid, &optimistic, Some(saved.clone()));
            success(saved)
        }
        Err(e) => {
            store.replace_socials_if(&user.uid, &optimistic, previous);
            Err(report_write_error(&state, "update-socials", e))
        }
    }
}

/// PUT /api/profile/picture
pub async fn set_profile_picture(
    State(state): State<AppState>,
    Json(request): Json<ProfilePictureRequest>,
) -> ApiResult<Option<String>> {
    let user = state.queries.session.require()?;
    let url = request.url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(AppError::Validation(
            "Profile picture must be an http(s) URL".to_string(),
        ));
    }

    state
        .queries
        .backend
        .set_profile_picture_url(&user.uid, url)
        .await
        .map_err(|e| report_write_error(&state, "set-profile-picture", e))?;

    state
        .queries
        .store
        .set_profile_picture_url(&user.uid, Some(url.to_string()));
    let picture = state.queries.profile_picture();
    picture.refresh();
    success(picture.fetch().await)
}

/// PUT /api/profile/emergency-contact
pub async fn set_emergency_contact(
    State(state): State<AppState>,
    Json(contact): Json<EmergencyContact>,
) -> ApiResult<EmergencyContact> {
    let user = state.queries.session.require()?;
    if contact.name.trim().is_empty() || contact.phone.trim().is_empty() {
        return Err(AppError::Validation(
            "Emergency contact name and phone are required".to_string(),
        ));
    }

    state
        .queries
        .backend
        .set_emergency_contact(&user.uid, &contact)
        .await
        .map_err(|e| report_write_error(&state, "set-emergency-contact", e))?;
    success(contact)
}

/// PUT /api/profile/team - Create the caller's team or edit one they own.
pub async fn save_team(
    State(state): State<AppState>,
    Json(request): Json<SaveTeamRequest>,
) -> ApiResult<Team> {
    let user = state.queries.session.require()?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Team name is required".to_string()));
    }

    let existing = match state.queries.store.snapshot().team.clone() {
        Some(team) => Some(team),
        None => state.queries.backend.get_team(&user.uid).await?,
    };
    if let Some(team) = &existing {
        if team.owner_id != user.uid {
            return Err(AppError::Forbidden(
                "Only the team owner can edit the team".to_string(),
            ));
        }
    }

    let mut member_ids = vec![user.uid.clone()];
    for id in request.member_ids {
        if !member_ids.contains(&id) {
            member_ids.push(id);
        }
    }

    let team = Team {
        id: existing
            .map(|t| t.id)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: name.to_string(),
        owner_id: user.uid.clone(),
        member_ids,
        updated_at: Utc::now().to_rfc3339(),
    };

    let saved = state
        .queries
        .backend
        .save_team(&team)
        .await
        .map_err(|e| report_write_error(&state, "save-team", e))?;
    state.queries.store.set_team(&user.uid, Some(saved.clone()));
    success(saved)
}

/// POST /api/profile/verify-github
pub async fn verify_github(
    State(state): State<AppState>,
    Json(request): Json<VerifyGithubRequest>,
) -> ApiResult<VerifyGithubView> {
    state.queries.session.require()?;
    let verified = state
        .queries
        .backend
        .verify_github_email(&request.token, &request.email)
        .await
        .map_err(|e| report_write_error(&state, "verify-github", e))?;
    success(VerifyGithubView { verified })
}
