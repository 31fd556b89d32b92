//! Team, socials and emergency contact records.

use serde::{Deserialize, Serialize};

/// Social profile links returned by `requestSocials`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Socials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
}

/// A hackathon team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
    pub updated_at: String,
}

/// Request body for creating or renaming the caller's team.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTeamRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

/// A record in the `emergency-contacts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub relationship: String,
}

/// Request body for `verifyGitHubEmail`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyGithubRequest {
    pub token: String,
    pub email: String,
}

/// Request body for overriding the profile picture.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfilePictureRequest {
    pub url: String,
}
