//! Hackathon metadata documents and telemetry event kinds.

use serde::{Deserialize, Serialize};

/// The `hackathon-metadata/typeforms` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeformLinks {
    #[serde(rename = "mjvURL")]
    pub mjv_url: String,
}

/// Telemetry event types accepted by `logEvent`.
pub mod events {
    pub const FETCH_ERROR: &str = "fetch-error";
    pub const WRITE_ERROR: &str = "write-error";
    pub const SIGN_IN: &str = "sign-in";
    pub const SIGN_OUT: &str = "sign-out";
    pub const APPLICATION_SUBMITTED: &str = "application-submitted";
    pub const ADMIN_SCAN: &str = "admin-scan";
}

/// A telemetry event as persisted by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
    pub created_at: String,
}
