//! Read-only projection of the externally issued identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The signed-in user as issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub claims: BTreeMap<String, serde_json::Value>,
}

impl CurrentUser {
    /// True when the custom claim is present and set to `true`.
    pub fn has_claim(&self, claim: &str) -> bool {
        matches!(self.claims.get(claim), Some(serde_json::Value::Bool(true)))
    }

    pub fn is_admin(&self) -> bool {
        self.has_claim("admin")
    }
}
