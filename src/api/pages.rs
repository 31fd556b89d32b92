//! Home and login views.

use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use super::{success, ApiResult};
use crate::config::APP_VERSION;
use crate::gate::{applications_open, has_submitted_application, GateContext};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub version: &'static str,
    pub signed_in: bool,
    pub display_name: Option<String>,
    pub applications_open: bool,
    pub has_application: bool,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub version: &'static str,
    pub signed_in: bool,
}

/// GET /api/ - Landing page.
pub async fn home(State(state): State<AppState>) -> ApiResult<HomeView> {
    let user = state.queries.session.current();
    let ctx = GateContext {
        current_user: user.clone(),
        applications: state.queries.applications().fetch().await,
        today: Utc::now().date_naive(),
    };
    let window = applications_open(
        &state.config.applications_open,
        &state.config.applications_close,
    );

    success(HomeView {
        version: APP_VERSION,
        signed_in: user.is_some(),
        display_name: user.as_ref().and_then(|u| u.display_name.clone()),
        applications_open: window(&ctx),
        has_application: has_submitted_application(&ctx),
        is_admin: user.as_ref().is_some_and(|u| u.is_admin()),
    })
}

/// GET /api/login
pub async fn login(State(state): State<AppState>) -> ApiResult<LoginView> {
    success(LoginView {
        version: APP_VERSION,
        signed_in: state.queries.session.current().is_some(),
    })
}
