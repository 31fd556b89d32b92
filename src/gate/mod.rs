//! Route-level access control.
//!
//! A gate holds an ordered list of predicates over already-loaded data. All
//! must pass for the page to render; otherwise the gate answers with a
//! redirect. Predicates never fetch.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};

use crate::models::{Application, CurrentUser};
use crate::routes::Route;
use crate::util::is_date_in_range;
use crate::AppState;

/// Response header telling the client whether to replace the history entry.
pub const HISTORY_REPLACE_HEADER: &str = "x-history-replace";

/// Data a predicate may look at.
#[derive(Debug, Clone)]
pub struct GateContext {
    pub current_user: Option<CurrentUser>,
    pub applications: Arc<Vec<Application>>,
    pub today: NaiveDate,
}

pub type Predicate = Arc<dyn Fn(&GateContext) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Render,
    Redirect { to: Route, replace: bool },
}

#[derive(Clone)]
pub struct Gate {
    predicates: Vec<Predicate>,
    redirect_to: Route,
    replace: bool,
}

impl Gate {
    /// A gate that redirects to `redirect_to`, replacing history.
    pub fn new(redirect_to: Route) -> Self {
        Self {
            predicates: Vec::new(),
            redirect_to,
            replace: true,
        }
    }

    pub fn require(
        mut self,
        predicate: impl Fn(&GateContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicates.push(Arc::new(predicate));
        self
    }

    pub fn replace_history(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn evaluate(&self, ctx: &GateContext) -> GateDecision {
        if self.predicates.iter().all(|p| p(ctx)) {
            GateDecision::Render
        } else {
            GateDecision::Redirect {
                to: self.redirect_to,
                replace: self.replace,
            }
        }
    }

    // ==================== STANDARD GATES ====================

    pub fn signed_in() -> Self {
        Gate::new(Route::Login).require(is_signed_in)
    }

    pub fn applicant() -> Self {
        Gate::new(Route::Apply).require(has_submitted_application)
    }

    /// Only users who have not applied yet, while applications are open.
    pub fn can_apply(open: &str, close: &str) -> Self {
        Gate::new(Route::Home)
            .require(|ctx| !has_submitted_application(ctx))
            .require(applications_open(open, close))
    }

    pub fn admin() -> Self {
        Gate::new(Route::Home).replace_history(false).require(is_admin)
    }
}

// ==================== PREDICATES ====================

pub fn is_signed_in(ctx: &GateContext) -> bool {
    ctx.current_user.is_some()
}

pub fn has_submitted_application(ctx: &GateContext) -> bool {
    ctx.applications.iter().any(|a| a.status.is_submitted())
}

pub fn is_admin(ctx: &GateContext) -> bool {
    ctx.current_user.as_ref().is_some_and(CurrentUser::is_admin)
}

/// Passes while `today` lies within the inclusive window.
pub fn applications_open(
    open: &str,
    close: &str,
) -> impl Fn(&GateContext) -> bool + Send + Sync + 'static {
    let open = open.to_string();
    let close = close.to_string();
    move |ctx| match is_date_in_range(ctx.today, &open, &close) {
        Ok(inside) => inside,
        Err(e) => {
            tracing::warn!("Application window is misconfigured: {}", e);
            false
        }
    }
}

// ==================== MIDDLEWARE ====================

/// Gate middleware: loads the context through the hooks, then either runs
/// the handler or redirects.
pub async fn gate_layer(
    gate: Arc<Gate>,
    state: AppState,
    request: Request,
    next: Next,
) -> Response {
    let ctx = GateContext {
        current_user: state.queries.session.current(),
        applications: state.queries.applications().fetch().await,
        today: Utc::now().date_naive(),
    };

    match gate.evaluate(&ctx) {
        GateDecision::Render => next.run(request).await,
        GateDecision::Redirect { to, replace } => {
            tracing::debug!("Gate redirect {} -> {}", request.uri().path(), to.path());
            redirect_response(to, replace)
        }
    }
}

fn redirect_response(to: Route, replace: bool) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION.as_str(), to.path()),
            (HISTORY_REPLACE_HEADER, if replace { "true" } else { "false" }),
        ],
    )
        .into_response()
}
