//! Page handlers for the portal's local HTTP surface.
//!
//! Every handler answers with the `{ success, data }` envelope, or an
//! [`AppError`](crate::errors::AppError) rendered by its `IntoResponse`.

mod admin;
mod apply;
mod pages;
mod profile;
mod session;
mod status;

pub use admin::*;
pub use apply::*;
pub use pages::*;
pub use profile::*;
pub use session::*;
pub use status::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            data,
        }
    }

    /// Same envelope with a different status code.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Trace a failed write, emit a `write-error` event, and hand the error back
/// so the handler can surface it.
pub(crate) fn report_write_error(
    state: &crate::AppState,
    operation: &'static str,
    error: crate::errors::AppError,
) -> crate::errors::AppError {
    tracing::warn!("{} failed: {}", operation, error);
    crate::remote::log_event_detached(
        std::sync::Arc::clone(&state.queries.backend),
        crate::models::events::WRITE_ERROR,
        serde_json::json!({ "operation": operation, "error": error.to_string() }),
    );
    error
}
