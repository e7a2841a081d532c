use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use innkeep_core::repository::StoreError;

/// Failures a handler cannot recover with a redirect or a redisplay.
/// Validation and session-state problems never reach this type; they are
/// handled in the handlers with flashes and redirects.
#[derive(Debug)]
pub enum AppError {
    Store(StoreError),
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Full detail stays in the server log; the client gets a generic page.
        match self {
            AppError::Store(e) => tracing::error!("store failure: {}", e),
            AppError::Internal(msg) => tracing::error!("internal error: {}", msg),
        }

        let body = Html(crate::views::error_page());
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
