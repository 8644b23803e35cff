use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::crm::CrmRejection;

/// Errors surfaced by the bot's HTTP layer. Interpreter failures are not
/// errors at this level; they travel inside a `CommandResult`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Errors of the mock CRM, rendered as `{"detail": "..."}` like a real CRM
/// rejection.
#[derive(Debug, thiserror::Error)]
pub enum CrmApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for CrmApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            CrmApiError::NotFound(_) => StatusCode::NOT_FOUND,
            CrmApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CrmApiError::Internal(e) => {
                tracing::error!(error = %e, "mock CRM request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = CrmRejection {
            detail: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}
