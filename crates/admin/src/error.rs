//! Unified error handling for the admin API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::WorkflowError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Workflow operation failed.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Store operation outside the workflow failed.
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    /// Bad request from client (malformed body or query).
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Workflow(err) => match err {
                WorkflowError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
                WorkflowError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                WorkflowError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
                WorkflowError::FailedPrecondition(_) => StatusCode::CONFLICT,
                WorkflowError::Internal(_) | WorkflowError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Workflow(err) => err.code(),
            Self::Store(_) => "internal",
            Self::BadRequest(_) => "invalid_argument",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Set the Sentry user context from an admin uid.
pub fn set_sentry_user(uid: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(uid.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(WorkflowError::NotFound("approval a1".to_string()));
        assert_eq!(err.to_string(), "not found: approval a1");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        // Test that errors map to correct HTTP status codes
        fn get_status(err: WorkflowError) -> StatusCode {
            AppError::from(err).into_response().status()
        }

        assert_eq!(
            get_status(WorkflowError::Unauthenticated("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(WorkflowError::PermissionDenied("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(WorkflowError::InvalidArgument("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(WorkflowError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(WorkflowError::FailedPrecondition("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(WorkflowError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::from(WorkflowError::FailedPrecondition("x".to_string())).code(),
            "failed_precondition"
        );
        assert_eq!(
            AppError::Store(StoreError::DataCorruption("x".to_string())).code(),
            "internal"
        );
        assert_eq!(AppError::BadRequest("x".to_string()).code(), "invalid_argument");
    }
}
