//! Workflow error taxonomy.

use thiserror::Error;

use crate::db::StoreError;

/// Errors raised by workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No caller identity was presented.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller lacks the role or capability, or is deactivated.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The proposal is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A ledger entry or live entity is missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is not allowed in the current state.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// An invariant of the workflow itself was violated.
    #[error("internal error: {0}")]
    Internal(String),

    /// The document store failed.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl WorkflowError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::PermissionDenied(_) => "permission_denied",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::FailedPrecondition(_) => "failed_precondition",
            Self::Internal(_) | Self::Store(_) => "internal",
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => Self::NotFound(format!("{collection}/{id}")),
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_document_maps_to_not_found() {
        let err: WorkflowError = StoreError::NotFound {
            collection: "banners",
            id: "b9".to_string(),
        }
        .into();
        assert!(matches!(err, WorkflowError::NotFound(ref what) if what == "banners/b9"));
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn test_store_failures_are_internal() {
        let err: WorkflowError = StoreError::DataCorruption("bad".to_string()).into();
        assert!(matches!(err, WorkflowError::Store(_)));
        assert_eq!(err.code(), "internal");
    }
}
