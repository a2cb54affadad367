//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (document store ping)
//!
//! # Approvals (caller identified by x-admin-uid)
//! POST /api/approvals                   - Submit a proposal
//! GET  /api/approvals                   - List proposals (?status=&entityType=&limit=)
//! GET  /api/approvals/pending-count     - Count pending proposals
//! GET  /api/approvals/{id}              - Read one proposal
//! POST /api/approvals/{id}/review       - Approve or reject a proposal
//! ```

pub mod approvals;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the complete admin router (without the tracing and Sentry layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(approvals::router())
}
