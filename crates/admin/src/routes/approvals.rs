//! Approval workflow API handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use karat_core::{ApprovalId, ApprovalStatus, Decision, EntityType};

use crate::{
    error::AppError,
    middleware::Caller,
    models::{ApprovalFilter, ApprovalRecord, NewApproval},
    services::{ProposalOutcome, ReviewOutcome},
    state::AppState,
};

/// Build the approvals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/approvals", post(submit).get(list))
        .route("/api/approvals/pending-count", get(pending_count))
        .route("/api/approvals/{id}", get(show))
        .route("/api/approvals/{id}/review", post(review))
}

/// Query parameters for listing proposals.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<ApprovalStatus>,
    pub entity_type: Option<EntityType>,
    pub limit: Option<usize>,
}

/// Request body for a review decision.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewRequest {
    pub decision: Decision,
    #[serde(default)]
    pub note: Option<String>,
}

/// Response for the pending counter.
#[derive(Debug, Serialize)]
pub struct PendingCountResponse {
    pub count: u64,
}

/// Submit a proposal.
///
/// # Errors
///
/// Returns an error if the body is malformed or the workflow refuses the
/// proposal.
pub async fn submit(
    caller: Caller,
    State(state): State<AppState>,
    body: Result<Json<NewApproval>, JsonRejection>,
) -> Result<(StatusCode, Json<ProposalOutcome>), AppError> {
    let Json(proposal) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let outcome = state.coordinator().propose(caller.uid(), proposal).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// List proposals, most recent first.
///
/// # Errors
///
/// Returns an error if the query is malformed, the caller may not view
/// proposals, or the store fails.
pub async fn list(
    caller: Caller,
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<ApprovalRecord>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let filter = ApprovalFilter {
        status: params.status,
        entity_type: params.entity_type,
    };
    let records = state
        .coordinator()
        .list(caller.uid(), filter, params.limit)
        .await?;
    Ok(Json(records))
}

/// Count pending proposals.
///
/// # Errors
///
/// Returns an error if the caller may not view proposals or the store fails.
pub async fn pending_count(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<PendingCountResponse>, AppError> {
    let count = state.coordinator().count_pending(caller.uid()).await?;
    Ok(Json(PendingCountResponse { count }))
}

/// Read one proposal.
///
/// # Errors
///
/// Returns an error if the proposal does not exist or the caller may not view
/// proposals.
pub async fn show(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApprovalRecord>, AppError> {
    let record = state
        .coordinator()
        .get(caller.uid(), &ApprovalId::new(id))
        .await?;
    Ok(Json(record))
}

/// Approve or reject a pending proposal.
///
/// # Errors
///
/// Returns an error if the body is malformed, the caller is not a reviewer,
/// the proposal is missing or already decided, or applying it fails.
pub async fn review(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<ReviewOutcome>, AppError> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let outcome = state
        .coordinator()
        .review(
            caller.uid(),
            &ApprovalId::new(id),
            request.decision,
            request.note.as_deref(),
        )
        .await?;
    Ok(Json(outcome))
}
