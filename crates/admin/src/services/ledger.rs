//! Approval ledger: durable proposals and their state machine.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use karat_core::{ApprovalId, ApprovalStatus, Decision, EntityType};

use crate::db::{Collection, DocumentStore, Query, Transaction, to_fields};
use crate::models::{AdminIdentity, ApprovalFilter, ApprovalRecord, NewApproval};

use super::WorkflowError;

/// Number of entries returned by [`ApprovalLedger::list`] when no limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Upper bound on a single listing.
pub const MAX_LIST_LIMIT: usize = 500;

const SUBMITTED_AT: &str = "submittedAt";

/// Store of ledger entries in the `approvals` collection.
#[derive(Clone)]
pub struct ApprovalLedger {
    store: Arc<dyn DocumentStore>,
}

impl ApprovalLedger {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record a new pending proposal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the action is not legal for the entity
    /// type or a non-create action has no entity id.
    #[instrument(
        skip_all,
        fields(entity_type = %proposal.entity_type, action = %proposal.action_type)
    )]
    pub async fn submit(
        &self,
        tx: &mut dyn Transaction,
        proposal: NewApproval,
        submitter: &AdminIdentity,
    ) -> Result<ApprovalRecord, WorkflowError> {
        check_legal(&proposal)?;

        let record = ApprovalRecord {
            id: ApprovalId::generate(),
            entity_type: proposal.entity_type,
            action_type: proposal.action_type,
            entity_id: proposal.entity_id,
            proposed_changes: proposal.proposed_changes,
            status: ApprovalStatus::Pending,
            submitted_by: submitter.uid.clone(),
            submitted_by_email: submitter.email.clone(),
            submitted_at: Utc::now(),
            reviewed_by: None,
            reviewed_by_email: None,
            reviewed_at: None,
            review_note: None,
        };

        tx.set(Collection::Approvals, record.id.as_str(), to_fields(&record)?)
            .await?;

        tracing::info!(approval_id = %record.id, "Recorded proposal");
        Ok(record)
    }

    /// Load an entry inside a transaction, locking it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no entry with this id.
    pub async fn load(
        &self,
        tx: &mut dyn Transaction,
        id: &ApprovalId,
    ) -> Result<ApprovalRecord, WorkflowError> {
        let doc = tx
            .get(Collection::Approvals, id.as_str())
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("approval {id}")))?;
        Ok(ApprovalRecord::from_document(&doc)?)
    }

    /// Move a pending entry to the terminal status for `decision`.
    ///
    /// `entity_id` fills in the target of a create that was materialized on
    /// approval.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is no entry with this id
    /// - `FailedPrecondition` if the entry was already decided
    #[instrument(skip(self, tx, reviewer, note), fields(reviewer = %reviewer.uid))]
    pub async fn transition(
        &self,
        tx: &mut dyn Transaction,
        id: &ApprovalId,
        decision: Decision,
        reviewer: &AdminIdentity,
        note: Option<&str>,
        entity_id: Option<String>,
    ) -> Result<ApprovalRecord, WorkflowError> {
        let mut record = self.load(tx, id).await?;
        let next = decision.status();
        if !record.status.can_transition_to(next) {
            return Err(WorkflowError::FailedPrecondition(format!(
                "approval {id} is already {}",
                record.status
            )));
        }

        record.status = next;
        record.reviewed_by = Some(reviewer.uid.clone());
        record.reviewed_by_email = Some(reviewer.email.clone());
        record.reviewed_at = Some(Utc::now());
        record.review_note = note.map(str::to_owned);
        if entity_id.is_some() {
            record.entity_id = entity_id;
        }

        tx.set(Collection::Approvals, id.as_str(), to_fields(&record)?)
            .await?;
        Ok(record)
    }

    /// Read one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails or the entry is corrupt.
    pub async fn get(&self, id: &ApprovalId) -> Result<Option<ApprovalRecord>, WorkflowError> {
        let doc = self.store.get(Collection::Approvals, id.as_str()).await?;
        Ok(doc
            .as_ref()
            .map(ApprovalRecord::from_document)
            .transpose()?)
    }

    /// List entries, most recently submitted first.
    ///
    /// `limit` defaults to [`DEFAULT_LIST_LIMIT`] and is clamped to
    /// `1..=MAX_LIST_LIMIT`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails or an entry is corrupt.
    pub async fn list(
        &self,
        filter: ApprovalFilter,
        limit: Option<usize>,
    ) -> Result<Vec<ApprovalRecord>, WorkflowError> {
        let query = filter_query(filter)
            .newest_first(SUBMITTED_AT)
            .limit(clamp_limit(limit));

        let docs = self.store.query(Collection::Approvals, &query).await?;
        docs.iter()
            .map(|doc| ApprovalRecord::from_document(doc).map_err(WorkflowError::from))
            .collect()
    }

    /// Count pending entries without fetching them.
    ///
    /// # Errors
    ///
    /// Returns an error if the store count fails.
    pub async fn count_pending(&self) -> Result<u64, WorkflowError> {
        let query = filter_query(ApprovalFilter {
            status: Some(ApprovalStatus::Pending),
            entity_type: None,
        });
        Ok(self.store.count(Collection::Approvals, &query).await?)
    }

    /// Find a pending entry targeting `(entity_type, entity_id)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails or the entry is corrupt.
    pub async fn find_pending_for(
        &self,
        tx: &mut dyn Transaction,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Option<ApprovalRecord>, WorkflowError> {
        let query = filter_query(ApprovalFilter {
            status: Some(ApprovalStatus::Pending),
            entity_type: Some(entity_type),
        })
        .filter("entityId", entity_id)
        .limit(1);

        let docs = tx.query(Collection::Approvals, &query).await?;
        Ok(docs
            .first()
            .map(ApprovalRecord::from_document)
            .transpose()?)
    }
}

fn check_legal(proposal: &NewApproval) -> Result<(), WorkflowError> {
    if !proposal.entity_type.supports(proposal.action_type) {
        return Err(WorkflowError::InvalidArgument(format!(
            "{} is not a valid action for {}",
            proposal.action_type, proposal.entity_type
        )));
    }
    if proposal.action_type.requires_entity_id() && proposal.entity_id.is_none() {
        return Err(WorkflowError::InvalidArgument(format!(
            "{} proposals require an entityId",
            proposal.action_type
        )));
    }
    Ok(())
}

fn filter_query(filter: ApprovalFilter) -> Query {
    let mut query = Query::new();
    if let Some(status) = filter.status {
        query = query.filter("status", Value::from(status.as_str()));
    }
    if let Some(entity_type) = filter.entity_type {
        query = query.filter("entityType", Value::from(entity_type.as_str()));
    }
    query
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}
