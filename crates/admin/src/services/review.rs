//! Review coordinator: the maker-checker workflow entry points.
//!
//! Every operation resolves the caller first, then runs inside a single
//! store transaction. The ledger transition and the adapter's side effect
//! commit together; any error drops the transaction and leaves the entry
//! `pending` with the live entity untouched.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use karat_core::{ActionType, AdminUid, ApprovalId, ApprovalStatus, Decision, Permission};

use crate::db::{DocumentStore, Transaction};
use crate::models::{AdminIdentity, ApprovalFilter, ApprovalRecord, NewApproval};

use super::adapters::{AdapterRegistry, EntityAdapter};
use super::{ApprovalLedger, IdentityResolver, WorkflowError};

/// Review note recorded when a super-admin's own submission is applied.
pub const DIRECT_APPLY_NOTE: &str = "applied directly by super admin";

/// Tunable workflow rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowPolicy {
    /// Maximum number of banners.
    pub banner_limit: u64,
    /// Refuse a proposal while another one for the same entity is pending.
    pub single_pending_per_entity: bool,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            banner_limit: super::adapters::banner::DEFAULT_BANNER_LIMIT,
            single_pending_per_entity: true,
        }
    }
}

/// Result of submitting a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalOutcome {
    pub approval_id: ApprovalId,
    pub status: ApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// Result of reviewing a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub approval_id: ApprovalId,
    pub decision: Decision,
}

/// Orchestrates proposals and reviews across the ledger and adapters.
#[derive(Clone)]
pub struct ReviewCoordinator {
    store: Arc<dyn DocumentStore>,
    identities: IdentityResolver,
    ledger: ApprovalLedger,
    adapters: AdapterRegistry,
    policy: WorkflowPolicy,
}

impl ReviewCoordinator {
    /// Coordinator with the standard adapters.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, policy: WorkflowPolicy) -> Self {
        let adapters = AdapterRegistry::standard(policy.banner_limit);
        Self::with_adapters(store, adapters, policy)
    }

    #[must_use]
    pub fn with_adapters(
        store: Arc<dyn DocumentStore>,
        adapters: AdapterRegistry,
        policy: WorkflowPolicy,
    ) -> Self {
        Self {
            identities: IdentityResolver::new(Arc::clone(&store)),
            ledger: ApprovalLedger::new(Arc::clone(&store)),
            store,
            adapters,
            policy,
        }
    }

    #[must_use]
    pub const fn identities(&self) -> &IdentityResolver {
        &self.identities
    }

    #[must_use]
    pub const fn ledger(&self) -> &ApprovalLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn policy(&self) -> WorkflowPolicy {
        self.policy
    }

    /// Submit a proposal.
    ///
    /// Proposals from roles that require review are recorded `pending`.
    /// A super-admin's proposal is recorded and approved in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` / `PermissionDenied` from identity resolution, or
    ///   if the caller lacks the capability for the entity type
    /// - `InvalidArgument` for an illegal action or malformed payload
    /// - `NotFound` if the targeted live entity does not exist
    /// - `FailedPrecondition` if another proposal for the entity is pending
    ///   or the banner cap is already reached
    #[instrument(
        skip(self, proposal),
        fields(entity_type = %proposal.entity_type, action = %proposal.action_type)
    )]
    pub async fn propose(
        &self,
        caller: Option<&AdminUid>,
        mut proposal: NewApproval,
    ) -> Result<ProposalOutcome, WorkflowError> {
        let submitter = self.identities.resolve(caller).await?;
        let permission = proposal.entity_type.required_permission();
        if !submitter.has_permission(permission) {
            return Err(WorkflowError::PermissionDenied(format!(
                "{} lacks {permission}",
                submitter.uid
            )));
        }

        if !proposal.entity_type.supports(proposal.action_type) {
            return Err(WorkflowError::InvalidArgument(format!(
                "{} is not a valid action for {}",
                proposal.action_type, proposal.entity_type
            )));
        }
        if proposal.action_type == ActionType::Create && proposal.entity_id.is_some() {
            return Err(WorkflowError::InvalidArgument(
                "create proposals must not carry an entityId".to_string(),
            ));
        }

        let adapter = self.adapters.get(proposal.entity_type)?;
        if proposal.entity_id.is_none()
            && let Some(default_id) = adapter.default_entity_id()
        {
            proposal.entity_id = Some(default_id.to_owned());
        }

        let mut tx = self.store.begin().await?;

        if self.policy.single_pending_per_entity
            && let Some(entity_id) = proposal.entity_id.as_deref()
            && let Some(existing) = self
                .ledger
                .find_pending_for(tx.as_mut(), proposal.entity_type, entity_id)
                .await?
        {
            return Err(WorkflowError::FailedPrecondition(format!(
                "{} {entity_id} already has pending approval {}",
                proposal.entity_type, existing.id
            )));
        }

        adapter.prepare(tx.as_mut(), &mut proposal, &submitter).await?;
        let mut record = self.ledger.submit(tx.as_mut(), proposal, &submitter).await?;

        if !submitter.requires_review() {
            record = self
                .decide(
                    tx.as_mut(),
                    adapter,
                    &record,
                    Decision::Approved,
                    &submitter,
                    Some(DIRECT_APPLY_NOTE),
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(approval_id = %record.id, status = %record.status, "Proposal submitted");
        Ok(ProposalOutcome {
            approval_id: record.id,
            status: record.status,
            entity_id: record.entity_id,
        })
    }

    /// Approve or reject a pending proposal.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` / `PermissionDenied` if the caller is not an
    ///   active super-admin (checked before the entry is looked up)
    /// - `NotFound` if the entry or the live entity it targets is missing
    /// - `FailedPrecondition` if the entry was already decided or the
    ///   banner cap would be exceeded
    /// - `Internal` if no adapter handles the entry
    #[instrument(skip_all, fields(approval_id = %approval_id, decision = %decision))]
    pub async fn review(
        &self,
        caller: Option<&AdminUid>,
        approval_id: &ApprovalId,
        decision: Decision,
        note: Option<&str>,
    ) -> Result<ReviewOutcome, WorkflowError> {
        let reviewer = self.identities.resolve(caller).await?;
        if !reviewer.role.can_review() {
            return Err(WorkflowError::PermissionDenied(format!(
                "{} ({}) cannot review proposals",
                reviewer.uid, reviewer.role
            )));
        }

        let mut tx = self.store.begin().await?;
        let record = self.ledger.load(tx.as_mut(), approval_id).await?;
        if record.status != ApprovalStatus::Pending {
            return Err(WorkflowError::FailedPrecondition(format!(
                "approval {approval_id} is already {}",
                record.status
            )));
        }

        let adapter = self.adapters.get(record.entity_type)?;
        self.decide(tx.as_mut(), adapter, &record, decision, &reviewer, note)
            .await?;
        tx.commit().await?;

        tracing::info!(reviewer = %reviewer.uid, "Proposal reviewed");
        Ok(ReviewOutcome {
            approval_id: approval_id.clone(),
            decision,
        })
    }

    /// List proposals, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` / `PermissionDenied` if the caller may not
    /// view proposals, or a store error.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        caller: Option<&AdminUid>,
        filter: ApprovalFilter,
        limit: Option<usize>,
    ) -> Result<Vec<ApprovalRecord>, WorkflowError> {
        self.viewer(caller).await?;
        self.ledger.list(filter, limit).await
    }

    /// Count pending proposals.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` / `PermissionDenied` if the caller may not
    /// view proposals, or a store error.
    #[instrument(skip(self))]
    pub async fn count_pending(&self, caller: Option<&AdminUid>) -> Result<u64, WorkflowError> {
        self.viewer(caller).await?;
        self.ledger.count_pending().await
    }

    /// Read one proposal.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such proposal, `Unauthenticated` /
    /// `PermissionDenied` if the caller may not view proposals, or a store
    /// error.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        caller: Option<&AdminUid>,
        approval_id: &ApprovalId,
    ) -> Result<ApprovalRecord, WorkflowError> {
        self.viewer(caller).await?;
        self.ledger
            .get(approval_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("approval {approval_id}")))
    }

    async fn viewer(&self, caller: Option<&AdminUid>) -> Result<AdminIdentity, WorkflowError> {
        let identity = self.identities.resolve(caller).await?;
        if !identity.has_permission(Permission::ViewApprovals) {
            return Err(WorkflowError::PermissionDenied(format!(
                "{} lacks {}",
                identity.uid,
                Permission::ViewApprovals
            )));
        }
        Ok(identity)
    }

    /// Run the adapter side of a decision, then record it in the ledger.
    async fn decide(
        &self,
        tx: &mut dyn Transaction,
        adapter: &dyn EntityAdapter,
        record: &ApprovalRecord,
        decision: Decision,
        reviewer: &AdminIdentity,
        note: Option<&str>,
    ) -> Result<ApprovalRecord, WorkflowError> {
        let materialized = match decision {
            Decision::Approved => adapter.apply_approved(tx, record, reviewer).await?,
            Decision::Rejected => {
                adapter.apply_rejected(tx, record).await?;
                None
            }
        };

        self.ledger
            .transition(tx, &record.id, decision, reviewer, note, materialized)
            .await
    }
}
