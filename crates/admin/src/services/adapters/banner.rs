//! Banner adapter.
//!
//! Banners are only materialized on approval, so rejections need no
//! cleanup. The number of banners is capped; the cap is enforced when a
//! create is approved and checked early when one is proposed.
//!
//! The cap counts every stored banner, active or not. An `update` can flip
//! `isActive` back on without passing through a create approval, so an
//! inactive banner still holds its slot.

use async_trait::async_trait;
use chrono::Utc;

use karat_core::{ActionType, BannerId, EntityType};

use crate::db::{Collection, Query, Transaction, to_fields};
use crate::models::{
    AdminIdentity, ApprovalRecord, Banner, BannerChanges, BannerDraft, NewApproval,
};
use crate::services::WorkflowError;

use super::{EntityAdapter, parse_payload, stamped, target_id, unsupported};

/// Default number of banners allowed at once.
pub const DEFAULT_BANNER_LIMIT: u64 = 5;

/// Adapter for the `banners` collection.
#[derive(Debug, Clone, Copy)]
pub struct BannerAdapter {
    limit: u64,
}

impl Default for BannerAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_BANNER_LIMIT)
    }
}

impl BannerAdapter {
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self { limit }
    }

    async fn check_capacity(&self, tx: &mut dyn Transaction) -> Result<(), WorkflowError> {
        let count = tx.count(Collection::Banners, &Query::new()).await?;
        if count >= self.limit {
            return Err(WorkflowError::FailedPrecondition(format!(
                "banner limit reached ({count} of {})",
                self.limit
            )));
        }
        Ok(())
    }
}

async fn require_banner(tx: &mut dyn Transaction, id: &str) -> Result<(), WorkflowError> {
    match tx.get(Collection::Banners, id).await? {
        Some(_) => Ok(()),
        None => Err(WorkflowError::NotFound(format!("banner {id}"))),
    }
}

#[async_trait]
impl EntityAdapter for BannerAdapter {
    fn entity_type(&self) -> EntityType {
        EntityType::Banner
    }

    async fn prepare(
        &self,
        tx: &mut dyn Transaction,
        proposal: &mut NewApproval,
        _submitter: &AdminIdentity,
    ) -> Result<(), WorkflowError> {
        match proposal.action_type {
            ActionType::Create => {
                let draft: BannerDraft = parse_payload(&proposal.proposed_changes, "banner")?;
                draft.validate().map_err(WorkflowError::InvalidArgument)?;
                self.check_capacity(tx).await?;
                proposal.proposed_changes = to_fields(&draft)?;
            }
            ActionType::Update => {
                let changes: BannerChanges =
                    parse_payload(&proposal.proposed_changes, "banner update")?;
                changes.validate().map_err(WorkflowError::InvalidArgument)?;
                if let Some(id) = proposal.entity_id.as_deref() {
                    require_banner(tx, id).await?;
                }
                proposal.proposed_changes = to_fields(&changes)?;
            }
            ActionType::Delete => {
                if let Some(id) = proposal.entity_id.as_deref() {
                    require_banner(tx, id).await?;
                }
            }
            action => return Err(unsupported(EntityType::Banner, action)),
        }
        Ok(())
    }

    async fn apply_approved(
        &self,
        tx: &mut dyn Transaction,
        record: &ApprovalRecord,
        _reviewer: &AdminIdentity,
    ) -> Result<Option<String>, WorkflowError> {
        match record.action_type {
            ActionType::Create => {
                // Other banners may have gone live since the proposal.
                self.check_capacity(tx).await?;
                let draft: BannerDraft = parse_payload(&record.proposed_changes, "banner")?;
                let banner = Banner::from_draft(BannerId::generate(), draft, Utc::now());
                tx.set(Collection::Banners, banner.id.as_str(), to_fields(&banner)?)
                    .await?;

                tracing::info!(banner_id = %banner.id, "Created banner");
                Ok(Some(banner.id.into_inner()))
            }
            ActionType::Update => {
                let id = target_id(record)?;
                require_banner(tx, id).await?;
                let changes: BannerChanges =
                    parse_payload(&record.proposed_changes, "banner update")?;
                tx.merge(Collection::Banners, id, stamped(to_fields(&changes)?))
                    .await?;
                Ok(None)
            }
            ActionType::Delete => {
                let id = target_id(record)?;
                require_banner(tx, id).await?;
                tx.delete(Collection::Banners, id).await?;
                tracing::info!(banner_id = id, "Deleted banner");
                Ok(None)
            }
            action => Err(unsupported(EntityType::Banner, action)),
        }
    }

    async fn apply_rejected(
        &self,
        _tx: &mut dyn Transaction,
        _record: &ApprovalRecord,
    ) -> Result<(), WorkflowError> {
        Ok(())
    }
}
