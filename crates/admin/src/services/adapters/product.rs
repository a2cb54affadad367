//! Product adapter.
//!
//! A `create` proposal materializes the product straight away as an inactive
//! placeholder so it has a durable id; approval brings it live with the
//! status the submitter asked for. `update` proposals mark the live product
//! `pending_update` until reviewed. `archive`/`restore` leave the product
//! alone until approval.
//!
//! Only products whose creation was approved take later proposals. A
//! rejected placeholder stays rejected and inactive for good.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use karat_core::{ActionType, EntityType, ProductApprovalStatus, ProductStatus};

use crate::db::{Collection, Document, Transaction, to_fields};
use crate::models::{
    AdminIdentity, ApprovalRecord, NewApproval, Product, ProductChanges, ProductDraft,
};
use crate::services::WorkflowError;

use super::{EntityAdapter, parse_payload, stamped, target_id, unsupported};

/// Adapter for the `products` collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductAdapter;

/// Lifecycle fields written by the workflow.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductState {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<ProductStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    approval_status: Option<ProductApprovalStatus>,
}

impl ProductState {
    fn marker(approval_status: ProductApprovalStatus) -> Self {
        Self {
            approval_status: Some(approval_status),
            ..Self::default()
        }
    }

    fn live(status: ProductStatus) -> Self {
        Self {
            status: Some(status),
            is_active: Some(status.is_visible()),
            ..Self::default()
        }
    }
}

async fn write_state(
    tx: &mut dyn Transaction,
    id: &str,
    state: &ProductState,
) -> Result<(), WorkflowError> {
    tx.merge(Collection::Products, id, stamped(to_fields(state)?))
        .await?;
    Ok(())
}

async fn existing(tx: &mut dyn Transaction, id: &str) -> Result<Document, WorkflowError> {
    tx.get(Collection::Products, id)
        .await?
        .ok_or_else(|| WorkflowError::NotFound(format!("product {id}")))
}

/// Refuse changes to a product that never made it through creation review.
fn ensure_settled(doc: &Document) -> Result<(), WorkflowError> {
    let status = doc
        .fields
        .get("approvalStatus")
        .cloned()
        .and_then(|value| serde_json::from_value::<ProductApprovalStatus>(value).ok());
    match status {
        Some(ProductApprovalStatus::Rejected) => Err(WorkflowError::FailedPrecondition(format!(
            "product {} was rejected at creation",
            doc.id
        ))),
        Some(ProductApprovalStatus::PendingApproval) => {
            Err(WorkflowError::FailedPrecondition(format!(
                "product {} is still awaiting creation approval",
                doc.id
            )))
        }
        _ => Ok(()),
    }
}

fn proposal_target(proposal: &NewApproval) -> Result<&str, WorkflowError> {
    proposal.entity_id.as_deref().ok_or_else(|| {
        WorkflowError::InvalidArgument(format!(
            "{} proposals require an entityId",
            proposal.action_type
        ))
    })
}

#[async_trait]
impl EntityAdapter for ProductAdapter {
    fn entity_type(&self) -> EntityType {
        EntityType::Product
    }

    async fn prepare(
        &self,
        tx: &mut dyn Transaction,
        proposal: &mut NewApproval,
        submitter: &AdminIdentity,
    ) -> Result<(), WorkflowError> {
        match proposal.action_type {
            ActionType::Create => {
                let draft: ProductDraft = parse_payload(&proposal.proposed_changes, "product")?;
                draft.validate().map_err(WorkflowError::InvalidArgument)?;

                let changes = to_fields(&draft)?;
                let product = Product::placeholder(draft, submitter.uid.clone(), Utc::now());
                tx.set(Collection::Products, product.id.as_str(), to_fields(&product)?)
                    .await?;

                tracing::info!(product_id = %product.id, "Materialized product placeholder");
                proposal.entity_id = Some(product.id.into_inner());
                proposal.proposed_changes = changes;
            }
            ActionType::Update => {
                let changes: ProductChanges =
                    parse_payload(&proposal.proposed_changes, "product update")?;
                changes.validate().map_err(WorkflowError::InvalidArgument)?;

                let id = proposal_target(proposal)?.to_owned();
                ensure_settled(&existing(tx, &id).await?)?;
                write_state(
                    tx,
                    &id,
                    &ProductState::marker(ProductApprovalStatus::PendingUpdate),
                )
                .await?;
                proposal.proposed_changes = to_fields(&changes)?;
            }
            ActionType::Archive | ActionType::Restore => {
                let id = proposal_target(proposal)?.to_owned();
                ensure_settled(&existing(tx, &id).await?)?;
            }
            action => return Err(unsupported(EntityType::Product, action)),
        }
        Ok(())
    }

    async fn apply_approved(
        &self,
        tx: &mut dyn Transaction,
        record: &ApprovalRecord,
        _reviewer: &AdminIdentity,
    ) -> Result<Option<String>, WorkflowError> {
        let id = target_id(record)?;
        let product = existing(tx, id).await?;
        if record.action_type != ActionType::Create {
            ensure_settled(&product)?;
        }

        match record.action_type {
            ActionType::Create => {
                let draft: ProductDraft = parse_payload(&record.proposed_changes, "product")?;
                let state = ProductState {
                    approval_status: Some(ProductApprovalStatus::Approved),
                    ..ProductState::live(draft.original_status)
                };
                write_state(tx, id, &state).await?;
            }
            ActionType::Update => {
                let changes: ProductChanges =
                    parse_payload(&record.proposed_changes, "product update")?;
                let mut fields = to_fields(&changes)?;
                fields.extend(to_fields(&ProductState::marker(
                    ProductApprovalStatus::Approved,
                ))?);
                tx.merge(Collection::Products, id, stamped(fields)).await?;
            }
            ActionType::Archive => {
                write_state(tx, id, &ProductState::live(ProductStatus::Archived)).await?;
            }
            ActionType::Restore => {
                write_state(tx, id, &ProductState::live(ProductStatus::Active)).await?;
            }
            action => return Err(unsupported(EntityType::Product, action)),
        }

        tracing::info!(product_id = id, action = %record.action_type, "Applied product change");
        Ok(None)
    }

    async fn apply_rejected(
        &self,
        tx: &mut dyn Transaction,
        record: &ApprovalRecord,
    ) -> Result<(), WorkflowError> {
        match record.action_type {
            ActionType::Create => {
                let id = target_id(record)?;
                if tx.get(Collection::Products, id).await?.is_none() {
                    tracing::warn!(
                        product_id = id,
                        "Rejected product placeholder no longer exists"
                    );
                    return Ok(());
                }
                // The placeholder stays inactive and is kept for the audit trail.
                write_state(
                    tx,
                    id,
                    &ProductState::marker(ProductApprovalStatus::Rejected),
                )
                .await
            }
            ActionType::Update => {
                let id = target_id(record)?;
                let Some(doc) = tx.get(Collection::Products, id).await? else {
                    tracing::warn!(product_id = id, "Product of rejected update no longer exists");
                    return Ok(());
                };

                // A newer proposal may own the marker by now.
                let pending_update = Value::from("pending_update");
                if doc.fields.get("approvalStatus") != Some(&pending_update) {
                    tracing::debug!(product_id = id, "Update marker already replaced");
                    return Ok(());
                }
                write_state(
                    tx,
                    id,
                    &ProductState::marker(ProductApprovalStatus::Approved),
                )
                .await
            }
            ActionType::Archive | ActionType::Restore => Ok(()),
            action => Err(unsupported(EntityType::Product, action)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use karat_core::{AdminRole, AdminUid, ApprovalId, ApprovalStatus, Email};
    use serde_json::json;

    use super::*;
    use crate::db::{DocumentStore, Fields, MemoryStore};

    fn editor() -> AdminIdentity {
        AdminIdentity {
            uid: AdminUid::new("asha"),
            email: Email::parse("asha@karat.example").unwrap(),
            role: AdminRole::Editor,
            permissions: BTreeSet::new(),
            is_active: true,
        }
    }

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn record(proposal: NewApproval) -> ApprovalRecord {
        ApprovalRecord {
            id: ApprovalId::new("appr-1"),
            entity_type: proposal.entity_type,
            action_type: proposal.action_type,
            entity_id: proposal.entity_id,
            proposed_changes: proposal.proposed_changes,
            status: ApprovalStatus::Pending,
            submitted_by: AdminUid::new("asha"),
            submitted_by_email: Email::parse("asha@karat.example").unwrap(),
            submitted_at: Utc::now(),
            reviewed_by: None,
            reviewed_by_email: None,
            reviewed_at: None,
            review_note: None,
        }
    }

    async fn product_fields(store: &MemoryStore, id: &str) -> Fields {
        store
            .get(Collection::Products, id)
            .await
            .unwrap()
            .unwrap()
            .fields
    }

    #[tokio::test]
    async fn test_create_materializes_placeholder_then_goes_live() {
        let store = Arc::new(MemoryStore::new());
        let mut tx = store.begin().await.unwrap();
        let mut proposal = NewApproval::new(EntityType::Product, ActionType::Create).with_changes(
            fields(json!({
                "name": "Kundan choker",
                "category": "necklaces",
                "metalType": "gold",
                "purity": "22k",
                "weightGrams": "42.5",
                "originalStatus": "coming_soon",
            })),
        );

        ProductAdapter
            .prepare(tx.as_mut(), &mut proposal, &editor())
            .await
            .unwrap();
        let id = proposal.entity_id.clone().unwrap();
        assert_eq!(
            proposal.proposed_changes.get("originalStatus"),
            Some(&json!("coming_soon"))
        );

        let placeholder: Product = tx
            .get(Collection::Products, &id)
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert!(!placeholder.is_active);
        assert_eq!(placeholder.status, ProductStatus::PendingApproval);

        let materialized = ProductAdapter
            .apply_approved(tx.as_mut(), &record(proposal), &editor())
            .await
            .unwrap();
        assert_eq!(materialized, None);
        tx.commit().await.unwrap();

        let live = product_fields(&store, &id).await;
        assert_eq!(live.get("status"), Some(&json!("coming_soon")));
        assert_eq!(live.get("isActive"), Some(&json!(true)));
        assert_eq!(live.get("approvalStatus"), Some(&json!("approved")));
    }

    #[tokio::test]
    async fn test_create_approval_needs_placeholder() {
        let store = Arc::new(MemoryStore::new());
        let mut tx = store.begin().await.unwrap();
        let proposal = NewApproval::new(EntityType::Product, ActionType::Create)
            .with_entity_id("deleted")
            .with_changes(fields(json!({
                "name": "Nath",
                "category": "nose-rings",
                "metalType": "gold",
                "purity": "18k",
                "weightGrams": 2,
            })));

        let err = ProductAdapter
            .apply_approved(tx.as_mut(), &record(proposal), &editor())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rejection_respects_newer_marker() {
        let store = Arc::new(MemoryStore::new());
        let mut tx = store.begin().await.unwrap();
        tx.set(
            Collection::Products,
            "p1",
            fields(json!({"name": "Old", "approvalStatus": "pending_approval"})),
        )
        .await
        .unwrap();

        let proposal = NewApproval::new(EntityType::Product, ActionType::Update)
            .with_entity_id("p1")
            .with_changes(fields(json!({"name": "New"})));
        ProductAdapter
            .apply_rejected(tx.as_mut(), &record(proposal))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let live = product_fields(&store, "p1").await;
        assert_eq!(live.get("approvalStatus"), Some(&json!("pending_approval")));
        assert_eq!(live.get("name"), Some(&json!("Old")));
    }

    #[tokio::test]
    async fn test_update_rejection_skips_missing_product() {
        let store = Arc::new(MemoryStore::new());
        let mut tx = store.begin().await.unwrap();
        let proposal = NewApproval::new(EntityType::Product, ActionType::Update)
            .with_entity_id("gone")
            .with_changes(fields(json!({"name": "New"})));
        assert!(
            ProductAdapter
                .apply_rejected(tx.as_mut(), &record(proposal))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_archive_and_restore_require_product() {
        let store = Arc::new(MemoryStore::new());
        let mut tx = store.begin().await.unwrap();
        let mut proposal =
            NewApproval::new(EntityType::Product, ActionType::Archive).with_entity_id("missing");
        let err = ProductAdapter
            .prepare(tx.as_mut(), &mut proposal, &editor())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));

        tx.set(
            Collection::Products,
            "p2",
            fields(json!({"status": "active", "isActive": true})),
        )
        .await
        .unwrap();
        let archive = record(
            NewApproval::new(EntityType::Product, ActionType::Archive).with_entity_id("p2"),
        );
        ProductAdapter
            .apply_approved(tx.as_mut(), &archive, &editor())
            .await
            .unwrap();
        let doc = tx.get(Collection::Products, "p2").await.unwrap().unwrap();
        assert_eq!(doc.fields.get("status"), Some(&json!("archived")));
        assert_eq!(doc.fields.get("isActive"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn test_rejected_placeholder_cannot_be_restored_at_review() {
        let store = Arc::new(MemoryStore::new());
        let mut tx = store.begin().await.unwrap();
        tx.set(
            Collection::Products,
            "p3",
            fields(json!({
                "status": "pending_approval",
                "isActive": false,
                "approvalStatus": "rejected",
            })),
        )
        .await
        .unwrap();

        let restore = record(
            NewApproval::new(EntityType::Product, ActionType::Restore).with_entity_id("p3"),
        );
        let err = ProductAdapter
            .apply_approved(tx.as_mut(), &restore, &editor())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::FailedPrecondition(_)));

        let doc = tx.get(Collection::Products, "p3").await.unwrap().unwrap();
        assert_eq!(doc.fields.get("isActive"), Some(&json!(false)));
        assert_eq!(doc.fields.get("approvalStatus"), Some(&json!("rejected")));
    }
}
