//! Metal rates adapter.
//!
//! There is one rate sheet, `metal_rates/current`. Approving a change
//! snapshots the superseded sheet into `price_history` and merges the new
//! rates in the same transaction. Product prices are recomputed elsewhere.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use karat_core::{ActionType, EntityType, MetalRates, PriceHistoryId};

use crate::db::{Collection, Transaction, to_fields};
use crate::models::{
    AdminIdentity, ApprovalRecord, CURRENT_RATES_ID, NewApproval, PriceHistoryEntry,
    RateChangeRequest,
};
use crate::services::WorkflowError;

use super::{EntityAdapter, parse_payload, timestamp, unsupported};

/// Adapter for the `metal_rates` rate sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetalRatesAdapter;

#[async_trait]
impl EntityAdapter for MetalRatesAdapter {
    fn entity_type(&self) -> EntityType {
        EntityType::MetalRates
    }

    fn default_entity_id(&self) -> Option<&'static str> {
        Some(CURRENT_RATES_ID)
    }

    async fn prepare(
        &self,
        _tx: &mut dyn Transaction,
        proposal: &mut NewApproval,
        _submitter: &AdminIdentity,
    ) -> Result<(), WorkflowError> {
        if proposal.action_type != ActionType::Update {
            return Err(unsupported(EntityType::MetalRates, proposal.action_type));
        }
        match proposal.entity_id.as_deref() {
            None | Some(CURRENT_RATES_ID) => {}
            Some(other) => {
                return Err(WorkflowError::InvalidArgument(format!(
                    "metal rates can only be proposed against '{CURRENT_RATES_ID}', got '{other}'"
                )));
            }
        }

        let request: RateChangeRequest = parse_payload(&proposal.proposed_changes, "metal rates")?;
        request
            .validate()
            .map_err(|e| WorkflowError::InvalidArgument(e.to_string()))?;

        proposal.entity_id = Some(CURRENT_RATES_ID.to_owned());
        proposal.proposed_changes = to_fields(&request)?;
        Ok(())
    }

    async fn apply_approved(
        &self,
        tx: &mut dyn Transaction,
        record: &ApprovalRecord,
        reviewer: &AdminIdentity,
    ) -> Result<Option<String>, WorkflowError> {
        if record.action_type != ActionType::Update {
            return Err(unsupported(EntityType::MetalRates, record.action_type));
        }
        let request: RateChangeRequest = parse_payload(&record.proposed_changes, "metal rates")?;
        let changes = request.rates();
        let now = Utc::now();

        let current = tx.get(Collection::MetalRates, CURRENT_RATES_ID).await?;
        let previous: MetalRates = current
            .as_ref()
            .map(|doc| doc.decode())
            .transpose()?
            .unwrap_or_default();

        let history = PriceHistoryEntry {
            id: PriceHistoryId::generate(),
            previous_rates: previous.clone(),
            new_rates: previous.merged_with(&changes),
            changed_by: record.submitted_by.clone(),
            approved_by: reviewer.uid.clone(),
            approval_id: record.id.clone(),
            recorded_at: now,
        };
        tx.set(
            Collection::PriceHistory,
            history.id.as_str(),
            to_fields(&history)?,
        )
        .await?;

        let mut fields = to_fields(&changes)?;
        if current.is_none() && changes.currency.is_none() {
            fields.insert(
                "currency".to_owned(),
                Value::from(MetalRates::DEFAULT_CURRENCY),
            );
        }
        fields.insert(
            "updatedBy".to_owned(),
            Value::from(record.submitted_by.as_str()),
        );
        fields.insert("approvedBy".to_owned(), Value::from(reviewer.uid.as_str()));
        fields.insert("updatedAt".to_owned(), timestamp(now));
        fields.insert(
            "effectiveFrom".to_owned(),
            timestamp(request.effective_from.unwrap_or(now)),
        );

        if current.is_some() {
            tx.merge(Collection::MetalRates, CURRENT_RATES_ID, fields)
                .await?;
        } else {
            tx.set(Collection::MetalRates, CURRENT_RATES_ID, fields)
                .await?;
        }

        tracing::info!(
            history_id = %history.id,
            currency = history.new_rates.currency_or_default(),
            "Applied metal rate change"
        );
        Ok(None)
    }

    async fn apply_rejected(
        &self,
        _tx: &mut dyn Transaction,
        _record: &ApprovalRecord,
    ) -> Result<(), WorkflowError> {
        Ok(())
    }
}
