//! Entity adapters: per-entity rules for applying proposals.
//!
//! Each governed entity kind has one adapter. The coordinator resolves it
//! through the [`AdapterRegistry`] and never branches on the entity kind
//! itself.

pub mod banner;
pub mod metal_rates;
pub mod product;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use karat_core::{ActionType, EntityType};

use crate::db::{Fields, Transaction};
use crate::models::{AdminIdentity, ApprovalRecord, NewApproval};

use super::WorkflowError;

pub use banner::BannerAdapter;
pub use metal_rates::MetalRatesAdapter;
pub use product::ProductAdapter;

/// Entity-specific half of the workflow.
#[async_trait]
pub trait EntityAdapter: Send + Sync {
    /// Entity kind this adapter governs.
    fn entity_type(&self) -> EntityType;

    /// Entity id used when a proposal names none (singleton entities).
    fn default_entity_id(&self) -> Option<&'static str> {
        None
    }

    /// Validate and narrow a proposal before it is recorded.
    ///
    /// May rewrite `proposed_changes` into its normalized form, materialize a
    /// placeholder entity and set `entity_id`, and set approval markers on
    /// the live entity.
    async fn prepare(
        &self,
        tx: &mut dyn Transaction,
        proposal: &mut NewApproval,
        submitter: &AdminIdentity,
    ) -> Result<(), WorkflowError>;

    /// Apply an approved proposal to the live entity.
    ///
    /// Returns the id of an entity materialized by the approval, if any.
    async fn apply_approved(
        &self,
        tx: &mut dyn Transaction,
        record: &ApprovalRecord,
        reviewer: &AdminIdentity,
    ) -> Result<Option<String>, WorkflowError>;

    /// Clean up after a rejected proposal.
    async fn apply_rejected(
        &self,
        tx: &mut dyn Transaction,
        record: &ApprovalRecord,
    ) -> Result<(), WorkflowError>;
}

/// Adapters keyed by entity kind, built once at startup.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<EntityType, Arc<dyn EntityAdapter>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the product, metal rates and banner adapters.
    #[must_use]
    pub fn standard(banner_limit: u64) -> Self {
        Self::new()
            .with(Arc::new(ProductAdapter))
            .with(Arc::new(MetalRatesAdapter))
            .with(Arc::new(BannerAdapter::new(banner_limit)))
    }

    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn EntityAdapter>) -> Self {
        self.adapters.insert(adapter.entity_type(), adapter);
        self
    }

    /// Look up the adapter for an entity kind.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if no adapter is registered for `entity_type`.
    pub fn get(&self, entity_type: EntityType) -> Result<&dyn EntityAdapter, WorkflowError> {
        self.adapters
            .get(&entity_type)
            .map(|adapter| &**adapter)
            .ok_or_else(|| WorkflowError::Internal(format!("no adapter for {entity_type}")))
    }
}

/// Narrow a loosely typed payload into an adapter's payload type.
pub(crate) fn parse_payload<T: DeserializeOwned>(
    fields: &Fields,
    what: &str,
) -> Result<T, WorkflowError> {
    serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|e| WorkflowError::InvalidArgument(format!("invalid {what} payload: {e}")))
}

/// Error for an action an adapter does not handle.
pub(crate) fn unsupported(entity_type: EntityType, action: ActionType) -> WorkflowError {
    WorkflowError::Internal(format!("{entity_type} adapter cannot handle {action}"))
}

/// Entity id carried by a recorded proposal.
pub(crate) fn target_id(record: &ApprovalRecord) -> Result<&str, WorkflowError> {
    record.entity_id.as_deref().ok_or_else(|| {
        WorkflowError::Internal(format!("approval {} has no entityId", record.id))
    })
}

/// A timestamp in the form stored in documents.
pub(crate) fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Stamp `updatedAt` onto a field map.
pub(crate) fn stamped(mut fields: Fields) -> Fields {
    fields.insert("updatedAt".to_owned(), timestamp(Utc::now()));
    fields
}
