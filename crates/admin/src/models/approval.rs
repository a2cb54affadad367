//! Ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use karat_core::{ActionType, AdminUid, ApprovalId, ApprovalStatus, Email, EntityType};

use crate::db::{Document, Fields, StoreError};

/// A proposal and its review outcome.
///
/// The review fields are either all unset (`status = pending`) or set
/// together with the terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    pub id: ApprovalId,
    pub entity_type: EntityType,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub proposed_changes: Fields,
    pub status: ApprovalStatus,
    pub submitted_by: AdminUid,
    pub submitted_by_email: Email,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<AdminUid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by_email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
}

impl ApprovalRecord {
    /// Decode a stored ledger entry, checking the review invariant.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataCorruption` if the document does not decode
    /// or its review fields disagree with its status.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let record: Self = doc.decode()?;
        if record.reviewed_by.is_some() != record.status.is_terminal() {
            return Err(StoreError::DataCorruption(format!(
                "approval {} is {} but reviewedBy is {}",
                record.id,
                record.status,
                if record.reviewed_by.is_some() {
                    "set"
                } else {
                    "unset"
                }
            )));
        }
        Ok(record)
    }
}

/// A proposal as submitted, before it enters the ledger.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewApproval {
    pub entity_type: EntityType,
    pub action_type: ActionType,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub proposed_changes: Fields,
}

impl NewApproval {
    #[must_use]
    pub fn new(entity_type: EntityType, action_type: ActionType) -> Self {
        Self {
            entity_type,
            action_type,
            entity_id: None,
            proposed_changes: Fields::new(),
        }
    }

    #[must_use]
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn with_changes(mut self, proposed_changes: Fields) -> Self {
        self.proposed_changes = proposed_changes;
        self
    }
}

/// Filter for listing ledger entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalFilter {
    pub status: Option<ApprovalStatus>,
    pub entity_type: Option<EntityType>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(value: serde_json::Value) -> Document {
        Document {
            id: "appr-1".to_owned(),
            fields: value.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_decode_pending_entry() {
        let doc = document(json!({
            "entityType": "metalRates",
            "actionType": "update",
            "entityId": "current",
            "proposedChanges": {"gold22k": "6550"},
            "status": "pending",
            "submittedBy": "u1",
            "submittedByEmail": "meera@karat.example",
            "submittedAt": "2026-03-01T09:30:00Z",
        }));
        let record = ApprovalRecord::from_document(&doc).unwrap();
        assert_eq!(record.id.as_str(), "appr-1");
        assert_eq!(record.entity_type, EntityType::MetalRates);
        assert_eq!(record.status, ApprovalStatus::Pending);
        assert!(record.reviewed_at.is_none());
    }

    #[test]
    fn test_decode_rejects_broken_review_invariant() {
        let doc = document(json!({
            "entityType": "banner",
            "actionType": "delete",
            "entityId": "b1",
            "status": "approved",
            "submittedBy": "u1",
            "submittedByEmail": "meera@karat.example",
            "submittedAt": "2026-03-01T09:30:00Z",
        }));
        assert!(matches!(
            ApprovalRecord::from_document(&doc),
            Err(StoreError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_new_approval_rejects_unknown_fields() {
        let result = serde_json::from_value::<NewApproval>(json!({
            "entityType": "product",
            "actionType": "archive",
            "entityId": "p1",
            "priority": "high",
        }));
        assert!(result.is_err());
    }
}
