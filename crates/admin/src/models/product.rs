//! Catalog products and the payloads proposed against them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use karat_core::{AdminUid, MetalType, ProductApprovalStatus, ProductId, ProductStatus};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub metal_type: MetalType,
    /// Purity grade, e.g. `22k` or `925`.
    pub purity: String,
    pub weight_grams: Decimal,
    #[serde(default)]
    pub making_charges: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stone_charges: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub status: ProductStatus,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ProductApprovalStatus>,
    pub created_by: AdminUid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Materialize a proposed product in its non-live placeholder state.
    #[must_use]
    pub fn placeholder(draft: ProductDraft, created_by: AdminUid, now: DateTime<Utc>) -> Self {
        Self {
            id: ProductId::generate(),
            name: draft.name,
            description: draft.description,
            category: draft.category,
            metal_type: draft.metal_type,
            purity: draft.purity,
            weight_grams: draft.weight_grams,
            making_charges: draft.making_charges,
            stone_charges: draft.stone_charges,
            images: draft.images,
            sku: draft.sku,
            status: ProductStatus::PendingApproval,
            is_active: false,
            approval_status: Some(ProductApprovalStatus::PendingApproval),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload of a product `create` proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub metal_type: MetalType,
    pub purity: String,
    pub weight_grams: Decimal,
    #[serde(default)]
    pub making_charges: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stone_charges: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Status the product takes once the proposal is approved.
    #[serde(default)]
    pub original_status: ProductStatus,
}

impl ProductDraft {
    /// Check the draft describes a sellable product.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        require_text("category", &self.category)?;
        require_text("purity", &self.purity)?;
        check_weight(self.weight_grams)?;
        check_charges("makingCharges", Some(self.making_charges))?;
        check_charges("stoneCharges", self.stone_charges)?;

        if !matches!(
            self.original_status,
            ProductStatus::Active | ProductStatus::ComingSoon | ProductStatus::Draft
        ) {
            return Err("originalStatus must be active, coming_soon or draft".to_string());
        }
        Ok(())
    }
}

/// Payload of a product `update` proposal: the fields to change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metal_type: Option<MetalType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_grams: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub making_charges: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stone_charges: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

impl ProductChanges {
    /// Check at least one field changes and every changed field is valid.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem.
    pub fn validate(&self) -> Result<(), String> {
        if *self == Self::default() {
            return Err("update must change at least one field".to_string());
        }
        for (field, value) in [
            ("name", &self.name),
            ("category", &self.category),
            ("purity", &self.purity),
        ] {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }
        if let Some(weight) = self.weight_grams {
            check_weight(weight)?;
        }
        check_charges("makingCharges", self.making_charges)?;
        check_charges("stoneCharges", self.stone_charges)
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

fn check_weight(weight: Decimal) -> Result<(), String> {
    if weight <= Decimal::ZERO {
        return Err(format!("weightGrams must be positive, got {weight}"));
    }
    Ok(())
}

fn check_charges(field: &str, value: Option<Decimal>) -> Result<(), String> {
    match value {
        Some(v) if v < Decimal::ZERO => Err(format!("{field} must not be negative, got {v}")),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn draft(value: serde_json::Value) -> Result<ProductDraft, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_draft_defaults_to_active() {
        let draft = draft(json!({
            "name": "Lakshmi coin pendant",
            "category": "pendants",
            "metalType": "gold",
            "purity": "22k",
            "weightGrams": "8.5",
        }))
        .unwrap();
        assert_eq!(draft.original_status, ProductStatus::Active);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_draft_rejects_unknown_and_missing_fields() {
        assert!(
            draft(json!({
                "name": "Anklet",
                "category": "anklets",
                "metalType": "silver",
                "purity": "925",
                "weightGrams": 12,
                "discount": 10,
            }))
            .is_err()
        );
        assert!(draft(json!({"name": "Anklet"})).is_err());
    }

    #[test]
    fn test_draft_validation() {
        let mut draft = draft(json!({
            "name": "Bangle",
            "category": "bangles",
            "metalType": "gold",
            "purity": "18k",
            "weightGrams": 0,
        }))
        .unwrap();
        assert!(draft.validate().unwrap_err().contains("weightGrams"));

        draft.weight_grams = Decimal::ONE;
        draft.original_status = ProductStatus::Archived;
        assert!(draft.validate().unwrap_err().contains("originalStatus"));
    }

    #[test]
    fn test_changes_must_not_be_empty() {
        assert!(ProductChanges::default().validate().is_err());

        let changes: ProductChanges = serde_json::from_value(json!({"name": "New Name"})).unwrap();
        assert!(changes.validate().is_ok());

        let changes: ProductChanges = serde_json::from_value(json!({"name": "  "})).unwrap();
        assert!(changes.validate().is_err());
    }

    #[test]
    fn test_placeholder_is_not_live() {
        let draft = draft(json!({
            "name": "Solitaire ring",
            "category": "rings",
            "metalType": "platinum",
            "purity": "950",
            "weightGrams": 4,
            "originalStatus": "coming_soon",
        }))
        .unwrap();
        let product = Product::placeholder(draft, AdminUid::new("u1"), Utc::now());
        assert!(!product.is_active);
        assert_eq!(product.status, ProductStatus::PendingApproval);
        assert_eq!(
            product.approval_status,
            Some(ProductApprovalStatus::PendingApproval)
        );
    }
}
