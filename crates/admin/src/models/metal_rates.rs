//! Metal rate changes and their audit trail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use karat_core::{AdminUid, ApprovalId, MetalRates, PriceHistoryId, RateError};

/// Id of the single rate-sheet document in `metal_rates`.
pub const CURRENT_RATES_ID: &str = "current";

/// Payload of a `metalRates` update proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RateChangeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_24k: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_22k: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_18k: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silver: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platinum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// When the new rates take effect. Defaults to the approval time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<DateTime<Utc>>,
}

impl RateChangeRequest {
    /// The proposed rates, without the effective date.
    #[must_use]
    pub fn rates(&self) -> MetalRates {
        MetalRates {
            gold_24k: self.gold_24k,
            gold_22k: self.gold_22k,
            gold_18k: self.gold_18k,
            silver: self.silver,
            platinum: self.platinum,
            currency: self.currency.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns the first [`RateError`] in the proposed rates.
    pub fn validate(&self) -> Result<(), RateError> {
        self.rates().validate()
    }
}

/// Snapshot of superseded rates, written when a rate change is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub id: PriceHistoryId,
    pub previous_rates: MetalRates,
    pub new_rates: MetalRates,
    /// Who proposed the change.
    pub changed_by: AdminUid,
    pub approved_by: AdminUid,
    pub approval_id: ApprovalId,
    pub recorded_at: DateTime<Utc>,
}
