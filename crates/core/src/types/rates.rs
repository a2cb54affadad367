//! Metal rate sheet using decimal arithmetic.
//!
//! Rates are per-gram prices in the sheet's currency. A sheet with some rates
//! unset is used both for the current rate document and for a partial change
//! proposed against it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors raised when validating a rate sheet.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    /// No rate was supplied at all.
    #[error("at least one metal rate must be provided")]
    Empty,
    /// A rate was zero or negative.
    #[error("rate {field} must be positive, got {value}")]
    NotPositive {
        field: &'static str,
        value: Decimal,
    },
    /// The currency code is not a three-letter code.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// Per-gram metal rates.
///
/// Unknown fields are ignored so the current-rates document, which also
/// carries audit stamps, decodes into this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalRates {
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
    /// ISO 4217 currency code. Unset means the store default (`INR`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl MetalRates {
    /// Currency used when a sheet does not name one.
    pub const DEFAULT_CURRENCY: &'static str = "INR";

    fn rates(&self) -> [(&'static str, Option<Decimal>); 5] {
        [
            ("gold24k", self.gold_24k),
            ("gold22k", self.gold_22k),
            ("gold18k", self.gold_18k),
            ("silver", self.silver),
            ("platinum", self.platinum),
        ]
    }

    /// Whether no rate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates().iter().all(|(_, rate)| rate.is_none())
    }

    /// Validate a proposed change: at least one rate, all rates positive,
    /// and a three-letter currency code when one is given.
    ///
    /// # Errors
    ///
    /// Returns the first [`RateError`] found.
    pub fn validate(&self) -> Result<(), RateError> {
        if self.is_empty() {
            return Err(RateError::Empty);
        }

        for (field, rate) in self.rates() {
            if let Some(value) = rate
                && value <= Decimal::ZERO
            {
                return Err(RateError::NotPositive { field, value });
            }
        }

        if let Some(currency) = &self.currency
            && (currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()))
        {
            return Err(RateError::InvalidCurrency(currency.clone()));
        }

        Ok(())
    }

    /// Overlay `changes` onto `self`; rates unset in `changes` keep their
    /// current value.
    #[must_use]
    pub fn merged_with(&self, changes: &Self) -> Self {
        Self {
            gold_24k: changes.gold_24k.or(self.gold_24k),
            gold_22k: changes.gold_22k.or(self.gold_22k),
            gold_18k: changes.gold_18k.or(self.gold_18k),
            silver: changes.silver.or(self.silver),
            platinum: changes.platinum.or(self.platinum),
            currency: changes.currency.clone().or_else(|| self.currency.clone()),
        }
    }

    /// The sheet currency, falling back to [`Self::DEFAULT_CURRENCY`].
    #[must_use]
    pub fn currency_or_default(&self) -> &str {
        self.currency.as_deref().unwrap_or(Self::DEFAULT_CURRENCY)
    }
}
