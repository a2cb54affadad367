//! Approval queue inspection commands.
//!
//! These read the ledger directly with operator privileges; they never
//! decide on proposals. Reviews go through the service so the live entity
//! and the ledger change together.
//!
//! # Usage
//!
//! ```bash
//! karat-cli approvals list --status pending --entity-type banner --limit 20
//! karat-cli approvals pending
//! ```

use std::sync::Arc;

use karat_admin::db::{PgDocumentStore, StoreError};
use karat_admin::models::ApprovalFilter;
use karat_admin::services::{ApprovalLedger, WorkflowError};
use karat_core::{ApprovalStatus, EntityType};
use thiserror::Error;

/// Errors that can occur while reading the queue.
#[derive(Debug, Error)]
pub enum ApprovalsError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidArgument(String),
}

async fn ledger() -> Result<ApprovalLedger, ApprovalsError> {
    let database_url =
        super::database_url().ok_or(ApprovalsError::MissingEnvVar("ADMIN_DATABASE_URL"))?;
    let pool = karat_admin::db::create_pool(&database_url).await?;
    Ok(ApprovalLedger::new(Arc::new(PgDocumentStore::new(pool))))
}

/// Parse the optional `--status` / `--entity-type` flags into a filter.
///
/// # Errors
///
/// Returns `InvalidArgument` if either value is unknown.
pub fn parse_filter(
    status: Option<&str>,
    entity_type: Option<&str>,
) -> Result<ApprovalFilter, ApprovalsError> {
    Ok(ApprovalFilter {
        status: status
            .map(str::parse::<ApprovalStatus>)
            .transpose()
            .map_err(ApprovalsError::InvalidArgument)?,
        entity_type: entity_type
            .map(str::parse::<EntityType>)
            .transpose()
            .map_err(ApprovalsError::InvalidArgument)?,
    })
}

/// Print ledger entries as JSON lines, most recent first.
///
/// # Errors
///
/// Returns `ApprovalsError` if the flags are invalid or the query fails.
pub async fn list(
    status: Option<&str>,
    entity_type: Option<&str>,
    limit: Option<usize>,
) -> Result<(), ApprovalsError> {
    let filter = parse_filter(status, entity_type)?;
    let records = ledger().await?.list(filter, limit).await?;

    tracing::info!("Found {} approval(s)", records.len());
    for record in &records {
        let line = serde_json::to_string(record)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{line}");
        }
    }
    Ok(())
}

/// Print the number of pending proposals.
///
/// # Errors
///
/// Returns `ApprovalsError` if the query fails.
pub async fn pending() -> Result<(), ApprovalsError> {
    let count = ledger().await?.count_pending().await?;
    #[allow(clippy::print_stdout)]
    {
        println!("{count}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        let filter = parse_filter(Some("pending"), Some("metalRates")).unwrap();
        assert_eq!(filter.status, Some(ApprovalStatus::Pending));
        assert_eq!(filter.entity_type, Some(EntityType::MetalRates));

        assert_eq!(parse_filter(None, None).unwrap(), ApprovalFilter::default());
        assert!(matches!(
            parse_filter(Some("closed"), None),
            Err(ApprovalsError::InvalidArgument(_))
        ));
    }
}
