//! Admin identity management commands.
//!
//! # Usage
//!
//! ```bash
//! # Register a reviewer
//! karat-cli admin create --uid u-owner --email owner@karat.example --role super_admin
//!
//! # Register an editor who may propose banner and rate changes
//! karat-cli admin create --uid u-asha --email asha@karat.example --role editor \
//!     --permission manage_banners --permission manage_rates --permission view_approvals
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for the admin database

use std::collections::BTreeSet;
use std::sync::Arc;

use karat_admin::db::{PgDocumentStore, StoreError};
use karat_admin::models::AdminIdentity;
use karat_admin::services::IdentityResolver;
use karat_core::{AdminRole, AdminUid, Email, Permission};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, editor")]
    InvalidRole(String),

    /// Invalid permission.
    #[error("Invalid permission: {0}")]
    InvalidPermission(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Invalid uid.
    #[error("Invalid uid: must not be blank")]
    InvalidUid,
}

/// Build an identity from command-line values.
///
/// # Errors
///
/// Returns `AdminError` if the uid, email, role or any permission is invalid.
pub fn build_identity(
    uid: &str,
    email: &str,
    role: &str,
    permissions: &[String],
    inactive: bool,
) -> Result<AdminIdentity, AdminError> {
    let uid = uid.trim();
    if uid.is_empty() {
        return Err(AdminError::InvalidUid);
    }

    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let permissions = permissions
        .iter()
        .map(|p| {
            p.parse::<Permission>()
                .map_err(|_| AdminError::InvalidPermission(p.clone()))
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(AdminIdentity {
        uid: AdminUid::new(uid),
        email,
        role,
        permissions,
        is_active: !inactive,
    })
}

/// Create or replace an admin identity.
///
/// # Errors
///
/// Returns `AdminError` if arguments are invalid or the write fails.
pub async fn create_user(
    uid: &str,
    email: &str,
    role: &str,
    permissions: &[String],
    inactive: bool,
) -> Result<(), AdminError> {
    let identity = build_identity(uid, email, role, permissions, inactive)?;

    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    let pool = karat_admin::db::create_pool(&database_url).await?;
    let resolver = IdentityResolver::new(Arc::new(PgDocumentStore::new(pool)));

    tracing::info!("Registering admin: {} ({})", identity.email, identity.role);
    resolver.register(&identity).await?;

    tracing::info!(
        "Admin registered successfully! UID: {}, Email: {}, Role: {}",
        identity.uid,
        identity.email,
        identity.role
    );
    if identity.role.requires_review() && identity.permissions.is_empty() {
        tracing::warn!("Note: admin has no permissions and cannot propose any change");
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_identity() {
        let identity = build_identity(
            " u-asha ",
            "asha@karat.example",
            "editor",
            &["manage_banners".to_owned(), "view_approvals".to_owned()],
            false,
        )
        .unwrap();
        assert_eq!(identity.uid.as_str(), "u-asha");
        assert_eq!(identity.role, AdminRole::Editor);
        assert!(identity.permissions.contains(&Permission::ManageBanners));
        assert!(identity.is_active);
    }

    #[test]
    fn test_build_identity_rejects_bad_values() {
        assert!(matches!(
            build_identity("u", "a@karat.example", "viewer", &[], false),
            Err(AdminError::InvalidRole(_))
        ));
        assert!(matches!(
            build_identity("u", "not-an-email", "admin", &[], false),
            Err(AdminError::InvalidEmail(_))
        ));
        assert!(matches!(
            build_identity("u", "a@karat.example", "admin", &["fly".to_owned()], false),
            Err(AdminError::InvalidPermission(_))
        ));
        assert!(matches!(
            build_identity("  ", "a@karat.example", "admin", &[], false),
            Err(AdminError::InvalidUid)
        ));
    }
}
