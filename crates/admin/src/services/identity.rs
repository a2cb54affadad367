//! Caller identity resolution.

use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use karat_core::AdminUid;

use crate::db::{Collection, DocumentStore, Fields, StoreError};
use crate::models::AdminIdentity;
use crate::models::admin_user::StoredAdminUser;

use super::WorkflowError;

/// Resolves callers against the `admin_users` collection.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn DocumentStore>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Resolve a caller to an active admin identity.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if no caller id was presented
    /// - `PermissionDenied` if the caller has no admin record or is inactive
    #[instrument(skip(self))]
    pub async fn resolve(&self, caller: Option<&AdminUid>) -> Result<AdminIdentity, WorkflowError> {
        let uid = caller.ok_or_else(|| {
            WorkflowError::Unauthenticated("no caller identity presented".to_string())
        })?;

        let doc = self
            .store
            .get(Collection::AdminUsers, uid.as_str())
            .await?
            .ok_or_else(|| WorkflowError::PermissionDenied(format!("{uid} is not an admin")))?;

        let identity: AdminIdentity = doc.decode::<StoredAdminUser>()?.into();
        if !identity.is_active {
            return Err(WorkflowError::PermissionDenied(format!(
                "admin {uid} is deactivated"
            )));
        }

        Ok(identity)
    }

    /// Create or replace an admin record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    #[instrument(skip(self, identity), fields(uid = %identity.uid, role = %identity.role))]
    pub async fn register(&self, identity: &AdminIdentity) -> Result<(), StoreError> {
        let permissions: Vec<Value> = identity
            .permissions
            .iter()
            .map(|p| Value::from(p.as_str()))
            .collect();

        let mut fields = Fields::new();
        fields.insert("email".to_owned(), Value::from(identity.email.as_str()));
        fields.insert("role".to_owned(), Value::from(identity.role.as_str()));
        fields.insert("permissions".to_owned(), Value::Array(permissions));
        fields.insert("isActive".to_owned(), Value::Bool(identity.is_active));

        let mut tx = self.store.begin().await?;
        tx.set(Collection::AdminUsers, identity.uid.as_str(), fields)
            .await?;
        tx.commit().await?;

        tracing::info!("Registered admin identity");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use karat_core::{AdminRole, Email, Permission};

    use super::*;
    use crate::db::MemoryStore;

    fn identity(uid: &str, role: AdminRole, is_active: bool) -> AdminIdentity {
        AdminIdentity {
            uid: AdminUid::new(uid),
            email: Email::parse(&format!("{uid}@karat.example")).unwrap(),
            role,
            permissions: BTreeSet::from([Permission::ManageBanners]),
            is_active,
        }
    }

    #[tokio::test]
    async fn test_resolve() {
        let resolver = IdentityResolver::new(Arc::new(MemoryStore::new()));
        resolver
            .register(&identity("asha", AdminRole::Editor, true))
            .await
            .unwrap();
        resolver
            .register(&identity("gone", AdminRole::Admin, false))
            .await
            .unwrap();

        let resolved = resolver.resolve(Some(&AdminUid::new("asha"))).await.unwrap();
        assert_eq!(resolved, identity("asha", AdminRole::Editor, true));

        assert!(matches!(
            resolver.resolve(None).await,
            Err(WorkflowError::Unauthenticated(_))
        ));
        assert!(matches!(
            resolver.resolve(Some(&AdminUid::new("nobody"))).await,
            Err(WorkflowError::PermissionDenied(_))
        ));
        assert!(matches!(
            resolver.resolve(Some(&AdminUid::new("gone"))).await,
            Err(WorkflowError::PermissionDenied(_))
        ));
    }
}
