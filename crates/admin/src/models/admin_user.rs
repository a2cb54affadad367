//! Admin identity as stored in the `admin_users` collection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use karat_core::{AdminUid, Email, Permission};

// Re-export AdminRole from core for convenience
pub use karat_core::AdminRole;

/// A resolved admin identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub uid: AdminUid,
    pub email: Email,
    pub role: AdminRole,
    /// Capability flags granted explicitly. Super-admins hold every flag
    /// regardless of this set.
    pub permissions: BTreeSet<Permission>,
    pub is_active: bool,
}

impl AdminIdentity {
    /// Whether this identity holds `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role == AdminRole::SuperAdmin || self.permissions.contains(&permission)
    }

    /// Whether changes proposed by this identity are held for review.
    #[must_use]
    pub const fn requires_review(&self) -> bool {
        self.role.requires_review()
    }
}

/// Stored form of an admin record.
///
/// Permissions are kept as plain strings so a flag written by a newer
/// console does not make the whole record unreadable.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredAdminUser {
    pub id: AdminUid,
    pub email: Email,
    pub role: AdminRole,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl From<StoredAdminUser> for AdminIdentity {
    fn from(stored: StoredAdminUser) -> Self {
        let permissions = stored
            .permissions
            .iter()
            .filter_map(|flag| match flag.parse::<Permission>() {
                Ok(permission) => Some(permission),
                Err(e) => {
                    tracing::warn!(uid = %stored.id, error = %e, "Ignoring unknown permission");
                    None
                }
            })
            .collect();

        Self {
            uid: stored.id,
            email: stored.email,
            role: stored.role,
            permissions,
            is_active: stored.is_active,
        }
    }
}
