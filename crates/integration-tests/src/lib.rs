//! Integration tests for Karat.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p karat-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `approval_workflow` - End-to-end proposal and review scenarios
//! - `approvals_api` - The axum router driven with `tower::ServiceExt::oneshot`
//!
//! Everything runs against the in-memory document store, so no database is
//! needed.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Router;
use serde::de::DeserializeOwned;
use serde_json::Value;

use karat_admin::config::{AdminConfig, StoreBackend};
use karat_admin::db::{Collection, DocumentStore, Fields, MemoryStore};
use karat_admin::models::AdminIdentity;
use karat_admin::routes;
use karat_admin::services::{ReviewCoordinator, WorkflowPolicy};
use karat_admin::state::AppState;
use karat_core::{AdminRole, AdminUid, Email, Permission};

/// Uid of the seeded super-admin reviewer.
pub const OWNER: &str = "u-owner";
/// Uid of the seeded editor holding every capability.
pub const EDITOR: &str = "u-asha";
/// Uid of the seeded admin holding every capability.
pub const MANAGER: &str = "u-ravi";
/// Uid of the seeded editor with no capabilities.
pub const INTERN: &str = "u-intern";
/// Uid of the seeded, deactivated editor.
pub const FORMER: &str = "u-former";

/// A workflow over a fresh in-memory store with seeded admins.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub coordinator: ReviewCoordinator,
    pub policy: WorkflowPolicy,
}

impl TestContext {
    /// Context with the default workflow policy.
    pub async fn new() -> Self {
        Self::with_policy(WorkflowPolicy::default()).await
    }

    /// Context with a custom workflow policy.
    pub async fn with_policy(policy: WorkflowPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn DocumentStore> = store.clone();
        let coordinator = ReviewCoordinator::new(shared, policy);

        let all = BTreeSet::from(Permission::ALL);
        let seeds = [
            (OWNER, AdminRole::SuperAdmin, BTreeSet::new(), true),
            (EDITOR, AdminRole::Editor, all.clone(), true),
            (MANAGER, AdminRole::Admin, all.clone(), true),
            (INTERN, AdminRole::Editor, BTreeSet::new(), true),
            (FORMER, AdminRole::Editor, all, false),
        ];
        for (uid, role, permissions, is_active) in seeds {
            coordinator
                .identities()
                .register(&AdminIdentity {
                    uid: AdminUid::new(uid),
                    email: Email::parse(&format!(
                        "{}@karat.example",
                        uid.trim_start_matches("u-")
                    ))
                    .unwrap(),
                    role,
                    permissions,
                    is_active,
                })
                .await
                .unwrap();
        }

        Self {
            store,
            coordinator,
            policy,
        }
    }

    /// The axum router over this context's store.
    pub fn router(&self) -> Router {
        let config = AdminConfig {
            store: StoreBackend::Memory,
            database_url: None,
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            workflow: self.policy,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        };
        let store: Arc<dyn DocumentStore> = self.store.clone();
        routes::routes().with_state(AppState::new(config, store))
    }

    /// Read a live document's fields.
    pub async fn fields(&self, collection: Collection, id: &str) -> Option<Fields> {
        self.store
            .get(collection, id)
            .await
            .unwrap()
            .map(|doc| doc.fields)
    }

    /// Read and decode a live document.
    pub async fn decode<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> T {
        self.store
            .get(collection, id)
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: Collection) -> u64 {
        self.store
            .count(collection, &karat_admin::db::Query::new())
            .await
            .unwrap()
    }
}

/// Caller handle for a seeded uid.
pub fn uid(uid: &str) -> AdminUid {
    AdminUid::new(uid)
}

/// Turn a JSON object literal into document fields.
pub fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}
