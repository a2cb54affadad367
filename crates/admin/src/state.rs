//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::db::DocumentStore;
use crate::services::ReviewCoordinator;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Arc<dyn DocumentStore>,
    coordinator: ReviewCoordinator,
}

impl AppState {
    /// Build state around a document store, wiring the workflow policy from config.
    #[must_use]
    pub fn new(config: AdminConfig, store: Arc<dyn DocumentStore>) -> Self {
        let coordinator = ReviewCoordinator::new(Arc::clone(&store), config.workflow);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                coordinator,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn coordinator(&self) -> &ReviewCoordinator {
        &self.inner.coordinator
    }
}
