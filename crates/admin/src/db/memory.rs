//! In-process document store.
//!
//! Transactions take the store lock for their whole lifetime and work on a
//! copy of the data, which replaces the shared state on commit. Transactions
//! are therefore fully serialized; this is intended for local runs
//! (`ADMIN_STORE=memory`) and tests, not for production volume.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    Collection, Document, DocumentStore, Fields, Query, StoreError, Transaction, timestamp_field,
};

type Collections = HashMap<Collection, BTreeMap<String, Fields>>;

/// Document store kept in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

fn run_query(data: &Collections, collection: Collection, query: &Query) -> Vec<Document> {
    let mut docs: Vec<Document> = data
        .get(&collection)
        .into_iter()
        .flat_map(BTreeMap::iter)
        .filter(|(_, fields)| query.matches(fields))
        .map(|(id, fields)| Document {
            id: id.clone(),
            fields: fields.clone(),
        })
        .collect();

    if let Some(field) = &query.newest_first {
        // Documents without the timestamp sort last.
        docs.sort_by(|a, b| {
            timestamp_field(&b.fields, field).cmp(&timestamp_field(&a.fields, field))
        });
    }

    if let Some(limit) = query.limit {
        docs.truncate(limit);
    }

    docs
}

fn count_matching(data: &Collections, collection: Collection, query: &Query) -> u64 {
    let count = data
        .get(&collection)
        .map_or(0, |docs| docs.values().filter(|f| query.matches(f)).count());
    u64::try_from(count).unwrap_or(u64::MAX)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let data = self.inner.lock().await;
        Ok(data
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_owned(),
                fields: fields.clone(),
            }))
    }

    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let data = self.inner.lock().await;
        Ok(run_query(&data, collection, query))
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64, StoreError> {
        let data = self.inner.lock().await;
        Ok(count_matching(&data, collection, query))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Transaction over a [`MemoryStore`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Collections>,
    working: Collections,
}

impl MemoryTransaction {
    fn existing(&mut self, collection: Collection, id: &str) -> Result<&mut Fields, StoreError> {
        self.working
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.name(),
                id: id.to_owned(),
            })
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(
        &mut self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .working
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_owned(),
                fields: fields.clone(),
            }))
    }

    async fn query(
        &mut self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(run_query(&self.working, collection, query))
    }

    async fn count(&mut self, collection: Collection, query: &Query) -> Result<u64, StoreError> {
        Ok(count_matching(&self.working, collection, query))
    }

    async fn insert(
        &mut self,
        collection: Collection,
        fields: Fields,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.working
            .entry(collection)
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn set(
        &mut self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.working
            .entry(collection)
            .or_default()
            .insert(id.to_owned(), fields);
        Ok(())
    }

    async fn merge(
        &mut self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let existing = self.existing(collection, id)?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.working
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.name(),
                id: id.to_owned(),
            })
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
