use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Record, Store, StoreError};

/// Process-local table used by tests, the demo command, and the `memory` backend.
pub struct MemoryStore<R: Record> {
    records: Arc<Mutex<BTreeMap<R::Id, R>>>,
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl<R: Record> Clone for MemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<R: Record> MemoryStore<R> {
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.records.lock().expect("store mutex poisoned");
            for record in records {
                guard.insert(record.id().clone(), record);
            }
        }
        store
    }

    pub fn snapshot(&self) -> Vec<R> {
        let guard = self.records.lock().expect("store mutex poisoned");
        guard.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<R: Record> Store<R> for MemoryStore<R> {
    async fn fetch_all(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.snapshot())
    }

    async fn fetch(&self, id: &R::Id) -> Result<Option<R>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn insert(&self, record: R) -> Result<R, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(record.id()) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &R::Id, patch: &R::Patch) -> Result<R, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        record.apply(patch);
        Ok(record.clone())
    }

    async fn delete(&self, id: &R::Id) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
