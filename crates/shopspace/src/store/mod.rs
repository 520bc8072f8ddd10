//! Persistent store contract shared by every back-office table.
//!
//! Services only ever see [`Store`]; the concrete backend is picked at startup.

mod hosted;
mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

pub(crate) use hosted::hosted_base;
pub use hosted::HostedStore;
pub use memory::MemoryStore;

/// A row type persisted in a single table.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Clone + Ord + fmt::Display + fmt::Debug + Send + Sync + 'static;
    /// Partial update; absent fields are left untouched by every backend.
    type Patch: Serialize + fmt::Debug + Send + Sync;

    const TABLE: &'static str;

    fn id(&self) -> &Self::Id;
    fn apply(&mut self, patch: &Self::Patch);
}

/// Generic read/write surface of the hosted database.
#[async_trait]
pub trait Store<R: Record>: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<R>, StoreError>;
    async fn fetch(&self, id: &R::Id) -> Result<Option<R>, StoreError>;
    async fn insert(&self, record: R) -> Result<R, StoreError>;
    async fn update(&self, id: &R::Id, patch: &R::Patch) -> Result<R, StoreError>;
    async fn delete(&self, id: &R::Id) -> Result<(), StoreError>;
}

pub type SharedStore<R> = Arc<dyn Store<R>>;

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Distinguishes an absent field from an explicit `null` in a JSON body, so patches
/// can clear nullable columns.
pub(crate) fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
