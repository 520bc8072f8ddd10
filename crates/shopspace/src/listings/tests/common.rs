use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::access::{ActorId, AdminSession};
use crate::clock::FixedClock;
use crate::listings::{Listing, ListingId, ListingPatch, ListingService, ListingStatus};
use crate::store::{MemoryStore, Store, StoreError};

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn operator() -> ActorId {
    ActorId("operator-7".to_string())
}

pub(super) fn session() -> AdminSession {
    AdminSession { actor: operator() }
}

pub(super) fn listing(number: u32, status: ListingStatus) -> Listing {
    Listing {
        id: ListingId::generate(),
        listing_number: number,
        title: format!("매물 {number}"),
        description: String::new(),
        province: "서울".to_string(),
        district: "마포구".to_string(),
        address: None,
        category: Some("상가".to_string()),
        price: Some(10_000 * u64::from(number)),
        deposit: None,
        monthly_rent: None,
        area_sqm: Some(33.0),
        floor: Some(1),
        image_urls: Vec::new(),
        view_count: Some(0),
        status,
        deleted_at: None,
        deleted_by: None,
        created_at: Some(start() - Duration::days(i64::from(number))),
        updated_at: None,
    }
}

pub(super) fn trashed(mut listing: Listing, deleted_at: DateTime<Utc>) -> Listing {
    listing.deleted_at = Some(deleted_at);
    listing.deleted_by = Some(operator());
    listing
}

/// One listing per status, live, followed by one trashed listing per status.
pub(super) fn mixed_catalog() -> Vec<Listing> {
    let mut listings = Vec::new();
    for (offset, status) in ListingStatus::ALL.into_iter().enumerate() {
        listings.push(listing(offset as u32 + 1, status));
    }
    for (offset, status) in ListingStatus::ALL.into_iter().enumerate() {
        listings.push(trashed(
            listing(offset as u32 + 10, status),
            start() - Duration::days(offset as i64),
        ));
    }
    listings
}

pub(super) struct Harness {
    pub(super) service: Arc<ListingService>,
    pub(super) store: Arc<MemoryStore<Listing>>,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn harness(listings: Vec<Listing>) -> Harness {
    let store = Arc::new(MemoryStore::with_records(listings));
    let clock = Arc::new(FixedClock::new(start()));
    let service = Arc::new(ListingService::new(store.clone(), clock.clone()));
    Harness {
        service,
        store,
        clock,
    }
}

/// Store whose every call fails as if the hosted database were unreachable.
pub(super) struct UnavailableStore;

#[async_trait]
impl Store<Listing> for UnavailableStore {
    async fn fetch_all(&self) -> Result<Vec<Listing>, StoreError> {
        Err(unavailable())
    }

    async fn fetch(&self, _id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Err(unavailable())
    }

    async fn insert(&self, _record: Listing) -> Result<Listing, StoreError> {
        Err(unavailable())
    }

    async fn update(&self, _id: &ListingId, _patch: &ListingPatch) -> Result<Listing, StoreError> {
        Err(unavailable())
    }

    async fn delete(&self, _id: &ListingId) -> Result<(), StoreError> {
        Err(unavailable())
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

/// Reads succeed, but writes to the listed ids fail.
pub(super) struct FlakyWrites {
    pub(super) inner: MemoryStore<Listing>,
    pub(super) failing: BTreeSet<ListingId>,
}

#[async_trait]
impl Store<Listing> for FlakyWrites {
    async fn fetch_all(&self) -> Result<Vec<Listing>, StoreError> {
        self.inner.fetch_all().await
    }

    async fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        self.inner.fetch(id).await
    }

    async fn insert(&self, record: Listing) -> Result<Listing, StoreError> {
        self.inner.insert(record).await
    }

    async fn update(&self, id: &ListingId, patch: &ListingPatch) -> Result<Listing, StoreError> {
        if self.failing.contains(id) {
            return Err(unavailable());
        }
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        if self.failing.contains(id) {
            return Err(unavailable());
        }
        self.inner.delete(id).await
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
