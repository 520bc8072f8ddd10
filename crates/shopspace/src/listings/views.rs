use chrono::{DateTime, Utc};
use serde::Serialize;

use super::catalog::{ListingTab, TabCounts};
use super::domain::{Listing, ListingId, ListingStatus};
use super::lifecycle::{days_until_purge, purge_due_at, LifecycleState, PurgeUrgency};

/// One row of the admin listing table, with the retention countdown precomputed.
#[derive(Debug, Clone, Serialize)]
pub struct ListingRow {
    #[serde(flatten)]
    pub listing: Listing,
    pub lifecycle: LifecycleState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_purge: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge_due_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge_urgency: Option<PurgeUrgency>,
}

impl ListingRow {
    pub fn new(listing: Listing, now: DateTime<Utc>) -> Self {
        let days = days_until_purge(listing.deleted_at, now);
        Self {
            lifecycle: LifecycleState::of(&listing),
            days_until_purge: days,
            purge_due_at: listing.deleted_at.map(purge_due_at),
            purge_urgency: days.map(PurgeUrgency::classify),
            listing,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingOverview {
    pub tab: ListingTab,
    pub counts: TabCounts,
    pub items: Vec<ListingRow>,
    pub generated_at: DateTime<Utc>,
}

/// The subset of a listing shown to anonymous visitors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicListing {
    pub id: ListingId,
    pub listing_number: u32,
    pub title: String,
    pub description: String,
    pub province: String,
    pub district: String,
    pub address: Option<String>,
    pub category: Option<String>,
    pub price: Option<u64>,
    pub deposit: Option<u64>,
    pub monthly_rent: Option<u64>,
    pub area_sqm: Option<f64>,
    pub floor: Option<i16>,
    pub image_urls: Vec<String>,
    pub view_count: u64,
    pub status: ListingStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Listing> for PublicListing {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id,
            listing_number: listing.listing_number,
            title: listing.title,
            description: listing.description,
            province: listing.province,
            district: listing.district,
            address: listing.address,
            category: listing.category,
            price: listing.price,
            deposit: listing.deposit,
            monthly_rent: listing.monthly_rent,
            area_sqm: listing.area_sqm,
            floor: listing.floor,
            image_urls: listing.image_urls,
            view_count: listing.view_count.unwrap_or(0),
            status: listing.status,
            created_at: listing.created_at,
        }
    }
}

/// Per-record result of a bulk action. Successful steps are never rolled back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkOutcome<Id = ListingId> {
    pub succeeded: Vec<Id>,
    pub failed: Vec<BulkFailure<Id>>,
}

impl<Id> Default for BulkOutcome<Id> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<Id> BulkOutcome<Id> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure<Id = ListingId> {
    pub id: Id,
    pub reason: String,
}
