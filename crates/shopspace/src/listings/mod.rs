//! Listings: the marketplace items, their live/trashed lifecycle, and the admin table.

pub mod catalog;
pub mod domain;
pub(crate) mod export;
pub mod lifecycle;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use catalog::{
    count_by_tab, filter_for_tab, ListingQuery, ListingTab, LocationFilter, SortField, SortOrder,
    TabCounts,
};
pub use domain::{
    Listing, ListingChanges, ListingDraft, ListingId, ListingPatch, ListingStatus,
    ListingValidationError, NewListing,
};
pub use export::ExportError;
pub use lifecycle::{
    days_until_purge, purge_due_at, transition, InvalidStateError, LifecycleAction,
    LifecycleState, PurgeUrgency, Transition, PURGE_HIGHLIGHT_DAYS, RETENTION_DAYS,
};
pub use router::{admin_listing_router, public_listing_router};
pub use service::{BulkAction, ListingService, ListingServiceError};
pub use views::{BulkFailure, BulkOutcome, ListingOverview, ListingRow, PublicListing};
