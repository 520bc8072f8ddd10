use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};

use super::catalog::{count_by_tab, filter_for_tab, ListingQuery, ListingTab};
use super::domain::{
    Listing, ListingChanges, ListingDraft, ListingId, ListingPatch, ListingStatus,
    ListingValidationError, NewListing,
};
use super::export::{write_csv, ExportError};
use super::lifecycle::{
    transition, InvalidStateError, LifecycleAction, LifecycleState, Transition,
};
use super::views::{BulkFailure, BulkOutcome, ListingOverview, ListingRow, PublicListing};
use crate::access::ActorId;
use crate::clock::Clock;
use crate::store::{SharedStore, StoreError};

/// Bulk actions offered on the admin table's selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BulkAction {
    SetStatus { status: ListingStatus },
    SoftDelete,
    Restore,
    Purge,
}

impl BulkAction {
    fn for_actor(&self, actor: &ActorId) -> LifecycleAction {
        match self {
            BulkAction::SetStatus { status } => LifecycleAction::SetStatus(*status),
            BulkAction::SoftDelete => LifecycleAction::SoftDelete {
                actor: actor.clone(),
            },
            BulkAction::Restore => LifecycleAction::Restore,
            BulkAction::Purge => LifecycleAction::Purge,
        }
    }
}

/// Service composing the listing store with the lifecycle policy and catalog.
///
/// Every call re-reads the store; nothing is cached between requests.
pub struct ListingService {
    store: SharedStore<Listing>,
    clock: Arc<dyn Clock>,
}

impl ListingService {
    pub fn new(store: SharedStore<Listing>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Tab counts plus the filtered table for the requested tab.
    pub async fn overview(&self, query: &ListingQuery) -> Result<ListingOverview, ListingServiceError> {
        let listings = self.store.fetch_all().await?;
        let now = self.clock.now();
        let items = filter_for_tab(&listings, query)
            .into_iter()
            .map(|listing| ListingRow::new(listing, now))
            .collect();

        Ok(ListingOverview {
            tab: query.tab,
            counts: count_by_tab(&listings),
            items,
            generated_at: now,
        })
    }

    /// Trashed listings ordered by how soon they fall out of the retention window.
    pub async fn purge_queue(&self) -> Result<Vec<ListingRow>, ListingServiceError> {
        let listings = self.store.fetch_all().await?;
        let now = self.clock.now();
        let mut rows: Vec<ListingRow> = listings
            .into_iter()
            .filter(Listing::is_trashed)
            .map(|listing| ListingRow::new(listing, now))
            .collect();
        rows.sort_by_key(|row| row.days_until_purge);
        Ok(rows)
    }

    pub async fn get(&self, id: &ListingId) -> Result<Listing, ListingServiceError> {
        self.store
            .fetch(id)
            .await?
            .ok_or(ListingServiceError::NotFound(*id))
    }

    pub async fn row(&self, id: &ListingId) -> Result<ListingRow, ListingServiceError> {
        let listing = self.get(id).await?;
        Ok(ListingRow::new(listing, self.clock.now()))
    }

    /// Create a listing from operator input. New listings start live and pending.
    pub async fn create(&self, draft: ListingDraft) -> Result<Listing, ListingServiceError> {
        let validated = NewListing::try_from(draft)?;
        let existing = self.store.fetch_all().await?;
        let next_number = existing
            .iter()
            .map(|listing| listing.listing_number)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or(ListingServiceError::NumbersExhausted)?;

        let listing = validated.into_listing(next_number, self.clock.now());
        let stored = self.store.insert(listing).await?;
        info!(listing_id = %stored.id, listing_number = stored.listing_number, "listing created");
        Ok(stored)
    }

    /// Edit descriptive fields of a live listing.
    pub async fn edit(
        &self,
        id: &ListingId,
        changes: ListingChanges,
    ) -> Result<Listing, ListingServiceError> {
        let patch = changes.into_patch(self.clock.now())?;
        let current = self.get(id).await?;
        if current.is_trashed() {
            return Err(InvalidStateError::new(&current, "edit").into());
        }
        self.write_patch(id, &patch).await
    }

    /// Apply a lifecycle action, persisting only the fields the transition changed.
    ///
    /// Returns the updated listing, or `None` when the record was purged.
    pub async fn apply(
        &self,
        id: &ListingId,
        action: LifecycleAction,
    ) -> Result<Option<Listing>, ListingServiceError> {
        let current = self.get(id).await?;
        let label = action.label();

        match transition(&current, action, self.clock.now())? {
            Transition::Updated { patch, .. } => {
                let stored = self.write_patch(id, &patch).await?;
                info!(listing_id = %id, action = label, state = %LifecycleState::of(&stored), "listing transitioned");
                Ok(Some(stored))
            }
            Transition::Purged(purged) => {
                self.store.delete(&purged).await.map_err(|err| match err {
                    StoreError::NotFound => ListingServiceError::NotFound(purged),
                    other => other.into(),
                })?;
                info!(listing_id = %purged, "listing purged");
                Ok(None)
            }
        }
    }

    pub async fn set_status(
        &self,
        id: &ListingId,
        status: ListingStatus,
    ) -> Result<Listing, ListingServiceError> {
        self.apply(id, LifecycleAction::SetStatus(status))
            .await?
            .ok_or(ListingServiceError::NotFound(*id))
    }

    pub async fn soft_delete(
        &self,
        id: &ListingId,
        actor: ActorId,
    ) -> Result<Listing, ListingServiceError> {
        self.apply(id, LifecycleAction::SoftDelete { actor })
            .await?
            .ok_or(ListingServiceError::NotFound(*id))
    }

    pub async fn restore(&self, id: &ListingId) -> Result<Listing, ListingServiceError> {
        self.apply(id, LifecycleAction::Restore)
            .await?
            .ok_or(ListingServiceError::NotFound(*id))
    }

    pub async fn purge(&self, id: &ListingId) -> Result<(), ListingServiceError> {
        self.apply(id, LifecycleAction::Purge).await.map(|_| ())
    }

    /// Run `action` once per id, independently. Earlier successes stand if later ids fail.
    pub async fn bulk(&self, action: &BulkAction, ids: &[ListingId], actor: &ActorId) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            match self.apply(id, action.for_actor(actor)).await {
                Ok(_) => outcome.succeeded.push(*id),
                Err(err) => {
                    if err.is_outage() {
                        error!(listing_id = %id, error = %err, "bulk listing action hit a store outage");
                    } else {
                        warn!(listing_id = %id, error = %err, "bulk listing action failed");
                    }
                    outcome.failed.push(BulkFailure {
                        id: *id,
                        reason: err.operator_message(),
                    });
                }
            }
        }

        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            actor = %actor,
            "bulk listing action finished"
        );
        outcome
    }

    /// CSV rendering of the table the operator is currently looking at.
    pub async fn export_csv(&self, query: &ListingQuery) -> Result<Vec<u8>, ListingServiceError> {
        let overview = self.overview(query).await?;
        Ok(write_csv(&overview.items)?)
    }

    /// Live, active listings for the public browse page.
    pub async fn browse(&self, query: &ListingQuery) -> Result<Vec<PublicListing>, ListingServiceError> {
        let listings = self.store.fetch_all().await?;
        let public_query = ListingQuery {
            tab: ListingTab::Active,
            ..query.clone()
        };
        Ok(filter_for_tab(&listings, &public_query)
            .into_iter()
            .map(PublicListing::from)
            .collect())
    }

    /// Public detail page. Counts the view; trashed, pending, and hidden listings are not found.
    pub async fn view(&self, id: &ListingId) -> Result<PublicListing, ListingServiceError> {
        let listing = self.get(id).await?;
        if listing.is_trashed() || !listing.status.is_public() {
            return Err(ListingServiceError::NotFound(*id));
        }

        let patch = ListingPatch {
            view_count: Some(listing.view_count.unwrap_or(0).saturating_add(1)),
            ..ListingPatch::default()
        };
        let stored = self.write_patch(id, &patch).await?;
        Ok(PublicListing::from(stored))
    }

    async fn write_patch(
        &self,
        id: &ListingId,
        patch: &ListingPatch,
    ) -> Result<Listing, ListingServiceError> {
        self.store.update(id, patch).await.map_err(|err| match err {
            StoreError::NotFound => ListingServiceError::NotFound(*id),
            other => other.into(),
        })
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error("listing {0} not found")]
    NotFound(ListingId),
    #[error(transparent)]
    Validation(#[from] ListingValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("no listing numbers left to assign")]
    NumbersExhausted,
}

pub(crate) const STORE_UNAVAILABLE_MESSAGE: &str =
    "the listing store is unavailable, please try again";

impl ListingServiceError {
    pub fn is_outage(&self) -> bool {
        matches!(self, ListingServiceError::Store(StoreError::Unavailable(_)))
    }

    /// Text shown to the operator. Store outages never expose backend detail.
    pub fn operator_message(&self) -> String {
        if self.is_outage() {
            STORE_UNAVAILABLE_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}
