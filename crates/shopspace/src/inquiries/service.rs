use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::domain::{
    Inquiry, InquiryChanges, InquiryDraft, InquiryId, InquiryStatus, InquiryValidationError,
    NewInquiry,
};
use crate::clock::Clock;
use crate::listings::{BulkFailure, BulkOutcome, Listing};
use crate::store::{SharedStore, StoreError};

/// Admin inbox filter. Both parts are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InquiryFilter {
    #[serde(default)]
    pub status: Option<InquiryStatus>,
    #[serde(default, rename = "q")]
    pub search: Option<String>,
}

impl InquiryFilter {
    fn admits(&self, inquiry: &Inquiry, needle: Option<&str>) -> bool {
        if self.status.is_some_and(|status| status != inquiry.status) {
            return false;
        }
        needle.map_or(true, |needle| {
            [&inquiry.name, &inquiry.phone, &inquiry.message]
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InquiryCounts {
    pub total: usize,
    pub new: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl InquiryCounts {
    pub fn tally(inquiries: &[Inquiry]) -> Self {
        inquiries
            .iter()
            .fold(Self::default(), |mut counts, inquiry| {
                counts.total += 1;
                match inquiry.status {
                    InquiryStatus::New => counts.new += 1,
                    InquiryStatus::InProgress => counts.in_progress += 1,
                    InquiryStatus::Completed => counts.completed += 1,
                }
                counts
            })
    }
}

pub struct InquiryService {
    store: SharedStore<Inquiry>,
    listings: SharedStore<Listing>,
    clock: Arc<dyn Clock>,
}

impl InquiryService {
    pub fn new(
        store: SharedStore<Inquiry>,
        listings: SharedStore<Listing>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            listings,
            clock,
        }
    }

    /// Public submission. Inquiries may only reference live listings.
    pub async fn submit(&self, draft: InquiryDraft) -> Result<Inquiry, InquiryServiceError> {
        let validated = NewInquiry::try_from(draft)?;
        if let Some(listing_id) = validated.listing_id() {
            let listing = self.listings.fetch(&listing_id).await?;
            if !listing.is_some_and(|listing| listing.is_live()) {
                return Err(InquiryValidationError::UnavailableListing(listing_id).into());
            }
        }

        let stored = self
            .store
            .insert(validated.into_inquiry(self.clock.now()))
            .await?;
        info!(inquiry_id = %stored.id, listing_id = ?stored.listing_id, "inquiry received");
        Ok(stored)
    }

    /// Inbox rows matching `filter`, newest first.
    pub async fn list(&self, filter: &InquiryFilter) -> Result<Vec<Inquiry>, InquiryServiceError> {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);

        let mut inquiries: Vec<Inquiry> = self
            .store
            .fetch_all()
            .await?
            .into_iter()
            .filter(|inquiry| filter.admits(inquiry, needle.as_deref()))
            .collect();
        inquiries.sort_by_key(|inquiry| std::cmp::Reverse(created_or_epoch(inquiry)));
        Ok(inquiries)
    }

    pub async fn counts(&self) -> Result<InquiryCounts, InquiryServiceError> {
        let inquiries = self.store.fetch_all().await?;
        Ok(InquiryCounts::tally(&inquiries))
    }

    pub async fn get(&self, id: &InquiryId) -> Result<Inquiry, InquiryServiceError> {
        self.store
            .fetch(id)
            .await?
            .ok_or(InquiryServiceError::NotFound(*id))
    }

    pub async fn update(
        &self,
        id: &InquiryId,
        changes: InquiryChanges,
    ) -> Result<Inquiry, InquiryServiceError> {
        let patch = changes.into_patch(self.clock.now())?;
        let stored = self
            .store
            .update(id, &patch)
            .await
            .map_err(|err| not_found_or(err, *id))?;
        info!(inquiry_id = %id, status = %stored.status, "inquiry updated");
        Ok(stored)
    }

    pub async fn delete(&self, id: &InquiryId) -> Result<(), InquiryServiceError> {
        self.store
            .delete(id)
            .await
            .map_err(|err| not_found_or(err, *id))?;
        info!(inquiry_id = %id, "inquiry deleted");
        Ok(())
    }

    /// Deletes each id independently; failures do not undo earlier deletions.
    pub async fn bulk_delete(&self, ids: &[InquiryId]) -> BulkOutcome<InquiryId> {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            match self.delete(id).await {
                Ok(()) => outcome.succeeded.push(*id),
                Err(err) => {
                    if err.is_outage() {
                        error!(inquiry_id = %id, error = %err, "bulk inquiry delete hit a store outage");
                    } else {
                        warn!(inquiry_id = %id, error = %err, "bulk inquiry delete failed");
                    }
                    outcome.failed.push(BulkFailure {
                        id: *id,
                        reason: err.operator_message(),
                    });
                }
            }
        }
        outcome
    }
}

fn created_or_epoch(inquiry: &Inquiry) -> DateTime<Utc> {
    inquiry.created_at.unwrap_or(DateTime::UNIX_EPOCH)
}

fn not_found_or(err: StoreError, id: InquiryId) -> InquiryServiceError {
    match err {
        StoreError::NotFound => InquiryServiceError::NotFound(id),
        other => other.into(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InquiryServiceError {
    #[error(transparent)]
    Validation(#[from] InquiryValidationError),
    #[error("inquiry {0} not found")]
    NotFound(InquiryId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) const STORE_UNAVAILABLE_MESSAGE: &str =
    "the inquiry store is unavailable, please try again";

impl InquiryServiceError {
    pub fn is_outage(&self) -> bool {
        matches!(self, InquiryServiceError::Store(StoreError::Unavailable(_)))
    }

    pub fn operator_message(&self) -> String {
        if self.is_outage() {
            STORE_UNAVAILABLE_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}
