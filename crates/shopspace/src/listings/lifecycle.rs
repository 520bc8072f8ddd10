//! Listing lifecycle: the live/trashed state machine and the advisory retention window.
//!
//! ```text
//! Live(s) --set_status(s')--> Live(s')
//! Live(s) --soft_delete-----> Trashed(s)
//! Trashed(s) --restore------> Live(s)
//! Trashed(s) --purge--------> (record destroyed)
//! ```
//!
//! Nothing here performs I/O; the service persists the returned patch.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Listing, ListingId, ListingPatch, ListingStatus};
use crate::access::ActorId;

/// Days a trashed listing is kept before it is flagged as due for purge.
pub const RETENTION_DAYS: i64 = 30;
/// Countdowns at or below this many days are highlighted to operators.
pub const PURGE_HIGHLIGHT_DAYS: i64 = 7;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum LifecycleState {
    Live(ListingStatus),
    /// Carries the status the listing had when it was deleted.
    Trashed(ListingStatus),
}

impl LifecycleState {
    pub fn of(listing: &Listing) -> Self {
        if listing.is_live() {
            Self::Live(listing.status)
        } else {
            Self::Trashed(listing.status)
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Live(status) => write!(f, "live ({status})"),
            LifecycleState::Trashed(status) => write!(f, "trashed (was {status})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    SetStatus(ListingStatus),
    SoftDelete { actor: ActorId },
    Restore,
    Purge,
}

impl LifecycleAction {
    pub const fn label(&self) -> &'static str {
        match self {
            LifecycleAction::SetStatus(_) => "change the status of",
            LifecycleAction::SoftDelete { .. } => "delete",
            LifecycleAction::Restore => "restore",
            LifecycleAction::Purge => "permanently delete",
        }
    }
}

/// Result of a permitted transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The listing survives; `patch` names exactly the columns that changed.
    Updated { listing: Listing, patch: ListingPatch },
    /// The record must be removed from the store.
    Purged(ListingId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} listing {listing_id} while it is {state}")]
pub struct InvalidStateError {
    pub listing_id: ListingId,
    pub action: &'static str,
    pub state: LifecycleState,
}

impl InvalidStateError {
    pub(crate) fn new(listing: &Listing, action: &'static str) -> Self {
        Self {
            listing_id: listing.id,
            action,
            state: LifecycleState::of(listing),
        }
    }
}

pub fn transition(
    listing: &Listing,
    action: LifecycleAction,
    now: DateTime<Utc>,
) -> Result<Transition, InvalidStateError> {
    let state = LifecycleState::of(listing);
    let patch = match (state, &action) {
        (LifecycleState::Live(_), LifecycleAction::SetStatus(status)) => ListingPatch {
            status: Some(*status),
            ..ListingPatch::default()
        },
        (LifecycleState::Live(_), LifecycleAction::SoftDelete { actor }) => ListingPatch {
            deleted_at: Some(Some(now)),
            deleted_by: Some(Some(actor.clone())),
            ..ListingPatch::default()
        },
        (LifecycleState::Trashed(_), LifecycleAction::Restore) => ListingPatch {
            deleted_at: Some(None),
            deleted_by: Some(None),
            ..ListingPatch::default()
        },
        (LifecycleState::Trashed(_), LifecycleAction::Purge) => {
            return Ok(Transition::Purged(listing.id));
        }
        _ => return Err(InvalidStateError::new(listing, action.label())),
    };

    let mut next = listing.clone();
    patch.apply_to(&mut next);
    Ok(Transition::Updated {
        listing: next,
        patch,
    })
}

/// Instant after which a listing trashed at `deleted_at` is due for purge.
///
/// Saturates at the latest representable instant for out-of-range stored timestamps.
pub fn purge_due_at(deleted_at: DateTime<Utc>) -> DateTime<Utc> {
    deleted_at
        .checked_add_signed(Duration::days(RETENTION_DAYS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whole days left in the retention window, rounded up. `None` for live listings.
///
/// Zero or negative values mean the listing is already eligible for purge.
pub fn days_until_purge(deleted_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let remaining = (purge_due_at(deleted_at?) - now).num_milliseconds();
    Some(-(-remaining).div_euclid(MILLIS_PER_DAY))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeUrgency {
    /// The retention window has elapsed.
    Due,
    /// Within the highlight threshold.
    Imminent,
    Scheduled,
}

impl PurgeUrgency {
    pub fn classify(days_left: i64) -> Self {
        if days_left <= 0 {
            Self::Due
        } else if days_left <= PURGE_HIGHLIGHT_DAYS {
            Self::Imminent
        } else {
            Self::Scheduled
        }
    }

    pub const fn is_highlighted(self) -> bool {
        !matches!(self, PurgeUrgency::Scheduled)
    }

    pub const fn label(self) -> &'static str {
        match self {
            PurgeUrgency::Due => "due",
            PurgeUrgency::Imminent => "imminent",
            PurgeUrgency::Scheduled => "scheduled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn deleted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn countdown_starts_at_retention_window() {
        let d = deleted_at();
        assert_eq!(days_until_purge(Some(d), d), Some(30));
        assert_eq!(days_until_purge(Some(d), d + Duration::days(30)), Some(0));
        assert!(days_until_purge(Some(d), d + Duration::days(31)).expect("trashed") < 0);
    }

    #[test]
    fn countdown_rounds_partial_days_up() {
        let d = deleted_at();
        assert_eq!(days_until_purge(Some(d), d + Duration::hours(1)), Some(30));
        assert_eq!(
            days_until_purge(Some(d), d + Duration::days(30) - Duration::milliseconds(1)),
            Some(1)
        );
        assert_eq!(
            days_until_purge(Some(d), d + Duration::days(30) + Duration::hours(23)),
            Some(0)
        );
        assert_eq!(
            days_until_purge(Some(d), d + Duration::days(32) + Duration::hours(1)),
            Some(-2)
        );
    }

    #[test]
    fn far_future_deletion_saturates_instead_of_overflowing() {
        let far = DateTime::<Utc>::MAX_UTC - Duration::days(1);
        assert_eq!(purge_due_at(far), DateTime::<Utc>::MAX_UTC);
        assert!(days_until_purge(Some(far), deleted_at()).expect("trashed") > RETENTION_DAYS);
    }

    #[test]
    fn live_listings_have_no_countdown() {
        assert_eq!(days_until_purge(None, deleted_at()), None);
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(PurgeUrgency::classify(-3), PurgeUrgency::Due);
        assert_eq!(PurgeUrgency::classify(0), PurgeUrgency::Due);
        assert_eq!(PurgeUrgency::classify(1), PurgeUrgency::Imminent);
        assert_eq!(PurgeUrgency::classify(7), PurgeUrgency::Imminent);
        assert_eq!(PurgeUrgency::classify(8), PurgeUrgency::Scheduled);
        assert!(PurgeUrgency::Due.is_highlighted());
        assert!(!PurgeUrgency::Scheduled.is_highlighted());
    }
}
