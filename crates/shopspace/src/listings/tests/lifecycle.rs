use chrono::Duration;

use super::common::*;
use crate::listings::{
    count_by_tab, filter_for_tab, transition, LifecycleAction, LifecycleState, ListingQuery,
    ListingStatus, ListingTab, TabCounts, Transition,
};

const ALL_TABS: [ListingTab; 6] = [
    ListingTab::All,
    ListingTab::Active,
    ListingTab::Pending,
    ListingTab::Hidden,
    ListingTab::Sold,
    ListingTab::Deleted,
];

#[test]
fn every_listing_is_either_live_or_trashed() {
    let catalog = mixed_catalog();
    let counts = count_by_tab(&catalog);
    assert_eq!(counts.all + counts.deleted, catalog.len());
    assert_eq!(
        counts.active + counts.pending + counts.hidden + counts.sold,
        counts.all
    );
    assert_eq!(counts.deleted, 4);
}

#[test]
fn counts_of_empty_input_are_zero() {
    assert_eq!(count_by_tab(&[]), TabCounts::default());
}

#[test]
fn trashed_listings_appear_only_in_deleted_tab() {
    let catalog = mixed_catalog();
    for tab in ALL_TABS {
        let rows = filter_for_tab(&catalog, &ListingQuery::for_tab(tab));
        let trashed = rows.iter().filter(|listing| listing.is_trashed()).count();
        if tab == ListingTab::Deleted {
            assert_eq!(trashed, rows.len(), "deleted tab holds only trash");
            assert_eq!(rows.len(), 4);
        } else {
            assert_eq!(trashed, 0, "{tab} tab must not show trash");
        }
    }
}

#[test]
fn status_tabs_partition_the_live_set() {
    let catalog = mixed_catalog();
    let counts = count_by_tab(&catalog);
    for tab in ALL_TABS {
        let rows = filter_for_tab(&catalog, &ListingQuery::for_tab(tab));
        let expected = match tab {
            ListingTab::All => counts.all,
            ListingTab::Active => counts.active,
            ListingTab::Pending => counts.pending,
            ListingTab::Hidden => counts.hidden,
            ListingTab::Sold => counts.sold,
            ListingTab::Deleted => counts.deleted,
        };
        assert_eq!(rows.len(), expected, "{tab} tab disagrees with its badge");
    }
}

#[test]
fn filtering_does_not_mutate_input() {
    let catalog = mixed_catalog();
    let before = catalog.clone();
    let _ = filter_for_tab(&catalog, &ListingQuery::for_tab(ListingTab::Deleted));
    assert_eq!(catalog, before);
}

#[test]
fn set_status_twice_equals_once() {
    for status in ListingStatus::ALL {
        let original = listing(1, ListingStatus::Pending);
        let Ok(Transition::Updated { listing: once, .. }) =
            transition(&original, LifecycleAction::SetStatus(status), start())
        else {
            panic!("live listing accepts set_status");
        };
        let Ok(Transition::Updated { listing: twice, .. }) =
            transition(&once, LifecycleAction::SetStatus(status), start())
        else {
            panic!("live listing accepts set_status");
        };
        assert_eq!(once, twice);
    }
}

#[test]
fn soft_delete_then_restore_keeps_status_and_clears_marker() {
    for status in ListingStatus::ALL {
        let original = listing(3, status);
        let Ok(Transition::Updated { listing: deleted, patch }) = transition(
            &original,
            LifecycleAction::SoftDelete { actor: operator() },
            start(),
        ) else {
            panic!("live listing can be trashed");
        };
        assert_eq!(LifecycleState::of(&deleted), LifecycleState::Trashed(status));
        assert_eq!(deleted.deleted_at, Some(start()));
        assert_eq!(deleted.deleted_by, Some(operator()));
        assert_eq!(patch.status, None, "soft delete leaves status untouched");

        let Ok(Transition::Updated { listing: restored, .. }) =
            transition(&deleted, LifecycleAction::Restore, start() + Duration::days(3))
        else {
            panic!("trashed listing can be restored");
        };
        assert_eq!(restored.status, status);
        assert_eq!(restored.deleted_at, None);
        assert_eq!(restored.deleted_by, None);
        assert_eq!(restored, original);
    }
}

#[test]
fn trashed_listings_reject_status_changes() {
    let deleted = trashed(listing(4, ListingStatus::Hidden), start());
    for status in ListingStatus::ALL {
        let err = transition(&deleted, LifecycleAction::SetStatus(status), start())
            .expect_err("status change on trash is invalid");
        assert_eq!(err.state, LifecycleState::Trashed(ListingStatus::Hidden));
        assert_eq!(err.listing_id, deleted.id);
    }
}

#[test]
fn live_listings_cannot_be_restored_or_purged() {
    let live = listing(5, ListingStatus::Active);
    assert!(transition(&live, LifecycleAction::Restore, start()).is_err());
    assert!(transition(&live, LifecycleAction::Purge, start()).is_err());

    let deleted = trashed(listing(6, ListingStatus::Active), start());
    assert!(transition(
        &deleted,
        LifecycleAction::SoftDelete { actor: operator() },
        start()
    )
    .is_err());
}

#[test]
fn purge_is_allowed_before_the_window_ends() {
    let deleted = trashed(listing(8, ListingStatus::Sold), start());
    assert_eq!(
        transition(&deleted, LifecycleAction::Purge, start() + Duration::minutes(1)),
        Ok(Transition::Purged(deleted.id))
    );
}
