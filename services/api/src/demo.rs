use chrono::{DateTime, Duration, Utc};
use clap::Args;
use shopspace::access::ActorId;
use shopspace::clock::{Clock, FixedClock};
use shopspace::error::AppError;
use shopspace::listings::{
    BulkAction, Listing, ListingDraft, ListingQuery, ListingService, ListingStatus, ListingTab,
    PurgeUrgency, RETENTION_DAYS,
};
use shopspace::store::MemoryStore;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Start the walkthrough at this RFC 3339 instant (defaults to now).
    #[arg(long, value_parser = crate::infra::parse_timestamp)]
    pub(crate) start: Option<DateTime<Utc>>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let start = args.start.unwrap_or_else(Utc::now);
    let clock = Arc::new(FixedClock::new(start));
    let service = ListingService::new(Arc::new(MemoryStore::<Listing>::default()), clock.clone());
    let operator = ActorId("demo-operator".to_string());

    println!("Listing lifecycle demo (starting {})", start.format("%Y-%m-%d"));

    let mut created = Vec::new();
    for (title, province) in [("강남 오피스", "서울"), ("서초 오피스", "서울"), ("해운대 카페", "부산")] {
        let listing = service
            .create(ListingDraft {
                title: title.to_string(),
                province: province.to_string(),
                ..ListingDraft::default()
            })
            .await?;
        println!(
            "- Created #{} {} -> {}",
            listing.listing_number, listing.title, listing.status
        );
        created.push(listing);
    }

    let ids: Vec<_> = created.iter().map(|listing| listing.id).collect();
    let outcome = service
        .bulk(
            &BulkAction::SetStatus {
                status: ListingStatus::Active,
            },
            &ids,
            &operator,
        )
        .await;
    println!("- Bulk activated {} listings", outcome.succeeded.len());

    let target = &created[0];
    service.soft_delete(&target.id, operator.clone()).await?;
    println!("- Moved #{} to trash", target.listing_number);
    print_counts(&service).await?;

    for days in [0, 23, RETENTION_DAYS, RETENTION_DAYS + 1] {
        clock.set(start + Duration::days(days));
        let row = service.row(&target.id).await?;
        println!(
            "  day {:>2}: {} days until purge ({})",
            days,
            row.days_until_purge.unwrap_or_default(),
            row.purge_urgency.map(PurgeUrgency::label).unwrap_or("live")
        );
    }

    match service.set_status(&target.id, ListingStatus::Sold).await {
        Ok(_) => println!("- Unexpectedly changed the status of a trashed listing"),
        Err(err) => println!("- Rejected: {err}"),
    }

    let restored = service.restore(&target.id).await?;
    println!(
        "- Restored #{} as {} at {}",
        restored.listing_number,
        restored.status,
        clock.now().format("%Y-%m-%d")
    );

    let mixed = vec![created[1].id, created[2].id];
    service.soft_delete(&created[1].id, operator.clone()).await?;
    let outcome = service.bulk(&BulkAction::Restore, &mixed, &operator).await;
    println!(
        "- Bulk restore: {} succeeded, {} failed",
        outcome.succeeded.len(),
        outcome.failed.len()
    );
    for failure in &outcome.failed {
        println!("    {} -> {}", failure.id, failure.reason);
    }

    service.soft_delete(&created[2].id, operator).await?;
    service.purge(&created[2].id).await?;
    println!("- Purged #{} permanently", created[2].listing_number);
    print_counts(&service).await?;
    Ok(())
}

async fn print_counts(service: &ListingService) -> Result<(), AppError> {
    let overview = service
        .overview(&ListingQuery::for_tab(ListingTab::Deleted))
        .await?;
    let counts = overview.counts;
    println!(
        "  tabs: all {} | active {} | pending {} | hidden {} | sold {} | trash {}",
        counts.all, counts.active, counts.pending, counts.hidden, counts.sold, counts.deleted
    );
    Ok(())
}
