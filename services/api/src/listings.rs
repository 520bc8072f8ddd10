use crate::infra::{build_stores, parse_timestamp};
use chrono::{DateTime, Utc};
use clap::Args;
use shopspace::clock::FixedClock;
use shopspace::config::{AppConfig, StoreConfig};
use shopspace::error::AppError;
use shopspace::listings::{
    ListingQuery, ListingRow, ListingService, ListingTab, LocationFilter, PurgeUrgency,
    RETENTION_DAYS,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Where listing commands read from, and at which instant countdowns are evaluated.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct SourceArgs {
    /// Evaluate purge countdowns at this RFC 3339 instant instead of now
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Seed the in-memory store with demo listings first
    #[arg(long)]
    pub(crate) demo: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct TrashReportArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Include listings that are not yet close to purge
    #[arg(long)]
    pub(crate) all: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Table tab to export: all, active, pending, hidden, sold, deleted (or trash)
    #[arg(long, default_value = "all")]
    pub(crate) tab: ListingTab,
    /// Only rows whose title or listing number contains this text
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Only rows in this province
    #[arg(long)]
    pub(crate) province: Option<String>,
    /// Write the CSV here instead of stdout
    #[arg(long, short)]
    pub(crate) out: Option<PathBuf>,
}

impl ExportArgs {
    fn query(&self) -> ListingQuery {
        ListingQuery {
            tab: self.tab,
            search: self.search.clone(),
            location: LocationFilter::from(self.province.clone().unwrap_or_default()),
            ..ListingQuery::default()
        }
    }
}

struct OpenedListings {
    service: ListingService,
    now: DateTime<Utc>,
    origin: &'static str,
}

fn open_listings(source: &SourceArgs) -> Result<OpenedListings, AppError> {
    let config = AppConfig::load()?;
    let now = source.now.unwrap_or_else(Utc::now);
    let client = reqwest::Client::builder().build()?;
    let seed = source.demo || config.seed_demo;
    let stores = build_stores(&config.store, &client, seed, now);
    let origin = match config.store {
        StoreConfig::Hosted(_) => "hosted store",
        StoreConfig::Memory if seed => "demo data",
        StoreConfig::Memory => "empty in-memory store",
    };

    Ok(OpenedListings {
        service: ListingService::new(stores.listings, Arc::new(FixedClock::new(now))),
        now,
        origin,
    })
}

pub(crate) async fn run_trash_report(args: TrashReportArgs) -> Result<(), AppError> {
    let opened = open_listings(&args.source)?;
    let queue = opened.service.purge_queue().await?;

    println!(
        "Trash report ({}, evaluated {})",
        opened.origin,
        opened.now.format("%Y-%m-%d %H:%M UTC")
    );
    println!("Retention window: {RETENTION_DAYS} days");
    render_trash_rows(&queue, args.all);
    Ok(())
}

pub(crate) async fn run_listing_export(args: ExportArgs) -> Result<(), AppError> {
    let opened = open_listings(&args.source)?;
    let bytes = opened.service.export_csv(&args.query()).await?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &bytes)?;
            eprintln!(
                "Exported the {} tab from {} to {}",
                args.tab,
                opened.origin,
                path.display()
            );
        }
        None => std::io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}

fn render_trash_rows(rows: &[ListingRow], all: bool) {
    if rows.is_empty() {
        println!("- Trash is empty");
        return;
    }

    let due = rows
        .iter()
        .filter(|row| row.purge_urgency == Some(PurgeUrgency::Due))
        .count();
    let imminent = rows
        .iter()
        .filter(|row| row.purge_urgency == Some(PurgeUrgency::Imminent))
        .count();
    println!(
        "- {} trashed | {} due for purge | {} within the highlight window",
        rows.len(),
        due,
        imminent
    );

    for row in rows {
        let urgency = row.purge_urgency.unwrap_or(PurgeUrgency::Scheduled);
        if !all && !urgency.is_highlighted() {
            continue;
        }
        let countdown = countdown_label(row.days_until_purge.unwrap_or_default());
        let deleted_by = row
            .listing
            .deleted_by
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  - #{} {} [{}] {} (deleted by {}, was {})",
            row.listing.listing_number,
            row.listing.title,
            urgency.label(),
            countdown,
            deleted_by,
            row.listing.status
        );
    }
}

fn countdown_label(days: i64) -> String {
    match days {
        1 => "1 day left".to_string(),
        days if days > 1 => format!("{days} days left"),
        0 => "due today".to_string(),
        -1 => "overdue by 1 day".to_string(),
        days => format!("overdue by {} days", -days),
    }
}
