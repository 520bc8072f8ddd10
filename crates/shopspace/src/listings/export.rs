use chrono::{DateTime, Utc};
use serde::Serialize;

use super::views::ListingRow;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode listing csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush listing csv: {0}")]
    Flush(String),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    listing_number: u32,
    title: &'a str,
    province: &'a str,
    district: &'a str,
    category: Option<&'a str>,
    status: &'static str,
    price: Option<u64>,
    deposit: Option<u64>,
    monthly_rent: Option<u64>,
    area_sqm: Option<f64>,
    view_count: u64,
    created_at: Option<String>,
    deleted_at: Option<String>,
    days_until_purge: Option<i64>,
}

fn timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
}

pub(crate) fn write_csv(rows: &[ListingRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        let listing = &row.listing;
        writer.serialize(CsvRow {
            listing_number: listing.listing_number,
            title: &listing.title,
            province: &listing.province,
            district: &listing.district,
            category: listing.category.as_deref(),
            status: listing.status.label(),
            price: listing.price,
            deposit: listing.deposit,
            monthly_rent: listing.monthly_rent,
            area_sqm: listing.area_sqm,
            view_count: listing.view_count.unwrap_or(0),
            created_at: timestamp(listing.created_at),
            deleted_at: timestamp(listing.deleted_at),
            days_until_purge: row.days_until_purge,
        })?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.to_string()))
}
