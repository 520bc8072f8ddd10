//! Tab counts and the filtered, sorted listing table shown to operators.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Listing, ListingStatus};

/// Tabs of the admin listing table. `Deleted` is the trash view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingTab {
    #[default]
    All,
    Active,
    Pending,
    Hidden,
    Sold,
    #[serde(alias = "trash")]
    Deleted,
}

impl ListingTab {
    pub const fn label(self) -> &'static str {
        match self {
            ListingTab::All => "all",
            ListingTab::Active => "active",
            ListingTab::Pending => "pending",
            ListingTab::Hidden => "hidden",
            ListingTab::Sold => "sold",
            ListingTab::Deleted => "deleted",
        }
    }

    fn status(self) -> Option<ListingStatus> {
        match self {
            ListingTab::Active => Some(ListingStatus::Active),
            ListingTab::Pending => Some(ListingStatus::Pending),
            ListingTab::Hidden => Some(ListingStatus::Hidden),
            ListingTab::Sold => Some(ListingStatus::Sold),
            ListingTab::All | ListingTab::Deleted => None,
        }
    }

    pub fn admits(self, listing: &Listing) -> bool {
        match self {
            ListingTab::Deleted => listing.is_trashed(),
            ListingTab::All => listing.is_live(),
            tab => listing.is_live() && tab.status() == Some(listing.status),
        }
    }
}

impl fmt::Display for ListingTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ListingTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "hidden" => Ok(Self::Hidden),
            "sold" => Ok(Self::Sold),
            "deleted" | "trash" => Ok(Self::Deleted),
            other => Err(format!("unknown listing tab '{other}'")),
        }
    }
}

/// Per-tab badge counts. `all` counts live listings only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TabCounts {
    pub all: usize,
    pub active: usize,
    pub pending: usize,
    pub hidden: usize,
    pub sold: usize,
    pub deleted: usize,
}

pub fn count_by_tab(listings: &[Listing]) -> TabCounts {
    listings
        .iter()
        .fold(TabCounts::default(), |mut counts, listing| {
            if listing.is_trashed() {
                counts.deleted += 1;
                return counts;
            }
            counts.all += 1;
            match listing.status {
                ListingStatus::Active => counts.active += 1,
                ListingStatus::Pending => counts.pending += 1,
                ListingStatus::Hidden => counts.hidden += 1,
                ListingStatus::Sold => counts.sold += 1,
            }
            counts
        })
}

/// Province filter; the literal `"all"` (or an empty value) disables it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationFilter {
    #[default]
    All,
    Province(String),
}

impl LocationFilter {
    pub fn admits(&self, listing: &Listing) -> bool {
        match self {
            LocationFilter::All => true,
            LocationFilter::Province(province) => listing.province == *province,
        }
    }
}

impl From<String> for LocationFilter {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Province(trimmed.to_string())
        }
    }
}

impl From<LocationFilter> for String {
    fn from(value: LocationFilter) -> Self {
        match value {
            LocationFilter::All => "all".to_string(),
            LocationFilter::Province(province) => province,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
    ViewCount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Everything the listing table needs to narrow and order the fetched rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub tab: ListingTab,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub location: LocationFilter,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

impl ListingQuery {
    pub fn for_tab(tab: ListingTab) -> Self {
        Self {
            tab,
            ..Self::default()
        }
    }

    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase)
    }
}

fn matches_search(listing: &Listing, needle: &str) -> bool {
    listing.title.to_lowercase().contains(needle)
        || listing.listing_number.to_string().contains(needle)
}

fn compare(a: &Listing, b: &Listing, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => {
            let epoch = DateTime::<Utc>::UNIX_EPOCH;
            a.created_at
                .unwrap_or(epoch)
                .cmp(&b.created_at.unwrap_or(epoch))
        }
        SortField::Price => a.price.unwrap_or(0).cmp(&b.price.unwrap_or(0)),
        SortField::ViewCount => a.view_count.unwrap_or(0).cmp(&b.view_count.unwrap_or(0)),
    }
}

/// Rows of `tab` matching the search and location filters, in the requested order.
///
/// There is no secondary sort key: rows that compare equal keep their fetch order.
pub fn filter_for_tab(listings: &[Listing], query: &ListingQuery) -> Vec<Listing> {
    let needle = query.needle();
    let mut rows: Vec<Listing> = listings
        .iter()
        .filter(|listing| query.tab.admits(listing))
        .filter(|listing| {
            needle
                .as_deref()
                .map_or(true, |needle| matches_search(listing, needle))
        })
        .filter(|listing| query.location.admits(listing))
        .cloned()
        .collect();

    rows.sort_by(|a, b| match query.order {
        SortOrder::Asc => compare(a, b, query.sort),
        SortOrder::Desc => compare(b, a, query.sort),
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::ListingId;

    fn listing(number: u32, title: &str, province: &str) -> Listing {
        Listing {
            id: ListingId::generate(),
            listing_number: number,
            title: title.to_string(),
            description: String::new(),
            province: province.to_string(),
            district: String::new(),
            address: None,
            category: None,
            price: None,
            deposit: None,
            monthly_rent: None,
            area_sqm: None,
            floor: None,
            image_urls: Vec::new(),
            view_count: None,
            status: ListingStatus::Active,
            deleted_at: None,
            deleted_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn query_deserializes_from_url_strings() {
        let query: ListingQuery =
            serde_json::from_value(serde_json::json!({
                "tab": "deleted",
                "location": "all",
                "sort": "view_count",
                "order": "asc"
            }))
            .expect("query parses");
        assert_eq!(query.tab, ListingTab::Deleted);
        assert_eq!(query.location, LocationFilter::All);
        assert_eq!(query.sort, SortField::ViewCount);
        assert_eq!(query.order, SortOrder::Asc);
    }

    #[test]
    fn search_matches_listing_number() {
        let rows = vec![listing(1042, "역삼 카페", "서울"), listing(77, "판교 사무실", "경기")];
        let query = ListingQuery {
            search: Some("104".to_string()),
            ..ListingQuery::default()
        };
        let found = filter_for_tab(&rows, &query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].listing_number, 1042);
    }

    #[test]
    fn search_is_case_insensitive() {
        let rows = vec![listing(1, "Gangnam Office", "서울"), listing(2, "Seocho Shop", "서울")];
        let query = ListingQuery {
            search: Some("  gANGNAM ".to_string()),
            ..ListingQuery::default()
        };
        let found = filter_for_tab(&rows, &query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Gangnam Office");
    }

    #[test]
    fn location_filter_is_exact() {
        let rows = vec![listing(1, "a", "서울"), listing(2, "b", "서울특별시")];
        let query = ListingQuery {
            location: LocationFilter::from("서울".to_string()),
            ..ListingQuery::default()
        };
        let found = filter_for_tab(&rows, &query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].listing_number, 1);
    }

    #[test]
    fn missing_dates_sort_as_epoch() {
        let mut dated = listing(1, "dated", "서울");
        dated.created_at = Some(Utc::now());
        let undated = listing(2, "undated", "서울");
        let rows = vec![dated, undated];

        let newest_first = filter_for_tab(&rows, &ListingQuery::default());
        assert_eq!(newest_first[0].listing_number, 1);

        let oldest_first = filter_for_tab(
            &rows,
            &ListingQuery {
                order: SortOrder::Asc,
                ..ListingQuery::default()
            },
        );
        assert_eq!(oldest_first[0].listing_number, 2);
    }

    #[test]
    fn tab_parses_trash_alias() {
        assert_eq!("trash".parse::<ListingTab>(), Ok(ListingTab::Deleted));
        assert!("archived".parse::<ListingTab>().is_err());
    }
}
