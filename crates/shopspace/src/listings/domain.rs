use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::ActorId;
use crate::store::Record;

const MAX_TITLE_CHARS: usize = 120;
const MAX_IMAGES: usize = 20;

/// Opaque identifier of a listing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub Uuid);

impl ListingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ListingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Marketplace classification of a listing. Only meaningful while the listing is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Pending,
    Hidden,
    Sold,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 4] = [
        ListingStatus::Active,
        ListingStatus::Pending,
        ListingStatus::Hidden,
        ListingStatus::Sold,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Pending => "pending",
            ListingStatus::Hidden => "hidden",
            ListingStatus::Sold => "sold",
        }
    }

    /// Whether anonymous visitors may open the listing's detail page.
    pub const fn is_public(self) -> bool {
        matches!(self, ListingStatus::Active | ListingStatus::Sold)
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ListingStatus {
    type Err = ListingValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "hidden" => Ok(Self::Hidden),
            "sold" => Ok(Self::Sold),
            other => Err(ListingValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// A business space offered for sale, as stored in the `listings` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub listing_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub province: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(default)]
    pub deposit: Option<u64>,
    #[serde(default)]
    pub monthly_rent: Option<u64>,
    #[serde(default)]
    pub area_sqm: Option<f64>,
    #[serde(default)]
    pub floor: Option<i16>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    pub status: ListingStatus,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_by: Option<ActorId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Listing {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Record for Listing {
    type Id = ListingId;
    type Patch = ListingPatch;

    const TABLE: &'static str = "listings";

    fn id(&self) -> &ListingId {
        &self.id
    }

    fn apply(&mut self, patch: &ListingPatch) {
        patch.apply_to(self);
    }
}

/// Partial update of a listing row. `None` leaves a column untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_sqm: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<Option<i16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<Option<ActorId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, listing: &mut Listing) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }

        set(&mut listing.title, &self.title);
        set(&mut listing.description, &self.description);
        set(&mut listing.province, &self.province);
        set(&mut listing.district, &self.district);
        set(&mut listing.address, &self.address);
        set(&mut listing.category, &self.category);
        set(&mut listing.price, &self.price);
        set(&mut listing.deposit, &self.deposit);
        set(&mut listing.monthly_rent, &self.monthly_rent);
        set(&mut listing.area_sqm, &self.area_sqm);
        set(&mut listing.floor, &self.floor);
        set(&mut listing.image_urls, &self.image_urls);
        if let Some(count) = self.view_count {
            listing.view_count = Some(count);
        }
        set(&mut listing.status, &self.status);
        set(&mut listing.deleted_at, &self.deleted_at);
        set(&mut listing.deleted_by, &self.deleted_by);
        if let Some(at) = self.updated_at {
            listing.updated_at = Some(at);
        }
    }
}

/// Operator-supplied input for a new listing, as received from the admin form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub province: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(default)]
    pub deposit: Option<u64>,
    #[serde(default)]
    pub monthly_rent: Option<u64>,
    #[serde(default)]
    pub area_sqm: Option<f64>,
    #[serde(default)]
    pub floor: Option<i16>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// A draft that passed validation; the only way to construct a [`Listing`] from operator input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing(ListingDraft);

impl TryFrom<ListingDraft> for NewListing {
    type Error = ListingValidationError;

    fn try_from(mut draft: ListingDraft) -> Result<Self, Self::Error> {
        draft.title = validate_title(&draft.title)?;
        draft.province = validate_province(&draft.province)?;
        draft.district = draft.district.trim().to_string();
        draft.address = normalize_optional(draft.address);
        draft.category = normalize_optional(draft.category);
        if let Some(area) = draft.area_sqm {
            validate_area(area)?;
        }
        validate_images(&draft.image_urls)?;
        Ok(Self(draft))
    }
}

impl NewListing {
    pub fn into_listing(self, listing_number: u32, now: DateTime<Utc>) -> Listing {
        let draft = self.0;
        Listing {
            id: ListingId::generate(),
            listing_number,
            title: draft.title,
            description: draft.description,
            province: draft.province,
            district: draft.district,
            address: draft.address,
            category: draft.category,
            price: draft.price,
            deposit: draft.deposit,
            monthly_rent: draft.monthly_rent,
            area_sqm: draft.area_sqm,
            floor: draft.floor,
            image_urls: draft.image_urls,
            view_count: Some(0),
            status: ListingStatus::Pending,
            deleted_at: None,
            deleted_by: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Edits to descriptive fields. Lifecycle columns are only changed through transitions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListingChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "crate::store::deserialize_nullable")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::store::deserialize_nullable")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::store::deserialize_nullable")]
    pub price: Option<Option<u64>>,
    #[serde(default, deserialize_with = "crate::store::deserialize_nullable")]
    pub deposit: Option<Option<u64>>,
    #[serde(default, deserialize_with = "crate::store::deserialize_nullable")]
    pub monthly_rent: Option<Option<u64>>,
    #[serde(default, deserialize_with = "crate::store::deserialize_nullable")]
    pub area_sqm: Option<Option<f64>>,
    #[serde(default, deserialize_with = "crate::store::deserialize_nullable")]
    pub floor: Option<Option<i16>>,
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
}

impl ListingChanges {
    pub fn into_patch(self, now: DateTime<Utc>) -> Result<ListingPatch, ListingValidationError> {
        let title = self.title.as_deref().map(validate_title).transpose()?;
        let province = self.province.as_deref().map(validate_province).transpose()?;
        if let Some(Some(area)) = self.area_sqm {
            validate_area(area)?;
        }
        if let Some(images) = &self.image_urls {
            validate_images(images)?;
        }

        let patch = ListingPatch {
            title,
            description: self.description,
            province,
            district: self.district.map(|district| district.trim().to_string()),
            address: self.address.map(normalize_optional),
            category: self.category.map(normalize_optional),
            price: self.price,
            deposit: self.deposit,
            monthly_rent: self.monthly_rent,
            area_sqm: self.area_sqm,
            floor: self.floor,
            image_urls: self.image_urls,
            ..ListingPatch::default()
        };

        if patch.is_empty() {
            return Err(ListingValidationError::NothingToChange);
        }

        Ok(ListingPatch {
            updated_at: Some(now),
            ..patch
        })
    }
}

fn validate_title(raw: &str) -> Result<String, ListingValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ListingValidationError::MissingTitle);
    }
    let length = title.chars().count();
    if length > MAX_TITLE_CHARS {
        return Err(ListingValidationError::TitleTooLong {
            max: MAX_TITLE_CHARS,
            actual: length,
        });
    }
    Ok(title.to_string())
}

fn validate_province(raw: &str) -> Result<String, ListingValidationError> {
    let province = raw.trim();
    if province.is_empty() || province.eq_ignore_ascii_case("all") {
        return Err(ListingValidationError::MissingProvince);
    }
    Ok(province.to_string())
}

fn validate_area(area: f64) -> Result<(), ListingValidationError> {
    if area.is_finite() && area > 0.0 {
        Ok(())
    } else {
        Err(ListingValidationError::InvalidArea(area))
    }
}

fn validate_images(urls: &[String]) -> Result<(), ListingValidationError> {
    if urls.len() > MAX_IMAGES {
        return Err(ListingValidationError::TooManyImages { max: MAX_IMAGES });
    }
    match urls
        .iter()
        .find(|url| !(url.starts_with("https://") || url.starts_with("http://")))
    {
        Some(url) => Err(ListingValidationError::InvalidImageUrl(url.clone())),
        None => Ok(()),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Reasons operator input for a listing is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("title is required")]
    MissingTitle,
    #[error("title exceeds {max} characters ({actual})")]
    TitleTooLong { max: usize, actual: usize },
    #[error("province is required")]
    MissingProvince,
    #[error("area must be a positive number of square metres, got {0}")]
    InvalidArea(f64),
    #[error("at most {max} images may be attached")]
    TooManyImages { max: usize },
    #[error("image url '{0}' must be http(s)")]
    InvalidImageUrl(String),
    #[error("unknown listing status '{0}'")]
    UnknownStatus(String),
    #[error("no changes supplied")]
    NothingToChange,
}
