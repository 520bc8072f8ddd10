use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::listings::ListingId;
use crate::store::Record;

pub const MAX_MESSAGE_CHARS: usize = 2000;
const MAX_NOTE_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InquiryId(pub Uuid);

impl InquiryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InquiryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for InquiryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Handling progress of a customer inquiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    #[default]
    New,
    InProgress,
    Completed,
}

impl InquiryStatus {
    pub const ALL: [InquiryStatus; 3] = [
        InquiryStatus::New,
        InquiryStatus::InProgress,
        InquiryStatus::Completed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::InProgress => "in_progress",
            InquiryStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A customer's question about a listing, or a general contact request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: InquiryId,
    #[serde(default)]
    pub listing_id: Option<ListingId>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub message: String,
    #[serde(default)]
    pub status: InquiryStatus,
    #[serde(default)]
    pub admin_note: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Inquiry {
    type Id = InquiryId;
    type Patch = InquiryPatch;

    const TABLE: &'static str = "inquiries";

    fn id(&self) -> &InquiryId {
        &self.id
    }

    fn apply(&mut self, patch: &InquiryPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(note) = &patch.admin_note {
            self.admin_note = note.clone();
        }
        if let Some(at) = patch.updated_at {
            self.updated_at = Some(at);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InquiryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InquiryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Public contact form payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InquiryDraft {
    #[serde(default)]
    pub listing_id: Option<ListingId>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub message: String,
}

/// A validated draft. Whether `listing_id` refers to a live listing is checked by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInquiry(InquiryDraft);

impl TryFrom<InquiryDraft> for NewInquiry {
    type Error = InquiryValidationError;

    fn try_from(mut draft: InquiryDraft) -> Result<Self, Self::Error> {
        draft.name = required(&draft.name, "name")?;
        draft.phone = required(&draft.phone, "phone")?;
        draft.message = required(&draft.message, "message")?;

        let length = draft.message.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(InquiryValidationError::MessageTooLong {
                max: MAX_MESSAGE_CHARS,
                actual: length,
            });
        }

        draft.email = draft
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());
        if let Some(email) = &draft.email {
            if !email.contains('@') {
                return Err(InquiryValidationError::InvalidEmail(email.clone()));
            }
        }

        Ok(Self(draft))
    }
}

impl NewInquiry {
    pub fn listing_id(&self) -> Option<ListingId> {
        self.0.listing_id
    }

    pub fn into_inquiry(self, now: DateTime<Utc>) -> Inquiry {
        let draft = self.0;
        Inquiry {
            id: InquiryId::generate(),
            listing_id: draft.listing_id,
            name: draft.name,
            phone: draft.phone,
            email: draft.email,
            message: draft.message,
            status: InquiryStatus::New,
            admin_note: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Operator edits: handling status and the internal note.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InquiryChanges {
    #[serde(default)]
    pub status: Option<InquiryStatus>,
    #[serde(default, deserialize_with = "crate::store::deserialize_nullable")]
    pub admin_note: Option<Option<String>>,
}

impl InquiryChanges {
    pub fn into_patch(self, now: DateTime<Utc>) -> Result<InquiryPatch, InquiryValidationError> {
        if self.status.is_none() && self.admin_note.is_none() {
            return Err(InquiryValidationError::NothingToChange);
        }

        let admin_note = self.admin_note.map(|note| {
            note.map(|note| note.trim().to_string())
                .filter(|note| !note.is_empty())
        });
        if let Some(Some(note)) = &admin_note {
            let length = note.chars().count();
            if length > MAX_NOTE_CHARS {
                return Err(InquiryValidationError::NoteTooLong {
                    max: MAX_NOTE_CHARS,
                    actual: length,
                });
            }
        }

        Ok(InquiryPatch {
            status: self.status,
            admin_note,
            updated_at: Some(now),
        })
    }
}

fn required(raw: &str, field: &'static str) -> Result<String, InquiryValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        Err(InquiryValidationError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InquiryValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("message exceeds {max} characters ({actual})")]
    MessageTooLong { max: usize, actual: usize },
    #[error("admin note exceeds {max} characters ({actual})")]
    NoteTooLong { max: usize, actual: usize },
    #[error("email '{0}' is not a valid address")]
    InvalidEmail(String),
    #[error("listing {0} is not available for inquiries")]
    UnavailableListing(ListingId),
    #[error("no changes supplied")]
    NothingToChange,
}
