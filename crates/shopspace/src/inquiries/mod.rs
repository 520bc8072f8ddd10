//! Customer inquiries: public submission and the operator inbox.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    Inquiry, InquiryChanges, InquiryDraft, InquiryId, InquiryPatch, InquiryStatus,
    InquiryValidationError, NewInquiry, MAX_MESSAGE_CHARS,
};
pub use router::{admin_inquiry_router, public_inquiry_router};
pub use service::{InquiryCounts, InquiryFilter, InquiryService, InquiryServiceError};
