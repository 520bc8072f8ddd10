//! Back office for a commercial-space marketplace: listings with a live/trash
//! lifecycle and 30-day retention, customer inquiries, and news articles.

pub mod access;
pub mod articles;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod inquiries;
pub mod listings;
pub mod store;
pub mod telemetry;
