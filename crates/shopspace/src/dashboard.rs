//! Back-office landing summary.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::articles::{ArticleService, ArticleTotals};
use crate::inquiries::{InquiryCounts, InquiryService};
use crate::listings::{ListingQuery, ListingRow, ListingService, TabCounts};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub listings: TabCounts,
    /// Trashed listings whose retention window has lapsed or ends within the highlight window.
    pub purge_attention: Vec<ListingRow>,
    pub inquiries: InquiryCounts,
    pub articles: ArticleTotals,
    pub generated_at: DateTime<Utc>,
}

pub struct DashboardService {
    listings: Arc<ListingService>,
    inquiries: Arc<InquiryService>,
    articles: Arc<ArticleService>,
}

impl DashboardService {
    pub fn new(
        listings: Arc<ListingService>,
        inquiries: Arc<InquiryService>,
        articles: Arc<ArticleService>,
    ) -> Self {
        Self {
            listings,
            inquiries,
            articles,
        }
    }

    pub async fn summary(&self) -> Result<DashboardSummary, DashboardError> {
        let overview = self.listings.overview(&ListingQuery::default()).await?;
        let purge_attention = self
            .listings
            .purge_queue()
            .await?
            .into_iter()
            .filter(|row| row.purge_urgency.is_some_and(|urgency| urgency.is_highlighted()))
            .collect();

        Ok(DashboardSummary {
            listings: overview.counts,
            purge_attention,
            inquiries: self.inquiries.counts().await?,
            articles: self.articles.totals().await?,
            generated_at: overview.generated_at,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Listings(#[from] crate::listings::ListingServiceError),
    #[error(transparent)]
    Inquiries(#[from] crate::inquiries::InquiryServiceError),
    #[error(transparent)]
    Articles(#[from] crate::articles::ArticleServiceError),
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        match self {
            DashboardError::Listings(err) => err.into_response(),
            DashboardError::Inquiries(err) => err.into_response(),
            DashboardError::Articles(err) => err.into_response(),
        }
    }
}

pub fn dashboard_router(service: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/admin/api/dashboard", get(summary_handler))
        .with_state(service)
}

pub(crate) async fn summary_handler(State(service): State<Arc<DashboardService>>) -> Response {
    match service.summary().await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::ActorId;
    use crate::articles::Article;
    use crate::clock::FixedClock;
    use crate::inquiries::Inquiry;
    use crate::listings::{Listing, ListingDraft, PurgeUrgency};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn summary_highlights_listings_close_to_purge() {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).single().expect("valid"),
        ));
        let listing_store = Arc::new(MemoryStore::<Listing>::default());
        let listings = Arc::new(ListingService::new(listing_store.clone(), clock.clone()));
        let inquiries = Arc::new(InquiryService::new(
            Arc::new(MemoryStore::<Inquiry>::default()),
            listing_store,
            clock.clone(),
        ));
        let articles = Arc::new(ArticleService::new(
            Arc::new(MemoryStore::<Article>::default()),
            clock.clone(),
        ));
        let dashboard = DashboardService::new(listings.clone(), inquiries, articles);

        let draft = |title: &str| ListingDraft {
            title: title.to_string(),
            province: "부산".to_string(),
            ..ListingDraft::default()
        };
        let early = listings.create(draft("해운대 카페")).await.expect("created");
        let late = listings.create(draft("서면 사무실")).await.expect("created");
        listings.create(draft("남포동 상가")).await.expect("created");

        let actor = ActorId("operator".to_string());
        listings.soft_delete(&early.id, actor.clone()).await.expect("trashed");
        clock.advance(Duration::days(20));
        listings.soft_delete(&late.id, actor).await.expect("trashed");
        clock.advance(Duration::days(5));

        let summary = dashboard.summary().await.expect("summary builds");
        assert_eq!(summary.listings.all, 1);
        assert_eq!(summary.listings.deleted, 2);
        assert_eq!(summary.purge_attention.len(), 1);
        assert_eq!(summary.purge_attention[0].listing.id, early.id);
        assert_eq!(summary.purge_attention[0].purge_urgency, Some(PurgeUrgency::Imminent));
        assert_eq!(summary.inquiries.total, 0);
    }
}
