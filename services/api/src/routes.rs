use crate::infra::{AppState, Stores};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use shopspace::access::{login_router, require_admin, AccessControl};
use shopspace::articles::{admin_article_router, public_article_router, ArticleService};
use shopspace::clock::Clock;
use shopspace::dashboard::{dashboard_router, DashboardService};
use shopspace::inquiries::{admin_inquiry_router, public_inquiry_router, InquiryService};
use shopspace::listings::{admin_listing_router, public_listing_router, ListingService};
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) struct Services {
    pub(crate) listings: Arc<ListingService>,
    pub(crate) inquiries: Arc<InquiryService>,
    pub(crate) articles: Arc<ArticleService>,
    pub(crate) dashboard: Arc<DashboardService>,
}

impl Services {
    pub(crate) fn new(stores: Stores, clock: Arc<dyn Clock>) -> Self {
        let listings = Arc::new(ListingService::new(stores.listings.clone(), clock.clone()));
        let inquiries = Arc::new(InquiryService::new(
            stores.inquiries,
            stores.listings,
            clock.clone(),
        ));
        let articles = Arc::new(ArticleService::new(stores.articles, clock));
        let dashboard = Arc::new(DashboardService::new(
            listings.clone(),
            inquiries.clone(),
            articles.clone(),
        ));
        Self {
            listings,
            inquiries,
            articles,
            dashboard,
        }
    }
}

/// Public and admin domain routes, with the admin guard layered over all of them,
/// plus the unguarded operational endpoints.
pub(crate) fn with_back_office_routes(services: &Services, access: Arc<AccessControl>) -> Router {
    Router::new()
        .merge(public_listing_router(services.listings.clone()))
        .merge(public_inquiry_router(services.inquiries.clone()))
        .merge(public_article_router(services.articles.clone()))
        .merge(admin_listing_router(services.listings.clone()))
        .merge(admin_inquiry_router(services.inquiries.clone()))
        .merge(admin_article_router(services.articles.clone()))
        .merge(dashboard_router(services.dashboard.clone()))
        .merge(login_router(access.clone()))
        .layer(axum::middleware::from_fn_with_state(access, require_admin))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
