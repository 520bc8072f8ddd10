//! The assembled back office behind the session guard: redirects for anonymous operators,
//! session actors flowing into listing deletes, and the inquiry and article surfaces.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use shopspace::access::{
    login_router, require_admin, AccessControl, ActorId, GuardPolicy, StaticSessionLookup,
};
use shopspace::articles::{admin_article_router, public_article_router, Article, ArticleService};
use shopspace::clock::FixedClock;
use shopspace::dashboard::{dashboard_router, DashboardService};
use shopspace::inquiries::{
    admin_inquiry_router, public_inquiry_router, Inquiry, InquiryService,
};
use shopspace::listings::{
    admin_listing_router, public_listing_router, Listing, ListingDraft, ListingService,
    ListingStatus,
};
use shopspace::store::MemoryStore;

const COOKIE: &str = "sb-session";
const TOKEN: &str = "tok-admin";

struct BackOffice {
    app: Router,
    listings: Arc<ListingService>,
}

fn back_office() -> BackOffice {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0)
            .single()
            .expect("valid"),
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
        clock,
    ));
    let dashboard = Arc::new(DashboardService::new(
        listings.clone(),
        inquiries.clone(),
        articles.clone(),
    ));

    let lookup = StaticSessionLookup::default().with_session(TOKEN, ActorId("admin-1".to_string()));
    let access = Arc::new(AccessControl::new(
        GuardPolicy::new("/admin/login"),
        COOKIE,
        Arc::new(lookup),
    ));

    let app = Router::new()
        .merge(public_listing_router(listings.clone()))
        .merge(public_inquiry_router(inquiries.clone()))
        .merge(public_article_router(articles.clone()))
        .merge(admin_listing_router(listings.clone()))
        .merge(admin_inquiry_router(inquiries))
        .merge(admin_article_router(articles))
        .merge(dashboard_router(dashboard))
        .merge(login_router(access.clone()))
        .layer(axum::middleware::from_fn_with_state(access, require_admin));

    BackOffice { app, listings }
}

fn admin(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("{COOKIE}={TOKEN}"));
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    request.expect("request builds")
}

fn anonymous(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    request.expect("request builds")
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("route executes")
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION]
        .to_str()
        .expect("ascii location")
}

async fn seed_active(office: &BackOffice, title: &str) -> Listing {
    let created = office
        .listings
        .create(ListingDraft {
            title: title.to_string(),
            province: "서울".to_string(),
            ..ListingDraft::default()
        })
        .await
        .expect("created");
    office
        .listings
        .set_status(&created.id, ListingStatus::Active)
        .await
        .expect("activated")
}

#[tokio::test]
async fn anonymous_admin_request_redirects_to_login_with_target() {
    let office = back_office();
    let response = send(
        &office.app,
        anonymous("GET", "/admin/api/listings?tab=deleted", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "/admin/login?redirect=%2Fadmin%2Fapi%2Flistings%3Ftab%3Ddeleted"
    );
}

#[tokio::test]
async fn unknown_token_is_treated_as_anonymous() {
    let office = back_office();
    let request = Request::get("/admin/api/dashboard")
        .header(header::COOKIE, format!("{COOKIE}=forged"))
        .body(Body::empty())
        .expect("request builds");

    let response = send(&office.app, request).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn public_routes_ignore_the_guard() {
    let office = back_office();
    seed_active(&office, "망원동 카페").await;

    let response = send(&office.app, anonymous("GET", "/api/v1/listings", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn login_page_sends_authenticated_operator_to_safe_target() {
    let office = back_office();

    let back = send(
        &office.app,
        admin("GET", "/admin/login?redirect=%2Fadmin%2Fapi%2Fdashboard", None),
    )
    .await;
    assert_eq!(back.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&back), "/admin/api/dashboard");

    let offsite = send(
        &office.app,
        admin("GET", "/admin/login?redirect=%2F%2Fevil.example.com", None),
    )
    .await;
    assert_eq!(location(&offsite), "/admin");
}

#[tokio::test]
async fn login_page_is_reachable_without_session() {
    let office = back_office();
    let response = send(
        &office.app,
        anonymous("GET", "/admin/login?redirect=%2Fadmin%2Fapi%2Farticles", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["redirect"], json!("/admin/api/articles"));
}

#[tokio::test]
async fn soft_delete_records_the_session_actor() {
    let office = back_office();
    let listing = seed_active(&office, "연남동 공방").await;

    let response = send(
        &office.app,
        admin("POST", &format!("/admin/api/listings/{}/delete", listing.id), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["deleted_by"], json!("admin-1"));

    let conflict = send(
        &office.app,
        admin(
            "POST",
            &format!("/admin/api/listings/{}/status", listing.id),
            Some(json!({ "status": "sold" })),
        ),
    )
    .await;
    assert_eq!(conflict.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn inquiry_flows_from_public_form_to_admin_inbox() {
    let office = back_office();
    let listing = seed_active(&office, "광화문 사무실").await;

    let submitted = send(
        &office.app,
        anonymous(
            "POST",
            "/api/v1/inquiries",
            Some(json!({
                "listing_id": listing.id,
                "name": "오지훈",
                "phone": "010-9876-5432",
                "message": "임대 조건이 궁금합니다"
            })),
        ),
    )
    .await;
    assert_eq!(submitted.status(), StatusCode::CREATED);
    let id = json_body(submitted).await["id"]
        .as_str()
        .expect("id")
        .to_string();

    let invalid = send(
        &office.app,
        anonymous(
            "POST",
            "/api/v1/inquiries",
            Some(json!({ "name": "", "phone": "010", "message": "?" })),
        ),
    )
    .await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let updated = send(
        &office.app,
        admin(
            "PATCH",
            &format!("/admin/api/inquiries/{id}"),
            Some(json!({ "status": "in_progress", "admin_note": "내일 연락" })),
        ),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);

    let inbox = json_body(
        send(
            &office.app,
            admin("GET", "/admin/api/inquiries?status=in_progress&q=%EC%98%A4", None),
        )
        .await,
    )
    .await;
    assert_eq!(inbox["counts"]["in_progress"], json!(1));
    assert_eq!(inbox["items"][0]["admin_note"], json!("내일 연락"));

    let deleted = send(
        &office.app,
        admin(
            "POST",
            "/admin/api/inquiries/bulk-delete",
            Some(json!({ "ids": [id] })),
        ),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::OK);
}

#[tokio::test]
async fn articles_become_public_once_published() {
    let office = back_office();

    let created = send(
        &office.app,
        admin(
            "POST",
            "/admin/api/articles",
            Some(json!({
                "title": "상가 계약 전 체크리스트",
                "category": "guide",
                "body": "권리금과 용도를 확인하세요."
            })),
        ),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let id = json_body(created).await["id"]
        .as_str()
        .expect("id")
        .to_string();

    let hidden = send(&office.app, anonymous("GET", &format!("/api/v1/articles/{id}"), None)).await;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    let published = send(
        &office.app,
        admin("POST", &format!("/admin/api/articles/{id}/publish"), None),
    )
    .await;
    assert_eq!(published.status(), StatusCode::OK);
    assert!(!json_body(published).await["published_at"].is_null());

    let index = json_body(
        send(&office.app, anonymous("GET", "/api/v1/articles?category=guide", None)).await,
    )
    .await;
    assert_eq!(index.as_array().expect("array").len(), 1);

    let dashboard = json_body(send(&office.app, admin("GET", "/admin/api/dashboard", None)).await).await;
    assert_eq!(dashboard["articles"]["published"], json!(1));
    assert_eq!(dashboard["articles"]["draft"], json!(0));
}
