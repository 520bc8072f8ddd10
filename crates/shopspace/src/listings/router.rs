use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::catalog::ListingQuery;
use super::domain::{ListingChanges, ListingDraft, ListingId, ListingStatus};
use super::service::{BulkAction, ListingService, ListingServiceError};
use crate::access::AdminSession;
use crate::extract::IdPath;
use crate::store::StoreError;

/// Anonymous browse and detail endpoints.
pub fn public_listing_router(service: Arc<ListingService>) -> Router {
    Router::new()
        .route("/api/v1/listings", get(browse_handler))
        .route("/api/v1/listings/{id}", get(view_handler))
        .with_state(service)
}

/// Back-office endpoints; expects the access guard to have inserted an [`AdminSession`].
pub fn admin_listing_router(service: Arc<ListingService>) -> Router {
    Router::new()
        .route(
            "/admin/api/listings",
            get(overview_handler).post(create_handler),
        )
        .route("/admin/api/listings/export", get(export_handler))
        .route("/admin/api/listings/bulk", post(bulk_handler))
        .route(
            "/admin/api/listings/{id}",
            get(detail_handler)
                .patch(edit_handler)
                .delete(purge_handler),
        )
        .route("/admin/api/listings/{id}/status", post(status_handler))
        .route("/admin/api/listings/{id}/delete", post(soft_delete_handler))
        .route("/admin/api/listings/{id}/restore", post(restore_handler))
        .with_state(service)
}

impl IntoResponse for ListingServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ListingServiceError::InvalidState(_) => StatusCode::CONFLICT,
            ListingServiceError::NotFound(_) | ListingServiceError::Store(StoreError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ListingServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ListingServiceError::Store(StoreError::Conflict)
            | ListingServiceError::NumbersExhausted => StatusCode::CONFLICT,
            ListingServiceError::Store(StoreError::Unavailable(_)) => {
                error!(error = %self, "listing store unavailable");
                StatusCode::SERVICE_UNAVAILABLE
            }
            ListingServiceError::Export(_) => {
                error!(error = %self, "listing export failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = json!({ "error": self.operator_message() });
        (status, Json(payload)).into_response()
    }
}

pub(crate) async fn browse_handler(
    State(service): State<Arc<ListingService>>,
    Query(query): Query<ListingQuery>,
) -> Response {
    match service.browse(&query).await {
        Ok(listings) => Json(listings).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn view_handler(
    State(service): State<Arc<ListingService>>,
    IdPath(id): IdPath<ListingId>,
) -> Response {
    match service.view(&id).await {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn overview_handler(
    State(service): State<Arc<ListingService>>,
    Query(query): Query<ListingQuery>,
) -> Response {
    match service.overview(&query).await {
        Ok(overview) => Json(overview).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_handler(
    State(service): State<Arc<ListingService>>,
    Json(draft): Json<ListingDraft>,
) -> Response {
    match service.create(draft).await {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler(
    State(service): State<Arc<ListingService>>,
    IdPath(id): IdPath<ListingId>,
) -> Response {
    match service.row(&id).await {
        Ok(row) => Json(row).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn edit_handler(
    State(service): State<Arc<ListingService>>,
    IdPath(id): IdPath<ListingId>,
    Json(changes): Json<ListingChanges>,
) -> Response {
    match service.edit(&id, changes).await {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    pub(crate) status: ListingStatus,
}

pub(crate) async fn status_handler(
    State(service): State<Arc<ListingService>>,
    IdPath(id): IdPath<ListingId>,
    Json(request): Json<StatusRequest>,
) -> Response {
    match service.set_status(&id, request.status).await {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn soft_delete_handler(
    State(service): State<Arc<ListingService>>,
    Extension(session): Extension<AdminSession>,
    IdPath(id): IdPath<ListingId>,
) -> Response {
    match service.soft_delete(&id, session.actor).await {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn restore_handler(
    State(service): State<Arc<ListingService>>,
    IdPath(id): IdPath<ListingId>,
) -> Response {
    match service.restore(&id).await {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn purge_handler(
    State(service): State<Arc<ListingService>>,
    IdPath(id): IdPath<ListingId>,
) -> Response {
    match service.purge(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkRequest {
    #[serde(flatten)]
    pub(crate) action: BulkAction,
    pub(crate) ids: Vec<ListingId>,
}

pub(crate) async fn bulk_handler(
    State(service): State<Arc<ListingService>>,
    Extension(session): Extension<AdminSession>,
    Json(request): Json<BulkRequest>,
) -> Response {
    if request.ids.is_empty() {
        let payload = json!({ "error": "no listings selected" });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    let outcome = service
        .bulk(&request.action, &request.ids, &session.actor)
        .await;
    let status = if outcome.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (status, Json(outcome)).into_response()
}

pub(crate) async fn export_handler(
    State(service): State<Arc<ListingService>>,
    Query(query): Query<ListingQuery>,
) -> Response {
    match service.export_csv(&query).await {
        Ok(bytes) => {
            let filename = format!("listings-{}.csv", query.tab);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}
