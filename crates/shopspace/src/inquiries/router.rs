use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{InquiryChanges, InquiryDraft, InquiryId};
use super::service::{InquiryFilter, InquiryService, InquiryServiceError};
use crate::extract::IdPath;
use crate::store::StoreError;

pub fn public_inquiry_router(service: Arc<InquiryService>) -> Router {
    Router::new()
        .route("/api/v1/inquiries", post(submit_handler))
        .with_state(service)
}

pub fn admin_inquiry_router(service: Arc<InquiryService>) -> Router {
    Router::new()
        .route("/admin/api/inquiries", get(list_handler))
        .route("/admin/api/inquiries/bulk-delete", post(bulk_delete_handler))
        .route(
            "/admin/api/inquiries/{id}",
            get(detail_handler)
                .patch(update_handler)
                .delete(delete_handler),
        )
        .with_state(service)
}

impl IntoResponse for InquiryServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            InquiryServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InquiryServiceError::NotFound(_) | InquiryServiceError::Store(StoreError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            InquiryServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
            InquiryServiceError::Store(StoreError::Unavailable(_)) => {
                error!(error = %self, "inquiry store unavailable");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        let payload = json!({ "error": self.operator_message() });
        (status, Json(payload)).into_response()
    }
}

pub(crate) async fn submit_handler(
    State(service): State<Arc<InquiryService>>,
    Json(draft): Json<InquiryDraft>,
) -> Response {
    match service.submit(draft).await {
        Ok(inquiry) => (
            StatusCode::CREATED,
            Json(json!({ "id": inquiry.id, "status": inquiry.status })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_handler(
    State(service): State<Arc<InquiryService>>,
    Query(filter): Query<InquiryFilter>,
) -> Response {
    let listed = service.list(&filter).await;
    let counted = service.counts().await;
    match (listed, counted) {
        (Ok(items), Ok(counts)) => Json(json!({ "counts": counts, "items": items })).into_response(),
        (Err(err), _) | (_, Err(err)) => err.into_response(),
    }
}

pub(crate) async fn detail_handler(
    State(service): State<Arc<InquiryService>>,
    IdPath(id): IdPath<InquiryId>,
) -> Response {
    match service.get(&id).await {
        Ok(inquiry) => Json(inquiry).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_handler(
    State(service): State<Arc<InquiryService>>,
    IdPath(id): IdPath<InquiryId>,
    Json(changes): Json<InquiryChanges>,
) -> Response {
    match service.update(&id, changes).await {
        Ok(inquiry) => Json(inquiry).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_handler(
    State(service): State<Arc<InquiryService>>,
    IdPath(id): IdPath<InquiryId>,
) -> Response {
    match service.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkDeleteRequest {
    pub(crate) ids: Vec<InquiryId>,
}

pub(crate) async fn bulk_delete_handler(
    State(service): State<Arc<InquiryService>>,
    Json(request): Json<BulkDeleteRequest>,
) -> Response {
    if request.ids.is_empty() {
        let payload = json!({ "error": "no inquiries selected" });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    let outcome = service.bulk_delete(&request.ids).await;
    let status = if outcome.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (status, Json(outcome)).into_response()
}
