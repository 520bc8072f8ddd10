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

use super::domain::{ArticleChanges, ArticleDraft, ArticleId};
use super::service::{ArticleService, ArticleServiceError};
use crate::extract::IdPath;
use crate::store::StoreError;

pub fn public_article_router(service: Arc<ArticleService>) -> Router {
    Router::new()
        .route("/api/v1/articles", get(index_handler))
        .route("/api/v1/articles/{id}", get(read_handler))
        .with_state(service)
}

pub fn admin_article_router(service: Arc<ArticleService>) -> Router {
    Router::new()
        .route("/admin/api/articles", get(list_handler).post(create_handler))
        .route(
            "/admin/api/articles/{id}",
            get(detail_handler)
                .patch(edit_handler)
                .delete(delete_handler),
        )
        .route("/admin/api/articles/{id}/publish", post(publish_handler))
        .route("/admin/api/articles/{id}/unpublish", post(unpublish_handler))
        .with_state(service)
}

impl IntoResponse for ArticleServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ArticleServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ArticleServiceError::NotFound(_) | ArticleServiceError::Store(StoreError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ArticleServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
            ArticleServiceError::Store(StoreError::Unavailable(_)) => {
                error!(error = %self, "article store unavailable");
                let payload = json!({ "error": "the article store is unavailable, please try again" });
                return (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response();
            }
        };

        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IndexQuery {
    #[serde(default)]
    pub(crate) category: Option<String>,
}

pub(crate) async fn index_handler(
    State(service): State<Arc<ArticleService>>,
    Query(query): Query<IndexQuery>,
) -> Response {
    match service.published(query.category.as_deref()).await {
        Ok(articles) => Json(articles).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn read_handler(
    State(service): State<Arc<ArticleService>>,
    IdPath(id): IdPath<ArticleId>,
) -> Response {
    match service.read(&id).await {
        Ok(article) => Json(article).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_handler(State(service): State<Arc<ArticleService>>) -> Response {
    match service.list().await {
        Ok(articles) => Json(articles).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_handler(
    State(service): State<Arc<ArticleService>>,
    Json(draft): Json<ArticleDraft>,
) -> Response {
    match service.create(draft).await {
        Ok(article) => (StatusCode::CREATED, Json(article)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler(
    State(service): State<Arc<ArticleService>>,
    IdPath(id): IdPath<ArticleId>,
) -> Response {
    match service.get(&id).await {
        Ok(article) => Json(article).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn edit_handler(
    State(service): State<Arc<ArticleService>>,
    IdPath(id): IdPath<ArticleId>,
    Json(changes): Json<ArticleChanges>,
) -> Response {
    match service.edit(&id, changes).await {
        Ok(article) => Json(article).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_handler(
    State(service): State<Arc<ArticleService>>,
    IdPath(id): IdPath<ArticleId>,
) -> Response {
    match service.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn publish_handler(
    State(service): State<Arc<ArticleService>>,
    IdPath(id): IdPath<ArticleId>,
) -> Response {
    match service.publish(&id).await {
        Ok(article) => Json(article).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn unpublish_handler(
    State(service): State<Arc<ArticleService>>,
    IdPath(id): IdPath<ArticleId>,
) -> Response {
    match service.unpublish(&id).await {
        Ok(article) => Json(article).into_response(),
        Err(err) => err.into_response(),
    }
}
