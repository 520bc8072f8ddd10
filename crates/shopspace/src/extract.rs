//! Request extractors shared by the domain routers.

use std::str::FromStr;

use axum::{
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Record id taken from the `{id}` path segment.
///
/// An id that does not parse cannot name a stored record, so it is rejected as a
/// JSON 404 like any other unknown id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath<Id>(pub Id);

impl<S, Id> FromRequestParts<S> for IdPath<Id>
where
    S: Send + Sync,
    Id: FromStr + Send,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        raw.parse::<Id>().map(IdPath).map_err(|_| {
            let payload = json!({ "error": format!("no record matches id '{raw}'") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::ListingId;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn echo(IdPath(id): IdPath<ListingId>) -> String {
        id.to_string()
    }

    fn app() -> Router {
        Router::new().route("/items/{id}", get(echo))
    }

    #[tokio::test]
    async fn well_formed_id_is_extracted() {
        let id = ListingId::generate();
        let response = app()
            .oneshot(
                Request::get(format!("/items/{id}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        assert_eq!(bytes, id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn malformed_id_is_json_not_found() {
        let response = app()
            .oneshot(
                Request::get("/items/12345")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["error"], json!("no record matches id '12345'"));
    }
}
