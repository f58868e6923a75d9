//! Query-string extractor with validation.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Query-string extractor with automatic validation.
///
/// Unparseable values, unknown parameters (with `#[serde(deny_unknown_fields)]`)
/// and validation failures are rejected with `400 Bad Request`.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::ValidatedQuery;
///
/// #[derive(Deserialize, Validate)]
/// #[serde(deny_unknown_fields)]
/// struct Paging {
///     #[validate(range(min = 1))]
///     page: Option<u64>,
/// }
///
/// async fn list(ValidatedQuery(paging): ValidatedQuery<Paging>) { /* ... */ }
/// ```
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        params
            .validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedQuery(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    #[serde(deny_unknown_fields, rename_all = "camelCase")]
    struct Paging {
        #[validate(range(min = 1))]
        page: Option<u64>,
        per_page: Option<u64>,
    }

    async fn list(ValidatedQuery(paging): ValidatedQuery<Paging>) -> String {
        format!("{:?}/{:?}", paging.page, paging.per_page)
    }

    async fn status(uri: &str) -> StatusCode {
        Router::new()
            .route("/", get(list))
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_valid_query() {
        assert_eq!(status("/?page=2&perPage=10").await, StatusCode::OK);
        assert_eq!(status("/").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejected_queries() {
        assert_eq!(status("/?page=abc").await, StatusCode::BAD_REQUEST);
        assert_eq!(status("/?page=0").await, StatusCode::BAD_REQUEST);
        assert_eq!(status("/?sort=title").await, StatusCode::BAD_REQUEST);
    }
}
