//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Malformed bodies and validation failures are both rejected with
/// `400 Bad Request` and an [`ErrorResponse`](crate::errors::ErrorResponse).
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::post;
/// use axum_helpers::extractors::ValidatedJson;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct CreateBoard {
///     #[validate(length(min = 1))]
///     title: String,
/// }
///
/// async fn create_board(ValidatedJson(payload): ValidatedJson<CreateBoard>) -> String {
///     format!("Creating board: {}", payload.title)
/// }
///
/// let app = Router::new().route("/boards", post(create_board));
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::post};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct CreateBoard {
        #[validate(length(min = 1))]
        title: String,
    }

    async fn create(ValidatedJson(board): ValidatedJson<CreateBoard>) -> String {
        board.title
    }

    fn app() -> Router {
        Router::new().route("/", post(create))
    }

    fn json_request(body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let response = app().oneshot(json_request(r#"{"title":"Good board!"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_body_is_bad_request() {
        let response = app().oneshot(json_request(r#"{"title":""}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = app().oneshot(json_request("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let missing_field = app().oneshot(json_request("{}")).await.unwrap();
        assert_eq!(missing_field.status(), StatusCode::BAD_REQUEST);
    }
}
