//! Path parameter extractor with validation.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Extractor for structured path parameters.
///
/// Deserializes the matched route parameters into `T` and runs its
/// `validator` rules. Failures become a JSON `400 Bad Request` instead of
/// axum's plain-text rejection.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::ValidatedPath;
///
/// #[derive(Deserialize, Validate)]
/// #[serde(deny_unknown_fields)]
/// struct BoardParams {
///     #[validate(length(min = 1))]
///     id: String,
/// }
///
/// async fn get_board(ValidatedPath(params): ValidatedPath<BoardParams>) -> String {
///     params.id
/// }
/// ```
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        params
            .validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedPath(params))
    }
}
