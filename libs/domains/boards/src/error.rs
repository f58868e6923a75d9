use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::DocumentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Store(#[from] DocumentError),
}

pub type BoardResult<T> = Result<T, BoardError>;

/// Convert BoardError to AppError for standardized error responses
impl From<BoardError> for AppError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::Validation(msg) | BoardError::InvalidQuery(msg) => {
                AppError::BadRequest(msg)
            }
            BoardError::Store(err) => match err {
                DocumentError::DuplicateId(_) => AppError::Conflict(err.to_string()),
                DocumentError::InvalidFilter(_) | DocumentError::InvalidPage(_) => {
                    AppError::BadRequest(err.to_string())
                }
                DocumentError::Serialization(msg) => AppError::DatabaseDecode(msg),
                DocumentError::Backend(msg) => AppError::Database(msg),
            },
        }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status(err: impl Into<BoardError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_store_errors_map_to_status_codes() {
        assert_eq!(
            status(DocumentError::DuplicateId("b1".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(DocumentError::InvalidPage("page must be at least 1".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(DocumentError::InvalidFilter("$where".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(DocumentError::Serialization("bad date".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(DocumentError::Backend("connection refused".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_input_errors_are_bad_requests() {
        assert_eq!(
            status(BoardError::Validation("title must not be empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(BoardError::InvalidQuery("perPage is required".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
