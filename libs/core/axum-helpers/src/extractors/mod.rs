//! Custom extractors for Axum handlers.
//!
//! All extractors reject bad input with `400 Bad Request` and the standard
//! error body.

pub mod validated_json;
pub mod validated_path;
pub mod validated_query;

pub use validated_json::ValidatedJson;
pub use validated_path::ValidatedPath;
pub use validated_query::ValidatedQuery;
