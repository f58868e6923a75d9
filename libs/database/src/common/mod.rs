//! Utilities shared by every storage backend

pub mod error;
pub mod retry;

pub use error::{DocumentError, DocumentResult};
pub use retry::{RetryConfig, retry, retry_with_backoff};
