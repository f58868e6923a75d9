/// Error type shared by every document repository backend
///
/// "Not found" is deliberately absent: operations report a missing record as
/// `None`, `UpdateOutcome::NotMatched` or a zero count.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The filter cannot be evaluated (empty or operator-like field name)
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Paging parameters are out of range
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// A record with the same id already exists
    #[error("Document with id '{0}' already exists")]
    DuplicateId(String),

    /// A record could not be converted to or from its stored form
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The underlying store failed
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentError {
    /// Whether the error was caused by the caller's input rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocumentError::InvalidFilter(_)
                | DocumentError::InvalidPage(_)
                | DocumentError::DuplicateId(_)
        )
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::Serialization(err.to_string())
    }
}

/// Result type alias for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(DocumentError::InvalidFilter("$where".into()).is_client_error());
        assert!(DocumentError::InvalidPage("page 0".into()).is_client_error());
        assert!(DocumentError::DuplicateId("42".into()).is_client_error());
        assert!(!DocumentError::Backend("socket closed".into()).is_client_error());
        assert!(!DocumentError::Serialization("bad date".into()).is_client_error());
    }

    #[test]
    fn test_duplicate_message_names_id() {
        let err = DocumentError::DuplicateId("board-1".into());
        assert_eq!(err.to_string(), "Document with id 'board-1' already exists");
    }
}
