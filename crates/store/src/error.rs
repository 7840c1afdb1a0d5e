//! Store error types.

use thiserror::Error;

use buildtrack_shared::AppError;

/// Errors surfaced by the document store and its codec.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document at the path.
    #[error("No document at '{0}'")]
    NotFound(String),

    /// A create hit an existing document.
    #[error("Document already exists at '{0}'")]
    AlreadyExists(String),

    /// A stored document could not be decoded into its domain type.
    #[error("Cannot decode document at '{path}': {message}")]
    Decode {
        /// Path of the offending document.
        path: String,
        /// What was malformed.
        message: String,
    },

    /// Backend I/O failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Builds a decode error for a document path.
    #[must_use]
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => Self::NotFound(path),
            other => Self::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_app_not_found() {
        let app: AppError = StoreError::NotFound("customers/c1/projects/p1".into()).into();
        assert_eq!(app.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_backend_maps_to_app_store() {
        let app: AppError = StoreError::Backend("connection reset".into()).into();
        assert_eq!(app.error_code(), "STORE_ERROR");
        assert!(!app.is_caller_fault());
    }
}
