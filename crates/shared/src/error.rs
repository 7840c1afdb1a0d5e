//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every mutation operation returns an explicit outcome through this
/// taxonomy rather than panicking past the boundary. No single failed
/// operation is fatal to the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected locally before any store write.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity absent in the store at mutation time.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient store I/O failure, surfaced with the underlying cause.
    /// No automatic retry; the caller decides.
    #[error("Store error: {0}")]
    Store(String),

    /// A ledger delta would have produced an impossible aggregate.
    /// The value was clamped and flagged for reconciliation.
    #[error("Consistency warning: {0}")]
    Consistency(String),

    /// Business rule violation (e.g., deleting a project with open expenses).
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for log correlation.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
            Self::Consistency(_) => "CONSISTENCY_WARNING",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the error is recoverable by retrying with
    /// corrected input.
    #[must_use]
    pub const fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::BusinessRule(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_error_codes() {
        assert_eq!(
            AppError::Validation("test".into()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(AppError::NotFound("test".into()).error_code(), "NOT_FOUND");
        assert_eq!(AppError::Store("test".into()).error_code(), "STORE_ERROR");
        assert_eq!(
            AppError::Consistency("test".into()).error_code(),
            "CONSISTENCY_WARNING"
        );
        assert_eq!(
            AppError::BusinessRule("test".into()).error_code(),
            "BUSINESS_RULE_VIOLATION"
        );
        assert_eq!(
            AppError::Internal("test".into()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
        assert_eq!(AppError::NotFound("msg".into()).to_string(), "Not found: msg");
        assert_eq!(AppError::Store("msg".into()).to_string(), "Store error: msg");
        assert_eq!(
            AppError::Consistency("msg".into()).to_string(),
            "Consistency warning: msg"
        );
    }

    #[test]
    fn test_caller_fault_classification() {
        assert!(AppError::Validation("x".into()).is_caller_fault());
        assert!(AppError::NotFound("x".into()).is_caller_fault());
        assert!(AppError::BusinessRule("x".into()).is_caller_fault());
        assert!(!AppError::Store("x".into()).is_caller_fault());
        assert!(!AppError::Consistency("x".into()).is_caller_fault());
        assert!(!AppError::Internal("x".into()).is_caller_fault());
    }
}
