//! Unified error handling for store access.
//!
//! Provides a single error type for every data-access operation:
//! - store-reported failures (non-success statuses)
//! - transport failures (HTTP)
//! - cancellation, kept distinct from store failures

use domain::DomainError;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Input
    #[error("{0}")]
    Validation(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    // Cancellation
    #[error("Operation cancelled")]
    Cancelled,

    // Store errors
    #[error("Store returned status {status}: {message}")]
    Store { status: u16, message: String },

    #[error("Delete of '{id}' was rejected with status {status} after {attempts} attempts")]
    DeleteRejected { id: String, status: u16, attempts: u32 },

    #[error("Delete of '{id}' failed after {attempts} attempts: {last_error}")]
    DeleteExhausted {
        id: String,
        attempts: u32,
        last_error: String,
    },

    // External errors
    #[cfg(feature = "http")]
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code for callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidDocument(_) => "INVALID_DOCUMENT",
            AppError::Cancelled => "CANCELLED",
            AppError::Store { .. } => "STORE_ERROR",
            AppError::DeleteRejected { .. } => "DELETE_REJECTED",
            AppError::DeleteExhausted { .. } => "DELETE_EXHAUSTED",
            #[cfg(feature = "http")]
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Store status attached to the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Store { status, .. } | AppError::DeleteRejected { status, .. } => {
                Some(*status)
            }
            #[cfg(feature = "http")]
            AppError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if the operation was cancelled by the caller
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::InvalidDocument(msg) => AppError::InvalidDocument(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn store(status: u16, message: impl Into<String>) -> Self {
        AppError::Store {
            status,
            message: message.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn service_unavailable(service: impl Into<String>) -> Self {
        AppError::ServiceUnavailable(service.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_convert() {
        let err: AppError = DomainError::invalid_document("expected a JSON object").into();
        assert_eq!(err.code(), "INVALID_DOCUMENT");

        let err: AppError = DomainError::validation("bad").into();
        assert!(matches!(err, AppError::Validation(msg) if msg == "bad"));
    }

    #[test]
    fn test_status_is_exposed_for_store_errors() {
        assert_eq!(AppError::store(409, "conflict").status(), Some(409));
        assert_eq!(
            AppError::DeleteRejected {
                id: "x".to_string(),
                status: 500,
                attempts: 5,
            }
            .status(),
            Some(500)
        );
        assert_eq!(AppError::Cancelled.status(), None);
    }

    #[test]
    fn test_cancellation_is_distinct() {
        assert!(AppError::Cancelled.is_cancelled());
        assert!(!AppError::service_unavailable("store").is_cancelled());
        assert_eq!(AppError::Cancelled.code(), "CANCELLED");
    }

    #[test]
    fn test_exhausted_message_names_attempts() {
        let err = AppError::DeleteExhausted {
            id: "doc-1".to_string(),
            attempts: 5,
            last_error: "connection reset".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Delete of 'doc-1' failed after 5 attempts: connection reset"
        );
    }
}
