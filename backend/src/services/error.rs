//! Error types for the analytics services.

use crate::db::repository::RepositoryError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Error type for analytics operations.
///
/// Validation failures are raised before the records store is touched;
/// store failures abort the whole operation and are never retried here.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Filter criteria cannot be turned into a selection rule.
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    /// Ranking parameters are out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The records store failed to execute or scan a request.
    #[error("Query error: {0}")]
    Query(#[from] RepositoryError),

    /// A spawned query task did not complete.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyticsError {
    pub fn invalid_criteria(message: impl Into<String>) -> Self {
        Self::InvalidCriteria(message.into())
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Validation errors are the caller's fault and never worth retrying.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidCriteria(_) | Self::InvalidParameter(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_convert_to_query() {
        let err: AnalyticsError = RepositoryError::connection("down").into();
        assert!(matches!(err, AnalyticsError::Query(_)));
        assert!(!err.is_validation());
        assert!(err.to_string().contains("Connection error: down"));
    }

    #[test]
    fn test_validation_errors() {
        assert!(AnalyticsError::invalid_criteria("empty gender").is_validation());
        assert!(AnalyticsError::invalid_parameter("index must be > 0").is_validation());
    }
}
