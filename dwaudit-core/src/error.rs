//! Error types for the audit engine.
//!
//! Source errors carry a credential-free context string. Connection strings
//! are never embedded in error messages; callers that need to mention a
//! source use [`crate::security::redact_connection_string`] first.

use thiserror::Error;

/// Main error type for audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Requested column does not exist in the dataset
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    /// Detector invoked on a column whose type it cannot handle
    #[error("Detector {detector} does not support column '{column}' of type {dtype}")]
    UnsupportedColumnType {
        column: String,
        detector: String,
        dtype: String,
    },

    /// A detector's match pattern does not compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Data source could not produce a dataset (credentials sanitized)
    #[error("Data source failed: {context}")]
    Source {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// An exporter could not produce its output
    #[error("Export failed: {context}")]
    Export { context: String },
}

/// Convenience type alias for Results with AuditError
pub type Result<T> = std::result::Result<T, AuditError>;

impl AuditError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a column-not-found error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates an unsupported column type error
    pub fn unsupported(
        column: impl Into<String>,
        detector: impl Into<String>,
        dtype: impl Into<String>,
    ) -> Self {
        Self::UnsupportedColumnType {
            column: column.into(),
            detector: detector.into(),
            dtype: dtype.into(),
        }
    }

    /// Creates an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Creates a data source error with context
    pub fn source_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates an export error
    pub fn export(context: impl Into<String>) -> Self {
        Self::Export {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message() {
        let error = AuditError::configuration("min_year exceeds max_year");
        assert_eq!(
            error.to_string(),
            "Configuration error: min_year exceeds max_year"
        );
    }

    #[test]
    fn test_unsupported_error_names_everything() {
        let error = AuditError::unsupported("amount", "leading_spaces", "numeric");
        let message = error.to_string();
        assert!(message.contains("amount"));
        assert!(message.contains("leading_spaces"));
        assert!(message.contains("numeric"));
    }

    #[test]
    fn test_invalid_pattern_message() {
        let error = AuditError::invalid_pattern("[bad", "unclosed character class");
        assert_eq!(
            error.to_string(),
            "Invalid pattern '[bad': unclosed character class"
        );
    }

    #[test]
    fn test_source_error_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = AuditError::source_failed("Failed to count rows in 'orders'", cause);

        assert_eq!(
            error.to_string(),
            "Data source failed: Failed to count rows in 'orders'"
        );
        assert!(std::error::Error::source(&error).is_some());
    }
}
