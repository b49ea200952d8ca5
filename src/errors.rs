//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the inventory service, providing the error
//! types and conversions shared by all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from storage, matching, configuration, API
//! - **Output**: Structured error types with context
//! - **Error Categories**: Input validation, Storage, Configuration, API
//!
//! ## Key Features
//! - Distinct `InvalidInput` so callers never conflate "could not check"
//!   with "no duplicate found"
//! - Storage-level duplicate rejection surfaced as its own variant
//! - Automatic conversion from the storage and serialization stack

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, StockError>;

/// Error types for the inventory service
#[derive(Debug, Error)]
pub enum StockError {
    /// Required parameters missing for an operation that demands them
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Referenced record does not exist
    #[error("Model not found: {id}")]
    NotFound { id: String },

    /// Storage-level unique constraint rejected a write
    #[error("A model with identical details already exists (id: {existing_id})")]
    DuplicateModel { existing_id: String },

    /// Validation errors on configuration or stored data
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Storage collaborator failed or is unreachable
    #[error("Storage unavailable: {details}")]
    StorageUnavailable { details: String },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Record serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StockError {
    /// Error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            StockError::InvalidInput { .. } | StockError::ValidationFailed { .. } => "validation",
            StockError::NotFound { .. } => "not_found",
            StockError::DuplicateModel { .. } => "duplicate",
            StockError::Config { .. } | StockError::Toml(_) => "configuration",
            StockError::StorageUnavailable { .. }
            | StockError::Database(_)
            | StockError::Serialization(_) => "storage",
            StockError::Json(_) | StockError::Io(_) | StockError::Internal { .. } => "internal",
        }
    }

    /// Whether a non-destructive check may degrade to an empty result
    /// instead of surfacing this error to the user.
    pub fn is_fail_open(&self) -> bool {
        matches!(
            self,
            StockError::StorageUnavailable { .. }
                | StockError::Database(_)
                | StockError::Serialization(_)
        )
    }
}

/// Shorthand for input-validation failures on missing parameters
pub fn invalid_input(message: impl Into<String>) -> StockError {
    StockError::InvalidInput {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_cover_core_variants() {
        assert_eq!(invalid_input("missing colour").category(), "validation");
        assert_eq!(
            StockError::NotFound { id: "x".into() }.category(),
            "not_found"
        );
        assert_eq!(
            StockError::DuplicateModel {
                existing_id: "x".into()
            }
            .category(),
            "duplicate"
        );
    }

    #[test]
    fn only_storage_failures_fail_open() {
        assert!(StockError::StorageUnavailable {
            details: "down".into()
        }
        .is_fail_open());
        assert!(!invalid_input("missing modelName").is_fail_open());
        assert!(!StockError::NotFound { id: "x".into() }.is_fail_open());
    }
}
