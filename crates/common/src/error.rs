//! Error types for warden.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Caller Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A non time-bounded action was handed to the reversal engine.
    #[error("Invalid action kind: {0}")]
    InvalidActionKind(String),

    // === Infrastructure Errors ===
    #[error("Database error: {0}")]
    Database(String),

    /// The chat platform rejected or failed an undo call.
    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidActionKind(_) => "INVALID_ACTION_KIND",
            Self::Database(_) => "STORAGE_FAILURE",
            Self::Platform(_) => "UNDO_FAILURE",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Returns whether the failed operation may succeed if attempted again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Platform(_))
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
