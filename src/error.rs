//! Unified error hierarchy for Trailog
//!
//! Every failure is either surfaced to the user as a message or degraded to an
//! in-memory-only session; nothing here is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all Trailog operations
#[derive(Debug, Error)]
pub enum TrailogError {
    /// Form input rejected before any record was built
    #[error("Validation error: {0}")]
    Validation(String),

    /// Workout type other than running or cycling
    #[error("Unsupported workout type: {0}")]
    UnsupportedType(String),

    /// Operation referenced an id absent from the store
    #[error("Workout not found: {id}")]
    NotFound { id: String },

    /// Position could not be acquired; the map stays disabled
    #[error("Geolocation unavailable: {0}")]
    GeolocationUnavailable(String),

    /// Storage mirror failures
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage mirror errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading the stored workouts failed
    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    /// Writing the stored workouts failed
    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    /// Stored data is not a valid workout array
    #[error("Corrupted workout data: {reason}")]
    Corrupted { reason: String },

    /// Serializing the in-memory workouts failed
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Trailog operations
pub type Result<T> = std::result::Result<T, TrailogError>;

impl TrailogError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrailogError::Validation(_) => ErrorSeverity::Warning,
            TrailogError::UnsupportedType(_) => ErrorSeverity::Warning,
            TrailogError::GeolocationUnavailable(_) => ErrorSeverity::Warning,
            TrailogError::Persistence(_) => ErrorSeverity::Warning,
            // Ids always come from the store, so a miss is a broken invariant
            TrailogError::NotFound { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Whether the in-memory session can carry on after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.severity(), ErrorSeverity::Critical)
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TrailogError::Validation(reason) => format!("Not a valid input: {}", reason),
            TrailogError::UnsupportedType(kind) => {
                format!("Unknown workout type '{}'. Use running or cycling.", kind)
            }
            TrailogError::GeolocationUnavailable(_) => "Could not get your location".to_string(),
            TrailogError::Persistence(PersistenceError::WriteFailed { .. }) => {
                "Workouts could not be saved. Changes are kept for this session only.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Broken internal invariant
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
