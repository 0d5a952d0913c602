//! Error types for metrictrack.
//!
//! This module defines the crate-wide error type. Report generation and
//! import validation have their own narrower error types
//! ([`crate::report::ReportError`], [`crate::validate::ValidationError`])
//! which convert into [`Error`] at the boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::report::ReportError;
use crate::validate::ValidationError;

/// The main error type for metrictrack operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Writing the collection to the persistence backend failed.
    #[error("failed to persist metrics under key '{key}': {message}")]
    Persist {
        /// Storage key the collection lives under.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Record Errors ===
    /// A period code did not match `YYYY-MM` with a month in 01-12.
    #[error("invalid period '{0}': expected YYYY-MM with month 01-12")]
    InvalidPeriod(String),

    /// A record field failed its invariant.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A canonical index did not address a stored record.
    #[error("no metric at index {index} (collection holds {len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of records in the collection.
        len: usize,
    },

    /// A display position did not address a shown record.
    #[error("no metric displayed at position {0}")]
    UnknownPosition(usize),

    // === Transfer Errors ===
    /// An import payload was rejected; the collection was left untouched.
    #[error("import rejected: {0}")]
    Import(String),

    // === Report Errors ===
    /// Report generation failed.
    #[error(transparent)]
    Report(#[from] ReportError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for metrictrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::Import(err.to_string())
    }
}

impl Error {
    /// Create a new invalid record error.
    #[must_use]
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord(message.into())
    }

    /// Create a new persistence error.
    #[must_use]
    pub fn persist(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persist {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from the persistence layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. } | Self::DatabaseQuery(_) | Self::Persist { .. }
        )
    }

    /// Check if this error is an import rejection.
    #[must_use]
    pub fn is_import_rejected(&self) -> bool {
        matches!(self, Self::Import(_))
    }
}
