//! Error types for partstrack.
//!
//! This module defines the crate-wide error type and the tracking sync error
//! taxonomy surfaced to users as inline notices.

use std::path::PathBuf;
use thiserror::Error;

use crate::part::PartId;

/// The main error type for partstrack operations.
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

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// No part with the given id exists.
    #[error("part {0} not found")]
    PartNotFound(PartId),

    /// A viewer operation needs a part in view and none is open.
    #[error("no part is open in the viewer")]
    NoPartOpen,

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

    // === Tracking Errors ===
    /// A tracking sync failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    // === I/O Errors ===
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

/// A specialized Result type for partstrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Check if this error means the part does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PartNotFound(_))
    }
}

/// Failures of a tracking lookup.
///
/// None of these mutate part state; cached tracking data is kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The request never produced a usable response.
    #[error("network error: {0}")]
    Network(String),

    /// The provider is throttling lookups.
    #[error("{0}")]
    RateLimited(String),

    /// The provider answered with an error.
    #[error("tracking provider error: {0}")]
    Provider(String),

    /// A lookup for this part is already running.
    #[error("refresh already in progress for part {0}")]
    AlreadyInFlight(PartId),
}

impl SyncError {
    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a provider error.
    #[must_use]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Create a rate-limit error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited(message.into())
    }

    /// Whether this is a soft failure shown as a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Whether the lookup was suppressed by single-flight.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::AlreadyInFlight(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
