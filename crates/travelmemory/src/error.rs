//! Error types for travelmemory.
//!
//! This module defines the error type shared by the capture controller, the
//! save pipeline, storage and configuration. Cancelled workflows are not
//! errors; they are reported through [`crate::workflow::WorkflowOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for travelmemory operations.
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

    // === Capture Errors ===
    /// The device cannot record video.
    #[error("video recording unavailable: {reason}")]
    CapabilityUnavailable {
        /// What is missing (a camera, or movie capture support).
        reason: String,
    },

    /// A capture session is already recording.
    #[error("a capture session is already recording")]
    AlreadyRecording,

    /// The operation needs an active recording.
    #[error("no capture session is recording")]
    NotRecording,

    /// The camera rejected an operation.
    #[error("camera error: {0}")]
    Camera(String),

    // === Save Errors ===
    /// The media-picked event carried no media location.
    #[error("picked media has no location")]
    MediaMissing,

    /// The picked media location could not be resolved to a file URL.
    #[error("picked media could not be resolved: {path}")]
    MediaUnresolved {
        /// The path that failed to resolve.
        path: PathBuf,
    },

    /// The clip could not be written to the media library.
    #[error("failed to save video to the media library: {reason}")]
    SaveFailed {
        /// Why the library refused or failed the save.
        reason: String,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for travelmemory operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new camera error.
    #[must_use]
    pub fn camera(message: impl Into<String>) -> Self {
        Self::Camera(message.into())
    }

    /// Create a capability error describing what is missing.
    #[must_use]
    pub fn capability_unavailable(reason: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a media library save failure.
    #[must_use]
    pub fn save_failed(reason: impl Into<String>) -> Self {
        Self::SaveFailed {
            reason: reason.into(),
        }
    }

    /// Check if this error means the device cannot record.
    #[must_use]
    pub fn is_capability_error(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable { .. })
    }}
