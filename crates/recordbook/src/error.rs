//! Error types for recordbook.
//!
//! This module defines all error types used throughout the recordbook crate.
//! Catalog operations surface exactly one of three domain failures
//! (`NotFound`, `Validation`, `Conflict`); the remaining variants cover the
//! ambient concerns of configuration and snapshot files.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A documented flat file.
    File,
    /// A field within a file's record layout.
    Field,
    /// A documented program.
    Program,
    /// A key-file reference attached to a program.
    KeyFile,
    /// A note attached to a program.
    Note,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Field => write!(f, "field"),
            Self::Program => write!(f, "program"),
            Self::KeyFile => write!(f, "key file"),
            Self::Note => write!(f, "note"),
        }
    }
}

/// The main error type for recordbook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Catalog Errors ===
    /// An operation referenced an id absent from the catalog.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// What kind of entity was looked up.
        entity: EntityKind,
        /// The key that was looked up, rendered for display.
        key: String,
    },

    /// Required input was missing or malformed.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// A uniqueness rule was violated.
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflicting keys.
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

/// A specialized Result type for recordbook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error for the given entity and key.
    #[must_use]
    pub fn not_found(entity: EntityKind, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Check if this error reports a missing entity.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error reports invalid input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error reports a uniqueness violation.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
