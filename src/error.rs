//! Centralized error types for mailto.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailto library.
#[derive(Error, Debug)]
pub enum MailtoError {
    /// I/O error with the associated file path.
    #[error("I/O error accessing '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A recipient segment is not a syntactically valid email address.
    #[error("{0} is not a valid email address")]
    InvalidRecipient(String),

    /// A client rule table was loaded without a default rule set.
    #[error("Client rule table has no default rules")]
    MissingDefaultRules,

    /// A client rule table could not be parsed.
    #[error("Invalid client rules in {origin}: {reason}")]
    InvalidRules { origin: String, reason: String },

    /// The configuration file could not be parsed.
    #[error("Invalid configuration '{path}': {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    /// The contact cache is missing or unreadable.
    #[error("Contact cache error '{path}': {reason}")]
    ContactCache { path: PathBuf, reason: String },

    /// The settings file could not be read or written.
    #[error("Settings error: {0}")]
    Settings(String),

    /// Installed email clients could not be listed.
    #[error("Could not list installed apps: {0}")]
    Discovery(String),

    /// The email client could not be launched.
    #[error("Could not open '{uri}' in {app}: {reason}")]
    Launch {
        app: String,
        uri: String,
        reason: String,
    },
}

/// Convenience alias for `Result<T, MailtoError>`.
pub type Result<T> = std::result::Result<T, MailtoError>;

impl MailtoError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
