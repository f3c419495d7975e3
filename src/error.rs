//! Error types for the tilepilot crate.
//!
//! Nothing on the decision or episode path returns these: artifact loading
//! converts them into [`ArtifactStatus`](crate::policy::ArtifactStatus) values
//! and the engine degrades to its next fallback tier instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::policy::ArtifactKind;

/// Main error type for the crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("{kind} artifact not found at {}", path.display())]
    ArtifactNotFound { kind: ArtifactKind, path: PathBuf },

    #[error("failed to parse {kind} artifact at {}: {message}", path.display())]
    ArtifactParse {
        kind: ArtifactKind,
        path: PathBuf,
        message: String,
    },

    #[error("invalid state key '{key}': {reason}")]
    InvalidStateKey { key: String, reason: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_key(key: &str, reason: impl Into<String>) -> Self {
        Error::InvalidStateKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}
