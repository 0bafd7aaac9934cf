//! Error types for ssh-host-manager

use std::path::PathBuf;

/// Result type for ssh-host-manager operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, editing or launching hosts
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the home directory")]
    HomeDirUnavailable,

    #[error("Visit store {path} is not valid: {source}")]
    VisitStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid host entry: {0}")]
    InvalidEntry(String),

    #[error("Window error: {0}")]
    Gui(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
