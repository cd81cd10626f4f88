//! Error types for the store registry module.

use thiserror::Error;

/// Errors that can occur during registry and store operations.
///
/// Engine failures are never retried or rewritten: the engine's own error
/// text travels to the caller through the source chain.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    #[error("No open store at path: {0}")]
    NotOpen(String),

    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: fjall::Error,
    },

    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
