//! Unified error type for the kv-registry library.
//!
//! This module provides a single [`Error`] type that encompasses all errors
//! that can occur in the library, making it easier to handle errors in
//! application code.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Unified error type for all registry operations.
///
/// This enum wraps the module-specific error types, allowing callers to use
/// a single error type throughout their application.
///
/// # Example
///
/// ```ignore
/// use kv_registry::{Result, StoreRegistry};
///
/// fn boot() -> Result<StoreRegistry> {
///     StoreRegistry::from_config_file("kv-registry.toml")
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Error from registry or store operations.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Error loading or parsing a configuration file.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a registry or store error.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns `true` if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
