//! Common test utilities and fixtures.
//!
//! This module provides shared helpers to reduce duplication across the
//! test suite.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

// =============================================================================
// Scratch Directories
// =============================================================================

/// Scratch area holding store directories for one test.
///
/// Dropping it removes everything, including any store the engine created.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create a fresh scratch area.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Path for a store named `name`, as a UTF-8 string.
    ///
    /// The directory itself is not created; the engine does that on first
    /// open.
    pub fn store_path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    /// Write a TOML config file into the scratch area and return its path.
    pub fn write_config(&self, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.dir.path().join("stores.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }
}
