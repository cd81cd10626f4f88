//! Convenient re-exports for common usage patterns.
//!
//! This module provides a single import to bring all commonly used types
//! into scope.
//!
//! # Example
//!
//! ```ignore
//! use kv_registry::prelude::*;
//!
//! let registry = StoreRegistry::new();
//! let store = registry.open("/var/lib/app/store")?;
//! store.put("greeting", b"hello")?;
//! registry.close("/var/lib/app/store")?;
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Registry and store types
pub use crate::store::{StoreError, StoreHandle, StoreRegistry};

// Configuration types
pub use crate::config::{Config, ConfigError, StoreConfig};
