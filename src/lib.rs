//! Registry of open key-value stores, addressed by filesystem path.
//!
//! An embedded [fjall] store lives in a directory and holds a single
//! exclusive lock while open. This library keeps the bookkeeping around that
//! fact: a [`StoreRegistry`] maps each path to the one live [`StoreHandle`]
//! for it, so opening the same path twice yields the same handle instead of
//! a second engine instance fighting over the lock.
//!
//! # Quick Start
//!
//! ```ignore
//! use kv_registry::prelude::*;
//!
//! let registry = StoreRegistry::new();
//!
//! // First open creates the store on disk; later opens reuse the handle.
//! let store = registry.open("/var/lib/app/store")?;
//! store.put("greeting", b"hello")?;
//! assert_eq!(store.get("greeting")?.as_deref(), Some(&b"hello"[..]));
//!
//! // Closing releases the registry entry (and the lock, once every
//! // outstanding handle is dropped). Closing again is an error.
//! registry.close("/var/lib/app/store")?;
//! ```
//!
//! # Modules
//!
//! - [`store`] - The registry and per-store handles (always available)
//! - [`config`] - TOML configuration listing stores to open at startup
//! - [`ffi`] - C ABI surface for foreign hosts (requires `ffi` feature)
//!
//! # Feature Flags
//!
//! - `ffi` - Build the C boundary; implies `logging` (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own
//!   subscriber unless they call the boundary's logging initializer)
//! - `full` - Enable all features

pub mod config;
#[cfg(feature = "ffi")]
pub mod ffi;
mod logging;
pub mod prelude;
pub mod store;

mod error;

// Re-export the unified error type
pub use error::{Error, Result};

// Re-export the core types at crate root for convenience
pub use config::{Config, ConfigError, StoreConfig};
pub use store::{StoreError, StoreHandle, StoreRegistry};
