//! Store registry module.
//!
//! This module tracks open storage instances by filesystem path. The
//! [`StoreRegistry`] owns one [`StoreHandle`] per open path and guarantees
//! that a path is never physically opened twice; handles expose the engine's
//! data operations (get/put/delete/keys) on an open instance.

mod error;
mod handle;
mod registry;

pub use error::StoreError;
pub use handle::StoreHandle;
pub use registry::StoreRegistry;
