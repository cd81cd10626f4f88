//! C ABI boundary for foreign hosts.
//!
//! This module is the shared-library surface of the crate: every entry point
//! is callable from C (or anything speaking the C ABI) and follows the same
//! conventions.
//!
//! - The registry is an explicitly owned object. Create one with
//!   [`kvreg_registry_new`] or [`kvreg_registry_open_config`], pass it to
//!   every call, and destroy it with [`kvreg_registry_free`], which closes
//!   every store still open.
//! - Fallible calls return a [`Status`] and, on failure, write descriptive
//!   error text to `err_out`. `err_out` may be null when the caller does not
//!   want the message; a returned string is released with
//!   [`kvreg_string_free`]. A success and a failure can never be confused:
//!   the status is the discriminant, the strings are only payload.
//! - Byte buffers returned by [`kvreg_get`] are released with
//!   [`kvreg_buf_free`].
//! - Panics never unwind across the boundary; a caught panic reports
//!   [`Status::Panic`].
//!
//! Every call is synchronous and the registry serializes its own state, so a
//! single registry may be shared by multiple host threads.

use std::ffi::{CStr, CString, c_char};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

use tracing_subscriber::EnvFilter;

use crate::logging::error;
use crate::store::{StoreError, StoreRegistry};

/// Filter installed by [`kvreg_logging_init`] when the host passes null.
const DEFAULT_LOG_FILTER: &str = "info";

/// Result discriminant returned by every fallible boundary function.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The call succeeded.
    Ok = 0,
    /// A required pointer argument was null.
    NullArgument = 1,
    /// A string argument was not valid UTF-8.
    InvalidUtf8 = 2,
    /// The store path was empty or malformed.
    InvalidPath = 3,
    /// No open store is registered for the path.
    NotOpen = 4,
    /// The engine could not open the store at the path.
    OpenFailed = 5,
    /// The engine failed during a data operation.
    Engine = 6,
    /// The requested key does not exist.
    NotFound = 7,
    /// Configuration or logging setup failed.
    Config = 8,
    /// An internal panic was caught at the boundary.
    Panic = 9,
}

impl From<&StoreError> for Status {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::InvalidPath(_) => Status::InvalidPath,
            StoreError::NotOpen(_) => Status::NotOpen,
            StoreError::OpenFailed { .. } => Status::OpenFailed,
            StoreError::Fjall(_) | StoreError::Io(_) => Status::Engine,
        }
    }
}

impl From<&crate::Error> for Status {
    fn from(err: &crate::Error) -> Self {
        match err {
            crate::Error::Store(e) => Status::from(e),
            crate::Error::Config(_) => Status::Config,
            crate::Error::Io(_) => Status::Engine,
        }
    }
}

/// Crate version as a static NUL-terminated string.
///
/// Never null. The string is borrowed from the library; do not free it.
#[unsafe(no_mangle)]
pub extern "C" fn kvreg_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}

/// Install a process-wide tracing subscriber writing to stderr.
///
/// `filter` uses tracing-subscriber's `EnvFilter` syntax (`"info"`,
/// `"kv_registry=debug"`, ...); null selects `"info"`. Fails with
/// [`Status::Config`] if the filter is invalid or a subscriber is already
/// installed.
///
/// # Safety
///
/// `filter`, if non-null, must be a valid NUL-terminated string; `err_out`,
/// if non-null, must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_logging_init(
    filter: *const c_char,
    err_out: *mut *mut c_char,
) -> Status {
    unsafe { clear_out(err_out) };
    guarded(err_out, || {
        let filter = if filter.is_null() {
            DEFAULT_LOG_FILTER
        } else {
            match unsafe { read_str(filter, "filter", err_out) } {
                Ok(f) => f,
                Err(status) => return status,
            }
        };

        let env_filter = match EnvFilter::try_new(filter) {
            Ok(f) => f,
            Err(e) => {
                unsafe { write_err(err_out, &format!("Invalid log filter: {}", e)) };
                return Status::Config;
            }
        };

        match tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .try_init()
        {
            Ok(()) => Status::Ok,
            Err(e) => {
                unsafe { write_err(err_out, &e.to_string()) };
                Status::Config
            }
        }
    })
}

/// Create an empty registry.
///
/// Never fails. Destroy with [`kvreg_registry_free`].
#[unsafe(no_mangle)]
pub extern "C" fn kvreg_registry_new() -> *mut StoreRegistry {
    Box::into_raw(Box::new(StoreRegistry::new()))
}

/// Create a registry and open every store listed in the TOML file at
/// `config_path`.
///
/// On success `*registry_out` receives the new registry. On failure nothing
/// is registered, `*registry_out` is null, and any store opened before the
/// failing one has been released again.
///
/// # Safety
///
/// `config_path` must be a valid NUL-terminated string, `registry_out` must
/// be writable, and `err_out`, if non-null, must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_registry_open_config(
    config_path: *const c_char,
    registry_out: *mut *mut StoreRegistry,
    err_out: *mut *mut c_char,
) -> Status {
    unsafe { clear_out(err_out) };
    if registry_out.is_null() {
        unsafe { write_err(err_out, "registry_out is null") };
        return Status::NullArgument;
    }
    unsafe { *registry_out = ptr::null_mut() };

    guarded(err_out, || {
        let config_path = match unsafe { read_str(config_path, "config_path", err_out) } {
            Ok(p) => p,
            Err(status) => return status,
        };

        match StoreRegistry::from_config_file(config_path) {
            Ok(registry) => {
                unsafe { *registry_out = Box::into_raw(Box::new(registry)) };
                Status::Ok
            }
            Err(e) => {
                unsafe { write_err(err_out, &e.to_string()) };
                Status::from(&e)
            }
        }
    })
}

/// Destroy a registry created by [`kvreg_registry_new`] or
/// [`kvreg_registry_open_config`], closing every store still open.
///
/// Passing null is a no-op.
///
/// # Safety
///
/// `registry`, if non-null, must have been returned by this library and must
/// not be used again after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_registry_free(registry: *mut StoreRegistry) {
    if registry.is_null() {
        return;
    }
    let registry = unsafe { Box::from_raw(registry) };
    // Closing flushes through the engine; a panic must not unwind into C.
    let _ = panic::catch_unwind(AssertUnwindSafe(move || {
        registry.close_all();
    }));
}

/// Open the store at `path`, registering it in `registry`.
///
/// Opening a path that is already registered succeeds without a second
/// physical open.
///
/// # Safety
///
/// `registry` must point to a live registry, `path` must be a valid
/// NUL-terminated string, and `err_out`, if non-null, must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_open(
    registry: *const StoreRegistry,
    path: *const c_char,
    err_out: *mut *mut c_char,
) -> Status {
    unsafe { clear_out(err_out) };
    guarded(err_out, || {
        let registry = match unsafe { registry_ref(registry, err_out) } {
            Ok(r) => r,
            Err(status) => return status,
        };
        let path = match unsafe { read_str(path, "path", err_out) } {
            Ok(p) => p,
            Err(status) => return status,
        };
        unsafe { report(err_out, registry.open(path).map(|_| ())) }
    })
}

/// Close the store at `path`, removing it from `registry`.
///
/// Fails with [`Status::NotOpen`] if the path has no registered store;
/// closing twice fails the second time.
///
/// # Safety
///
/// Same contract as [`kvreg_open`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_close(
    registry: *const StoreRegistry,
    path: *const c_char,
    err_out: *mut *mut c_char,
) -> Status {
    unsafe { clear_out(err_out) };
    guarded(err_out, || {
        let registry = match unsafe { registry_ref(registry, err_out) } {
            Ok(r) => r,
            Err(status) => return status,
        };
        let path = match unsafe { read_str(path, "path", err_out) } {
            Ok(p) => p,
            Err(status) => return status,
        };
        unsafe { report(err_out, registry.close(path)) }
    })
}

/// Report whether a store is currently open at `path`.
///
/// Never has side effects. A null registry or path, or a non-UTF-8 path,
/// reports `false`.
///
/// # Safety
///
/// `registry`, if non-null, must point to a live registry; `path`, if
/// non-null, must be a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_is_open(
    registry: *const StoreRegistry,
    path: *const c_char,
) -> bool {
    if registry.is_null() || path.is_null() {
        return false;
    }
    let registry = unsafe { &*registry };
    let Ok(path) = unsafe { CStr::from_ptr(path) }.to_str() else {
        return false;
    };
    panic::catch_unwind(AssertUnwindSafe(|| registry.is_open(path))).unwrap_or(false)
}

/// Number of stores currently open in `registry`.
///
/// A null registry reports zero.
///
/// # Safety
///
/// `registry`, if non-null, must point to a live registry.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_store_count(registry: *const StoreRegistry) -> usize {
    if registry.is_null() {
        return 0;
    }
    let registry = unsafe { &*registry };
    panic::catch_unwind(AssertUnwindSafe(|| registry.len())).unwrap_or(0)
}

/// Store `value` under `key` in the open store at `path`.
///
/// The write is persisted before the call returns. Fails with
/// [`Status::NotOpen`] if the path has no registered store.
///
/// # Safety
///
/// `registry` must point to a live registry; `path` and `key` must be valid
/// NUL-terminated strings; `value` must point to `value_len` readable bytes
/// (null is permitted when `value_len` is zero); `err_out`, if non-null,
/// must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_put(
    registry: *const StoreRegistry,
    path: *const c_char,
    key: *const c_char,
    value: *const u8,
    value_len: usize,
    err_out: *mut *mut c_char,
) -> Status {
    unsafe { clear_out(err_out) };
    guarded(err_out, || {
        let registry = match unsafe { registry_ref(registry, err_out) } {
            Ok(r) => r,
            Err(status) => return status,
        };
        let path = match unsafe { read_str(path, "path", err_out) } {
            Ok(p) => p,
            Err(status) => return status,
        };
        let key = match unsafe { read_str(key, "key", err_out) } {
            Ok(k) => k,
            Err(status) => return status,
        };
        let value = match unsafe { read_bytes(value, value_len, "value", err_out) } {
            Ok(v) => v,
            Err(status) => return status,
        };
        unsafe {
            report(
                err_out,
                registry.handle(path).and_then(|store| store.put(key, value)),
            )
        }
    })
}

/// Fetch the value stored under `key` in the open store at `path`.
///
/// On [`Status::Ok`], `*value_out` points to a buffer of `*value_len_out`
/// bytes owned by the caller; release it with [`kvreg_buf_free`]. An absent
/// key reports [`Status::NotFound`] with both outputs zeroed.
///
/// # Safety
///
/// `registry` must point to a live registry; `path` and `key` must be valid
/// NUL-terminated strings; `value_out` and `value_len_out` must be writable;
/// `err_out`, if non-null, must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_get(
    registry: *const StoreRegistry,
    path: *const c_char,
    key: *const c_char,
    value_out: *mut *mut u8,
    value_len_out: *mut usize,
    err_out: *mut *mut c_char,
) -> Status {
    unsafe { clear_out(err_out) };
    if value_out.is_null() || value_len_out.is_null() {
        unsafe { write_err(err_out, "value_out / value_len_out is null") };
        return Status::NullArgument;
    }
    unsafe {
        *value_out = ptr::null_mut();
        *value_len_out = 0;
    }

    guarded(err_out, || {
        let registry = match unsafe { registry_ref(registry, err_out) } {
            Ok(r) => r,
            Err(status) => return status,
        };
        let path = match unsafe { read_str(path, "path", err_out) } {
            Ok(p) => p,
            Err(status) => return status,
        };
        let key = match unsafe { read_str(key, "key", err_out) } {
            Ok(k) => k,
            Err(status) => return status,
        };

        match registry.handle(path).and_then(|store| store.get(key)) {
            Ok(Some(value)) => {
                let value = value.into_boxed_slice();
                unsafe {
                    *value_len_out = value.len();
                    *value_out = Box::into_raw(value) as *mut u8;
                }
                Status::Ok
            }
            Ok(None) => Status::NotFound,
            Err(e) => {
                unsafe { write_err(err_out, &e.to_string()) };
                Status::from(&e)
            }
        }
    })
}

/// Remove the value stored under `key` in the open store at `path`.
///
/// Removing an absent key succeeds. Fails with [`Status::NotOpen`] if the
/// path has no registered store.
///
/// # Safety
///
/// Same contract as [`kvreg_put`], minus the value buffer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_delete(
    registry: *const StoreRegistry,
    path: *const c_char,
    key: *const c_char,
    err_out: *mut *mut c_char,
) -> Status {
    unsafe { clear_out(err_out) };
    guarded(err_out, || {
        let registry = match unsafe { registry_ref(registry, err_out) } {
            Ok(r) => r,
            Err(status) => return status,
        };
        let path = match unsafe { read_str(path, "path", err_out) } {
            Ok(p) => p,
            Err(status) => return status,
        };
        let key = match unsafe { read_str(key, "key", err_out) } {
            Ok(k) => k,
            Err(status) => return status,
        };
        unsafe {
            report(
                err_out,
                registry.handle(path).and_then(|store| store.delete(key)),
            )
        }
    })
}

/// Release a string returned through `err_out`.
///
/// Passing null is a no-op.
///
/// # Safety
///
/// `s`, if non-null, must have been returned by this library and must not be
/// used again after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_string_free(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(s) });
}

/// Release a value buffer returned by [`kvreg_get`].
///
/// `len` must be the length the call reported. Passing null is a no-op.
///
/// # Safety
///
/// `buf`, if non-null, must have been returned by this library with length
/// `len` and must not be used again after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kvreg_buf_free(buf: *mut u8, len: usize) {
    if buf.is_null() {
        return;
    }
    let slice = unsafe { slice::from_raw_parts_mut(buf, len) };
    drop(unsafe { Box::from_raw(slice as *mut [u8]) });
}

// Helpers. All of these uphold the exported functions' documented contracts;
// out-pointers are only written when non-null.

/// Run a boundary body, containing panics.
fn guarded<F: FnOnce() -> Status>(err_out: *mut *mut c_char, f: F) -> Status {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            error!("panic caught at the C boundary");
            unsafe { write_err(err_out, "internal panic in kv-registry") };
            Status::Panic
        }
    }
}

/// Borrow the registry behind a boundary pointer.
unsafe fn registry_ref<'a>(
    registry: *const StoreRegistry,
    err_out: *mut *mut c_char,
) -> Result<&'a StoreRegistry, Status> {
    if registry.is_null() {
        unsafe { write_err(err_out, "registry is null") };
        return Err(Status::NullArgument);
    }
    Ok(unsafe { &*registry })
}

/// Read a required C string argument.
unsafe fn read_str<'a>(
    ptr: *const c_char,
    what: &str,
    err_out: *mut *mut c_char,
) -> Result<&'a str, Status> {
    if ptr.is_null() {
        unsafe { write_err(err_out, &format!("{} is null", what)) };
        return Err(Status::NullArgument);
    }
    match unsafe { CStr::from_ptr(ptr) }.to_str() {
        Ok(s) => Ok(s),
        Err(_) => {
            unsafe { write_err(err_out, &format!("{} is not valid UTF-8", what)) };
            Err(Status::InvalidUtf8)
        }
    }
}

/// Read a byte-buffer argument. Null is only valid for an empty buffer.
unsafe fn read_bytes<'a>(
    ptr: *const u8,
    len: usize,
    what: &str,
    err_out: *mut *mut c_char,
) -> Result<&'a [u8], Status> {
    if ptr.is_null() {
        if len == 0 {
            return Ok(&[]);
        }
        unsafe { write_err(err_out, &format!("{} is null", what)) };
        return Err(Status::NullArgument);
    }
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

/// Report a store-level result through the status/err_out convention.
unsafe fn report(err_out: *mut *mut c_char, result: Result<(), StoreError>) -> Status {
    match result {
        Ok(()) => Status::Ok,
        Err(e) => {
            unsafe { write_err(err_out, &e.to_string()) };
            Status::from(&e)
        }
    }
}

/// Write `msg` to `err_out` as a caller-owned C string.
unsafe fn write_err(err_out: *mut *mut c_char, msg: &str) {
    if err_out.is_null() {
        return;
    }
    // Interior NUL cannot be represented in a C string; truncate there.
    let msg = msg.split('\0').next().unwrap_or("");
    let msg = CString::new(msg).unwrap_or_default();
    unsafe { *err_out = msg.into_raw() };
}

/// Null out an out-pointer before doing any work.
unsafe fn clear_out<T>(out: *mut *mut T) {
    if !out.is_null() {
        unsafe { *out = ptr::null_mut() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_store_error() {
        let err = StoreError::InvalidPath("path must not be empty".to_string());
        assert_eq!(Status::from(&err), Status::InvalidPath);

        let err = StoreError::NotOpen("/tmp/missing".to_string());
        assert_eq!(Status::from(&err), Status::NotOpen);
    }

    #[test]
    fn test_version_is_package_version() {
        let version = unsafe { CStr::from_ptr(kvreg_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_write_err_roundtrip() {
        let mut err: *mut c_char = ptr::null_mut();
        unsafe { write_err(&mut err, "boom") };
        assert!(!err.is_null());

        let msg = unsafe { CStr::from_ptr(err) }.to_str().unwrap().to_string();
        assert_eq!(msg, "boom");
        unsafe { kvreg_string_free(err) };
    }

    #[test]
    fn test_write_err_null_target_is_noop() {
        unsafe { write_err(ptr::null_mut(), "ignored") };
    }
}
