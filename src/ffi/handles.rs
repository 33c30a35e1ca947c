//! Opaque FFI handle types and output buffer tracking
//!
//! # Handle Validity Tracking
//!
//! Session handles are tracked in a global registry to detect:
//! - Double-deinit attempts (calling deinit on an already released handle)
//! - Use-after-deinit attempts (using a handle after it was released)
//!
//! Invalid handle operations return `SecurityStatus::InvalidInputParams`
//! instead of causing undefined behavior.
//!
//! A handle is an `Arc` turned into a raw pointer. Every call borrows its
//! own strong reference under the registry lock, so a concurrent deinit
//! cannot free a session that another thread is still using.
//!
//! # Output Buffers
//!
//! Every buffer the core hands to C is recorded with its length, which lets
//! `secapi_data_free` reject foreign pointers and tolerate repeated frees.

use crate::Session;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use zeroize::Zeroize;

/// Global registry of live session handles
static SESSION_HANDLES: LazyLock<Mutex<HashSet<usize>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Global registry of core-allocated output buffers (address -> length)
static OUTPUT_BUFFERS: LazyLock<Mutex<HashMap<usize, usize>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

// Registry updates are single inserts/removes, so a poisoned lock still
// guards a consistent set.
fn locked<T>(registry: &Mutex<T>) -> MutexGuard<'_, T> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

/// Generates an opaque FFI handle type with validity tracking.
///
/// This macro creates:
/// - A `#[repr(C)]` struct with zero-sized private field
/// - `into_opaque_ptr`: Move the inner value into an `Arc` and register it
/// - `from_opaque_ptr`: Unregister and take back the registry's reference
/// - `is_valid`: Check if handle is registered (tests only)
/// - `acquire`: Borrow a new strong reference (returns `Option`)
macro_rules! opaque_handle {
    (
        $(#[$meta:meta])*
        $handle:ident,
        $inner:ty,
        $registry:ident
    ) => {
        $(#[$meta])*
        #[repr(C)]
        pub struct $handle {
            _private: [u8; 0],
        }

        impl $handle {
            /// Convert from inner type to opaque FFI handle.
            ///
            /// The handle is registered in the global registry for validity tracking.
            /// The caller must eventually release it with `from_opaque_ptr` or the
            /// inner value leaks.
            pub(crate) fn into_opaque_ptr(inner: $inner) -> *mut Self {
                let ptr = Arc::into_raw(Arc::new(inner)) as *mut Self;
                locked(&$registry).insert(ptr as usize);
                ptr
            }

            /// Convert from opaque FFI handle back to the registry's reference.
            ///
            /// Returns `None` if the handle is invalid (null, already released, or never
            /// created). On success, the handle is unregistered and cannot be used again.
            ///
            /// # Safety
            /// - If `Some` is returned, the pointer is consumed and must not be used again
            pub(crate) unsafe fn from_opaque_ptr(ptr: *mut Self) -> Option<Arc<$inner>> {
                if ptr.is_null() {
                    return None;
                }
                if !locked(&$registry).remove(&(ptr as usize)) {
                    return None; // Handle was never created or already released
                }
                // SAFETY: Handle was registered, so it came from Arc::into_raw in
                // into_opaque_ptr and the registry's reference has not been released
                Some(unsafe { Arc::from_raw(ptr as *const $inner) })
            }

            /// Check if a handle is valid (registered and not released).
            #[cfg(test)]
            pub(crate) fn is_valid(ptr: *const Self) -> bool {
                !ptr.is_null() && locked(&$registry).contains(&(ptr as usize))
            }

            /// Take a new strong reference to the inner value.
            ///
            /// Returns `None` if the handle is invalid.
            ///
            /// # Safety
            /// - `ptr` must be null or a pointer previously returned by `into_opaque_ptr`
            pub(crate) unsafe fn acquire(ptr: *const Self) -> Option<Arc<$inner>> {
                if ptr.is_null() {
                    return None;
                }
                let handles = locked(&$registry);
                if !handles.contains(&(ptr as usize)) {
                    return None;
                }
                let inner = ptr as *const $inner;
                // SAFETY: The handle is registered and the registry lock is held, so
                // from_opaque_ptr cannot release the registry's reference before the
                // count is bumped
                unsafe {
                    Arc::increment_strong_count(inner);
                    Some(Arc::from_raw(inner))
                }
            }
        }
    };
}

opaque_handle!(
    /// Opaque handle for an initialized [`Session`]
    ///
    /// This is an opaque pointer type for FFI. The actual Session struct is
    /// never exposed across the FFI boundary - only this pointer.
    ///
    /// # Safety
    /// - Create with `secapi_init`
    /// - Release with `secapi_deinit`
    /// - Never dereference from C code
    SecapiHandle,
    Session,
    SESSION_HANDLES
);

/// Hand `bytes` to C as a tracked raw buffer.
///
/// Empty outputs are represented as a null pointer and are not tracked.
pub(crate) fn into_output_ptr(bytes: Vec<u8>) -> *mut u8 {
    if bytes.is_empty() {
        return std::ptr::null_mut();
    }
    let boxed = bytes.into_boxed_slice();
    let len = boxed.len();
    let ptr = Box::into_raw(boxed) as *mut u8;
    locked(&OUTPUT_BUFFERS).insert(ptr as usize, len);
    ptr
}

/// Zeroize and free a buffer produced by [`into_output_ptr`].
///
/// Returns `false` (and does nothing) for null, foreign or already freed
/// pointers.
///
/// # Safety
/// - If `true` is returned, `ptr` is dangling and must not be used again
pub(crate) unsafe fn free_output_ptr(ptr: *mut u8) -> bool {
    if ptr.is_null() {
        return false;
    }
    let Some(len) = locked(&OUTPUT_BUFFERS).remove(&(ptr as usize)) else {
        return false;
    };
    // SAFETY: The pointer was registered with this length by into_output_ptr,
    // which obtained it from Box::into_raw on a boxed slice
    let mut boxed = unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) };
    let bytes: &mut [u8] = &mut boxed;
    bytes.zeroize();
    true
}

/// Number of output buffers currently owned by C callers.
pub(crate) fn live_output_buffers() -> usize {
    locked(&OUTPUT_BUFFERS).len()
}
