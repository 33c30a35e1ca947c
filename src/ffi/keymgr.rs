//! C entry points for the session lifecycle and key management.

use crate::error::{Result, SecurityError};
use crate::ffi::error::{SecurityStatus, guard};
use crate::ffi::handles::{SecapiHandle, free_output_ptr};
use crate::ffi::types::{self, SecapiData};
use crate::keystore::{KeyMaterial, STORED_IV_LEN};
use crate::params::KeyType;
use crate::validate;
use crate::{Session, SessionConfig};
use std::ffi::c_char;
use std::sync::Arc;
use tracing::debug;

/// Initialize a session and store its handle in `*handle_out`.
///
/// # Returns
/// - `Ok` on success
/// - `InvalidInputParams` if `handle_out` is null
///
/// # Safety
/// - `handle_out` must be null or valid for writes
/// - The handle must be released with `secapi_deinit`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_init(handle_out: *mut *mut SecapiHandle) -> SecurityStatus {
    guard(|| {
        if handle_out.is_null() {
            return Err(SecurityError::invalid_input("null handle destination"));
        }
        let session = Session::with_config(SessionConfig::default())?;
        // SAFETY: Checked non-null above; writable per the caller contract
        unsafe { *handle_out = SecapiHandle::into_opaque_ptr(session) };
        Ok(())
    })
}

/// Tear down a session and every key it holds.
///
/// Calls already running on other threads finish first; the session is
/// dropped when the last one returns.
///
/// # Returns
/// - `Ok` on success
/// - `InvalidInputParams` for a null, unknown or already released handle
///
/// # Safety
/// - `handle` must not be used after this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_deinit(handle: *mut SecapiHandle) -> SecurityStatus {
    guard(|| {
        // from_opaque_ptr handles null check and validity tracking
        // SAFETY: If Some is returned, the registry's reference is ours
        let session = unsafe { SecapiHandle::from_opaque_ptr(handle) }
            .ok_or_else(|| SecurityError::invalid_input("null or unknown handle"))?;
        match Arc::try_unwrap(session) {
            Ok(session) => session.deinit(),
            Err(in_flight) => {
                debug!(id = in_flight.id(), "deinit deferred to in-flight calls");
            }
        }
        Ok(())
    })
}

/// Generate a key of `key_type` under `key_name`.
///
/// # Returns
/// - `Ok` on success
/// - `InvalidInputParams` for a null handle or unknown key type code
/// - `InvalidKeyIndex` for a null, empty or already used key name
/// - `Error` if the store is full or generation fails
///
/// # Safety
/// - `handle` must be null or a pointer returned by `secapi_init`
/// - `key_name` must be null or a valid NUL-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_key_generate(
    handle: *mut SecapiHandle,
    key_type: u32,
    key_name: *const c_char,
) -> SecurityStatus {
    guard(|| {
        // SAFETY: Caller contract
        let (session, key_type, key_name) = unsafe { key_request(handle, key_type, key_name) }?;
        session.key_generate(key_type, key_name)
    })
}

/// Remove the key `key_name`, which must be of `key_type`.
///
/// Unknown names and type mismatches report `InvalidKeyIndex`.
///
/// # Safety
/// As for [`secapi_key_generate`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_key_remove(
    handle: *mut SecapiHandle,
    key_type: u32,
    key_name: *const c_char,
) -> SecurityStatus {
    guard(|| {
        // SAFETY: Caller contract
        let (session, key_type, key_name) = unsafe { key_request(handle, key_type, key_name) }?;
        session.key_remove(key_type, key_name)
    })
}

/// Import key material under `key_name`.
///
/// AES keys are raw bytes of the length `key_type` implies. RSA keys are
/// PKCS#1 DER private keys whose modulus matches `key_type`. `iv` is
/// optional, AES only and exactly 16 bytes.
///
/// # Returns
/// - `Ok` on success
/// - `InvalidInputParams` for a null handle or key buffer, an unknown type
///   code, or material that does not match `key_type`
/// - `InvalidKeyIndex` for a null, empty or already used key name
///
/// # Safety
/// As for [`secapi_key_generate`]; `key` and `iv` must be null or valid for
/// reads.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_key_set(
    handle: *mut SecapiHandle,
    key_type: u32,
    key_name: *const c_char,
    key: *const SecapiData,
    iv: *const SecapiData,
) -> SecurityStatus {
    guard(|| {
        // SAFETY: Caller contract
        let (session, key_type, key_name) = unsafe { key_request(handle, key_type, key_name) }?;
        // SAFETY: Caller contract
        let key = unsafe { SecapiData::input(key) }
            .ok_or_else(|| SecurityError::invalid_input("null key material"))?;
        // SAFETY: Caller contract
        let iv = match unsafe { SecapiData::input(iv) } {
            None => None,
            Some(iv) => Some(<[u8; STORED_IV_LEN]>::try_from(iv).map_err(|_| {
                SecurityError::invalid_input(format!(
                    "stored IV must be {STORED_IV_LEN} bytes, got {}",
                    iv.len()
                ))
            })?),
        };

        let material = if key_type.is_aes() {
            KeyMaterial::aes(key, iv)?
        } else if iv.is_some() {
            return Err(SecurityError::invalid_input("RSA keys carry no IV"));
        } else {
            KeyMaterial::rsa_from_pkcs1_der(key)?
        };
        if material.key_type() != key_type {
            return Err(SecurityError::invalid_input(format!(
                "material is {:?}, expected {key_type:?}",
                material.key_type()
            )));
        }
        session.key_set(key_name, material)
    })
}

/// Release a buffer the library wrote into `data`, zeroizing it first.
///
/// Null structs, empty buffers and buffers the library did not allocate are
/// left alone, so calling this twice is harmless.
///
/// # Safety
/// - `data` must be null or valid for reads and writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_data_free(data: *mut SecapiData) {
    let _ = guard(|| {
        // SAFETY: Null checked by as_mut; validity per the caller contract
        let Some(data) = (unsafe { data.as_mut() }) else {
            return Ok(());
        };
        // SAFETY: Only pointers registered by this library are freed
        if unsafe { free_output_ptr(data.data) } {
            data.data = std::ptr::null_mut();
            data.length = 0;
        }
        Ok(())
    });
}

/// Validation steps 1 to 3 for key management calls.
///
/// # Safety
/// - `handle` must be null or a pointer returned by `secapi_init`
/// - `key_name` must be null or a valid NUL-terminated string
unsafe fn key_request<'a>(
    handle: *const SecapiHandle,
    key_type: u32,
    key_name: *const c_char,
) -> Result<(Arc<Session>, KeyType, &'a str)> {
    // SAFETY: Caller contract
    let session = unsafe { SecapiHandle::acquire(handle) }
        .ok_or_else(|| SecurityError::invalid_input("null or unknown handle"))?;
    let key_type = KeyType::try_from(key_type)?;
    // SAFETY: Caller contract
    let key_name = validate::key_name(unsafe { types::key_name(key_name) })?;
    Ok((session, key_type, key_name))
}
