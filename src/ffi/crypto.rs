//! C entry points for AES, RSA and AES-GCM.
//!
//! Every function:
//! - is panic-safe (a caught panic reports `Error`)
//! - validates in the documented order before touching the key store
//! - writes a library-owned buffer into `output` only on success
//!
//! # Safety (all functions)
//! - `handle` must be null or a pointer returned by `secapi_init`
//! - Parameter structs, `key_name` and `input` must be null or valid for reads
//! - `output` must be null or valid for writes
//! - Buffers returned in `output` must be released with `secapi_data_free`

use crate::Session;
use crate::error::Result;
use crate::ffi::error::{SecurityStatus, guard};
use crate::ffi::handles::SecapiHandle;
use crate::ffi::types::{self, SecapiAesParam, SecapiData, SecapiGcmParam, SecapiRsaParam};
use crate::validate::{RawParams, Request, validate_request};
use std::ffi::c_char;
use std::ptr;

/// Acquire the session behind `handle`, validate `request` and run `op`.
///
/// # Safety
/// - `handle` must be null or a pointer returned by `secapi_init`
unsafe fn dispatch<'a, P, T>(
    handle: *const SecapiHandle,
    request: Request<'a, P>,
    op: impl FnOnce(&Session, &P::Checked, &str, &[u8]) -> Result<T>,
) -> Result<T>
where
    P: RawParams,
{
    // SAFETY: Caller contract; unknown handles yield None
    let session = unsafe { SecapiHandle::acquire(handle) };
    let request = validate_request(session.as_deref(), request)?;
    op(request.session, &request.params, request.key_name, request.input)
}

/// Encrypt `input` with AES.
///
/// # Returns
/// - `Ok` with the ciphertext in `output`
/// - `InvalidInputParams` for a null handle, parameter, input or output, or an
///   unknown mode code
/// - `InvalidKeyIndex` for a null, empty or unknown key name
/// - `Error` for a wrong key type, missing IV or misaligned input
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_aes_encrypt(
    handle: *mut SecapiHandle,
    param: *const SecapiAesParam,
    key_name: *const c_char,
    input: *const SecapiData,
    output: *mut SecapiData,
) -> SecurityStatus {
    guard(|| {
        // SAFETY: Pointer validity per the module contract
        let request = unsafe {
            Request {
                params: SecapiAesParam::read(param),
                key_name: types::key_name(key_name),
                input: SecapiData::input(input),
                has_output: !output.is_null(),
            }
        };
        // SAFETY: Handle validity per the module contract
        let ciphertext =
            unsafe { dispatch(handle, request, |s, p, k, d| s.aes_encrypt(p, k, d))? };
        // SAFETY: Output checked non-null by the validator
        unsafe { SecapiData::write(output, ciphertext) }
    })
}

/// Decrypt `input` with AES.
///
/// Status codes as for [`secapi_aes_encrypt`]; bad padding also reports `Error`.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_aes_decrypt(
    handle: *mut SecapiHandle,
    param: *const SecapiAesParam,
    key_name: *const c_char,
    input: *const SecapiData,
    output: *mut SecapiData,
) -> SecurityStatus {
    guard(|| {
        // SAFETY: Pointer validity per the module contract
        let request = unsafe {
            Request {
                params: SecapiAesParam::read(param),
                key_name: types::key_name(key_name),
                input: SecapiData::input(input),
                has_output: !output.is_null(),
            }
        };
        // SAFETY: Handle validity per the module contract
        let plaintext =
            unsafe { dispatch(handle, request, |s, p, k, d| s.aes_decrypt(p, k, d))? };
        // SAFETY: Output checked non-null by the validator
        unsafe { SecapiData::write(output, plaintext) }
    })
}

/// Encrypt `input` under the public half of an RSA key.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_rsa_encrypt(
    handle: *mut SecapiHandle,
    param: *const SecapiRsaParam,
    key_name: *const c_char,
    input: *const SecapiData,
    output: *mut SecapiData,
) -> SecurityStatus {
    guard(|| {
        // SAFETY: Pointer validity per the module contract
        let request = unsafe {
            Request {
                params: SecapiRsaParam::read(param),
                key_name: types::key_name(key_name),
                input: SecapiData::input(input),
                has_output: !output.is_null(),
            }
        };
        // SAFETY: Handle validity per the module contract
        let ciphertext =
            unsafe { dispatch(handle, request, |s, p, k, d| s.rsa_encrypt(p, k, d))? };
        // SAFETY: Output checked non-null by the validator
        unsafe { SecapiData::write(output, ciphertext) }
    })
}

/// Decrypt `input` with an RSA private key.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_rsa_decrypt(
    handle: *mut SecapiHandle,
    param: *const SecapiRsaParam,
    key_name: *const c_char,
    input: *const SecapiData,
    output: *mut SecapiData,
) -> SecurityStatus {
    guard(|| {
        // SAFETY: Pointer validity per the module contract
        let request = unsafe {
            Request {
                params: SecapiRsaParam::read(param),
                key_name: types::key_name(key_name),
                input: SecapiData::input(input),
                has_output: !output.is_null(),
            }
        };
        // SAFETY: Handle validity per the module contract
        let plaintext =
            unsafe { dispatch(handle, request, |s, p, k, d| s.rsa_decrypt(p, k, d))? };
        // SAFETY: Output checked non-null by the validator
        unsafe { SecapiData::write(output, plaintext) }
    })
}

/// Authenticated encryption with AES-GCM.
///
/// The ciphertext goes to `output` and `param.tag_len` tag bytes are written
/// to `param.tag`, which counts as an output: a null tag buffer reports
/// `InvalidInputParams`.
///
/// # Safety
/// See the module documentation. `param.tag` must be writable for
/// `param.tag_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_gcm_encrypt(
    handle: *mut SecapiHandle,
    param: *const SecapiGcmParam,
    key_name: *const c_char,
    input: *const SecapiData,
    output: *mut SecapiData,
) -> SecurityStatus {
    guard(|| {
        // SAFETY: Null checked by as_ref
        let tag_out = unsafe { param.as_ref() }.map_or(ptr::null_mut(), |p| p.tag);
        // SAFETY: Pointer validity per the module contract
        let request = unsafe {
            Request {
                params: SecapiGcmParam::read_for_encrypt(param),
                key_name: types::key_name(key_name),
                input: SecapiData::input(input),
                has_output: !output.is_null() && !tag_out.is_null(),
            }
        };
        // SAFETY: Handle validity per the module contract
        let sealed =
            unsafe { dispatch(handle, request, |s, p, k, d| s.gcm_encrypt(p, k, d))? };
        // SAFETY: tag_out is non-null (validated) and writable for tag_len bytes,
        // which is exactly the length of the produced tag
        unsafe { ptr::copy_nonoverlapping(sealed.tag.as_ptr(), tag_out, sealed.tag.len()) };
        // SAFETY: Output checked non-null by the validator
        unsafe { SecapiData::write(output, sealed.ciphertext) }
    })
}

/// Authenticated decryption with AES-GCM against `param.tag`.
///
/// A null `param.aad` means no AAD. Any mismatch in AAD, tag or ciphertext
/// reports `Error` and leaves `output` untouched.
///
/// # Safety
/// See the module documentation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn secapi_gcm_decrypt(
    handle: *mut SecapiHandle,
    param: *const SecapiGcmParam,
    key_name: *const c_char,
    input: *const SecapiData,
    output: *mut SecapiData,
) -> SecurityStatus {
    guard(|| {
        // SAFETY: Pointer validity per the module contract
        let request = unsafe {
            Request {
                params: SecapiGcmParam::read_for_decrypt(param),
                key_name: types::key_name(key_name),
                input: SecapiData::input(input),
                has_output: !output.is_null(),
            }
        };
        // SAFETY: Handle validity per the module contract
        let plaintext =
            unsafe { dispatch(handle, request, |s, p, k, d| s.gcm_decrypt(p, k, d))? };
        // SAFETY: Output checked non-null by the validator
        unsafe { SecapiData::write(output, plaintext) }
    })
}
