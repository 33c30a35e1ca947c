//! `#[repr(C)]` parameter and buffer structs plus the pointer readers that
//! turn them into validator requests.
//!
//! A pointer/length pair is read as follows:
//! - null pointer with zero length: absent
//! - non-null pointer with zero length: absent
//! - null pointer with non-zero length: malformed (`InvalidInputParams`)

use crate::error::{Result, SecurityError};
use crate::ffi::handles::{free_output_ptr, into_output_ptr};
use crate::validate::{RawAesParams, RawGcmParams, RawRsaParams};
use std::ffi::{CStr, c_char};
use std::slice;

/// A byte buffer passed in either direction.
///
/// Buffers written by the library must be released with `secapi_data_free`.
#[repr(C)]
#[derive(Debug)]
pub struct SecapiData {
    pub data: *mut u8,
    pub length: u32,
}

/// AES request parameters; `iv` may be null to use the key's stored IV.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SecapiAesParam {
    pub mode: u32,
    pub iv: *const u8,
    pub iv_len: u32,
}

/// RSA request parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SecapiRsaParam {
    pub scheme: u32,
    pub hash_a: u32,
    pub hash_b: u32,
    /// Reserved
    pub salt_len: u32,
}

/// AES-GCM request parameters.
///
/// `tag` receives `tag_len` bytes on encryption and supplies them on
/// decryption. `aad` may be null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SecapiGcmParam {
    pub cipher: u32,
    pub iv: *const u8,
    pub iv_len: u32,
    pub aad: *const u8,
    pub aad_len: u32,
    pub tag: *mut u8,
    pub tag_len: u32,
}

/// Read a pointer/length pair.
///
/// # Safety
/// - A non-null `ptr` must be valid for reads of `len` bytes for `'a`
pub(crate) unsafe fn raw_slice<'a>(
    ptr: *const u8,
    len: u32,
    what: &str,
) -> Result<Option<&'a [u8]>> {
    match (ptr.is_null(), len) {
        (_, 0) => Ok(None),
        (true, _) => Err(SecurityError::invalid_input(format!(
            "{what} pointer is null but length is {len}"
        ))),
        // SAFETY: Non-null and non-empty; validity guaranteed by the caller
        (false, len) => Ok(Some(unsafe { slice::from_raw_parts(ptr, len as usize) })),
    }
}

/// Read a NUL-terminated key name; null or non-UTF-8 names are absent.
///
/// # Safety
/// - A non-null `ptr` must point to a NUL-terminated string valid for `'a`
pub(crate) unsafe fn key_name<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: Non-null and NUL-terminated per the caller contract
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

impl SecapiData {
    /// Read an input buffer; malformed or missing buffers are absent.
    ///
    /// # Safety
    /// - A non-null `ptr` must point to a valid `SecapiData` whose buffer is
    ///   readable for `'a`
    pub(crate) unsafe fn input<'a>(ptr: *const Self) -> Option<&'a [u8]> {
        // SAFETY: Null checked by as_ref; validity guaranteed by the caller
        let data = unsafe { ptr.as_ref() }?;
        // SAFETY: Same contract as above
        unsafe { raw_slice(data.data, data.length, "data") }.ok().flatten()
    }

    /// Hand `bytes` to the caller through `out`.
    ///
    /// A buffer still held in `out` from an earlier call is freed first.
    ///
    /// # Safety
    /// - `out` must be non-null and point to a writable `SecapiData`
    pub(crate) unsafe fn write(out: *mut Self, bytes: Vec<u8>) -> Result<()> {
        let length = u32::try_from(bytes.len()).map_err(|_| {
            SecurityError::invalid_input(format!("output of {} bytes overflows u32", bytes.len()))
        })?;
        // SAFETY: Non-null and writable per the caller contract
        let out = unsafe { &mut *out };
        // SAFETY: Only frees pointers this library registered
        unsafe { free_output_ptr(out.data) };
        out.data = into_output_ptr(bytes);
        out.length = length;
        Ok(())
    }
}

impl SecapiAesParam {
    /// # Safety
    /// - A non-null `ptr` must point to a valid `SecapiAesParam` whose IV
    ///   buffer is readable for `'a`
    pub(crate) unsafe fn read<'a>(ptr: *const Self) -> Option<Result<RawAesParams<'a>>> {
        // SAFETY: Null checked by as_ref; validity guaranteed by the caller
        let param = unsafe { ptr.as_ref() }?;
        Some(
            // SAFETY: Same contract as above
            unsafe { raw_slice(param.iv, param.iv_len, "iv") }.map(|iv| RawAesParams {
                mode: param.mode,
                iv,
            }),
        )
    }
}

impl SecapiRsaParam {
    /// # Safety
    /// - A non-null `ptr` must point to a valid `SecapiRsaParam`
    pub(crate) unsafe fn read(ptr: *const Self) -> Option<RawRsaParams> {
        // SAFETY: Null checked by as_ref; validity guaranteed by the caller
        let param = unsafe { ptr.as_ref() }?;
        Some(RawRsaParams {
            scheme: param.scheme,
            hash_a: param.hash_a,
            hash_b: param.hash_b,
            salt_len: param.salt_len,
        })
    }
}

impl SecapiGcmParam {
    /// Read parameters for encryption; the tag buffer is an output here.
    ///
    /// # Safety
    /// - A non-null `ptr` must point to a valid `SecapiGcmParam` whose IV and
    ///   AAD buffers are readable for `'a`
    pub(crate) unsafe fn read_for_encrypt<'a>(
        ptr: *const Self,
    ) -> Option<Result<RawGcmParams<'a>>> {
        // SAFETY: Null checked by as_ref; validity guaranteed by the caller
        let param = unsafe { ptr.as_ref() }?;
        // SAFETY: Same contract as above
        Some(unsafe { param.raw(None) })
    }

    /// Read parameters for decryption; the tag buffer is an input here.
    ///
    /// # Safety
    /// - As for [`read_for_encrypt`](Self::read_for_encrypt), and the tag
    ///   buffer must be readable for `tag_len` bytes
    pub(crate) unsafe fn read_for_decrypt<'a>(
        ptr: *const Self,
    ) -> Option<Result<RawGcmParams<'a>>> {
        // SAFETY: Null checked by as_ref; validity guaranteed by the caller
        let param = unsafe { ptr.as_ref() }?;
        Some(
            // SAFETY: Same contract as above
            unsafe { raw_slice(param.tag, param.tag_len, "tag") }
                .and_then(|tag| unsafe { param.raw(tag) }),
        )
    }

    /// # Safety
    /// - The IV and AAD buffers must be readable for `'a`
    unsafe fn raw<'a>(&self, tag: Option<&'a [u8]>) -> Result<RawGcmParams<'a>> {
        // SAFETY: Caller contract
        let iv = unsafe { raw_slice(self.iv, self.iv_len, "iv") }?;
        // SAFETY: Caller contract
        let aad = unsafe { raw_slice(self.aad, self.aad_len, "aad") }?;
        Ok(RawGcmParams {
            mode: self.cipher,
            iv: iv.unwrap_or_default(),
            aad: aad.unwrap_or_default(),
            tag_len: self.tag_len as usize,
            tag,
        })
    }
}
