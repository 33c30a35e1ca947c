//! C FFI layer for secapi-core
//!
//! Provides the handle-based C interface over [`Session`](crate::Session).
//! All functions use #[repr(C)] types and panic-safe wrappers, and report a
//! [`SecurityStatus`].

pub mod crypto;
pub mod error;
pub mod handles;
pub mod keymgr;
pub mod types;

pub use error::SecurityStatus;
pub use handles::SecapiHandle;
pub use types::{SecapiAesParam, SecapiData, SecapiGcmParam, SecapiRsaParam};

// Re-export FFI functions for C clients
pub use crypto::{
    secapi_aes_decrypt, secapi_aes_encrypt, secapi_gcm_decrypt, secapi_gcm_encrypt,
    secapi_rsa_decrypt, secapi_rsa_encrypt,
};
pub use keymgr::{
    secapi_data_free, secapi_deinit, secapi_init, secapi_key_generate, secapi_key_remove,
    secapi_key_set,
};

/// Number of library-allocated output buffers not yet released.
pub fn live_output_buffers() -> usize {
    handles::live_output_buffers()
}
