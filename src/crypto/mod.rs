//! Cryptographic engines.
//!
//! Each engine holds a [`KeyLookup`](crate::keystore::KeyLookup) capability
//! injected at construction and resolves key material by name on every
//! call. Engines never cache keys and never return partial output.
//!
//! # Engines
//! - [`aes::AesEngine`]: ECB/CBC/CTR with NoPad, ISO9797-M1/M2, PKCS5/7
//! - [`rsa::RsaEngine`]: PKCS#1 v1.5 and OAEP (MGF1) encryption
//! - [`gcm::GcmEngine`]: AES-GCM with AAD and 12..=16 byte tags

pub mod aes;
pub mod gcm;
pub mod rsa;

pub use self::aes::AesEngine;
pub use self::gcm::GcmEngine;
pub use self::rsa::RsaEngine;

use crate::params::KeyType;
use thiserror::Error;

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// Failures detected while transforming data.
///
/// These form the engine tier of the error taxonomy: they surface as the
/// generic `ERROR` status and never carry partial output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("input length {0} is not a multiple of the AES block size")]
    MisalignedInput(usize),

    #[error("no IV supplied and none stored with the key")]
    MissingIv,

    #[error("invalid IV length: expected {expected} bytes, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("invalid key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("operation requires {expected} key, found {actual:?}")]
    WrongKeyType {
        expected: &'static str,
        actual: KeyType,
    },

    #[error("invalid padding")]
    BadPadding,

    #[error("unsupported tag length: {0}")]
    UnsupportedTagLength(usize),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("authentication verification failed")]
    AuthenticationFailed,
}

/// Detect hardware AES support.
///
/// Informational only: the `aes` crate picks AES-NI or ARMv8 AES at runtime
/// regardless of this flag.
pub fn hardware_acceleration_available() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        std::arch::is_x86_feature_detected!("aes")
    }

    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("aes")
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    false
}
