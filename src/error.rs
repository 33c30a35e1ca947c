//! Public error type and the four-value status taxonomy.

use crate::crypto::CryptoError;
use crate::keystore::KeyStoreError;
use thiserror::Error;

/// Outcome codes shared by the Rust API and the C boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityStatus {
    /// Operation succeeded
    Ok = 0,
    /// Cryptographic or resource failure after validation passed
    Error = 1,
    /// Missing handle, malformed buffer or unrecognized parameter code
    InvalidInputParams = 2,
    /// Missing, empty or unknown key name
    InvalidKeyIndex = 3,
}

/// Errors returned by every [`Session`](crate::Session) operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("invalid input parameters: {0}")]
    InvalidInputParams(String),

    #[error("invalid key index: {0}")]
    InvalidKeyIndex(KeyStoreError),

    #[error("key store failure: {0}")]
    KeyStore(KeyStoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl SecurityError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        SecurityError::InvalidInputParams(reason.into())
    }

    /// Collapse to the status code reported at the C boundary.
    pub fn status(&self) -> SecurityStatus {
        match self {
            SecurityError::InvalidInputParams(_) => SecurityStatus::InvalidInputParams,
            SecurityError::InvalidKeyIndex(_) => SecurityStatus::InvalidKeyIndex,
            SecurityError::KeyStore(_) | SecurityError::Crypto(_) => SecurityStatus::Error,
        }
    }
}

impl From<KeyStoreError> for SecurityError {
    fn from(e: KeyStoreError) -> Self {
        match e {
            KeyStoreError::EmptyName
            | KeyStoreError::NotFound(_)
            | KeyStoreError::AlreadyExists(_)
            | KeyStoreError::TypeMismatch { .. }
            | KeyStoreError::NotAesKey(_) => SecurityError::InvalidKeyIndex(e),
            KeyStoreError::InvalidMaterial(reason) => SecurityError::InvalidInputParams(reason),
            KeyStoreError::CapacityExceeded(_)
            | KeyStoreError::RngFailure
            | KeyStoreError::GenerationFailed(_) => SecurityError::KeyStore(e),
        }
    }
}

impl From<&SecurityError> for SecurityStatus {
    fn from(e: &SecurityError) -> Self {
        e.status()
    }
}

impl From<Result<(), SecurityError>> for SecurityStatus {
    fn from(result: Result<(), SecurityError>) -> Self {
        match result {
            Ok(()) => SecurityStatus::Ok,
            Err(e) => e.status(),
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = SecurityError> = std::result::Result<T, E>;
