//! # secapi-core
//!
//! AES, RSA and AES-GCM services over a named key store, reachable through
//! a handle-scoped API.
//!
//! Every request is validated before any key is resolved or any cipher
//! runs. Keys are addressed by name and resolved on every call.
//!
//! ## Features
//!
//! | Feature | Description | Default |
//! |:--------|:------------|:-------:|
//! | `ffi` | C ABI (`secapi_*`) and header generation | No |
//!
//! ## Quick Start
//!
//! ```rust
//! use secapi_core::{AesMode, AesParams, KeyType, Session};
//!
//! let session = Session::init().unwrap();
//! session.key_generate(KeyType::Aes256, "disk").unwrap();
//!
//! let iv = [0x1au8; 16];
//! let params = AesParams::new(AesMode::CbcPkcs7).with_iv(&iv);
//! let ciphertext = session.aes_encrypt(&params, "disk", b"My Byte Print").unwrap();
//! let plaintext = session.aes_decrypt(&params, "disk", &ciphertext).unwrap();
//! assert_eq!(plaintext, b"My Byte Print");
//!
//! session.deinit();
//! ```
//!
//! ## Authenticated Encryption
//!
//! ```rust
//! use secapi_core::{GcmParams, KeyType, Session};
//!
//! let session = Session::init().unwrap();
//! session.key_generate(KeyType::Aes128, "gcm").unwrap();
//!
//! let iv = [0u8; 12];
//! let sealed = session
//!     .gcm_encrypt(&GcmParams::new(&iv).with_aad(b"header"), "gcm", b"secret")
//!     .unwrap();
//!
//! let params = GcmParams::new(&iv).with_aad(b"header").with_tag(&sealed.tag);
//! let opened = session.gcm_decrypt(&params, "gcm", &sealed.ciphertext).unwrap();
//! assert_eq!(opened, b"secret");
//! ```
//!
//! ## Error Taxonomy
//!
//! | Status | Meaning |
//! |:-------|:--------|
//! | `Ok` | success |
//! | `InvalidInputParams` | missing handle, bad buffer, unknown mode/scheme/hash code |
//! | `InvalidKeyIndex` | missing, empty or unknown key name |
//! | `Error` | cryptographic or resource failure, including GCM authentication |
//!
//! ## Security Properties
//!
//! - **Fail-closed AEAD**: no plaintext on tag or AAD mismatch
//! - **Blinded RSA decryption**
//! - **Memory safety**: `zeroize` on drop for all key material

pub mod config;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod params;
pub mod session;
pub mod validate;

// Metrics and observability
pub mod metrics;
pub use metrics::{OperationKind, OperationMetrics};

pub use config::SessionConfig;
pub use crypto::CryptoError;
pub use error::{SecurityError, SecurityStatus};
pub use keystore::{KeyMaterial, KeyStore, KeyStoreError};
pub use params::{
    AesMode, AesParams, GcmMode, GcmOutput, GcmParams, HashAlgorithm, KeyType, RsaParams,
    RsaScheme,
};
pub use session::Session;

// C FFI layer (feature-gated)
#[cfg(feature = "ffi")]
pub mod ffi;
