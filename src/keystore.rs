//! Named key store.
//!
//! Maps a key name to [`KeyMaterial`]: the key type, the secret (raw AES
//! bytes or an RSA private key) and an optional pre-set IV used when an AES
//! request carries none.
//!
//! # Consistency
//! Material is fully built (including RSA generation) before the write lock
//! is taken, and entries are replaced as whole `Arc`s. A reader therefore
//! sees either the complete key or no key at all, never a partial one.
//!
//! # Key hygiene
//! AES bytes live in `Zeroizing` buffers and RSA keys zeroize their private
//! components on drop. `Debug` prints only the type and a fingerprint.

use crate::params::KeyType;
use ring::rand::{SecureRandom, SystemRandom};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use zeroize::Zeroizing;

/// Length of a stored IV (one AES block).
pub const STORED_IV_LEN: usize = 16;

/// Errors raised by key store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyStoreError {
    #[error("key name is empty")]
    EmptyName,

    #[error("no key named '{0}'")]
    NotFound(String),

    #[error("key '{0}' already exists")]
    AlreadyExists(String),

    #[error("key '{name}' has type {actual:?}, not {expected:?}")]
    TypeMismatch {
        name: String,
        expected: KeyType,
        actual: KeyType,
    },

    #[error("key '{0}' is not an AES key")]
    NotAesKey(String),

    #[error("key store is full ({0} keys)")]
    CapacityExceeded(usize),

    #[error("invalid key material: {0}")]
    InvalidMaterial(String),

    #[error("random number generation failed")]
    RngFailure,

    #[error("key generation failed: {0}")]
    GenerationFailed(String),
}

/// Secret half of a stored key.
#[derive(Clone)]
pub enum KeySecret {
    Aes(Zeroizing<Vec<u8>>),
    Rsa(Box<RsaPrivateKey>),
}

/// A stored key: type, secret and optional pre-set IV.
///
/// `Clone` is intentionally not derived; the store hands out `Arc`s.
pub struct KeyMaterial {
    key_type: KeyType,
    secret: KeySecret,
    iv: Option<[u8; STORED_IV_LEN]>,
}

impl KeyMaterial {
    /// Wrap raw AES key bytes. The length selects AES-128/192/256.
    pub fn aes(key: &[u8], iv: Option<[u8; STORED_IV_LEN]>) -> Result<Self, KeyStoreError> {
        let key_type = KeyType::aes_for_len(key.len()).ok_or_else(|| {
            KeyStoreError::InvalidMaterial(format!(
                "AES key must be 16, 24 or 32 bytes, got {}",
                key.len()
            ))
        })?;
        Ok(Self {
            key_type,
            secret: KeySecret::Aes(Zeroizing::new(key.to_vec())),
            iv,
        })
    }

    /// Wrap an RSA private key. The modulus size selects the key type.
    pub fn rsa(key: RsaPrivateKey) -> Result<Self, KeyStoreError> {
        let bits = key.size() * 8;
        let key_type = KeyType::rsa_for_bits(bits).ok_or_else(|| {
            KeyStoreError::InvalidMaterial(format!("unsupported RSA modulus size: {bits} bits"))
        })?;
        Ok(Self {
            key_type,
            secret: KeySecret::Rsa(Box::new(key)),
            iv: None,
        })
    }

    /// Import a PKCS#1 DER encoded RSA private key.
    pub fn rsa_from_pkcs1_der(der: &[u8]) -> Result<Self, KeyStoreError> {
        let key = RsaPrivateKey::from_pkcs1_der(der)
            .map_err(|e| KeyStoreError::InvalidMaterial(format!("PKCS#1 DER: {e}")))?;
        Self::rsa(key)
    }

    /// Import a PKCS#1 PEM encoded RSA private key.
    pub fn rsa_from_pkcs1_pem(pem: &str) -> Result<Self, KeyStoreError> {
        let key = RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|e| KeyStoreError::InvalidMaterial(format!("PKCS#1 PEM: {e}")))?;
        Self::rsa(key)
    }

    /// Generate fresh material of the given type.
    ///
    /// AES keys come from `ring`'s system RNG; RSA keys are generated with
    /// the OS RNG. No IV is attached.
    pub fn generate(key_type: KeyType) -> Result<Self, KeyStoreError> {
        if let Some(len) = key_type.aes_key_len() {
            let rng = SystemRandom::new();
            let mut key = Zeroizing::new(vec![0u8; len]);
            rng.fill(&mut key).map_err(|_| KeyStoreError::RngFailure)?;
            return Ok(Self {
                key_type,
                secret: KeySecret::Aes(key),
                iv: None,
            });
        }

        match key_type.rsa_bits() {
            Some(bits) => {
                let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, bits)
                    .map_err(|e| KeyStoreError::GenerationFailed(e.to_string()))?;
                Self::rsa(key)
            }
            None => Err(KeyStoreError::GenerationFailed(format!(
                "no generator for {key_type:?}"
            ))),
        }
    }

    /// Same material with `iv` attached. Only AES keys carry an IV.
    pub fn with_iv(&self, iv: [u8; STORED_IV_LEN]) -> Option<Self> {
        match &self.secret {
            KeySecret::Aes(_) => Some(Self {
                key_type: self.key_type,
                secret: self.secret.clone(),
                iv: Some(iv),
            }),
            KeySecret::Rsa(_) => None,
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn iv(&self) -> Option<&[u8; STORED_IV_LEN]> {
        self.iv.as_ref()
    }

    pub fn aes_key(&self) -> Option<&[u8]> {
        match &self.secret {
            KeySecret::Aes(bytes) => Some(bytes.as_slice()),
            KeySecret::Rsa(_) => None,
        }
    }

    pub fn rsa_key(&self) -> Option<&RsaPrivateKey> {
        match &self.secret {
            KeySecret::Rsa(key) => Some(&**key),
            KeySecret::Aes(_) => None,
        }
    }

    /// Collision-resistant identifier that does not reveal the key.
    ///
    /// AES keys are fingerprinted over their bytes, RSA keys over the public
    /// modulus.
    pub fn fingerprint(&self) -> [u8; 16] {
        match &self.secret {
            KeySecret::Aes(bytes) => key_fingerprint(bytes),
            KeySecret::Rsa(key) => key_fingerprint(&key.n().to_bytes_be()),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_type", &self.key_type)
            .field("fingerprint", &hex_prefix(&self.fingerprint()))
            .field("has_iv", &self.iv.is_some())
            .finish()
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// Generate key fingerprint for identification
pub fn key_fingerprint(key: &[u8]) -> [u8; 16] {
    use sha2::Digest;

    let mut hasher = sha2::Sha256::new();
    hasher.update(b"secapi_key_fingerprint_v1");
    hasher.update(key);
    let hash = hasher.finalize();
    let mut result = [0u8; 16];
    result.copy_from_slice(&hash[..16]);
    result
}

/// Read-only capability handed to the engines.
pub trait KeyLookup: Send + Sync {
    /// Resolve `name` to its current material.
    fn lookup(&self, name: &str) -> Result<Arc<KeyMaterial>, KeyStoreError>;
}

/// Thread-safe store of named keys.
pub struct KeyStore {
    entries: RwLock<HashMap<String, Arc<KeyMaterial>>>,
    capacity: usize,
}

impl KeyStore {
    /// Default number of keys a store accepts.
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Generate a key of `key_type` under `name`.
    ///
    /// Fails with `AlreadyExists` if the name is taken; existing keys are
    /// never overwritten.
    pub fn generate(&self, key_type: KeyType, name: &str) -> Result<(), KeyStoreError> {
        check_name(name)?;
        // Cheap pre-check so a duplicate does not pay for RSA generation
        if self.contains(name) {
            return Err(KeyStoreError::AlreadyExists(name.to_string()));
        }
        let material = KeyMaterial::generate(key_type)?;
        self.insert(name, material)
    }

    /// Store caller-provided material under `name`.
    pub fn set(&self, name: &str, material: KeyMaterial) -> Result<(), KeyStoreError> {
        check_name(name)?;
        self.insert(name, material)
    }

    /// Attach (or replace) the pre-set IV of an AES key.
    pub fn set_iv(&self, name: &str, iv: [u8; STORED_IV_LEN]) -> Result<(), KeyStoreError> {
        check_name(name)?;
        let mut entries = self.write();
        let current = entries
            .get(name)
            .ok_or_else(|| KeyStoreError::NotFound(name.to_string()))?;
        let updated = current
            .with_iv(iv)
            .ok_or_else(|| KeyStoreError::NotAesKey(name.to_string()))?;
        entries.insert(name.to_string(), Arc::new(updated));
        Ok(())
    }

    /// Remove the key `name`, which must have type `key_type`.
    pub fn remove(&self, key_type: KeyType, name: &str) -> Result<(), KeyStoreError> {
        check_name(name)?;
        let mut entries = self.write();
        let actual = entries
            .get(name)
            .map(|material| material.key_type())
            .ok_or_else(|| KeyStoreError::NotFound(name.to_string()))?;
        if actual != key_type {
            return Err(KeyStoreError::TypeMismatch {
                name: name.to_string(),
                expected: key_type,
                actual,
            });
        }
        entries.remove(name);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn insert(&self, name: &str, material: KeyMaterial) -> Result<(), KeyStoreError> {
        let mut entries = self.write();
        if entries.contains_key(name) {
            return Err(KeyStoreError::AlreadyExists(name.to_string()));
        }
        if entries.len() >= self.capacity {
            return Err(KeyStoreError::CapacityExceeded(self.capacity));
        }
        entries.insert(name.to_string(), Arc::new(material));
        Ok(())
    }

    // Writers replace whole entries, so a poisoned lock still guards
    // consistent data and can be recovered.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<KeyMaterial>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<KeyMaterial>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyLookup for KeyStore {
    fn lookup(&self, name: &str) -> Result<Arc<KeyMaterial>, KeyStoreError> {
        check_name(name)?;
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| KeyStoreError::NotFound(name.to_string()))
    }
}

fn check_name(name: &str) -> Result<(), KeyStoreError> {
    if name.is_empty() {
        return Err(KeyStoreError::EmptyName);
    }
    Ok(())
}
