//! AES-GCM authenticated encryption
//!
//! Supports AES-128/192/256 keys from the key store, 96-bit IVs and tag
//! lengths of 12 to 16 bytes. The tag travels separately from the
//! ciphertext (detached), matching the C boundary where the caller owns a
//! tag buffer.
//!
//! # Fail-closed decryption
//!
//! The tag is verified before any plaintext is released. On any mismatch,
//! whether AAD, tag, ciphertext or key, the scratch buffer is zeroized and
//! a single [`CryptoError::AuthenticationFailed`] is returned so callers
//! cannot tell which input was wrong.

use super::CryptoError;
use crate::error::{Result, SecurityError};
use crate::keystore::{KeyLookup, KeyMaterial};
use crate::params::{GCM_IV_LEN, GcmMode, GcmOutput, GcmParams};
use aes_gcm::AesGcm;
use aes_gcm::aead::consts::{U12, U13, U14, U15, U16};
use aes_gcm::aead::{AeadInPlace, KeyInit, Nonce, Tag};
use std::sync::Arc;
use zeroize::Zeroize;

/// Binds `$cipher` to `AesGcm<$aes, U12, TagSize>` for a tag length.
macro_rules! with_tag_size {
    ($aes:ty, $tag_len:expr, $cipher:ident => $body:expr) => {
        match $tag_len {
            12 => {
                type $cipher = AesGcm<$aes, U12, U12>;
                $body
            }
            13 => {
                type $cipher = AesGcm<$aes, U12, U13>;
                $body
            }
            14 => {
                type $cipher = AesGcm<$aes, U12, U14>;
                $body
            }
            15 => {
                type $cipher = AesGcm<$aes, U12, U15>;
                $body
            }
            16 => {
                type $cipher = AesGcm<$aes, U12, U16>;
                $body
            }
            other => Err(CryptoError::UnsupportedTagLength(other)),
        }
    };
}

/// Binds `$cipher` to the GCM instance for a key and tag length.
macro_rules! with_gcm_cipher {
    ($key:expr, $tag_len:expr, $cipher:ident => $body:expr) => {
        match $key.len() {
            16 => with_tag_size!(::aes::Aes128, $tag_len, $cipher => $body),
            24 => with_tag_size!(::aes::Aes192, $tag_len, $cipher => $body),
            32 => with_tag_size!(::aes::Aes256, $tag_len, $cipher => $body),
            other => Err(CryptoError::InvalidKeyLength(other)),
        }
    };
}

/// AEAD engine resolving AES keys by name.
pub struct GcmEngine {
    keys: Arc<dyn KeyLookup>,
}

impl GcmEngine {
    pub fn new(keys: Arc<dyn KeyLookup>) -> Self {
        Self { keys }
    }

    /// Encrypt and authenticate `plaintext`, binding `params.aad`.
    ///
    /// # Returns
    /// Ciphertext (same length as the plaintext) and a `params.tag_len`
    /// byte tag.
    pub fn encrypt(
        &self,
        params: &GcmParams<'_>,
        key_name: &str,
        plaintext: &[u8],
    ) -> Result<GcmOutput> {
        let material = self.keys.lookup(key_name)?;
        let key = gcm_key(&material, params)?;

        let (ciphertext, tag) = with_gcm_cipher!(key, params.tag_len, C => {
            seal::<C>(key, params.iv, params.aad, plaintext)
        })?;
        Ok(GcmOutput { ciphertext, tag })
    }

    /// Verify `params.tag` over `ciphertext` and `params.aad`, then decrypt.
    ///
    /// No plaintext is returned unless verification succeeds.
    pub fn decrypt(
        &self,
        params: &GcmParams<'_>,
        key_name: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let tag = params
            .tag
            .ok_or_else(|| SecurityError::invalid_input("GCM decryption requires a tag"))?;
        let material = self.keys.lookup(key_name)?;
        let key = gcm_key(&material, params)?;

        let plaintext = with_gcm_cipher!(key, tag.len(), C => {
            open::<C>(key, params.iv, params.aad, ciphertext, tag)
        })?;
        Ok(plaintext)
    }
}

fn gcm_key<'a>(
    material: &'a KeyMaterial,
    params: &GcmParams<'_>,
) -> std::result::Result<&'a [u8], CryptoError> {
    let key = match params.mode {
        GcmMode::Aes => material.aes_key().ok_or(CryptoError::WrongKeyType {
            expected: "AES",
            actual: material.key_type(),
        })?,
    };
    if params.iv.len() != GCM_IV_LEN {
        return Err(CryptoError::InvalidIvLength {
            expected: GCM_IV_LEN,
            actual: params.iv.len(),
        });
    }
    Ok(key)
}

fn seal<C>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> std::result::Result<(Vec<u8>, Vec<u8>), CryptoError>
where
    C: AeadInPlace + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
    let nonce = Nonce::<C>::from_slice(iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(nonce, aad, &mut buffer)
        .map_err(|e| CryptoError::EncryptionFailed(format!("AES-GCM encryption failed: {e:?}")))?;

    Ok((buffer, tag.to_vec()))
}

fn open<C>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> std::result::Result<Vec<u8>, CryptoError>
where
    C: AeadInPlace + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
    let nonce = Nonce::<C>::from_slice(iv);
    let tag = Tag::<C>::from_slice(tag);

    let mut buffer = ciphertext.to_vec();
    match cipher.decrypt_in_place_detached(nonce, aad, &mut buffer, tag) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(CryptoError::AuthenticationFailed)
        }
    }
}
