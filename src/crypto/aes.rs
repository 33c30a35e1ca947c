//! AES block-cipher engine (ECB, CBC, CTR).
//!
//! Padding maps onto the RustCrypto `block-padding` schemes:
//!
//! | mode padding | scheme |
//! |---|---|
//! | NoPad | `NoPadding` (input must be block aligned) |
//! | ISO9797-M1 | `ZeroPadding` (no extra block when aligned) |
//! | ISO9797-M2 | `Iso7816` (`0x80` then zeros, always applied) |
//! | PKCS5 / PKCS7 | `Pkcs7` |
//!
//! CTR uses a 128-bit big-endian counter over the full IV block and never
//! pads.

use super::{AES_BLOCK_SIZE, CryptoError};
use crate::error::Result;
use crate::keystore::{KeyLookup, KeyMaterial};
use crate::params::{AesChaining, AesPadding, AesParams};
use ::aes::cipher::block_padding::{Iso7816, NoPadding, Pkcs7, ZeroPadding};
use ::aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit, StreamCipher};
use std::sync::Arc;

/// Binds `$cipher` to the AES variant matching the key length.
macro_rules! with_aes_cipher {
    ($key:expr, $cipher:ident => $body:expr) => {
        match $key.len() {
            16 => {
                type $cipher = ::aes::Aes128;
                $body
            }
            24 => {
                type $cipher = ::aes::Aes192;
                $body
            }
            32 => {
                type $cipher = ::aes::Aes256;
                $body
            }
            other => Err(CryptoError::InvalidKeyLength(other)),
        }
    };
}

/// Binds `$pad` to the block-padding scheme for an [`AesPadding`].
macro_rules! with_padding {
    ($padding:expr, $pad:ident => $body:expr) => {
        match $padding {
            AesPadding::None => {
                type $pad = NoPadding;
                $body
            }
            AesPadding::Iso9797M1 => {
                type $pad = ZeroPadding;
                $body
            }
            AesPadding::Iso9797M2 => {
                type $pad = Iso7816;
                $body
            }
            AesPadding::Pkcs5 | AesPadding::Pkcs7 => {
                type $pad = Pkcs7;
                $body
            }
        }
    };
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// Symmetric engine resolving AES keys by name.
pub struct AesEngine {
    keys: Arc<dyn KeyLookup>,
}

impl AesEngine {
    pub fn new(keys: Arc<dyn KeyLookup>) -> Self {
        Self { keys }
    }

    /// Encrypt `plaintext` under the AES key `key_name`.
    pub fn encrypt(
        &self,
        params: &AesParams<'_>,
        key_name: &str,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let key = self.keys.lookup(key_name)?;
        Ok(transform(&key, params, Direction::Encrypt, plaintext)?)
    }

    /// Decrypt `ciphertext` under the AES key `key_name`.
    pub fn decrypt(
        &self,
        params: &AesParams<'_>,
        key_name: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let key = self.keys.lookup(key_name)?;
        Ok(transform(&key, params, Direction::Decrypt, ciphertext)?)
    }
}

fn transform(
    key: &KeyMaterial,
    params: &AesParams<'_>,
    direction: Direction,
    data: &[u8],
) -> std::result::Result<Vec<u8>, CryptoError> {
    let key_bytes = key.aes_key().ok_or(CryptoError::WrongKeyType {
        expected: "AES",
        actual: key.key_type(),
    })?;

    let chaining = params.mode.chaining();
    let padding = params.mode.padding();

    // Unpadded block modes and every block-mode decryption work on whole blocks
    let needs_alignment = chaining != AesChaining::Ctr
        && (padding == AesPadding::None || direction == Direction::Decrypt);
    if needs_alignment && data.len() % AES_BLOCK_SIZE != 0 {
        return Err(CryptoError::MisalignedInput(data.len()));
    }

    match chaining {
        AesChaining::Ecb => ecb_transform(key_bytes, padding, direction, data),
        AesChaining::Cbc => {
            let iv = resolve_iv(params.iv, key)?;
            cbc_transform(key_bytes, &iv, padding, direction, data)
        }
        AesChaining::Ctr => {
            let iv = resolve_iv(params.iv, key)?;
            ctr_transform(key_bytes, &iv, data)
        }
    }
}

/// A non-empty explicit IV wins; an absent or empty one falls back to the
/// IV stored with the key.
fn resolve_iv(
    explicit: Option<&[u8]>,
    key: &KeyMaterial,
) -> std::result::Result<[u8; AES_BLOCK_SIZE], CryptoError> {
    match explicit {
        Some(iv) if !iv.is_empty() => iv.try_into().map_err(|_| CryptoError::InvalidIvLength {
            expected: AES_BLOCK_SIZE,
            actual: iv.len(),
        }),
        _ => key.iv().copied().ok_or(CryptoError::MissingIv),
    }
}

fn ecb_transform(
    key: &[u8],
    padding: AesPadding,
    direction: Direction,
    data: &[u8],
) -> std::result::Result<Vec<u8>, CryptoError> {
    with_aes_cipher!(key, C => with_padding!(padding, P => match direction {
        Direction::Encrypt => {
            let cipher = ecb::Encryptor::<C>::new_from_slice(key)
                .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
            Ok(cipher.encrypt_padded_vec_mut::<P>(data))
        }
        Direction::Decrypt => {
            let cipher = ecb::Decryptor::<C>::new_from_slice(key)
                .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
            cipher
                .decrypt_padded_vec_mut::<P>(data)
                .map_err(|_| CryptoError::BadPadding)
        }
    }))
}

fn cbc_transform(
    key: &[u8],
    iv: &[u8; AES_BLOCK_SIZE],
    padding: AesPadding,
    direction: Direction,
    data: &[u8],
) -> std::result::Result<Vec<u8>, CryptoError> {
    with_aes_cipher!(key, C => with_padding!(padding, P => match direction {
        Direction::Encrypt => {
            let cipher = cbc::Encryptor::<C>::new_from_slices(key, iv)
                .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
            Ok(cipher.encrypt_padded_vec_mut::<P>(data))
        }
        Direction::Decrypt => {
            let cipher = cbc::Decryptor::<C>::new_from_slices(key, iv)
                .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
            cipher
                .decrypt_padded_vec_mut::<P>(data)
                .map_err(|_| CryptoError::BadPadding)
        }
    }))
}

// CTR is its own inverse.
fn ctr_transform(
    key: &[u8],
    iv: &[u8; AES_BLOCK_SIZE],
    data: &[u8],
) -> std::result::Result<Vec<u8>, CryptoError> {
    let mut buffer = data.to_vec();
    with_aes_cipher!(key, C => {
        let mut cipher = ctr::Ctr128BE::<C>::new_from_slices(key, iv)
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        cipher.apply_keystream(&mut buffer);
        Ok(())
    })?;
    Ok(buffer)
}
