//! RSA encryption engine.
//!
//! `Pkcs1V15` is RSAES-PKCS1-v1_5 and ignores both hash fields. `PssMgf1`
//! is RSAES-OAEP: `hash_a` digests the (empty) label and fixes the overhead
//! of `2 * hash_a.output_len() + 2` bytes, `hash_b` drives MGF1.

use super::CryptoError;
use crate::error::Result;
use crate::keystore::{KeyLookup, KeyMaterial};
use crate::params::{HashAlgorithm, RsaParams, RsaScheme};
use ::rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey};
use rand::rngs::OsRng;
use sha2::digest::{Digest, DynDigest};
use std::sync::Arc;

/// Asymmetric engine resolving RSA private keys by name.
pub struct RsaEngine {
    keys: Arc<dyn KeyLookup>,
}

impl RsaEngine {
    pub fn new(keys: Arc<dyn KeyLookup>) -> Self {
        Self { keys }
    }

    /// Encrypt under the public half of `key_name`.
    ///
    /// Output is randomized and exactly one modulus long.
    pub fn encrypt(
        &self,
        params: &RsaParams,
        key_name: &str,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let material = self.keys.lookup(key_name)?;
        let key = rsa_key(&material)?;
        let public = key.to_public_key();

        let result = match params.scheme {
            RsaScheme::Pkcs1V15 => public.encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext),
            RsaScheme::PssMgf1 => {
                public.encrypt(&mut OsRng, oaep(params.hash_a, params.hash_b), plaintext)
            }
        };
        Ok(result.map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?)
    }

    /// Decrypt with the private key `key_name` (blinded).
    pub fn decrypt(
        &self,
        params: &RsaParams,
        key_name: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let material = self.keys.lookup(key_name)?;
        let key = rsa_key(&material)?;

        let result = match params.scheme {
            RsaScheme::Pkcs1V15 => key.decrypt_blinded(&mut OsRng, Pkcs1v15Encrypt, ciphertext),
            RsaScheme::PssMgf1 => {
                key.decrypt_blinded(&mut OsRng, oaep(params.hash_a, params.hash_b), ciphertext)
            }
        };
        // Padding failures stay opaque
        Ok(result.map_err(|_| CryptoError::DecryptionFailed("invalid ciphertext".into()))?)
    }
}

/// Largest plaintext `scheme` accepts under a `modulus_len`-byte key.
pub fn max_plaintext_len(params: &RsaParams, modulus_len: usize) -> usize {
    let overhead = match params.scheme {
        RsaScheme::Pkcs1V15 => 11,
        RsaScheme::PssMgf1 => 2 * params.hash_a.output_len() + 2,
    };
    modulus_len.saturating_sub(overhead)
}

fn rsa_key(material: &KeyMaterial) -> std::result::Result<&RsaPrivateKey, CryptoError> {
    material.rsa_key().ok_or(CryptoError::WrongKeyType {
        expected: "RSA",
        actual: material.key_type(),
    })
}

fn oaep(label_hash: HashAlgorithm, mgf_hash: HashAlgorithm) -> Oaep {
    match label_hash {
        HashAlgorithm::Md5 => oaep_with_label::<md5::Md5>(mgf_hash),
        HashAlgorithm::Sha1 => oaep_with_label::<sha1::Sha1>(mgf_hash),
        HashAlgorithm::Sha224 => oaep_with_label::<sha2::Sha224>(mgf_hash),
        HashAlgorithm::Sha256 => oaep_with_label::<sha2::Sha256>(mgf_hash),
        HashAlgorithm::Sha384 => oaep_with_label::<sha2::Sha384>(mgf_hash),
        HashAlgorithm::Sha512 => oaep_with_label::<sha2::Sha512>(mgf_hash),
    }
}

fn oaep_with_label<D>(mgf_hash: HashAlgorithm) -> Oaep
where
    D: 'static + Digest + DynDigest + Send + Sync,
{
    match mgf_hash {
        HashAlgorithm::Md5 => Oaep::new_with_mgf_hash::<D, md5::Md5>(),
        HashAlgorithm::Sha1 => Oaep::new_with_mgf_hash::<D, sha1::Sha1>(),
        HashAlgorithm::Sha224 => Oaep::new_with_mgf_hash::<D, sha2::Sha224>(),
        HashAlgorithm::Sha256 => Oaep::new_with_mgf_hash::<D, sha2::Sha256>(),
        HashAlgorithm::Sha384 => Oaep::new_with_mgf_hash::<D, sha2::Sha384>(),
        HashAlgorithm::Sha512 => Oaep::new_with_mgf_hash::<D, sha2::Sha512>(),
    }
}
