//! Typed parameter families for every operation.
//!
//! Each family is a closed enum with an explicit numeric code for the C
//! boundary. Conversion from a raw code goes through `TryFrom<u32>`, which
//! is the only place an unrecognized value can enter the crate; there is no
//! fallback variant, so a new mode stays rejected until it is added here and
//! handled by every exhaustive `match` downstream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A raw code that does not name any variant of its parameter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unrecognized {family} code: {code}")]
pub struct UnknownCode {
    pub family: &'static str,
    pub code: u32,
}

/// Generates `code()` and `TryFrom<u32>` for a fieldless `#[repr(u32)]` enum.
macro_rules! coded_enum {
    ($name:ident, $family:literal, [$($variant:ident),+ $(,)?]) => {
        impl $name {
            /// Every recognized variant, in code order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Numeric code used across the C boundary.
            pub fn code(self) -> u32 {
                self as u32
            }
        }

        impl TryFrom<u32> for $name {
            type Error = UnknownCode;

            fn try_from(code: u32) -> Result<Self, Self::Error> {
                $(
                    if code == $name::$variant as u32 {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownCode { family: $family, code })
            }
        }
    };
}

/// Padding discipline applied by the block modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesPadding {
    None,
    /// ISO/IEC 9797-1 method 1: zero bytes, only when not block aligned
    Iso9797M1,
    /// ISO/IEC 9797-1 method 2: a single `0x80` then zero bytes
    Iso9797M2,
    Pkcs5,
    Pkcs7,
}

/// Chaining mode of an AES operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesChaining {
    Ecb,
    Cbc,
    Ctr,
}

/// AES mode: chaining × padding, with CTR always unpadded.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AesMode {
    EcbNoPad = 0,
    EcbIso9797M1 = 1,
    EcbIso9797M2 = 2,
    EcbPkcs5 = 3,
    EcbPkcs7 = 4,
    CbcNoPad = 5,
    CbcIso9797M1 = 6,
    CbcIso9797M2 = 7,
    CbcPkcs5 = 8,
    CbcPkcs7 = 9,
    Ctr = 10,
}

coded_enum!(
    AesMode,
    "AES mode",
    [
        EcbNoPad,
        EcbIso9797M1,
        EcbIso9797M2,
        EcbPkcs5,
        EcbPkcs7,
        CbcNoPad,
        CbcIso9797M1,
        CbcIso9797M2,
        CbcPkcs5,
        CbcPkcs7,
        Ctr,
    ]
);

impl AesMode {
    pub fn chaining(self) -> AesChaining {
        match self {
            AesMode::EcbNoPad
            | AesMode::EcbIso9797M1
            | AesMode::EcbIso9797M2
            | AesMode::EcbPkcs5
            | AesMode::EcbPkcs7 => AesChaining::Ecb,
            AesMode::CbcNoPad
            | AesMode::CbcIso9797M1
            | AesMode::CbcIso9797M2
            | AesMode::CbcPkcs5
            | AesMode::CbcPkcs7 => AesChaining::Cbc,
            AesMode::Ctr => AesChaining::Ctr,
        }
    }

    pub fn padding(self) -> AesPadding {
        match self {
            AesMode::EcbNoPad | AesMode::CbcNoPad | AesMode::Ctr => AesPadding::None,
            AesMode::EcbIso9797M1 | AesMode::CbcIso9797M1 => AesPadding::Iso9797M1,
            AesMode::EcbIso9797M2 | AesMode::CbcIso9797M2 => AesPadding::Iso9797M2,
            AesMode::EcbPkcs5 | AesMode::CbcPkcs5 => AesPadding::Pkcs5,
            AesMode::EcbPkcs7 | AesMode::CbcPkcs7 => AesPadding::Pkcs7,
        }
    }

    /// Whether the mode consumes an IV (explicit or stored with the key).
    pub fn needs_iv(self) -> bool {
        !matches!(self.chaining(), AesChaining::Ecb)
    }
}

/// RSA encryption padding scheme.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RsaScheme {
    /// RSAES-PKCS1-v1_5
    Pkcs1V15 = 0,
    /// RSAES-OAEP with MGF1; hash A digests the label, hash B drives MGF1
    PssMgf1 = 1,
}

coded_enum!(RsaScheme, "RSA scheme", [Pkcs1V15, PssMgf1]);

/// Digest algorithms accepted by the RSA parameter fields.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Md5 = 0,
    Sha1 = 1,
    Sha224 = 2,
    Sha256 = 3,
    Sha384 = 4,
    Sha512 = 5,
}

coded_enum!(
    HashAlgorithm,
    "hash algorithm",
    [Md5, Sha1, Sha224, Sha256, Sha384, Sha512]
);

impl HashAlgorithm {
    /// Digest size in bytes.
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

/// AEAD cipher selector. Only AES-GCM exists today.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GcmMode {
    Aes = 0,
}

coded_enum!(GcmMode, "GCM mode", [Aes]);

/// Type of a stored key.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    Aes128 = 0,
    Aes192 = 1,
    Aes256 = 2,
    Rsa1024 = 3,
    Rsa2048 = 4,
    Rsa3072 = 5,
}

coded_enum!(
    KeyType,
    "key type",
    [Aes128, Aes192, Aes256, Rsa1024, Rsa2048, Rsa3072]
);

impl KeyType {
    pub fn is_aes(self) -> bool {
        self.aes_key_len().is_some()
    }

    pub fn is_rsa(self) -> bool {
        self.rsa_bits().is_some()
    }

    /// Raw key length in bytes for AES types.
    pub fn aes_key_len(self) -> Option<usize> {
        match self {
            KeyType::Aes128 => Some(16),
            KeyType::Aes192 => Some(24),
            KeyType::Aes256 => Some(32),
            KeyType::Rsa1024 | KeyType::Rsa2048 | KeyType::Rsa3072 => None,
        }
    }

    /// Modulus size in bits for RSA types.
    pub fn rsa_bits(self) -> Option<usize> {
        match self {
            KeyType::Rsa1024 => Some(1024),
            KeyType::Rsa2048 => Some(2048),
            KeyType::Rsa3072 => Some(3072),
            KeyType::Aes128 | KeyType::Aes192 | KeyType::Aes256 => None,
        }
    }

    /// AES type for a raw key length.
    pub fn aes_for_len(len: usize) -> Option<KeyType> {
        match len {
            16 => Some(KeyType::Aes128),
            24 => Some(KeyType::Aes192),
            32 => Some(KeyType::Aes256),
            _ => None,
        }
    }

    /// RSA type for a modulus size.
    pub fn rsa_for_bits(bits: usize) -> Option<KeyType> {
        match bits {
            1024 => Some(KeyType::Rsa1024),
            2048 => Some(KeyType::Rsa2048),
            3072 => Some(KeyType::Rsa3072),
            _ => None,
        }
    }
}

/// AES request parameters. An absent IV selects the IV stored with the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesParams<'a> {
    pub mode: AesMode,
    pub iv: Option<&'a [u8]>,
}

impl<'a> AesParams<'a> {
    pub fn new(mode: AesMode) -> Self {
        Self { mode, iv: None }
    }

    pub fn with_iv(mut self, iv: &'a [u8]) -> Self {
        self.iv = Some(iv);
        self
    }
}

/// RSA request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaParams {
    pub scheme: RsaScheme,
    pub hash_a: HashAlgorithm,
    pub hash_b: HashAlgorithm,
    /// Reserved; carried for ABI compatibility and ignored by every scheme.
    pub salt_len: u32,
}

impl RsaParams {
    pub fn new(scheme: RsaScheme, hash_a: HashAlgorithm, hash_b: HashAlgorithm) -> Self {
        Self {
            scheme,
            hash_a,
            hash_b,
            salt_len: 0,
        }
    }
}

/// Default (and maximum) GCM tag length in bytes.
pub const GCM_TAG_LEN: usize = 16;
/// Shortest tag the engine will produce or accept.
pub const GCM_MIN_TAG_LEN: usize = 12;
/// Required GCM IV length in bytes.
pub const GCM_IV_LEN: usize = 12;

/// AES-GCM request parameters.
///
/// `tag` is only consulted on decryption; encryption produces a tag of
/// `tag_len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcmParams<'a> {
    pub mode: GcmMode,
    pub iv: &'a [u8],
    pub aad: &'a [u8],
    pub tag_len: usize,
    pub tag: Option<&'a [u8]>,
}

impl<'a> GcmParams<'a> {
    /// Parameters for `iv`, with no AAD and a 16-byte tag.
    ///
    /// The IV must be exactly 12 bytes. Other lengths, which some GCM APIs
    /// accept by hashing the IV, fail with
    /// [`CryptoError::InvalidIvLength`](crate::CryptoError::InvalidIvLength).
    /// There is no fallback to an IV stored with the key.
    pub fn new(iv: &'a [u8]) -> Self {
        Self {
            mode: GcmMode::Aes,
            iv,
            aad: &[],
            tag_len: GCM_TAG_LEN,
            tag: None,
        }
    }

    pub fn with_aad(mut self, aad: &'a [u8]) -> Self {
        self.aad = aad;
        self
    }

    pub fn with_tag_len(mut self, tag_len: usize) -> Self {
        self.tag_len = tag_len;
        self
    }

    /// Supplies the tag to verify; also fixes `tag_len` to its length.
    pub fn with_tag(mut self, tag: &'a [u8]) -> Self {
        self.tag_len = tag.len();
        self.tag = Some(tag);
        self
    }
}

/// Output of an authenticated encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcmOutput {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip_for_every_variant() {
        for mode in AesMode::ALL {
            assert_eq!(AesMode::try_from(mode.code()), Ok(*mode));
        }
        for hash in HashAlgorithm::ALL {
            assert_eq!(HashAlgorithm::try_from(hash.code()), Ok(*hash));
        }
        for key_type in KeyType::ALL {
            assert_eq!(KeyType::try_from(key_type.code()), Ok(*key_type));
        }
        assert_eq!(RsaScheme::try_from(1), Ok(RsaScheme::PssMgf1));
        assert_eq!(GcmMode::try_from(0), Ok(GcmMode::Aes));
    }

    #[test]
    fn test_unknown_codes_rejected() {
        assert_eq!(
            AesMode::try_from(11),
            Err(UnknownCode {
                family: "AES mode",
                code: 11
            })
        );
        assert!(RsaScheme::try_from(2).is_err());
        assert!(HashAlgorithm::try_from(6).is_err());
        assert!(GcmMode::try_from(u32::MAX).is_err());
        assert!(KeyType::try_from(99).is_err());
    }

    #[test]
    fn test_mode_decomposition() {
        assert_eq!(AesMode::EcbIso9797M2.chaining(), AesChaining::Ecb);
        assert_eq!(AesMode::EcbIso9797M2.padding(), AesPadding::Iso9797M2);
        assert_eq!(AesMode::CbcPkcs5.chaining(), AesChaining::Cbc);
        assert_eq!(AesMode::CbcPkcs5.padding(), AesPadding::Pkcs5);
        assert_eq!(AesMode::Ctr.padding(), AesPadding::None);
        assert!(!AesMode::EcbPkcs7.needs_iv());
        assert!(AesMode::CbcNoPad.needs_iv());
        assert!(AesMode::Ctr.needs_iv());
    }

    #[test]
    fn test_key_type_sizes() {
        assert_eq!(KeyType::Aes192.aes_key_len(), Some(24));
        assert_eq!(KeyType::Rsa2048.rsa_bits(), Some(2048));
        assert!(KeyType::Aes256.is_aes());
        assert!(!KeyType::Aes256.is_rsa());
        assert_eq!(KeyType::aes_for_len(32), Some(KeyType::Aes256));
        assert_eq!(KeyType::aes_for_len(20), None);
        assert_eq!(KeyType::rsa_for_bits(3072), Some(KeyType::Rsa3072));
    }

    #[test]
    fn test_gcm_params_builder() {
        let iv = [0u8; 12];
        let tag = [1u8; 14];
        let params = GcmParams::new(&iv).with_aad(b"header").with_tag(&tag);
        assert_eq!(params.tag_len, 14);
        assert_eq!(params.aad, b"header");
        assert_eq!(params.mode, GcmMode::Aes);
    }
}
