#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use secapi_core::params::{GcmParams, KeyType};
use secapi_core::{CryptoError, SecurityError, SecurityStatus, Session};
use std::sync::LazyLock;

static SESSION: LazyLock<Session> = LazyLock::new(|| {
    let session = Session::init().expect("session init");
    session.key_generate(KeyType::Aes256, "fuzz").expect("key generation");
    session
});

#[derive(Arbitrary, Debug)]
struct GcmDecryptInput {
    iv: Vec<u8>,
    aad: Vec<u8>,
    tag: Vec<u8>,
    ciphertext: Vec<u8>,
}

fuzz_target!(|input: GcmDecryptInput| {
    // Attack: Feed forged ciphertexts, tags, IVs and AAD to authenticated decryption
    // Validates: No panics, forgeries never verify, failures stay indistinguishable

    let params = GcmParams::new(&input.iv)
        .with_aad(&input.aad)
        .with_tag(&input.tag);

    match SESSION.gcm_decrypt(&params, "fuzz", &input.ciphertext) {
        Ok(_) => {
            // A random 12..16-byte tag verifying is a 2^-96 event at best
            panic!("forged ciphertext authenticated");
        }
        Err(SecurityError::Crypto(CryptoError::AuthenticationFailed)) => {
            // Fuzz property: only well-formed requests reach tag verification
            assert_eq!(input.iv.len(), 12);
            assert!((12..=16).contains(&input.tag.len()));
            assert!(!input.ciphertext.is_empty());
        }
        Err(e) => {
            // Fuzz property: every rejection maps to one of the three failure codes
            assert_ne!(e.status(), SecurityStatus::Ok);
        }
    }
});
