//! RSA Integration Tests
//!
//! Runs the full scheme × label hash × MGF1 hash matrix against a fixed
//! RSA-2048 key, plus size limits and key type checks.

mod common;

use common::fixtures::*;
use secapi_core::crypto::rsa::max_plaintext_len;
use secapi_core::params::{HashAlgorithm, KeyType, RsaParams, RsaScheme};
use secapi_core::{SecurityStatus, Session};

#[test]
fn test_full_scheme_hash_matrix_roundtrips() {
    // WHY: every recognized (scheme, hash_a, hash_b) triple must round trip
    let session = session_with_rsa_key();
    let mut combinations = 0;

    for &scheme in RsaScheme::ALL {
        for &hash_a in HashAlgorithm::ALL {
            for &hash_b in HashAlgorithm::ALL {
                let params = RsaParams::new(scheme, hash_a, hash_b);
                let ciphertext = session
                    .rsa_encrypt(&params, "rsa-2048", RSA_PLAINTEXT)
                    .unwrap_or_else(|e| panic!("{scheme:?}/{hash_a:?}/{hash_b:?}: {e}"));
                assert_eq!(ciphertext.len(), 256);

                let decrypted = session.rsa_decrypt(&params, "rsa-2048", &ciphertext).unwrap();
                assert_eq!(decrypted, RSA_PLAINTEXT, "{scheme:?}/{hash_a:?}/{hash_b:?}");
                combinations += 1;
            }
        }
    }

    assert_eq!(combinations, 2 * 6 * 6);
    println!("✓ RSA matrix: {combinations} combinations round trip");
}

#[test]
fn test_repeated_calls_succeed() {
    let session = session_with_rsa_key();
    let params = RsaParams::new(RsaScheme::PssMgf1, HashAlgorithm::Sha256, HashAlgorithm::Sha256);

    for _ in 0..ITER_COUNT {
        let ciphertext = session.rsa_encrypt(&params, "rsa-2048", RSA_PLAINTEXT).unwrap();
        assert_eq!(
            session.rsa_decrypt(&params, "rsa-2048", &ciphertext).unwrap(),
            RSA_PLAINTEXT
        );
    }
}

#[test]
fn test_salt_len_is_ignored() {
    let session = session_with_rsa_key();
    let params = RsaParams::new(RsaScheme::PssMgf1, HashAlgorithm::Sha1, HashAlgorithm::Sha1);
    let salted = RsaParams {
        salt_len: 32,
        ..params
    };

    let ciphertext = session.rsa_encrypt(&salted, "rsa-2048", RSA_PLAINTEXT).unwrap();
    assert_eq!(
        session.rsa_decrypt(&params, "rsa-2048", &ciphertext).unwrap(),
        RSA_PLAINTEXT
    );
}

#[test]
fn test_plaintext_size_limits() {
    let session = session_with_rsa_key();

    for (scheme, hash_a) in [
        (RsaScheme::Pkcs1V15, HashAlgorithm::Sha1),
        (RsaScheme::PssMgf1, HashAlgorithm::Sha1),
        (RsaScheme::PssMgf1, HashAlgorithm::Sha512),
    ] {
        let params = RsaParams::new(scheme, hash_a, HashAlgorithm::Sha1);
        let limit = max_plaintext_len(&params, 256);

        let fits = vec![0x42u8; limit];
        assert!(session.rsa_encrypt(&params, "rsa-2048", &fits).is_ok());

        let too_long = vec![0x42u8; limit + 1];
        let err = session.rsa_encrypt(&params, "rsa-2048", &too_long).unwrap_err();
        assert_eq!(err.status(), SecurityStatus::Error, "{scheme:?}/{hash_a:?}");
    }
}

#[test]
fn test_tampered_ciphertext_is_engine_error() {
    let session = session_with_rsa_key();
    let params = RsaParams::new(RsaScheme::PssMgf1, HashAlgorithm::Sha256, HashAlgorithm::Sha256);
    let mut ciphertext = session.rsa_encrypt(&params, "rsa-2048", RSA_PLAINTEXT).unwrap();
    ciphertext[10] ^= 0x01;

    let err = session.rsa_decrypt(&params, "rsa-2048", &ciphertext).unwrap_err();
    assert_eq!(err.status(), SecurityStatus::Error);
}

#[test]
fn test_aes_key_with_rsa_is_engine_error() {
    let session = session_with_aes_keys();
    let params = RsaParams::new(RsaScheme::Pkcs1V15, HashAlgorithm::Sha1, HashAlgorithm::Sha1);
    let err = session.rsa_encrypt(&params, "aes-128", RSA_PLAINTEXT).unwrap_err();
    assert_eq!(err.status(), SecurityStatus::Error);
}

#[test]
fn test_generated_key_roundtrip() {
    // WHY: generated keys (not only imported ones) serve both schemes
    let session = Session::init().unwrap();
    session.key_generate(KeyType::Rsa1024, "gen").unwrap();

    for &scheme in RsaScheme::ALL {
        let params = RsaParams::new(scheme, HashAlgorithm::Sha1, HashAlgorithm::Sha1);
        let ciphertext = session.rsa_encrypt(&params, "gen", RSA_PLAINTEXT).unwrap();
        assert_eq!(ciphertext.len(), 128);
        assert_eq!(session.rsa_decrypt(&params, "gen", &ciphertext).unwrap(), RSA_PLAINTEXT);
    }
}
