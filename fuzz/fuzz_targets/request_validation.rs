#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use secapi_core::params::AesMode;
use secapi_core::validate::{RawAesParams, RawRsaParams, Request, validate_request};
use secapi_core::{SecurityStatus, Session};
use std::sync::LazyLock;

static SESSION: LazyLock<Session> =
    LazyLock::new(|| Session::init().expect("session init"));

#[derive(Arbitrary, Debug)]
struct ValidationInput {
    has_handle: bool,
    aes_mode: Option<u32>,
    iv: Option<Vec<u8>>,
    rsa_codes: Option<(u32, u32, u32, u32)>,
    key_name: Option<String>,
    input: Option<Vec<u8>>,
    has_output: bool,
}

fn status<T>(result: secapi_core::error::Result<T>) -> SecurityStatus {
    result.err().map_or(SecurityStatus::Ok, |e| e.status())
}

fuzz_target!(|input: ValidationInput| {
    // Attack: Arbitrary raw codes and null/empty combinations at the request boundary
    // Validates: No panics, status precedence is handle > params > key > buffers

    let handle = input.has_handle.then_some(&*SESSION);
    let key_name = input.key_name.as_deref();
    let data = input.input.as_deref();

    let aes = Request {
        params: input.aes_mode.map(|mode| RawAesParams {
            mode,
            iv: input.iv.as_deref(),
        }),
        key_name,
        input: data,
        has_output: input.has_output,
    };
    let aes_status = status(validate_request(handle, aes));

    // Fuzz property 1: a missing handle or unknown mode always wins
    let mode_known = input.aes_mode.is_some_and(|m| AesMode::try_from(m).is_ok());
    if !input.has_handle || !mode_known {
        assert_eq!(aes_status, SecurityStatus::InvalidInputParams);
    } else if key_name.is_none_or(str::is_empty) {
        // Fuzz property 2: key name is checked before any buffer
        assert_eq!(aes_status, SecurityStatus::InvalidKeyIndex);
    } else {
        assert_ne!(aes_status, SecurityStatus::InvalidKeyIndex);
        assert_ne!(aes_status, SecurityStatus::Error);
    }

    if let Some((scheme, hash_a, hash_b, salt_len)) = input.rsa_codes {
        let rsa = Request {
            params: Some(RawRsaParams {
                scheme,
                hash_a,
                hash_b,
                salt_len,
            }),
            key_name,
            input: data,
            has_output: input.has_output,
        };
        // Fuzz property 3: validation never reports an engine error
        assert_ne!(status(validate_request(handle, rsa)), SecurityStatus::Error);
    }
});
