// tests/derived_tests.rs
//! Digest and transport encodings accept plaintext or tokens alike

mod common;

use common::{cipher, cipher_with_legacy, PASSWORD_V1, PASSWORD_V2};
use encrypted_secret::{password_digest, transport_encode, CryptError};

const PASSWORD_DIGEST: &str = "$1$miq$Ho9GNOzRsxMpJSsgwG/y01";
const PASSWORD_TRANSPORT: &str =
    "cABhAHMAcwB3AG8AcgBkAEEAZABtAGkAbgBpAHMAdAByAGEAdABvAHIAUABhAHMAcwB3AG8AcgBkAA==";

#[test]
fn digest_of_plaintext_and_token_match() {
    let cipher = cipher();
    assert_eq!(password_digest(&cipher, "password").unwrap(), PASSWORD_DIGEST);
    assert_eq!(password_digest(&cipher, PASSWORD_V2).unwrap(), PASSWORD_DIGEST);
}

#[test]
fn digest_of_legacy_token() {
    let cipher = cipher_with_legacy();
    assert_eq!(password_digest(&cipher, PASSWORD_V1).unwrap(), PASSWORD_DIGEST);
}

#[test]
fn transport_encoding_of_plaintext_and_token_match() {
    let cipher = cipher();
    assert_eq!(transport_encode(&cipher, "password").unwrap(), PASSWORD_TRANSPORT);
    assert_eq!(transport_encode(&cipher, PASSWORD_V2).unwrap(), PASSWORD_TRANSPORT);
}

#[test]
fn undecryptable_tokens_are_errors() {
    let cipher = cipher();
    assert!(matches!(
        password_digest(&cipher, PASSWORD_V1),
        Err(CryptError::MissingKey { .. })
    ));
    assert!(matches!(
        transport_encode(&cipher, "v2:{anVuaw==}"),
        Err(CryptError::BadCiphertext { .. })
    ));
}
