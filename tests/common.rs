// tests/common.rs
//! Shared test utilities: logging setup and key fixtures
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use encrypted_secret::{Generation, KeyStore, SecretCipher};

#[cfg(feature = "logging")]
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `password` under the fixture v2 key
pub const PASSWORD_V2: &str = "v2:{gURYNPfZP3cu4+bw9pznMQ==}";
/// `password` under the fixture v1 key
pub const PASSWORD_V1: &str = "v1:{nGK2qVvElA72tbFE7VrGjQ==}";
/// `password` under the fixture v0 key, bare base64
pub const PASSWORD_V0: &str = "RBg2QZJmj7VrFhrC18lI5A==";

/// Call once at the start of any test that needs logs
pub fn setup() {
    #[cfg(feature = "logging")]
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env()) // respects RUST_LOG=
        .try_init()
        .ok();

    #[cfg(not(feature = "logging"))]
    { /* no-op */ }
}

/// Directory holding `v2_key`, `v1_key`, `v0_key` and `junk_key`
pub fn key_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/keys")
}

/// Cipher over the fixture root: current key only
pub fn cipher() -> SecretCipher {
    setup();
    SecretCipher::new(Arc::new(KeyStore::with_root(key_root())))
}

/// Cipher over the fixture root with the v1 and v0 keys registered
pub fn cipher_with_legacy() -> SecretCipher {
    let cipher = cipher();
    assert!(cipher.key_store().add_legacy("v1_key", Generation::new(1)));
    assert!(cipher.key_store().add_legacy("v0_key", Generation::LEGACY));
    cipher
}

/// Cipher whose root holds no keys at all
pub fn keyless_cipher() -> SecretCipher {
    setup();
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/no-such-dir");
    SecretCipher::new(Arc::new(KeyStore::with_root(root)))
}
