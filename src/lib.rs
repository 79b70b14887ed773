// src/lib.rs
//! encrypted-secret: versioned symmetric encryption for stored secrets
//!
//! Features:
//! - `v2:{...}` text tokens under AES-CBC keys loaded from key files
//! - Legacy key generations kept for decryption and migration (`recrypt`)
//! - Plaintext passthrough for values that were never encrypted
//! - Log redaction and derived encodings of a secret

pub mod algo;
pub mod aliases;
pub mod config;
pub mod consts;
pub mod derived;
pub mod engine;
pub mod error;
pub mod record;
pub mod sanitize;

// Re-export everything users need at the crate root
pub use algo::CipherAlgorithm;
pub use aliases::KeyMaterial;
pub use config::load as load_config;
pub use config::Config;
pub use derived::{md5_crypt, password_digest, transport_encode};
pub use engine::{generation_of, Generation, Key, KeySource, KeyStore, SecretCipher, Token};
pub use error::{ConfigError, CryptError, KeyFileError, Result, UnknownAlgorithm};
pub use record::{EncryptedColumns, EncryptedField};
pub use sanitize::{sanitize, sanitize_in_place};
