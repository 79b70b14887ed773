// src/engine/key.rs
//! A single symmetric key: algorithm, key bytes and fixed IV
//!
//! Encryption under a `Key` is deterministic: the IV is part of the key,
//! not drawn per call, so equal plaintexts always produce equal tokens.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use aes::{Aes128, Aes192, Aes256};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyIvInit};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::algo::CipherAlgorithm;
use crate::aliases::KeyMaterial;
use crate::consts::IV_LEN;
use crate::error::{CryptError, KeyFileError, Result};

/// On-disk key record
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    #[serde(default)]
    algorithm: CipherAlgorithm,
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iv: Option<String>,
}

pub struct Key {
    algorithm: CipherAlgorithm,
    key: KeyMaterial,
    iv: [u8; IV_LEN],
}

impl Key {
    /// Build a key from raw bytes. A missing IV means the all-zero block.
    pub fn new(algorithm: CipherAlgorithm, key: Vec<u8>, iv: Option<[u8; IV_LEN]>) -> Result<Self> {
        if key.len() != algorithm.key_len() {
            return Err(CryptError::InvalidKey {
                algorithm,
                reason: format!(
                    "expected {} key bytes, got {}",
                    algorithm.key_len(),
                    key.len()
                ),
            });
        }

        Ok(Self {
            algorithm,
            key: KeyMaterial::new(key),
            iv: iv.unwrap_or([0u8; IV_LEN]),
        })
    }

    /// Build a key from its base64 fields, as stored in key files
    pub fn from_base64(algorithm: CipherAlgorithm, key: &str, iv: Option<&str>) -> Result<Self> {
        let invalid = |reason: String| CryptError::InvalidKey { algorithm, reason };

        let raw_key = STANDARD
            .decode(key.trim())
            .map_err(|e| invalid(format!("key is not base64: {e}")))?;

        let raw_iv = match iv {
            Some(iv) => {
                let bytes = STANDARD
                    .decode(iv.trim())
                    .map_err(|e| invalid(format!("iv is not base64: {e}")))?;
                let len = bytes.len();
                let block: [u8; IV_LEN] = bytes
                    .try_into()
                    .map_err(|_| invalid(format!("expected {IV_LEN} iv bytes, got {len}")))?;
                Some(block)
            }
            None => None,
        };

        Self::new(algorithm, raw_key, raw_iv)
    }

    /// Fresh random key with the default (zero) IV
    pub fn generate(algorithm: CipherAlgorithm) -> Self {
        let mut bytes = vec![0u8; algorithm.key_len()];
        rand::rng().fill_bytes(&mut bytes);
        Self {
            algorithm,
            key: KeyMaterial::new(bytes),
            iv: [0u8; IV_LEN],
        }
    }

    /// Load a key file. Strict: every failure is reported.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, KeyFileError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| KeyFileError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&text).map_err(|reason| KeyFileError::Invalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_toml(text: &str) -> std::result::Result<Self, String> {
        let record: KeyFile = toml::from_str(text).map_err(|e| e.message().to_owned())?;
        Self::from_base64(record.algorithm, &record.key, record.iv.as_deref())
            .map_err(|e| e.to_string())
    }

    /// Persist as a key file. The file is written next to its final
    /// location and renamed into place.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), KeyFileError> {
        let path = path.as_ref();
        let unwritable = |source: std::io::Error| KeyFileError::Unwritable {
            path: path.to_path_buf(),
            source,
        };

        let record = KeyFile {
            algorithm: self.algorithm,
            key: self.key_base64(),
            iv: (self.iv != [0u8; IV_LEN]).then(|| self.iv_base64()),
        };
        let text = toml::to_string(&record).map_err(|e| unwritable(std::io::Error::other(e)))?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::Builder::new()
            .prefix(".key-")
            .tempfile_in(dir)
            .map_err(unwritable)?;
        tmp.write_all(text.as_bytes()).map_err(unwritable)?;
        tmp.persist(path).map_err(|e| unwritable(e.error))?;
        Ok(())
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    pub fn raw_key(&self) -> &[u8] {
        self.key.as_slice()
    }

    pub fn raw_iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn key_base64(&self) -> String {
        STANDARD.encode(self.raw_key())
    }

    pub fn iv_base64(&self) -> String {
        STANDARD.encode(self.iv)
    }

    /// Short BLAKE3 digest identifying this key in logs
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.algorithm.as_str().as_bytes());
        hasher.update(self.raw_key());
        hasher.update(&self.iv);
        hasher.finalize().to_hex()[..16].to_string()
    }

    /// CBC-encrypt with PKCS#7 padding
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_padded(plaintext)
            .map_err(|_| CryptError::InvalidKey {
                algorithm: self.algorithm,
                reason: "key or iv length rejected by cipher".into(),
            })
    }

    fn encrypt_padded(&self, plaintext: &[u8]) -> std::result::Result<Vec<u8>, InvalidLength> {
        let key = self.raw_key();
        Ok(match self.algorithm {
            CipherAlgorithm::Aes128Cbc => cbc::Encryptor::<Aes128>::new_from_slices(key, &self.iv)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            CipherAlgorithm::Aes192Cbc => cbc::Encryptor::<Aes192>::new_from_slices(key, &self.iv)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            CipherAlgorithm::Aes256Cbc => cbc::Encryptor::<Aes256>::new_from_slices(key, &self.iv)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        })
    }

    /// CBC-decrypt; `None` when the padding does not check out
    pub fn decrypt(&self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        let key = self.raw_key();
        match self.algorithm {
            CipherAlgorithm::Aes128Cbc => cbc::Decryptor::<Aes128>::new_from_slices(key, &self.iv)
                .ok()?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .ok(),
            CipherAlgorithm::Aes192Cbc => cbc::Decryptor::<Aes192>::new_from_slices(key, &self.iv)
                .ok()?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .ok(),
            CipherAlgorithm::Aes256Cbc => cbc::Decryptor::<Aes256>::new_from_slices(key, &self.iv)
                .ok()?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .ok(),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.iv == other.iv && self.raw_key() == other.raw_key()
    }
}

impl Eq for Key {}

// Key bytes never reach logs
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("algorithm", &self.algorithm)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_KEY: &str = "5ysYUd3Qrjj7DDplmEJHmnrFBEPS887JwOQv0jFYq2g=";

    #[test]
    fn test_known_vector_with_zero_iv() {
        let key = Key::from_base64(CipherAlgorithm::Aes256Cbc, DEV_KEY, None).unwrap();
        let ct = key.encrypt(b"password").unwrap();
        assert_eq!(STANDARD.encode(&ct), "gURYNPfZP3cu4+bw9pznMQ==");
        assert_eq!(key.decrypt(&ct).unwrap(), b"password");
    }

    #[test]
    fn test_explicit_iv_changes_ciphertext() {
        let key = Key::from_base64(
            CipherAlgorithm::Aes256Cbc,
            "JZjTdiuOzWlTHUkBZSGj9BmWEoswxvImWuwD/xN87s0=",
            Some("aXYtZm9yLWxlZ2FjeS0wMQ=="),
        )
        .unwrap();
        let ct = key.encrypt(b"secret").unwrap();
        assert_eq!(STANDARD.encode(&ct), "JBNWwF7xkMaRZsWvI8HBOw==");
        assert_eq!(key.iv_base64(), "aXYtZm9yLWxlZ2FjeS0wMQ==");
    }

    #[test]
    fn test_aes_128_key() {
        let key = Key::new(CipherAlgorithm::Aes128Cbc, b"legacy-v0-key-16".to_vec(), None).unwrap();
        let ct = key.encrypt(b"p4$$w0rd").unwrap();
        assert_eq!(STANDARD.encode(&ct), "FWezAkIXWSkmmQpltThDNw==");
    }

    #[test]
    fn test_wrong_key_length_rejected() {
        let err = Key::new(CipherAlgorithm::Aes256Cbc, vec![0u8; 16], None).unwrap_err();
        assert!(matches!(err, CryptError::InvalidKey { .. }));
    }

    #[test]
    fn test_short_iv_rejected() {
        let err = Key::from_base64(CipherAlgorithm::Aes256Cbc, DEV_KEY, Some("AAAA")).unwrap_err();
        assert!(err.to_string().contains("iv bytes"));
    }

    #[test]
    fn test_decrypt_rejects_partial_block() {
        let key = Key::generate(CipherAlgorithm::Aes256Cbc);
        assert!(key.decrypt(b"junk").is_none());
        assert!(key.decrypt(b"").is_none());
    }

    #[test]
    fn test_generate_is_random_and_sized() {
        let a = Key::generate(CipherAlgorithm::Aes256Cbc);
        let b = Key::generate(CipherAlgorithm::Aes256Cbc);
        assert_eq!(a.raw_key().len(), 32);
        assert_eq!(a.raw_iv(), &[0u8; IV_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_hides_key_bytes() {
        let key = Key::from_base64(CipherAlgorithm::Aes256Cbc, DEV_KEY, None).unwrap();
        let dbg = format!("{key:?}");
        assert!(!dbg.contains(DEV_KEY));
        assert!(dbg.contains(&key.fingerprint()));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v2_key");

        let key = Key::generate(CipherAlgorithm::Aes192Cbc);
        key.write_to(&path).unwrap();

        let loaded = Key::from_file(&path).unwrap();
        assert_eq!(loaded, key);
        assert!(std::fs::read_to_string(&path).unwrap().contains("aes-192-cbc"));
    }

    #[test]
    fn test_junk_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk_key");
        std::fs::write(&path, "junk").unwrap();

        let err = Key::from_file(&path).unwrap_err();
        assert!(matches!(err, KeyFileError::Invalid { .. }));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = Key::from_file("/definitely/not/here/v2_key").unwrap_err();
        assert!(matches!(err, KeyFileError::Unreadable { .. }));
    }
}
