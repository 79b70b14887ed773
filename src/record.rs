// src/record.rs
//! Encrypted fields on persisted records
//!
//! A record lists its encrypted columns and stores each as an
//! [`EncryptedField`]: writes go through `encrypt`, reads through
//! `decrypt`, and the stored token stays reachable through `raw`.

use crate::engine::SecretCipher;
use crate::error::Result;

/// Declares which columns of a record hold encrypted values
pub trait EncryptedColumns {
    const ENCRYPTED_COLUMNS: &'static [&'static str];

    fn is_encrypted_column(column: &str) -> bool {
        Self::ENCRYPTED_COLUMNS.contains(&column)
    }
}

/// Storage slot for one encrypted column. Holds only the token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedField {
    raw: Option<String>,
}

impl EncryptedField {
    /// Wrap a value read back from storage
    pub fn from_raw(raw: Option<String>) -> Self {
        Self { raw }
    }

    /// Decrypted value
    pub fn get(&self, cipher: &SecretCipher) -> Result<Option<String>> {
        cipher.decrypt_optional(self.raw.as_deref())
    }

    /// Encrypt and store `plaintext`
    pub fn set(&mut self, cipher: &SecretCipher, plaintext: Option<&str>) -> Result<()> {
        self.raw = cipher.encrypt_optional(plaintext)?;
        Ok(())
    }

    /// Stored token, unchanged
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Store an already-encrypted token as is
    pub fn set_raw(&mut self, token: Option<String>) {
        self.raw = token;
    }

    /// Move the stored token to the current key
    pub fn recrypt(&mut self, cipher: &SecretCipher) -> Result<()> {
        self.raw = cipher.recrypt_optional(self.raw.as_deref())?;
        Ok(())
    }
}
