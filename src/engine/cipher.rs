// src/engine/cipher.rs
//! Encrypt, decrypt and recrypt secrets as text tokens
//!
//! Decryption never assumes its input is a token. Anything that is not a
//! well-formed `v<n>:{...}` token, and is not a generation-0 token one of
//! the legacy keys can open, is handed back as already-plaintext. That lets
//! values which never went through this engine (ordinary passwords in old
//! configs) round-trip through `decrypt` unharmed.

use std::sync::Arc;

use tracing::{debug, trace};

use super::generation::Generation;
use super::key::Key;
use super::key_store::KeyStore;
use super::template;
use super::token::{self, Token};
use crate::error::{CryptError, Result};

/// Outcome of resolving a text value to plaintext
struct Resolved<'a> {
    /// Input with any template wrapper removed
    text: &'a str,
    plaintext: String,
    /// Tag of the versioned token, if the input was one
    generation: Option<Generation>,
    /// Key that opened it, if any key was needed
    key: Option<Arc<Key>>,
}

/// The cipher engine. Cheap to clone; clones share one key store.
#[derive(Clone)]
pub struct SecretCipher {
    keys: Arc<KeyStore>,
}

impl SecretCipher {
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self { keys }
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    /// Encrypt under the current key as a current-generation token
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.encrypt_as(plaintext, Generation::CURRENT)
    }

    /// Encrypt under the first key registered for `generation`
    pub fn encrypt_as(&self, plaintext: &str, generation: Generation) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(token::format(generation, &[]));
        }

        let key = self
            .keys
            .candidates(generation)
            .into_iter()
            .next()
            .ok_or(CryptError::MissingKey { generation })?;
        self.encrypt_with(plaintext, generation, &key)
    }

    /// Encrypt under an explicit key, tagging the token with `generation`
    pub fn encrypt_with(&self, plaintext: &str, generation: Generation, key: &Key) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(token::format(generation, &[]));
        }
        let ciphertext = key.encrypt(plaintext.as_bytes())?;
        Ok(token::format(generation, &ciphertext))
    }

    /// Plaintext of `text`.
    ///
    /// Versioned tokens must decrypt; every other input comes back as is
    /// (minus a template wrapper) unless a generation-0 key opens it.
    pub fn decrypt(&self, text: &str) -> Result<String> {
        Ok(self.resolve(text)?.plaintext)
    }

    /// Like [`decrypt`](Self::decrypt), but a versioned token that no key
    /// opens is returned unchanged. Corrupt base64 is still an error.
    pub fn try_decrypt(&self, text: &str) -> Result<String> {
        match self.resolve(text) {
            Ok(resolved) => Ok(resolved.plaintext),
            Err(err) if err.is_unresolved_token() => {
                debug!("Leaving value as is: {err}");
                Ok(text.to_owned())
            }
            Err(err) => Err(err),
        }
    }

    /// Encrypt unless `text` already is an encrypted value
    pub fn try_encrypt(&self, text: &str) -> Result<String> {
        if self.is_encrypted(text) {
            Ok(text.to_owned())
        } else {
            self.encrypt(text)
        }
    }

    /// Migrate `text` to the current key
    pub fn recrypt(&self, text: &str) -> Result<String> {
        let target = self.keys.current().ok_or(CryptError::MissingKey {
            generation: Generation::CURRENT,
        })?;
        self.recrypt_to(text, &target, Generation::CURRENT)
    }

    /// Migrate `text` to `target`, tagged `generation`.
    ///
    /// A token already opened by `target` under the same generation is
    /// returned byte for byte.
    pub fn recrypt_to(&self, text: &str, target: &Key, generation: Generation) -> Result<String> {
        let resolved = self.resolve(text)?;

        let already_there = resolved.generation == Some(generation)
            && resolved.key.as_deref().is_some_and(|key| key == target);
        if already_there {
            trace!("Token already under {generation} key {}", target.fingerprint());
            return Ok(resolved.text.to_owned());
        }

        self.encrypt_with(&resolved.plaintext, generation, target)
    }

    /// Whether `text` is a token this engine can open
    pub fn is_encrypted(&self, text: &str) -> bool {
        let text = template::unwrap(text);
        if text.is_empty() {
            return false;
        }
        match token::parse(text) {
            Ok(Token::Versioned { .. }) => self.resolve(text).is_ok(),
            Ok(Token::Legacy { payload }) => self.open_legacy(&payload).is_some(),
            _ => false,
        }
    }

    pub fn encrypt_optional(&self, plaintext: Option<&str>) -> Result<Option<String>> {
        plaintext.map(|p| self.encrypt(p)).transpose()
    }

    pub fn decrypt_optional(&self, text: Option<&str>) -> Result<Option<String>> {
        text.map(|t| self.decrypt(t)).transpose()
    }

    pub fn recrypt_optional(&self, text: Option<&str>) -> Result<Option<String>> {
        text.map(|t| self.recrypt(t)).transpose()
    }

    fn resolve<'a>(&self, text: &'a str) -> Result<Resolved<'a>> {
        let text = template::unwrap(text);
        let passthrough = || Resolved {
            text,
            plaintext: text.to_owned(),
            generation: None,
            key: None,
        };

        if text.is_empty() {
            return Ok(passthrough());
        }

        match token::parse(text)? {
            Token::Versioned {
                generation,
                payload,
            } => {
                if payload.is_empty() {
                    return Ok(Resolved {
                        text,
                        plaintext: String::new(),
                        generation: Some(generation),
                        key: None,
                    });
                }

                let candidates = self.keys.candidates(generation);
                if candidates.is_empty() {
                    return Err(CryptError::MissingKey { generation });
                }

                let (plaintext, key) = open_with(&candidates, &payload)
                    .ok_or(CryptError::BadCiphertext { generation })?;
                Ok(Resolved {
                    text,
                    plaintext,
                    generation: Some(generation),
                    key: Some(key),
                })
            }
            Token::Legacy { payload } => match self.open_legacy(&payload) {
                Some((plaintext, key)) => Ok(Resolved {
                    text,
                    plaintext,
                    generation: Some(Generation::LEGACY),
                    key: Some(key),
                }),
                None => Ok(passthrough()),
            },
            Token::Opaque => Ok(passthrough()),
        }
    }

    fn open_legacy(&self, payload: &[u8]) -> Option<(String, Arc<Key>)> {
        open_with(&self.keys.legacy(Generation::LEGACY), payload)
    }
}

/// First candidate whose output has valid padding and is UTF-8.
///
/// A wrong key yields valid padding for roughly one ciphertext in 256, so
/// padding alone cannot pick the winner.
fn open_with(candidates: &[Arc<Key>], payload: &[u8]) -> Option<(String, Arc<Key>)> {
    candidates.iter().find_map(|key| {
        let bytes = key.decrypt(payload)?;
        match String::from_utf8(bytes) {
            Ok(plaintext) => Some((plaintext, Arc::clone(key))),
            Err(_) => {
                trace!("Key {} produced non-UTF-8 output, trying next", key.fingerprint());
                None
            }
        }
    })
}
