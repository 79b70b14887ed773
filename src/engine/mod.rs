// src/engine/mod.rs
//! The versioned cipher engine
//!
//! Keys, the key store, the token wire format and the encrypt/decrypt/
//! recrypt operations built from them. Pure in-memory work, apart from
//! reading and writing key files.

pub mod cipher;
pub mod generation;
pub mod key;
pub mod key_store;
pub mod template;
pub mod token;

pub use cipher::SecretCipher;
pub use generation::Generation;
pub use key::Key;
pub use key_store::{KeySource, KeyStore};
pub use token::{generation_of, Token};
