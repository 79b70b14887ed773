// src/error.rs
//! Public error types for the entire crate

use std::path::PathBuf;

use thiserror::Error;

use crate::algo::CipherAlgorithm;
use crate::engine::generation::Generation;

#[derive(Error, Debug)]
pub enum CryptError {
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("can not decrypt {generation} encrypted string: {} is not available", generation.key_file_name())]
    MissingKey { generation: Generation },

    #[error("can not decrypt {generation} encrypted string: bad decrypt")]
    BadCiphertext { generation: Generation },

    #[error("invalid {algorithm} key material: {reason}")]
    InvalidKey {
        algorithm: CipherAlgorithm,
        reason: String,
    },

    #[error(transparent)]
    KeyFile(#[from] KeyFileError),
}

impl CryptError {
    /// Errors that mean "this token is not for us" rather than corruption
    pub fn is_unresolved_token(&self) -> bool {
        matches!(
            self,
            CryptError::MissingKey { .. } | CryptError::BadCiphertext { .. }
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported cipher algorithm {0:?}")]
pub struct UnknownAlgorithm(pub String);

#[derive(Error, Debug)]
pub enum KeyFileError {
    #[error("cannot read key file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid key file {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("cannot write key file {}: {source}", path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl KeyFileError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            KeyFileError::Unreadable { path, .. }
            | KeyFileError::Invalid { path, .. }
            | KeyFileError::Unwritable { path, .. } => path,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, CryptError>;
