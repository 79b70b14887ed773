// src/algo.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownAlgorithm;

/// Supported token ciphers, all CBC with PKCS#7 padding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
#[non_exhaustive]
pub enum CipherAlgorithm {
    Aes128Cbc,
    Aes192Cbc,
    #[default]
    Aes256Cbc,
}

impl CipherAlgorithm {
    /// Canonical OpenSSL-style name, as written in key files
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherAlgorithm::Aes128Cbc => "aes-128-cbc",
            CipherAlgorithm::Aes192Cbc => "aes-192-cbc",
            CipherAlgorithm::Aes256Cbc => "aes-256-cbc",
        }
    }

    /// Required key length in bytes
    pub fn key_len(&self) -> usize {
        match self {
            CipherAlgorithm::Aes128Cbc => 16,
            CipherAlgorithm::Aes192Cbc => 24,
            CipherAlgorithm::Aes256Cbc => 32,
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-128-cbc" => Ok(CipherAlgorithm::Aes128Cbc),
            "aes-192-cbc" => Ok(CipherAlgorithm::Aes192Cbc),
            "aes-256-cbc" => Ok(CipherAlgorithm::Aes256Cbc),
            _ => Err(UnknownAlgorithm(s.to_owned())),
        }
    }
}

impl TryFrom<String> for CipherAlgorithm {
    type Error = UnknownAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CipherAlgorithm> for String {
    fn from(value: CipherAlgorithm) -> Self {
        value.as_str().to_owned()
    }
}
