use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Key epoch a token was (or will be) encrypted under.
///
/// Displays as `v<n>`, the same spelling used in the wire prefix and in
/// conventional key file names (`v<n>_key`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u32);

impl Generation {
    /// Bare base64 tokens that predate the `v<n>:{}` wrapper
    pub const LEGACY: Generation = Generation(0);

    /// Generation used for all new encryption
    pub const CURRENT: Generation = Generation(2);

    pub const fn new(n: u32) -> Self {
        Generation(n)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub fn is_current(self) -> bool {
        self == Self::CURRENT
    }

    /// Conventional file name of this generation's key under the key root
    pub fn key_file_name(self) -> String {
        format!("v{}_key", self.0)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u32> for Generation {
    fn from(n: u32) -> Self {
        Generation(n)
    }
}

impl FromStr for Generation {
    type Err = std::num::ParseIntError;

    /// Accepts `2`, `v2` and `V2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .unwrap_or(s);
        digits.parse().map(Generation)
    }
}
