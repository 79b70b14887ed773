// src/consts.rs
//! Shared constants: wire format markers and fixed parameters

/// Environment variable naming the default key root directory
pub const KEY_ROOT_ENV: &str = "KEY_ROOT";

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "ENCRYPTED_SECRET_CONFIG";

/// Config file used when `CONFIG_PATH_ENV` is unset
pub const DEFAULT_CONFIG_FILE: &str = "encrypted-secret.toml";

/// CBC block size; every key carries an IV of exactly this length
pub const IV_LEN: usize = 16;

/// Replacement text for redacted tokens
pub const REDACTED: &str = "********";

/// Fixed salt for MD5-crypt password digests
pub const PASSWORD_DIGEST_SALT: &str = "miq";

/// Suffix the unattended-setup answer file expects after the password
pub const SYSPREP_PASSWORD_SUFFIX: &str = "AdministratorPassword";

/// Call-expression receivers recognized in template-wrapped tokens
pub const TEMPLATE_ALIASES: &[&str] = &["ManageIQ::Password", "MiqPassword", "DB_PASSWORD"];
