use crate::config::app::Config;

/// Key file the command-line tool reads when `--key` is not given,
/// relative to the working directory
pub const DEFAULT_KEY_FILE: &str = "certs/v2_key";

/// No explicit root (the environment decides) and no legacy keys
pub fn default_config() -> Config {
    Config {
        key_root: None,
        legacy_keys: Vec::new(),
    }
}
