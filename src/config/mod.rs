// src/config/mod.rs
//! Configuration system for encrypted-secret
//!
//! TOML file + environment defaults for the key root and legacy keys.

pub use app::{load, Config, LegacyKey};
pub use defaults::{default_config, DEFAULT_KEY_FILE};

mod app;
mod defaults;
