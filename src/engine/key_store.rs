// src/engine/key_store.rs
//! Every key the engine knows about: the current key plus legacy keys
//!
//! The current key is loaded lazily from `<root>/v2_key`. Legacy keys are
//! registered explicitly, tagged with the generation they decrypt, and are
//! tried in registration order.
//!
//! Neither failure is fatal here: a missing current key only logs a warning,
//! and a legacy key source that cannot be loaded is skipped.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::{debug, warn};

use super::generation::Generation;
use super::key::Key;
use crate::algo::CipherAlgorithm;
use crate::config::Config;
use crate::consts::KEY_ROOT_ENV;
use crate::error::{KeyFileError, Result};

/// Where a legacy key comes from
#[derive(Debug)]
pub enum KeySource {
    Key(Key),
    /// Absolute, or relative to the key root (the working directory when no
    /// root is set)
    Path(PathBuf),
}

impl From<Key> for KeySource {
    fn from(key: Key) -> Self {
        KeySource::Key(key)
    }
}

impl From<PathBuf> for KeySource {
    fn from(path: PathBuf) -> Self {
        KeySource::Path(path)
    }
}

impl From<&Path> for KeySource {
    fn from(path: &Path) -> Self {
        KeySource::Path(path.to_path_buf())
    }
}

impl From<&str> for KeySource {
    fn from(path: &str) -> Self {
        KeySource::Path(PathBuf::from(path))
    }
}

#[derive(Default)]
struct State {
    root: Option<PathBuf>,
    current: Option<Arc<Key>>,
    legacy: Vec<(Generation, Arc<Key>)>,
}

pub struct KeyStore {
    state: RwLock<State>,
    root_env: Cow<'static, str>,
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore {
    /// Empty store whose root defaults from `KEY_ROOT`
    pub fn new() -> Self {
        Self::with_root_env(KEY_ROOT_ENV)
    }

    /// Empty store whose root defaults from the given environment variable
    pub fn with_root_env(var: impl Into<Cow<'static, str>>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            root_env: var.into(),
        }
    }

    /// Empty store with an explicit root
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let store = Self::new();
        store.set_root_path(Some(root.into()));
        store
    }

    /// Store configured from `config`: root plus every listed legacy key
    pub fn from_config(config: &Config) -> Self {
        let store = Self::new();
        store.set_root_path(config.key_root.clone());
        for entry in &config.legacy_keys {
            store.add_legacy(entry.path.as_path(), entry.generation);
        }
        store
    }

    /// Explicit root, else the environment default
    pub fn root_path(&self) -> Option<PathBuf> {
        self.root_of(&self.state.read())
    }

    /// `None` reverts to the environment default. Drops the cached current
    /// key so it is reloaded from the new root; legacy keys stay.
    pub fn set_root_path(&self, root: Option<PathBuf>) {
        let mut state = self.state.write();
        state.root = root;
        state.current = None;
    }

    /// The current-generation key, loading it on first use
    pub fn current(&self) -> Option<Arc<Key>> {
        let state = self.state.upgradable_read();
        if let Some(key) = &state.current {
            return Some(Arc::clone(key));
        }

        let file_name = Generation::CURRENT.key_file_name();
        let path = resolve_under(self.root_of(&state).as_deref(), Path::new(&file_name));
        match Key::from_file(&path) {
            Ok(key) => {
                debug!("Loaded current key {} from {}", key.fingerprint(), path.display());
                let key = Arc::new(key);
                let mut state = RwLockUpgradableReadGuard::upgrade(state);
                state.current = Some(Arc::clone(&key));
                Some(key)
            }
            Err(KeyFileError::Unreadable { .. }) => {
                warn!(
                    "{} doesn't exist! Encryption under {} is unavailable until a key is installed.",
                    path.display(),
                    Generation::CURRENT
                );
                None
            }
            Err(err) => {
                warn!("{err}");
                None
            }
        }
    }

    /// Replace (or forget) the current key
    pub fn set_current(&self, key: Option<Key>) {
        self.state.write().current = key.map(Arc::new);
    }

    /// Register a key for decrypting `generation` tokens.
    ///
    /// Returns `false` (and registers nothing) when the source cannot be
    /// turned into a key.
    pub fn add_legacy(&self, source: impl Into<KeySource>, generation: Generation) -> bool {
        let key = match source.into() {
            KeySource::Key(key) => key,
            KeySource::Path(path) => {
                let path = resolve_under(self.root_path().as_deref(), &path);
                match Key::from_file(&path) {
                    Ok(key) => key,
                    Err(err) => {
                        debug!("Skipping {generation} legacy key: {err}");
                        return false;
                    }
                }
            }
        };

        debug!("Registered {generation} legacy key {}", key.fingerprint());
        self.state.write().legacy.push((generation, Arc::new(key)));
        true
    }

    /// Legacy keys registered for `generation`, in registration order
    pub fn legacy(&self, generation: Generation) -> Vec<Arc<Key>> {
        self.state
            .read()
            .legacy
            .iter()
            .filter(|(g, _)| *g == generation)
            .map(|(_, key)| Arc::clone(key))
            .collect()
    }

    /// Keys to try for a `generation` token: the current key first when
    /// the generation is current, then legacy keys for that generation
    pub fn candidates(&self, generation: Generation) -> Vec<Arc<Key>> {
        let (current, legacy) = self.snapshot();
        let current = current.filter(|_| generation.is_current());
        current
            .into_iter()
            .chain(
                legacy
                    .into_iter()
                    .filter(|(g, _)| *g == generation)
                    .map(|(_, key)| key),
            )
            .collect()
    }

    /// Current key (if any) followed by every legacy key
    pub fn all(&self) -> Vec<Arc<Key>> {
        let (current, legacy) = self.snapshot();
        current
            .into_iter()
            .chain(legacy.into_iter().map(|(_, key)| key))
            .collect()
    }

    /// Current and legacy keys as seen under one read guard
    fn snapshot(&self) -> (Option<Arc<Key>>, Vec<(Generation, Arc<Key>)>) {
        // Make sure the lazy load has been attempted
        self.current();
        let state = self.state.read();
        (state.current.clone(), state.legacy.clone())
    }

    pub fn clear_legacy(&self) {
        self.state.write().legacy.clear();
    }

    /// Fresh random key, optionally written out as a key file
    pub fn generate(algorithm: CipherAlgorithm, write_to: Option<&Path>) -> Result<Key> {
        let key = Key::generate(algorithm);
        if let Some(path) = write_to {
            key.write_to(path)?;
            debug!("Wrote {algorithm} key {} to {}", key.fingerprint(), path.display());
        }
        Ok(key)
    }

    fn root_of(&self, state: &State) -> Option<PathBuf> {
        state.root.clone().or_else(|| {
            std::env::var_os(&*self.root_env)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }
}

/// Absolute paths are taken as given; relative ones live under `root`
fn resolve_under(root: Option<&Path>, path: &Path) -> PathBuf {
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}
