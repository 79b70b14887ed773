// src/bin/encrypted-secret.rs
//! Encrypt or decrypt one secret from the command line
//!
//! ```text
//! encrypted-secret [--decrypt|--encrypt] [--key KEYFILE] [--debug] [string]
//! ```
//!
//! Without a string argument the secret is read from stdin.

use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use encrypted_secret::config::{self, DEFAULT_KEY_FILE};
use encrypted_secret::{Generation, Key, KeyFileError, KeyStore, SecretCipher};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: encrypted-secret [options] [string]

Encrypt or decrypt a secret with a v2 key file.
The string is read from stdin when not given.

Options:
    -d, --decrypt       Decrypt the string (default)
    -e, --encrypt       Encrypt the string
    -k, --key KEYFILE   Key file to use (default: certs/v2_key)
        --debug         Print key details to stderr
    -h, --help          Show this help
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Encrypt,
    Decrypt,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Encrypt => "encrypt",
            Mode::Decrypt => "decrypt",
        }
    }
}

#[derive(Debug)]
struct Options {
    mode: Mode,
    key_file: PathBuf,
    debug: bool,
    input: Option<String>,
}

enum Parsed {
    Run(Options),
    Help,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let options = match parse_args(std::env::args().skip(1))? {
        Parsed::Run(options) => options,
        Parsed::Help => {
            eprint!("{USAGE}");
            return Ok(());
        }
    };
    let debug_mode = options.debug || std::env::var_os("DEBUG").is_some_and(|v| !v.is_empty());

    let key = load_key(&options.key_file)?;
    if debug_mode {
        print_debug(options.mode, &options.key_file, &key);
    }

    let mut config = config::load()?;
    if config.key_root.is_none() {
        config.key_root = options
            .key_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
    }
    let store = KeyStore::from_config(&config);
    store.set_current(Some(key));
    let cipher = SecretCipher::new(Arc::new(store));

    let input = match options.input {
        Some(input) => input,
        None => read_stdin()?,
    };
    debug!("Read {} byte(s) of input", input.len());

    let output = match options.mode {
        Mode::Encrypt => cipher.encrypt(&input)?,
        Mode::Decrypt => cipher.decrypt(&input)?,
    };
    println!("{output}");
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Parsed> {
    let mut mode = Mode::Decrypt;
    let mut key_file = PathBuf::from(DEFAULT_KEY_FILE);
    let mut debug = false;
    let mut input = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "-?" | "--help" => return Ok(Parsed::Help),
            "-e" | "--encrypt" => mode = Mode::Encrypt,
            "-d" | "--decrypt" => mode = Mode::Decrypt,
            "--debug" => debug = true,
            "-k" | "--key" => {
                let path = args.next().with_context(|| format!("{arg} requires a KEYFILE"))?;
                key_file = PathBuf::from(path);
            }
            other => {
                if let Some(path) = other.strip_prefix("--key=") {
                    key_file = PathBuf::from(path);
                } else if other.starts_with('-') && other.len() > 1 {
                    bail!("unknown option {other}");
                } else if input.is_some() {
                    bail!("only one string may be given");
                } else {
                    input = Some(other.to_owned());
                }
            }
        }
    }

    Ok(Parsed::Run(Options {
        mode,
        key_file,
        debug,
        input,
    }))
}

fn load_key(path: &Path) -> Result<Key> {
    let label = Generation::CURRENT;
    Key::from_file(path).map_err(|err| match err {
        KeyFileError::Unreadable { .. } => {
            anyhow::anyhow!("Cannot read {label} key file {}", path.display())
        }
        other => anyhow::anyhow!("Invalid {label} key file {}: {other}", path.display()),
    })
}

fn read_stdin() -> Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Enter the string, then press Ctrl-D:");
    }
    let mut input = String::new();
    stdin.read_to_string(&mut input).context("Failed to read stdin")?;
    let trimmed = input.strip_suffix('\n').unwrap_or(&input);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(trimmed.to_owned())
}

fn print_debug(mode: Mode, key_file: &Path, key: &Key) {
    eprintln!("Mode:         {}", mode.as_str());
    eprintln!("Key File:     {}", key_file.display());
    eprintln!("Algorithm:    {}", key.algorithm());
    eprintln!("IV (Base64):  {}", key.iv_base64());
    eprintln!("IV (Hex):     {}", hex::encode(key.raw_iv()));
    eprintln!("Key (Base64): {}", key.key_base64());
    eprintln!("Key (Hex):    {}", hex::encode(key.raw_key()));
    eprintln!();
}
