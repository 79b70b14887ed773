// src/derived.rs
//! One-way and transport encodings of a secret
//!
//! Both accept either plaintext or a token; tokens are decrypted first, so
//! callers never need to know which one they hold.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::{Digest, Md5};

use crate::consts::{PASSWORD_DIGEST_SALT, SYSPREP_PASSWORD_SUFFIX};
use crate::engine::SecretCipher;
use crate::error::Result;

const MD5_CRYPT_MAGIC: &str = "$1$";
const MD5_CRYPT_ROUNDS: usize = 1000;
const CRYPT_ALPHABET: &[u8; 64] =
    b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// `$1$miq$...` MD5-crypt digest of the secret
pub fn password_digest(cipher: &SecretCipher, input: &str) -> Result<String> {
    let plaintext = cipher.decrypt(input)?;
    Ok(md5_crypt(plaintext.as_bytes(), PASSWORD_DIGEST_SALT))
}

/// Base64 of the UTF-16LE secret, in the shape unattended Windows setup
/// answer files expect for administrator passwords
pub fn transport_encode(cipher: &SecretCipher, input: &str) -> Result<String> {
    let plaintext = cipher.decrypt(input)?;
    let bytes: Vec<u8> = plaintext
        .encode_utf16()
        .chain(SYSPREP_PASSWORD_SUFFIX.encode_utf16())
        .flat_map(u16::to_le_bytes)
        .collect();
    Ok(STANDARD.encode(bytes))
}

/// FreeBSD MD5-crypt (`openssl passwd -1`). Salts longer than 8 bytes are
/// truncated.
pub fn md5_crypt(password: &[u8], salt: &str) -> String {
    let salt = &salt.as_bytes()[..salt.len().min(8)];

    let alternate = Md5::new()
        .chain_update(password)
        .chain_update(salt)
        .chain_update(password)
        .finalize();

    let mut ctx = Md5::new()
        .chain_update(password)
        .chain_update(MD5_CRYPT_MAGIC)
        .chain_update(salt);
    for chunk in password.chunks(16) {
        ctx.update(&alternate[..chunk.len()]);
    }
    let mut n = password.len();
    while n > 0 {
        if n & 1 == 1 {
            ctx.update([0u8]);
        } else {
            ctx.update(&password[..1]);
        }
        n >>= 1;
    }
    let mut digest = ctx.finalize();

    for round in 0..MD5_CRYPT_ROUNDS {
        let mut ctx = Md5::new();
        if round & 1 == 1 {
            ctx.update(password);
        } else {
            ctx.update(&digest);
        }
        if round % 3 != 0 {
            ctx.update(salt);
        }
        if round % 7 != 0 {
            ctx.update(password);
        }
        if round & 1 == 1 {
            ctx.update(&digest);
        } else {
            ctx.update(password);
        }
        digest = ctx.finalize();
    }

    let mut out = String::with_capacity(MD5_CRYPT_MAGIC.len() + salt.len() + 23);
    out.push_str(MD5_CRYPT_MAGIC);
    out.push_str(&String::from_utf8_lossy(salt));
    out.push('$');
    for (a, b, c) in [(0, 6, 12), (1, 7, 13), (2, 8, 14), (3, 9, 15), (4, 10, 5)] {
        let group = (u32::from(digest[a]) << 16) | (u32::from(digest[b]) << 8) | u32::from(digest[c]);
        push_crypt64(&mut out, group, 4);
    }
    push_crypt64(&mut out, u32::from(digest[11]), 2);
    out
}

fn push_crypt64(out: &mut String, mut value: u32, chars: usize) {
    for _ in 0..chars {
        out.push(char::from(CRYPT_ALPHABET[(value & 0x3f) as usize]));
        value >>= 6;
    }
}
