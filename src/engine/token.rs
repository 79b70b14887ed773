// src/engine/token.rs
//! Wire format of encrypted values
//!
//! Three shapes exist in the wild:
//! - `v<n>:{<base64>}`: versioned, the only form written today
//! - bare base64: generation 0, written before versioning existed
//! - anything else: not a token at all

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

use super::generation::Generation;
use super::template;
use crate::error::Result;

static VERSIONED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\Av([0-9]+):\{([^}]*)\}\z").expect("static regex"));

/// Parsed shape of a candidate token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Versioned {
        generation: Generation,
        payload: Vec<u8>,
    },
    Legacy {
        payload: Vec<u8>,
    },
    Opaque,
}

/// Classify `text`.
///
/// A versioned token with a malformed payload is an error; text that is
/// merely not base64 is `Opaque`.
pub fn parse(text: &str) -> Result<Token> {
    if let Some((generation, payload)) = split_versioned(text) {
        let payload = decode_payload(payload)?;
        return Ok(Token::Versioned {
            generation,
            payload,
        });
    }

    match STANDARD.decode(text) {
        Ok(payload) if !payload.is_empty() => Ok(Token::Legacy { payload }),
        _ => Ok(Token::Opaque),
    }
}

/// Render a versioned token
pub fn format(generation: Generation, payload: &[u8]) -> String {
    format!("v{}:{{{}}}", generation.get(), STANDARD.encode(payload))
}

/// Generation of a versioned token, looking through template wrappers
pub fn generation_of(text: &str) -> Option<Generation> {
    split_versioned(template::unwrap(text)).map(|(generation, _)| generation)
}

fn split_versioned(text: &str) -> Option<(Generation, &str)> {
    let caps = VERSIONED.captures(text)?;
    let generation = caps[1].parse::<u32>().ok()?;
    let payload = caps.get(2)?.as_str();
    Some((Generation::new(generation), payload))
}

fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    if payload.contains(['\n', '\r']) {
        let joined: String = payload.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
        Ok(STANDARD.decode(joined)?)
    } else {
        Ok(STANDARD.decode(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptError;

    #[test]
    fn test_parse_versioned() {
        let token = parse("v2:{gURYNPfZP3cu4+bw9pznMQ==}").unwrap();
        match token {
            Token::Versioned {
                generation,
                payload,
            } => {
                assert_eq!(generation, Generation::CURRENT);
                assert_eq!(payload.len(), 16);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_payload() {
        assert_eq!(
            parse("v2:{}").unwrap(),
            Token::Versioned {
                generation: Generation::CURRENT,
                payload: vec![],
            }
        );
    }

    #[test]
    fn test_parse_strips_newlines() {
        let wrapped = parse(
            "v2:{zad43i0dQB+8z45ZYMVmpFcagbt40T0aFddhHlj6YtPgoOJ5N3uBYAp8WwuZ\nQkar}",
        )
        .unwrap();
        let flat = parse(
            "v2:{zad43i0dQB+8z45ZYMVmpFcagbt40T0aFddhHlj6YtPgoOJ5N3uBYAp8WwuZQkar}",
        )
        .unwrap();
        assert_eq!(wrapped, flat);
    }

    #[test]
    fn test_parse_malformed_versioned_payload() {
        let err = parse("v2:{55555}").unwrap_err();
        assert!(matches!(err, CryptError::Decode(_)));
    }

    #[test]
    fn test_parse_bare_base64_is_legacy() {
        assert!(matches!(
            parse("FWezAkIXWSkmmQpltThDNw==").unwrap(),
            Token::Legacy { .. }
        ));
    }

    #[test]
    fn test_parse_plain_text_is_opaque() {
        assert_eq!(parse("ca$hcOw").unwrap(), Token::Opaque);
        assert_eq!(parse("v2:{unterminated").unwrap(), Token::Opaque);
        assert_eq!(parse("prefix v2:{abc=} suffix").unwrap(), Token::Opaque);
    }

    #[test]
    fn test_format() {
        assert_eq!(format(Generation::CURRENT, &[]), "v2:{}");
        assert_eq!(format(Generation::new(1), b"junk"), "v1:{anVuaw==}");
    }

    #[test]
    fn test_generation_of() {
        assert_eq!(generation_of("v1:{anVuaw==}"), Some(Generation::new(1)));
        assert_eq!(
            generation_of(r#"<%= MiqPassword.decrypt("v2:{anVuaw==}") %>"#),
            Some(Generation::CURRENT)
        );
        assert_eq!(generation_of("password"), None);
    }
}
