// src/sanitize.rs
//! Redact encrypted values from free text (logs, error messages, dumps)

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::consts::REDACTED;

// `v2:{...}` as written, and `v2%3A%7B...%7D` as it appears in URLs
static EMBEDDED_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"v[0-9]+(?::\{[^}]*\}|(?i:%3A%7B)\S*?(?i:%7D))").expect("static regex")
});

/// Copy of `text` with every token replaced by `********`
pub fn sanitize(text: &str) -> String {
    EMBEDDED_TOKEN.replace_all(text, REDACTED).into_owned()
}

/// In-place variant of [`sanitize`]
pub fn sanitize_in_place(text: &mut String) {
    let redacted = match EMBEDDED_TOKEN.replace_all(text, REDACTED) {
        Cow::Owned(redacted) => Some(redacted),
        Cow::Borrowed(_) => None,
    };
    if let Some(redacted) = redacted {
        *text = redacted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_raw_tokens() {
        assert_eq!(
            sanitize("some :password: v2:{XAWlcAlViNwB} and another :password: v2:{egr+hObB}"),
            "some :password: ******** and another :password: ********"
        );
    }

    #[test]
    fn test_redacts_percent_encoded_tokens() {
        assert_eq!(
            sanitize(
                "some :encoded_password: v2%3A%7BXAWlcAlViNwB%7D and another :encoded_password: v2%3A%7Begr%2BhObB%7D"
            ),
            "some :encoded_password: ******** and another :encoded_password: ********"
        );
    }

    #[test]
    fn test_lowercase_percent_encoding() {
        assert_eq!(sanitize("url?pw=v1%3a%7bYWJj%7d&x=1"), "url?pw=********&x=1");
    }

    #[test]
    fn test_encoded_token_stops_at_whitespace() {
        assert_eq!(
            sanitize("x v2%3A%7Babc and later text %7D y v2%3A%7BYWJj%7D"),
            "x v2%3A%7Babc and later text %7D y ********"
        );
    }

    #[test]
    fn test_no_label_required() {
        assert_eq!(sanitize("v2:{}"), "********");
        assert_eq!(sanitize("[v0:{abc}]"), "[********]");
    }

    #[test]
    fn test_plain_text_untouched() {
        let text = "nothing to see: password, v2 and {braces}";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_idempotent() {
        let once = sanitize("a v2:{XAWlcAlViNwB} b v2%3A%7Begr%2BhObB%7D c");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_in_place() {
        let mut x = String::from(
            "some :password: v2:{XAWlcAlViNwBkJYjH35Rbw==} and another :password: v2:{egr+hObBeS+OC/hBDYnwgg==}",
        );
        sanitize_in_place(&mut x);
        assert_eq!(x, "some :password: ******** and another :password: ********");
    }
}
