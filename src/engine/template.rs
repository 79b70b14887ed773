// src/engine/template.rs
//! Tokens embedded in template expressions
//!
//! Config files sometimes carry `<%= MiqPassword.decrypt("v2:{...}") %>`
//! instead of the bare token; only the quoted literal matters.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::consts::TEMPLATE_ALIASES;

static WRAPPED: Lazy<Regex> = Lazy::new(|| {
    let aliases = TEMPLATE_ALIASES
        .iter()
        .map(|alias| regex::escape(alias))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r#"\A\s*<%=\s*(?:{aliases})\.decrypt\(\s*(?:"([^"]*)"|'([^']*)')\s*\)\s*%>\s*\z"#
    );
    Regex::new(&pattern).expect("static regex")
});

/// The quoted literal of a wrapped token, or `text` itself
pub fn unwrap(text: &str) -> &str {
    WRAPPED
        .captures(text)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map_or(text, |m| m.as_str())
}

/// Whether `text` is a template wrapper at all
pub fn is_wrapped(text: &str) -> bool {
    WRAPPED.is_match(text)
}
