//! Detection of strings that came from the default `Object.toString()`.
//!
//! Such strings embed an identity hash and differ between runs, so they are
//! neither promoted to literals nor captured as regression values.

use std::sync::OnceLock;

use regex_lite::Regex;

fn identity_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@[0-9a-h]{1,8}").expect("valid identity pattern"))
}

fn default_to_string() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z]{2,}[a-zA-Z0-9.]*@[0-9a-h]{4,}").expect("valid toString pattern")
    })
}

/// Loose test: anything containing `@` followed by a short hex run.
pub fn looks_like_object_to_string(s: &str) -> bool {
    s.len() >= 3 && identity_suffix().is_match(s)
}

/// Stricter test for a `pkg.Class@1f2e3d` shaped string.
pub fn matches_default_to_string(s: &str) -> bool {
    default_to_string().is_match(s)
}
