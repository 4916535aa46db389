//! Movie id canonicalization.
//!
//! Every movie id that leaves the catalog accessor carries the `s` prefix:
//! - `s42` stays `s42`
//! - `tt0111161` (two letters + digits) becomes `s0111161`
//! - anything else is prefixed, `42` becomes `s42`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by every canonical movie id
pub const CANONICAL_PREFIX: char = 's';

/// A movie id in canonical form. Only [`normalize`] builds one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalMovieId(String);

impl CanonicalMovieId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalMovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalMovieId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalMovieId {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

impl From<String> for CanonicalMovieId {
    fn from(raw: String) -> Self {
        normalize(&raw)
    }
}

/// Canonicalize a raw movie id
pub fn normalize(raw: &str) -> CanonicalMovieId {
    let raw = raw.trim();

    if let Some(digits) = external_digits(raw) {
        return CanonicalMovieId(format!("{CANONICAL_PREFIX}{digits}"));
    }
    if raw.starts_with(CANONICAL_PREFIX) {
        return CanonicalMovieId(raw.to_string());
    }
    CanonicalMovieId(format!("{CANONICAL_PREFIX}{raw}"))
}

/// Digits of an external id: exactly two ASCII letters, then only digits.
/// `s`-prefixed ids are never external.
fn external_digits(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    if bytes.len() < 3 || bytes[0] == CANONICAL_PREFIX as u8 {
        return None;
    }
    let letters = bytes[..2].iter().all(u8::is_ascii_alphabetic);
    let digits = bytes[2..].iter().all(u8::is_ascii_digit);
    (letters && digits).then(|| &raw[2..])
}
