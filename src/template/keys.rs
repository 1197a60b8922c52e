//! Key pattern and collision-free key generation.

use regex::Regex;
use std::sync::LazyLock;

/// Pattern for slugs and field/column keys.
pub const KEY_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*$";

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(KEY_PATTERN).unwrap());

pub fn is_valid_key(key: &str) -> bool {
    KEY_RE.is_match(key)
}

/// First of `base`, `base1`, `base2`, … not already in `existing`.
pub fn unique_key<S: AsRef<str>>(existing: &[S], base: &str) -> String {
    let taken = |candidate: &str| existing.iter().any(|k| k.as_ref() == candidate);

    if !taken(base) {
        return base.to_string();
    }

    let mut i: u64 = 1;
    loop {
        let candidate = format!("{base}{i}");
        if !taken(&candidate) {
            return candidate;
        }
        i += 1;
    }
}
