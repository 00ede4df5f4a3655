//! Character pool handling.

use std::collections::HashSet;

use rand::Rng;

use ashwood_common::code::short_suffix;

/// Pool used when a session is created without its own list.
pub const DEFAULT_CHARACTERS: [&str; 6] = [
    "ravenkeeper",
    "antique_keymaster",
    "haunted_caretaker",
    "occult_scholar",
    "moonlit_detective",
    "clockwork_tinkerer",
];

pub fn default_pool() -> Vec<String> {
    DEFAULT_CHARACTERS.iter().map(|c| c.to_string()).collect()
}

/// Remove and return a uniformly random entry, or `None` when empty.
pub fn draw<R: Rng + ?Sized>(pool: &mut Vec<String>, rng: &mut R) -> Option<String> {
    if pool.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..pool.len());
    Some(pool.remove(idx))
}

/// Synthesize a `<prefix>_xxxx` id that `taken` does not report as in use.
pub fn placeholder(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = format!("{}_{}", prefix, short_suffix(4));
        if !taken(&candidate) {
            return candidate;
        }
    }
}

/// Check a caller-supplied pool: non-empty ids, no duplicates.
pub fn validate_pool(pool: &[String]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for c in pool {
        if c.trim().is_empty() {
            return Err("character ids must not be empty".to_string());
        }
        if !seen.insert(c.as_str()) {
            return Err(format!("duplicate character '{c}'"));
        }
    }
    Ok(())
}
