//! Short random codes: shareable session codes, placeholder suffixes and
//! opaque secrets.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;

/// Session code alphabet. Omits `0`, `O`, `1` and `I` so codes survive being
/// read aloud across a table.
const SESSION_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random part of a session code.
pub const SESSION_CODE_LEN: usize = 4;

fn random_from(charset: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// Generate a human-shareable session code such as `ASH-72QK`.
pub fn session_code() -> String {
    format!("ASH-{}", random_from(SESSION_CHARSET, SESSION_CODE_LEN))
}

/// Generate a short lowercase alphanumeric suffix (e.g. for `auto_k3f9`).
pub fn short_suffix(len: usize) -> String {
    random_from(SUFFIX_CHARSET, len)
}

/// Generate an opaque random secret with the given prefix.
pub fn opaque_secret(prefix: &str, bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(&mut buf[..]);
    format!("{}_{}", prefix, URL_SAFE_NO_PAD.encode(&buf))
}
