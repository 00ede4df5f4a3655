use ulid::Ulid;

/// Build a sortable, unique ID such as `nar_01J9ZK...` from a prefix.
///
/// # Examples
/// ```
/// let id = ashwood_common::id::prefixed_ulid("nar");
/// assert!(id.starts_with("nar_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Prefixes for IDs and secrets minted by the lobby.
pub mod prefix {
    /// GM bearer tokens.
    pub const GM_TOKEN: &str = "gmt";
    /// Narration calls, for correlating log lines.
    pub const NARRATION: &str = "nar";
}
