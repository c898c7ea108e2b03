pub mod ip;

pub use ip::extract_client_ip;

/// Stored user agents are capped at 255 characters.
pub const MAX_USER_AGENT_LEN: usize = 255;

/// Truncate a raw User-Agent header value to the stored length. Counts
/// characters, not bytes, so multibyte agents never split mid-character.
pub fn normalize_user_agent(raw: Option<&str>) -> String {
    raw.unwrap_or("").chars().take(MAX_USER_AGENT_LEN).collect()
}
