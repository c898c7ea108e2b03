//! Utility tests

use hitcounter::utils::{MAX_USER_AGENT_LEN, normalize_user_agent};

#[test]
fn test_normalize_user_agent_passthrough() {
    assert_eq!(
        normalize_user_agent(Some("Mozilla/5.0 (X11; Linux x86_64)")),
        "Mozilla/5.0 (X11; Linux x86_64)"
    );
}

#[test]
fn test_normalize_user_agent_missing_header() {
    assert_eq!(normalize_user_agent(None), "");
}

#[test]
fn test_normalize_user_agent_truncates_to_255() {
    let long = "x".repeat(400);
    let normalized = normalize_user_agent(Some(&long));
    assert_eq!(normalized.chars().count(), MAX_USER_AGENT_LEN);
}

#[test]
fn test_normalize_user_agent_counts_chars_not_bytes() {
    // 3 bytes per char; byte-based truncation would split mid-character
    let long = "测".repeat(300);
    let normalized = normalize_user_agent(Some(&long));
    assert_eq!(normalized.chars().count(), MAX_USER_AGENT_LEN);
    assert!(normalized.chars().all(|c| c == '测'));
}
