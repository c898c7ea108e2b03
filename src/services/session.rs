//! Anonymous session keys
//!
//! Deduplication of anonymous hits needs a session identifier that is stable
//! across requests, so a request without a usable session cookie gets a fresh
//! key that the response must write back. This mirrors the usual
//! "save the session before reading its key" dance of server-side session
//! frameworks, with the key itself living in the cookie.

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, time::Duration};
use uuid::Uuid;

use crate::config::SessionConfig;

/// The session key for one request, and whether it was issued just now.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub key: String,
    /// A fresh key must be persisted via cookie or dedup breaks on the next
    /// request
    pub fresh: bool,
}

/// Read the session key from the request cookie, or issue a new one. Only
/// well-formed UUID values are accepted; anything else is treated as absent.
pub fn obtain_session(req: &HttpRequest, config: &SessionConfig) -> SessionHandle {
    if let Some(cookie) = req.cookie(&config.cookie_name)
        && Uuid::parse_str(cookie.value()).is_ok()
    {
        return SessionHandle {
            key: cookie.value().to_string(),
            fresh: false,
        };
    }

    SessionHandle {
        key: Uuid::new_v4().to_string(),
        fresh: true,
    }
}

/// Build the cookie that persists (or extends) a session key.
pub fn persist_cookie(key: &str, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), key.to_string())
        .path("/")
        .http_only(true)
        .max_age(Duration::seconds(config.cookie_max_age_secs as i64))
        .finish()
}
