use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded view event. Append-only: never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    pub id: Uuid,
    pub hitcount_id: u64,
    /// Set for authenticated hits, `None` for anonymous ones
    pub user: Option<String>,
    pub session: String,
    pub ip: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

impl Hit {
    /// Key a hit deduplicates on: user+counter when authenticated,
    /// session+counter otherwise.
    pub fn dedup_key(&self) -> String {
        match &self.user {
            Some(user) => format!("u/{}/{}", user, self.hitcount_id),
            None => format!("s/{}/{}", self.session, self.hitcount_id),
        }
    }
}

/// The content object a counter belongs to. `author` is the typed
/// "no author" state: targets without an author relation simply carry `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentTarget {
    pub kind: String,
    pub object_id: String,
    author: Option<String>,
}

impl ContentTarget {
    pub fn new<K: Into<String>, O: Into<String>>(kind: K, object_id: O) -> Self {
        Self {
            kind: kind.into(),
            object_id: object_id.into(),
            author: None,
        }
    }

    pub fn with_author<K: Into<String>, O: Into<String>, A: Into<String>>(
        kind: K,
        object_id: O,
        author: A,
    ) -> Self {
        Self {
            kind: kind.into(),
            object_id: object_id.into(),
            author: Some(author.into()),
        }
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }
}

/// The countable target: aggregates hits against one content object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitCount {
    pub id: u64,
    pub target: ContentTarget,
    pub hits: u64,
}

impl HitCount {
    pub fn new(id: u64, target: ContentTarget) -> Self {
        Self {
            id,
            target,
            hits: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(user: Option<&str>, session: &str, hitcount_id: u64) -> Hit {
        Hit {
            id: Uuid::new_v4(),
            hitcount_id,
            user: user.map(String::from),
            session: session.to_string(),
            ip: "198.51.100.1".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_dedup_key_prefers_user() {
        assert_eq!(hit(Some("alice"), "sess-1", 7).dedup_key(), "u/alice/7");
        assert_eq!(hit(None, "sess-1", 7).dedup_key(), "s/sess-1/7");
    }

    #[test]
    fn test_target_author_accessor() {
        let plain = ContentTarget::new("post", "42");
        assert_eq!(plain.author(), None);

        let authored = ContentTarget::with_author("post", "42", "alice");
        assert_eq!(authored.author(), Some("alice"));
    }
}
