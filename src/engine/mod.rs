//! Hit decision engine
//!
//! Decides, for each incoming view event, whether it counts as a hit. The
//! rules run in a fixed order and the first match wins: blacklists, excluded
//! user groups, the per-IP limit, self-hit suppression, then per-user or
//! per-session deduplication against the active-hit view. The engine holds no
//! request state; everything it needs arrives in the immutable [`HitEvent`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PolicyConfig;
use crate::errors::{HitCounterError, Result};
use crate::storages::{BlacklistStore, CounterStore, Hit, HitStore, Stores};

/// Who triggered the view event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated { user_id: String, groups: Vec<String> },
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }
}

/// An immutable view event: identity signals plus the target counter.
#[derive(Debug, Clone)]
pub struct HitEvent {
    pub identity: Identity,
    pub session: String,
    pub ip: String,
    /// Already normalized (truncated to 255 chars) by the caller
    pub user_agent: String,
    pub hitcount_id: u64,
}

/// Anti-abuse policy knobs, derived from `[policy]` configuration.
#[derive(Debug, Clone, Default)]
pub struct HitPolicy {
    /// 0 disables the per-IP limit
    pub hits_per_ip_limit: u64,
    pub exclude_user_groups: HashSet<String>,
}

impl HitPolicy {
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            hits_per_ip_limit: config.hits_per_ip_limit,
            exclude_user_groups: config.exclude_user_groups.iter().cloned().collect(),
        }
    }
}

/// Why an event was not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    BlacklistedIp,
    BlacklistedUserAgent,
    ExcludedGroup,
    IpRateLimited,
    SelfHit,
    DuplicateUser,
    DuplicateSession,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RejectReason::BlacklistedIp => "ip blacklisted",
            RejectReason::BlacklistedUserAgent => "user agent blacklisted",
            RejectReason::ExcludedGroup => "user group excluded",
            RejectReason::IpRateLimited => "per-ip limit reached",
            RejectReason::SelfHit => "author viewing own content",
            RejectReason::DuplicateUser => "user already counted",
            RejectReason::DuplicateSession => "session already counted",
        };
        write!(f, "{}", reason)
    }
}

/// Outcome of the decision procedure. Every branch is an explicit verdict;
/// rejection is a valid result, not an error.
#[derive(Debug, Clone)]
pub enum Verdict {
    Accepted(Hit),
    Rejected(RejectReason),
}

impl Verdict {
    pub fn counted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

pub struct HitDecisionEngine {
    hits: Arc<dyn HitStore>,
    counters: Arc<dyn CounterStore>,
    blacklists: Arc<dyn BlacklistStore>,
}

impl HitDecisionEngine {
    pub fn new(stores: &Stores) -> Self {
        Self {
            hits: stores.hits.clone(),
            counters: stores.counters.clone(),
            blacklists: stores.blacklists.clone(),
        }
    }

    /// Run the ordered rule chain for one event. On acceptance exactly one
    /// hit is appended and the counter aggregate is bumped.
    ///
    /// The target counter must already exist; an unknown id is a precondition
    /// failure surfaced as `NotFound`, not a policy rejection.
    pub async fn evaluate(&self, event: &HitEvent, policy: &HitPolicy) -> Result<Verdict> {
        let Some(counter) = self.counters.get(event.hitcount_id).await? else {
            return Err(HitCounterError::not_found(format!(
                "hitcount {} does not exist",
                event.hitcount_id
            )));
        };

        // 1. blacklists, exact match
        if self.blacklists.contains_ip(&event.ip).await? {
            return Ok(self.reject(event, RejectReason::BlacklistedIp));
        }
        if self.blacklists.contains_user_agent(&event.user_agent).await? {
            return Ok(self.reject(event, RejectReason::BlacklistedUserAgent));
        }

        // 2. excluded user groups
        if !policy.exclude_user_groups.is_empty()
            && let Identity::Authenticated { groups, .. } = &event.identity
            && groups
                .iter()
                .any(|group| policy.exclude_user_groups.contains(group))
        {
            return Ok(self.reject(event, RejectReason::ExcludedGroup));
        }

        // 3. per-IP limit over the active view (strictly greater, 0 = off)
        if policy.hits_per_ip_limit > 0 {
            let active = self.hits.count_active_by_ip(&event.ip).await?;
            if active > policy.hits_per_ip_limit {
                return Ok(self.reject(event, RejectReason::IpRateLimited));
            }
        }

        match &event.identity {
            Identity::Authenticated { user_id, .. } => {
                // 4. an author never increments their own counter
                if counter.target.author() == Some(user_id.as_str()) {
                    return Ok(self.reject(event, RejectReason::SelfHit));
                }

                // 5. one active hit per user and counter
                if self
                    .hits
                    .has_active_for_user(user_id, event.hitcount_id)
                    .await?
                {
                    return Ok(self.reject(event, RejectReason::DuplicateUser));
                }
                self.accept(event, Some(user_id.clone()), RejectReason::DuplicateUser)
                    .await
            }
            Identity::Anonymous => {
                // 6. one active hit per session and counter
                if self
                    .hits
                    .has_active_for_session(&event.session, event.hitcount_id)
                    .await?
                {
                    return Ok(self.reject(event, RejectReason::DuplicateSession));
                }
                self.accept(event, None, RejectReason::DuplicateSession).await
            }
        }
    }

    fn reject(&self, event: &HitEvent, reason: RejectReason) -> Verdict {
        debug!(
            "Hit rejected for counter {} from {}: {}",
            event.hitcount_id, event.ip, reason
        );
        Verdict::Rejected(reason)
    }

    /// Persist the accepted hit. A `record` returning `false` means a
    /// concurrent request won the insert for the same dedup key; the store's
    /// uniqueness constraint turns that into a rejection instead of a double
    /// count.
    async fn accept(
        &self,
        event: &HitEvent,
        user: Option<String>,
        lost_race_reason: RejectReason,
    ) -> Result<Verdict> {
        let hit = Hit {
            id: Uuid::new_v4(),
            hitcount_id: event.hitcount_id,
            user,
            session: event.session.clone(),
            ip: event.ip.clone(),
            user_agent: event.user_agent.clone(),
            created_at: Utc::now(),
        };

        if !self.hits.record(hit.clone()).await? {
            return Ok(self.reject(event, lost_race_reason));
        }
        self.counters.increment(event.hitcount_id).await?;

        info!(
            "Hit recorded for counter {} ({})",
            event.hitcount_id,
            if hit.user.is_some() {
                "authenticated"
            } else {
                "anonymous"
            }
        );
        Ok(Verdict::Accepted(hit))
    }
}
