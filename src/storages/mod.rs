//! Storage interfaces
//!
//! The decision engine only ever sees these traits. The hit store exposes the
//! explicit reads the dedup rules need, each a pure query against the
//! active-hit view; `record` is the single mutating operation and carries the
//! uniqueness constraint that closes the concurrent double-insert race.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::Result;

pub mod memory;
mod models;

pub use models::{ContentTarget, Hit, HitCount};

#[async_trait]
pub trait HitStore: Send + Sync {
    /// Number of hits in the active view originating from `ip`
    async fn count_active_by_ip(&self, ip: &str) -> Result<u64>;

    /// Whether an active hit by `user` against this counter already exists
    async fn has_active_for_user(&self, user: &str, hitcount_id: u64) -> Result<bool>;

    /// Whether an active hit by `session` against this counter already exists
    async fn has_active_for_session(&self, session: &str, hitcount_id: u64) -> Result<bool>;

    /// Append a hit. Returns `false` without storing anything when an active
    /// hit with the same dedup key already exists, so a lost race degrades to
    /// an idempotent no-op instead of a double count.
    async fn record(&self, hit: Hit) -> Result<bool>;

    async fn backend_name(&self) -> String;
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn get(&self, id: u64) -> Result<Option<HitCount>>;

    /// Register a counter. Returns `false` when the id is already taken.
    async fn insert(&self, counter: HitCount) -> Result<bool>;

    /// Bump the aggregate count of an existing counter
    async fn increment(&self, id: u64) -> Result<()>;

    async fn load_all(&self) -> Result<HashMap<u64, HitCount>>;
}

#[async_trait]
pub trait BlacklistStore: Send + Sync {
    async fn contains_ip(&self, ip: &str) -> Result<bool>;
    async fn contains_user_agent(&self, user_agent: &str) -> Result<bool>;
    async fn add_ip(&self, ip: &str) -> Result<()>;
    async fn add_user_agent(&self, user_agent: &str) -> Result<()>;
}

/// The store handles a running service hands around.
#[derive(Clone)]
pub struct Stores {
    pub hits: Arc<dyn HitStore>,
    pub counters: Arc<dyn CounterStore>,
    pub blacklists: Arc<dyn BlacklistStore>,
}

pub struct StorageFactory;

impl StorageFactory {
    /// Build the storage backend and seed the blacklists from configuration.
    pub async fn create(config: &AppConfig) -> Result<Stores> {
        let window = Duration::seconds(config.policy.active_window_secs as i64);
        let backend = Arc::new(memory::MemoryStore::new(window));

        for ip in &config.blacklist.ips {
            backend.add_ip(ip).await?;
        }
        for agent in &config.blacklist.user_agents {
            backend.add_user_agent(agent).await?;
        }
        if !config.blacklist.ips.is_empty() || !config.blacklist.user_agents.is_empty() {
            info!(
                "Seeded blacklists: {} ips, {} user agents",
                config.blacklist.ips.len(),
                config.blacklist.user_agents.len()
            );
        }

        Ok(Stores {
            hits: backend.clone(),
            counters: backend.clone(),
            blacklists: backend,
        })
    }
}
