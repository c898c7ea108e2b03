//! In-memory storage backend
//!
//! Backs all three store traits with `DashMap`s. The hit log is append-only;
//! the dedup index maps dedup keys to the timestamp of their newest hit so
//! `record` can refuse duplicates atomically via the entry API.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;
use uuid::Uuid;

use crate::errors::{HitCounterError, Result};
use crate::storages::{BlacklistStore, CounterStore, Hit, HitCount, HitStore};

pub struct MemoryStore {
    hits: DashMap<Uuid, Hit>,
    /// dedup key -> created_at of the newest hit under that key
    dedup: DashMap<String, DateTime<Utc>>,
    counters: DashMap<u64, HitCount>,
    blacklist_ips: DashMap<String, ()>,
    blacklist_agents: DashMap<String, ()>,
    active_window: Duration,
}

impl MemoryStore {
    pub fn new(active_window: Duration) -> Self {
        Self {
            hits: DashMap::new(),
            dedup: DashMap::new(),
            counters: DashMap::new(),
            blacklist_ips: DashMap::new(),
            blacklist_agents: DashMap::new(),
            active_window,
        }
    }

    fn is_active(&self, created_at: DateTime<Utc>) -> bool {
        Utc::now() - created_at <= self.active_window
    }
}

#[async_trait]
impl HitStore for MemoryStore {
    async fn count_active_by_ip(&self, ip: &str) -> Result<u64> {
        let count = self
            .hits
            .iter()
            .filter(|entry| entry.value().ip == ip && self.is_active(entry.value().created_at))
            .count() as u64;
        Ok(count)
    }

    async fn has_active_for_user(&self, user: &str, hitcount_id: u64) -> Result<bool> {
        let key = format!("u/{}/{}", user, hitcount_id);
        Ok(self
            .dedup
            .get(&key)
            .is_some_and(|ts| self.is_active(*ts)))
    }

    async fn has_active_for_session(&self, session: &str, hitcount_id: u64) -> Result<bool> {
        let key = format!("s/{}/{}", session, hitcount_id);
        Ok(self
            .dedup
            .get(&key)
            .is_some_and(|ts| self.is_active(*ts)))
    }

    async fn record(&self, hit: Hit) -> Result<bool> {
        // The entry guard makes check-then-insert atomic per dedup key
        match self.dedup.entry(hit.dedup_key()) {
            Entry::Occupied(mut occupied) => {
                if self.is_active(*occupied.get()) {
                    trace!("Duplicate hit refused for key {}", hit.dedup_key());
                    return Ok(false);
                }
                // previous hit aged out of the active view
                occupied.insert(hit.created_at);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(hit.created_at);
            }
        }
        self.hits.insert(hit.id, hit);
        Ok(true)
    }

    async fn backend_name(&self) -> String {
        "memory".to_string()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get(&self, id: u64) -> Result<Option<HitCount>> {
        Ok(self.counters.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, counter: HitCount) -> Result<bool> {
        match self.counters.entry(counter.id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(counter);
                Ok(true)
            }
        }
    }

    async fn increment(&self, id: u64) -> Result<()> {
        match self.counters.get_mut(&id) {
            Some(mut counter) => {
                counter.hits += 1;
                Ok(())
            }
            None => Err(HitCounterError::not_found(format!(
                "hitcount {} does not exist",
                id
            ))),
        }
    }

    async fn load_all(&self) -> Result<HashMap<u64, HitCount>> {
        Ok(self
            .counters
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect())
    }
}

#[async_trait]
impl BlacklistStore for MemoryStore {
    async fn contains_ip(&self, ip: &str) -> Result<bool> {
        Ok(self.blacklist_ips.contains_key(ip))
    }

    async fn contains_user_agent(&self, user_agent: &str) -> Result<bool> {
        Ok(self.blacklist_agents.contains_key(user_agent))
    }

    async fn add_ip(&self, ip: &str) -> Result<()> {
        self.blacklist_ips.insert(ip.to_string(), ());
        Ok(())
    }

    async fn add_user_agent(&self, user_agent: &str) -> Result<()> {
        self.blacklist_agents.insert(user_agent.to_string(), ());
        Ok(())
    }
}
