//! Hitcounter - a self-hosted page-view hit counting service
//!
//! This library provides the core functionality for the Hitcounter service:
//! the hit decision engine, storage interfaces, and the HTTP endpoints that
//! record and expose view counts.
//!
//! # Architecture
//! - `engine`: the hit decision engine (blacklists, rate limits, dedup rules)
//! - `storages`: hit / counter / blacklist store traits and backends
//! - `services`: HTTP services (hit recording, counter reads, health)
//! - `i18n`: deferred-translation text values for JSON payloads
//! - `config`: configuration management
//! - `utils`: client IP extraction, user-agent normalization

pub mod config;
pub mod engine;
pub mod errors;
pub mod i18n;
pub mod services;
pub mod storages;
pub mod utils;
