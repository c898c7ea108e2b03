//! Configuration management
//!
//! Static configuration loaded from a TOML file at startup, with environment
//! variable overrides. Access goes through the global [`get_config`] instance.

mod r#impl;

pub use r#impl::{get_config, init_config};

use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub policy: PolicyConfig,
    pub blacklist: BlacklistConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Proxies whose X-Forwarded-For header is trusted (IP or CIDR)
    pub trusted_proxies: Vec<String>,
    /// Locale used when resolving deferred-translation text
    pub locale: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            trusted_proxies: Vec::new(),
            locale: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Reject once the active-hit count for an IP exceeds this limit (0 = disabled)
    pub hits_per_ip_limit: u64,
    /// Authenticated users in any of these groups never register hits
    pub exclude_user_groups: Vec<String>,
    /// How long a hit stays in the active view used for dedup and rate limiting
    pub active_window_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            hits_per_ip_limit: 0,
            exclude_user_groups: Vec::new(),
            // 7 days
            active_window_secs: 604_800,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    pub ips: Vec<String>,
    pub user_agents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_max_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "hc_session".to_string(),
            // 14 days
            cookie_max_age_secs: 1_209_600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.policy.hits_per_ip_limit, 0);
        assert_eq!(config.policy.active_window_secs, 604_800);
        assert_eq!(config.session.cookie_name, "hc_session");
        assert!(config.blacklist.ips.is_empty());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [policy]
            hits_per_ip_limit = 5
            exclude_user_groups = ["staff", "bots"]

            [blacklist]
            ips = ["203.0.113.7"]
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.policy.hits_per_ip_limit, 5);
        assert_eq!(config.policy.exclude_user_groups, vec!["staff", "bots"]);
        assert_eq!(config.blacklist.ips, vec!["203.0.113.7"]);
        // untouched sections keep their defaults
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.cookie_max_age_secs, 1_209_600);
    }
}
