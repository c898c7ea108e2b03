use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::error;
use tracing::{debug, warn};

use super::AppConfig;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// Load configuration from TOML file with environment variable fallback
    pub fn load() -> Self {
        let mut config = Self::load_from_file();
        config.override_with_env();
        config
    }

    fn load_from_file() -> Self {
        let config_paths = [
            "hitcounter.toml",
            "config.toml",
            "config/hitcounter.toml",
            "/etc/hitcounter/config.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                debug!("Loading config from: {}", path);
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<AppConfig>(&content) {
                        Ok(config) => {
                            debug!("Successfully loaded config from: {}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file {}: {}", path, e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file {}: {}", path, e);
                    }
                }
            }
        }

        debug!("No config file found, using defaults");
        Self::default()
    }

    /// Override configuration with environment variables
    fn override_with_env(&mut self) {
        // Server config
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            } else {
                error!("Invalid SERVER_PORT: {}", port);
            }
        }
        if let Ok(proxies) = env::var("TRUSTED_PROXIES") {
            self.server.trusted_proxies = split_list(&proxies);
        }
        if let Ok(locale) = env::var("HITCOUNTER_LOCALE") {
            self.server.locale = locale;
        }

        // Policy config
        if let Ok(limit) = env::var("HITS_PER_IP_LIMIT") {
            if let Ok(limit) = limit.parse() {
                self.policy.hits_per_ip_limit = limit;
            } else {
                error!("Invalid HITS_PER_IP_LIMIT: {}", limit);
            }
        }
        if let Ok(groups) = env::var("EXCLUDE_USER_GROUPS") {
            self.policy.exclude_user_groups = split_list(&groups);
        }
        if let Ok(window) = env::var("ACTIVE_WINDOW_SECS") {
            if let Ok(secs) = window.parse() {
                self.policy.active_window_secs = secs;
            } else {
                error!("Invalid ACTIVE_WINDOW_SECS: {}", window);
            }
        }

        // Blacklist config
        if let Ok(ips) = env::var("BLACKLIST_IPS") {
            self.blacklist.ips = split_list(&ips);
        }
        if let Ok(agents) = env::var("BLACKLIST_USER_AGENTS") {
            self.blacklist.user_agents = split_list(&agents);
        }

        // Session config
        if let Ok(name) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = name;
        }
        if let Ok(max_age) = env::var("SESSION_COOKIE_MAX_AGE_SECS") {
            if let Ok(secs) = max_age.parse() {
                self.session.cookie_max_age_secs = secs;
            } else {
                error!("Invalid SESSION_COOKIE_MAX_AGE_SECS: {}", max_age);
            }
        }

        // Logging config
        if let Ok(log_level) = env::var("RUST_LOG") {
            self.logging.level = log_level;
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Get the global configuration instance
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::load)
}

/// Initialize the global configuration
pub fn init_config() {
    CONFIG.get_or_init(AppConfig::load);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_list(""), Vec::<String>::new());
        assert_eq!(split_list(" , "), Vec::<String>::new());
    }
}
