use std::{env, time::Duration};

use dynamock_core::engine::DEFAULT_LIST_TABLES_LIMIT;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Per-request timeout in seconds (default: 10)
    pub request_timeout_seconds: u64,
    /// Largest page `ListTables` returns (default: 100)
    pub max_list_tables: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REQUEST_TIMEOUT_SECONDS` - Request timeout in seconds (default: 10)
    /// - `MAX_LIST_TABLES` - `ListTables` page size cap (default: 100)
    pub fn from_env() -> Self {
        Self {
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            max_list_tables: env::var("MAX_LIST_TABLES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(DEFAULT_LIST_TABLES_LIMIT),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timeout_conversion() {
        let config = Config {
            request_timeout_seconds: 30,
            max_list_tables: 100,
        };

        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_values() {
        env::remove_var("REQUEST_TIMEOUT_SECONDS");
        env::remove_var("MAX_LIST_TABLES");

        let config = Config::from_env();

        assert_eq!(config.request_timeout_seconds, 10);
        assert_eq!(config.max_list_tables, 100);
    }
}
