//! Hotel service configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3001`)
/// - `DATABASE_URL` — PostgreSQL connection string (default: `None`, uses in-memory store)
/// - `DB_MAX_CONNECTIONS` — max database pool connections (default: `10`)
/// - `HOLD_TTL_MINUTES` — hold lifetime before expiry (default: `15`)
/// - `SWEEP_INTERVAL_SECONDS` — expiration sweeper cadence (default: `30`)
/// - `LOCK_RETENTION_DAYS` — age at which terminal locks are deleted (default: `30`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub hold_ttl_minutes: i64,
    pub sweep_interval_seconds: u64,
    pub lock_retention_days: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            database_url: std::env::var("DATABASE_URL").ok(),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            hold_ttl_minutes: std::env::var("HOLD_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(hotel::engine::DEFAULT_HOLD_TTL_MINUTES),
            sweep_interval_seconds: std::env::var("SWEEP_INTERVAL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(hotel::sweeper::DEFAULT_SWEEP_INTERVAL_SECONDS),
            lock_retention_days: std::env::var("LOCK_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(hotel::sweeper::DEFAULT_RETENTION_DAYS),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: None,
            db_max_connections: 10,
            hold_ttl_minutes: hotel::engine::DEFAULT_HOLD_TTL_MINUTES,
            sweep_interval_seconds: hotel::sweeper::DEFAULT_SWEEP_INTERVAL_SECONDS,
            lock_retention_days: hotel::sweeper::DEFAULT_RETENTION_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.hold_ttl_minutes, 15);
        assert_eq!(config.sweep_interval_seconds, 30);
        assert_eq!(config.lock_retention_days, 30);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8081,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8081");
    }
}
