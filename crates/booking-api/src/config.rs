//! Booking service configuration loaded from environment variables.

use std::time::Duration;

use booking::HotelGatewayConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `DATABASE_URL` — PostgreSQL connection string (default: `None`, uses in-memory store)
/// - `DB_MAX_CONNECTIONS` — max database pool connections (default: `10`)
/// - `HOTEL_BASE_URL` — where the hotel gateway points (default: `http://localhost:3001`)
/// - `HOTEL_TIMEOUT_MS` — per-attempt budget for hotel calls (default: `5000`)
/// - `HOTEL_MAX_RETRIES` — retry count for retryable hotel failures (default: `3`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub hotel_base_url: String,
    pub hotel_timeout_ms: u64,
    pub hotel_max_retries: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL").ok(),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            hotel_base_url: std::env::var("HOTEL_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            hotel_timeout_ms: std::env::var("HOTEL_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            hotel_max_retries: std::env::var("HOTEL_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the gateway configuration derived from this config.
    pub fn gateway_config(&self) -> HotelGatewayConfig {
        HotelGatewayConfig::new(self.hotel_base_url.clone())
            .with_timeout(Duration::from_millis(self.hotel_timeout_ms))
            .with_max_retries(self.hotel_max_retries)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            db_max_connections: 10,
            hotel_base_url: "http://localhost:3001".to_string(),
            hotel_timeout_ms: 5000,
            hotel_max_retries: 3,
        }
    }
}
