//! Engine configuration from environment variables

use std::time::Duration;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite connection string
    pub database_url: String,

    /// Bind address
    pub host: String,
    pub port: u16,

    /// Upper bound on any single persistence call
    pub persistence_timeout: Duration,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://plaza.db?mode=rwc".to_string());
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(9001);
        let persistence_timeout = std::env::var("PERSISTENCE_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(5000));

        Self {
            database_url,
            host,
            port,
            persistence_timeout,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
