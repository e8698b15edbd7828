//! Environment-driven configuration and tracing bootstrap.

use notebase_core::defaults::{
    NOTE_CACHE_TTL_SECS, NOTE_LIST_CACHE_TTL_SECS, SEARCH_CACHE_TTL_SECS,
};
use notebase_core::{Error, Result};

/// Default Redis connection URL.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Application configuration, read from the environment.
///
/// Variables:
/// - `DATABASE_URL` (required)
/// - `REDIS_URL` (default: `redis://localhost:6379`)
/// - `REDIS_ENABLED` (default: true; "false"/"0" disables caching)
/// - `CACHE_TTL_NOTE`, `CACHE_TTL_LIST`, `CACHE_TTL_SEARCH` (seconds)
/// - `DB_MAX_CONNECTIONS` (default: 10)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub redis_enabled: bool,
    pub note_ttl_secs: u64,
    pub list_ttl_secs: u64,
    pub search_ttl_secs: u64,
    pub max_connections: u32,
}

impl AppConfig {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL is not set".to_string()))?;

        Ok(Self {
            database_url,
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            redis_enabled: std::env::var("REDIS_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            note_ttl_secs: env_u64("CACHE_TTL_NOTE", NOTE_CACHE_TTL_SECS),
            list_ttl_secs: env_u64("CACHE_TTL_LIST", NOTE_LIST_CACHE_TTL_SECS),
            search_ttl_secs: env_u64("CACHE_TTL_SEARCH", SEARCH_CACHE_TTL_SECS),
            max_connections: env_u64("DB_MAX_CONNECTIONS", 10) as u32,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Initialize tracing with an env-filter (`RUST_LOG`, defaulting to info).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
