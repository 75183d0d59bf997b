//! Configuration module for the SPPG Dashboard API
//!
//! Everything comes from environment variables; see [`AppConfig::from_env`].

use std::time::Duration;
use tracing::info;

use crate::models::{AppError, AppResult};
use crate::utils::constants::{
    DEFAULT_DB_MAX_RETRIES, DEFAULT_DB_TIMEOUT_SECS, DEFAULT_HOST,
    DEFAULT_NUTRITION_CACHE_TTL_SECS, DEFAULT_OPENFOODFACTS_URL, DEFAULT_PORT,
    DEFAULT_RATE_LIMIT_PER_MINUTE,
};

/// Where rows are stored
#[derive(Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Supabase project (PostgREST at `{url}/rest/v1`)
    Supabase { url: String, service_key: String },
    /// In-process store, for demos and tests
    Memory,
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Supabase { .. } => "supabase",
            Self::Memory => "memory",
        }
    }
}

// Service key is never printed
impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supabase { url, .. } => f
                .debug_struct("Supabase")
                .field("url", url)
                .field("service_key", &"<hidden>")
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    /// When set, every request except `/` and `/health` needs `X-API-Key`
    pub api_key: Option<String>,
    /// Requests per minute per client
    pub rate_limit_per_minute: u32,
    pub db_timeout: Duration,
    /// Retry attempts for reads
    pub db_max_retries: u32,
    pub openfoodfacts_url: String,
    pub nutrition_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store: StoreBackend::Memory,
            api_key: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            db_timeout: Duration::from_secs(DEFAULT_DB_TIMEOUT_SECS),
            db_max_retries: DEFAULT_DB_MAX_RETRIES,
            openfoodfacts_url: DEFAULT_OPENFOODFACTS_URL.to_string(),
            nutrition_cache_ttl_secs: DEFAULT_NUTRITION_CACHE_TTL_SECS,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store = match get("SPPG_STORE").as_deref() {
            Some("memory") => StoreBackend::Memory,
            None | Some("supabase") => {
                let url = get("SUPABASE_URL");
                let service_key =
                    get("SUPABASE_SERVICE_ROLE_KEY").or_else(|| get("SUPABASE_SERVICE_KEY"));
                match (url, service_key) {
                    (Some(url), Some(service_key)) => StoreBackend::Supabase {
                        url: url.trim_end_matches('/').to_string(),
                        service_key,
                    },
                    _ => {
                        return Err(AppError::missing_env(
                            "Supabase URL atau Key belum disetting! (SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY)",
                        ))
                    }
                }
            }
            Some(other) => return Err(AppError::invalid_config("SPPG_STORE", other)),
        };

        // PORT is what hosting platforms set; SPPG_PORT is for local runs
        let port = match get("PORT").or_else(|| get("SPPG_PORT")) {
            Some(p) => parse_value("PORT", &p)?,
            None => DEFAULT_PORT,
        };

        let rate_limit_per_minute: u32 =
            parse_or("SPPG_RATE_LIMIT", get("SPPG_RATE_LIMIT"), DEFAULT_RATE_LIMIT_PER_MINUTE)?;
        if rate_limit_per_minute == 0 {
            return Err(AppError::invalid_config("SPPG_RATE_LIMIT", "0"));
        }

        let config = Self {
            host: get("SPPG_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            store,
            api_key: get("SPPG_API_KEY"),
            rate_limit_per_minute,
            db_timeout: Duration::from_secs(parse_or(
                "SPPG_DB_TIMEOUT_SECS",
                get("SPPG_DB_TIMEOUT_SECS"),
                DEFAULT_DB_TIMEOUT_SECS,
            )?),
            db_max_retries: parse_or("SPPG_DB_MAX_RETRIES", get("SPPG_DB_MAX_RETRIES"), DEFAULT_DB_MAX_RETRIES)?,
            openfoodfacts_url: get("OPENFOODFACTS_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENFOODFACTS_URL.to_string()),
            nutrition_cache_ttl_secs: parse_or(
                "SPPG_NUTRITION_CACHE_TTL_SECS",
                get("SPPG_NUTRITION_CACHE_TTL_SECS"),
                DEFAULT_NUTRITION_CACHE_TTL_SECS,
            )?,
        };

        info!(
            store = config.store.name(),
            port = config.port,
            auth = config.api_key.is_some(),
            "⚙️ Configuration loaded"
        );

        Ok(config)
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.parse().map_err(|_| AppError::invalid_config(key, raw))
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> AppResult<T> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
