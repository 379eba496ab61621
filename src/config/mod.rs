// src/config/mod.rs
// Process configuration, loaded from .env and the environment once at startup

use once_cell::sync::Lazy;
use std::str::FromStr;
use std::time::Duration;

/// Fixed search path of the geocoding API
pub const GEOCODE_SEARCH_PATH: &str = "/search";

#[derive(Debug, Clone)]
pub struct FareConfig {
    // ── Server Configuration
    pub host: String,
    pub port: u16,
    pub secret_key: String,

    // ── Geocoding Configuration
    pub geocode_api_key: String,
    pub geocode_base_url: String,
    pub geocode_timeout: u64,

    // ── Model Configuration
    pub models_dir: String,

    // ── Session Configuration
    pub session_stale_timeout: u64,
    pub session_sweep_interval: u64,

    // ── Logging Configuration
    pub log_level: String,
}

// Handles values with trailing comments and extra whitespace.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl FareConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        Self {
            host: env_var_or("HOST", "0.0.0.0".to_string()),
            port: env_var_or("PORT", 8080),
            secret_key: env_var_or("SECRET_KEY", String::new()),
            geocode_api_key: env_var_or("GEOCODE_API_KEY", String::new()),
            geocode_base_url: env_var_or("GEOCODE_BASE_URL", "https://geocode.maps.co".to_string()),
            geocode_timeout: env_var_or("GEOCODE_TIMEOUT", 10),
            models_dir: env_var_or("MODELS_DIR", "./models".to_string()),
            session_stale_timeout: env_var_or("SESSION_STALE_TIMEOUT", 60),
            session_sweep_interval: env_var_or("SESSION_SWEEP_INTERVAL", 300),
            log_level: env_var_or("LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full URL of the geocoding search endpoint
    pub fn geocode_search_url(&self) -> String {
        format!(
            "{}{}",
            self.geocode_base_url.trim_end_matches('/'),
            GEOCODE_SEARCH_PATH
        )
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout)
    }

    /// Idle time after which a conversation may be evicted
    pub fn session_stale_timeout(&self) -> Duration {
        Duration::from_secs(self.session_stale_timeout * 60)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval.max(1))
    }

    /// Webhook secret, if one is configured
    pub fn webhook_secret(&self) -> Option<&str> {
        let secret = self.secret_key.trim();
        (!secret.is_empty()).then_some(secret)
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<FareConfig> = Lazy::new(FareConfig::from_env);
