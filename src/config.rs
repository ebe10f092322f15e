use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: String,
    pub db_busy_timeout_ms: u64,

    // Locales
    pub site_locale: String,

    // Cache
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub cache_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let site_locale = std::env::var("SITE_LOCALE").unwrap_or_else(|_| "en-US".to_string());
        if site_locale.trim().is_empty() {
            bail!("SITE_LOCALE must not be empty");
        }

        Ok(Self {
            // Storage
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "translations.db".to_string()),
            db_busy_timeout_ms: std::env::var("DB_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),

            // Locales
            site_locale,

            // Cache
            cache_enabled: std::env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),
            cache_ttl_secs: std::env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            cache_prefix: std::env::var("CACHE_PREFIX")
                .unwrap_or_else(|_| "translations".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "translations.db".to_string(),
            db_busy_timeout_ms: 5000,
            site_locale: "en-US".to_string(),
            cache_enabled: true,
            cache_ttl_secs: 300,
            cache_prefix: "translations".to_string(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
