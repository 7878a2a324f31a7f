//! Server configuration from environment variables

use lumina_foundation::{AppConfig, SafetyMode};
use std::path::PathBuf;

/// Environment-driven server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// SQLite database file backing quota and cache
    pub database_path: PathBuf,

    /// Upstream provider API key
    pub gemini_api_key: String,

    /// Base URL of the auth service; bearer credentials are rejected when unset
    pub auth_base_url: Option<String>,

    /// Orchestration policy settings
    pub app: AppConfig,
}

impl ServerConfig {
    /// Read configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut app = AppConfig::default();

        if let Some(limit) = env_parse::<u64>("LUMINA_DAILY_QUOTA_LIMIT") {
            app.daily_quota_limit = limit;
        }
        if let Ok(version) = std::env::var("LUMINA_CACHE_VERSION") {
            app.cache_version = version;
        }
        if let Ok(mode) = std::env::var("LUMINA_SAFETY_MODE") {
            app.safety_mode = match mode.to_lowercase().as_str() {
                "reject" => SafetyMode::Reject,
                _ => SafetyMode::Sanitize,
            };
        }

        Self {
            bind_addr: std::env::var("LUMINA_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_path: std::env::var("LUMINA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/lumina.db")),
            gemini_api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            auth_base_url: std::env::var("LUMINA_AUTH_URL").ok().filter(|s| !s.is_empty()),
            app,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.parse().ok())
}
