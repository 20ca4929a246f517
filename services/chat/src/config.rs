//! Service settings
//!
//! Loaded with the `config` crate from built-in defaults overlaid with
//! `CHAT_*` environment variables, e.g. `CHAT_PORT=8080` or
//! `CHAT_PUBLIC_BASE_URL=https://chat.example.com`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Which storage backend the service runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Chat service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Storage backend
    pub storage: StorageBackend,
    /// Fixed origin for absolute media URLs; derived from the request when unset
    pub public_base_url: Option<String>,
    /// Path prefix stored media is served under
    pub media_url: String,
    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            storage: StorageBackend::Postgres,
            public_base_url: None,
            media_url: "/".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from defaults and `CHAT_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("storage", "postgres")?
            .set_default("media_url", defaults.media_url)?
            .set_default("log_level", defaults.log_level)?
            .add_source(
                Environment::with_prefix("CHAT")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "CHAT_PORT",
        "CHAT_STORAGE",
        "CHAT_PUBLIC_BASE_URL",
        "CHAT_MEDIA_URL",
        "CHAT_LOG_LEVEL",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_settings_defaults() {
        clear_env();

        let settings = Settings::load().unwrap();
        assert_eq!(settings.bind_address(), "0.0.0.0:3002");
        assert_eq!(settings.storage, StorageBackend::Postgres);
        assert_eq!(settings.public_base_url, None);
        assert_eq!(settings.media_url, "/");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    #[serial]
    fn test_settings_from_env() {
        clear_env();
        unsafe {
            std::env::set_var("CHAT_PORT", "8080");
            std::env::set_var("CHAT_STORAGE", "memory");
            std::env::set_var("CHAT_PUBLIC_BASE_URL", "https://chat.example.com");
            std::env::set_var("CHAT_MEDIA_URL", "/media/");
        }

        let settings = Settings::load().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.storage, StorageBackend::Memory);
        assert_eq!(
            settings.public_base_url.as_deref(),
            Some("https://chat.example.com")
        );
        assert_eq!(settings.media_url, "/media/");

        clear_env();
    }
}
