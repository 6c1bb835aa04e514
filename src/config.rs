//! Configuration loading.
//!
//! Settings are layered with the `config` crate, lowest priority first:
//!
//! 1. the embedded defaults below
//! 2. an optional TOML/JSON/YAML file (`--config`)
//! 3. environment variables prefixed with `RTC_MONITOR`, using `__` for
//!    nesting (e.g. `RTC_MONITOR_DATABASE__DATABASE_URL`)
//!
//! ```toml
//! log_level = "debug"
//!
//! [database]
//! database_url = "https://rtcmonitor-default-rtdb.asia-southeast1.firebasedatabase.app"
//! ```

use std::path::Path;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Connection settings for the realtime database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub project_id: String,
    pub auth_domain: String,
    /// Database secret or ID token; reads are unauthenticated when unset.
    pub auth_token: Option<String>,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "https://rtcmonitor-default-rtdb.asia-southeast1.firebasedatabase.app"
                .to_string(),
            project_id: "rtcmonitor".to_string(),
            auth_domain: "rtcmonitor.firebaseapp.com".to_string(),
            auth_token: None,
            connect_timeout_secs: 10,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub database: DatabaseConfig,
    /// Default log filter; `RUST_LOG` takes precedence.
    pub log_level: String,
    /// File replay polling interval in seconds.
    pub refresh_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            log_level: "info".to_string(),
            refresh_secs: 1,
        }
    }
}

impl MonitorConfig {
    /// Load settings from the embedded defaults, `path` and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("RTC_MONITOR").separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
