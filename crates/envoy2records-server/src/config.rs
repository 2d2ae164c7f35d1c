// Runtime configuration for the receiver binary
//
// Layered sources, lowest to highest priority:
// 1. Built-in defaults
// 2. TOML config file (explicit path, or ./envoy2records.toml when present)
// 3. ENVOY2RECORDS_* environment variables
// 4. CLI flags (applied by main)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "envoy2records.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the stream listener binds to.
    pub listen_addr: String,
    /// Tracing filter directive, e.g. "info" or "envoy2records=debug".
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:11800".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl ServerConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load from the default location when it exists, defaults otherwise.
    pub fn load_or_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(listen_addr) = get("ENVOY2RECORDS_LISTEN_ADDR") {
            self.listen_addr = listen_addr;
        }
        if let Some(log_level) = get("ENVOY2RECORDS_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(log_format) = get("ENVOY2RECORDS_LOG_FORMAT") {
            // Unrecognized values keep the configured format.
            match log_format.to_ascii_lowercase().as_str() {
                "text" => self.log_format = LogFormat::Text,
                "json" => self.log_format = LogFormat::Json,
                _ => {}
            }
        }
    }
}
