//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::latency::DEFAULT_MIN_LATENCY;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keys accepted by `reqtrack config set`
pub const VALID_KEYS: &[(&str, &str)] = &[
    ("server_url", "Base URL of the tracking backend"),
    ("min_latency_ms", "Minimum duration of mutating operations in milliseconds (0 disables)"),
    ("request_timeout_secs", "HTTP request timeout in seconds"),
    ("default_format", "Default output format (auto, table, json, csv, id)"),
    ("data_dir", "Directory holding the session and shown-notification files"),
];

/// reqtrack configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub server_url: Option<String>,

    /// Latency floor for create/update/delete/status/report operations
    pub min_latency_ms: Option<u64>,

    pub request_timeout_secs: Option<u64>,

    /// Default output format
    pub default_format: Option<String>,

    /// Where durable local state lives
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        Self::load_layers(Self::global_config_path().as_deref(), |key| {
            std::env::var(key).ok()
        })
    }

    /// Defaults, then the config file at `global`, then `env`
    pub fn load_layers(global: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(path) = global {
            if path.exists() {
                if let Ok(contents) = std::fs::read_to_string(path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        if let Some(server) = env("REQTRACK_SERVER") {
            config.server_url = Some(server);
        }
        if let Some(ms) = env("REQTRACK_MIN_LATENCY_MS").and_then(|v| v.trim().parse().ok()) {
            config.min_latency_ms = Some(ms);
        }
        if let Some(dir) = env("REQTRACK_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        config
    }

    /// Path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "reqtrack")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.server_url.is_some() {
            self.server_url = other.server_url;
        }
        if other.min_latency_ms.is_some() {
            self.min_latency_ms = other.min_latency_ms;
        }
        if other.request_timeout_secs.is_some() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
    }

    /// Backend URL without a trailing slash
    pub fn server_url(&self) -> String {
        self.server_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn min_latency(&self) -> Duration {
        self.min_latency_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MIN_LATENCY)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Directory for `session.json` and the shown-notification set
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "reqtrack")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".reqtrack"))
    }

    /// Value of `key` as it would be shown by `config show`
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "server_url" => self.server_url.clone(),
            "min_latency_ms" => self.min_latency_ms.map(|v| v.to_string()),
            "request_timeout_secs" => self.request_timeout_secs.map(|v| v.to_string()),
            "default_format" => self.default_format.clone(),
            "data_dir" => self.data_dir.as_ref().map(|p| p.display().to_string()),
            _ => None,
        }
    }
}

pub fn is_valid_key(key: &str) -> bool {
    VALID_KEYS.iter().any(|(k, _)| *k == key)
}
