use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `upstream.api_version`.
pub const API_VERSION_ENV: &str = "GHL_API_VERSION";
/// Environment variable that overrides `upstream.base_url`.
pub const API_BASE_ENV: &str = "GHL_API_BASE";

pub const DEFAULT_API_BASE: &str = "https://services.leadconnectorhq.com";
pub const DEFAULT_API_VERSION: &str = "2021-07-28";

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/crm-metrics/config.toml),
    /// falling back to defaults if the file doesn't exist. Environment
    /// overrides are applied afterwards.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        let config = if path.exists() {
            Self::read_file(&path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Load configuration from a specific path, then apply environment overrides.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::read_file(path)?.with_env_overrides())
    }

    fn read_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write current configuration to the given path.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crm-metrics")
            .join("config.toml")
    }

    /// Apply `GHL_API_VERSION` / `GHL_API_BASE` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using an arbitrary lookup. Empty values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(version) = lookup(API_VERSION_ENV).filter(|v| !v.is_empty()) {
            self.upstream.api_version = version;
        }
        if let Some(base) = lookup(API_BASE_ENV).filter(|v| !v.is_empty()) {
            self.upstream.base_url = base;
        }
        self
    }
}

/// Upstream CRM API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL every API path is appended to.
    pub base_url: String,
    /// Value sent in the `Version` header on every request.
    pub api_version: String,
    /// Per-request timeout in seconds. None leaves the transport default.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.into(),
            api_version: DEFAULT_API_VERSION.into(),
            timeout_secs: None,
            user_agent: concat!("crm-metrics/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Emit permissive CORS headers and answer OPTIONS.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            cors: true,
        }
    }
}
