//! Engine configuration.
//!
//! Loaded from JSON. Every key is optional; missing keys keep their defaults.

use crate::error::{FetchError, Result};
use crate::types::DeviceProfile;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PAGEFETCH_CONFIG";

const DEFAULT_DESKTOP_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
const DEFAULT_MOBILE_UA: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.7258.127 Mobile Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeout_ms: u64,
    pub timeout_max_retry_count: u32,
    pub desktop_user_agent: String,
    pub mobile_user_agent: String,
    pub referrer: String,
    pub proxy_host: String,
    pub proxy_port: Option<u16>,
    pub follow_redirects: bool,
    pub ignore_content_type: bool,
    pub url_prefix: String,
    pub protocol: String,
    pub port: String,
    pub cache_duplicates: bool,
    pub cache_log_duplicates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            timeout_max_retry_count: 2,
            desktop_user_agent: DEFAULT_DESKTOP_UA.into(),
            mobile_user_agent: DEFAULT_MOBILE_UA.into(),
            referrer: "http://www.google.com".into(),
            proxy_host: String::new(),
            proxy_port: None,
            follow_redirects: true,
            ignore_content_type: true,
            url_prefix: String::new(),
            protocol: "http".into(),
            port: String::new(),
            cache_duplicates: true,
            cache_log_duplicates: true,
        }
    }
}

impl Config {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| FetchError::Config(format!("invalid config json: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            FetchError::Config(format!("could not read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Load from `$PAGEFETCH_CONFIG`, else `config.json` in the platform
    /// config dir, else defaults.
    pub fn discover() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "pagefetch", "pagefetch")
            .map(|proj| proj.config_dir().join("config.json"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn user_agent(&self, device: DeviceProfile) -> &str {
        match device {
            DeviceProfile::Desktop => &self.desktop_user_agent,
            DeviceProfile::Mobile => &self.mobile_user_agent,
        }
    }

    /// Proxy address, only when both host and port are set.
    pub fn proxy(&self) -> Option<(&str, u16)> {
        match (self.proxy_host.trim(), self.proxy_port) {
            ("", _) | (_, None) => None,
            (host, Some(port)) => Some((host, port)),
        }
    }

    pub fn with_cache_duplicates(mut self, enabled: bool) -> Self {
        self.cache_duplicates = enabled;
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }
}
