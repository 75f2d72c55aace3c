use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Address the device answers on while it runs its own access point.
pub const DEFAULT_API_BASE: &str = "http://192.168.168.1/";

/// Runtime settings for the setup view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanViewConfig {
    /// Base URL of the device REST API; `wifi/scan` is resolved against it
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Delay between the end of one scan cycle and the start of the next
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Per-request timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_timeout_ms() -> u64 {
    3000
}

impl Default for ScanViewConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ScanViewConfig {
    /// Parse configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Read configuration from a file
    pub fn from_file(file_path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(file_path)
            .map_err(|err| anyhow!("Failed to read config file {file_path}: {err}"))?;
        Self::from_json(&content).map_err(|err| anyhow!("Invalid config file {file_path}: {err}"))
    }

    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse `api_base`, appending a trailing slash so relative joins keep
    /// the full path (`http://dev/api` + `wifi/scan` -> `http://dev/api/wifi/scan`).
    pub fn api_base_url(&self) -> Result<Url> {
        normalize_base(&self.api_base)
    }
}

pub(crate) fn normalize_base(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|err| anyhow!("Invalid API base '{raw}': {err}"))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("API base '{raw}' cannot be used as a base URL"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
