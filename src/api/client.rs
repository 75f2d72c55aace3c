use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::types::{AccessPoint, ScanResponse};
use crate::config::{normalize_base, ScanViewConfig};

/// Anything that can produce one round of scan results.
///
/// The poller only talks to this trait, so tests and alternative transports
/// can stand in for the device.
#[async_trait]
pub trait ScanSource: Send + Sync {
    /// Run one scan and return every access point it reported.
    async fn scan(&self) -> Result<Vec<AccessPoint>>;
}

/// Blocking HTTP client for the device REST API
#[derive(Clone)]
pub struct DeviceClient {
    base: Url,
    agent: ureq::Agent,
}

impl DeviceClient {
    pub fn new(config: &ScanViewConfig) -> Result<Self> {
        Self::with_base(&config.api_base, config.timeout())
    }

    pub fn with_base(api_base: &str, timeout: Duration) -> Result<Self> {
        let base = normalize_base(api_base)?;
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Ok(Self {
            base,
            agent: ureq::Agent::new_with_config(config),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn scan_url(&self) -> Result<Url> {
        self.endpoint("wifi/scan")
    }

    pub fn config_url(&self) -> Result<Url> {
        self.endpoint("config")
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| anyhow!("Failed to build URL for {path}: {err}"))
    }

    /// Fetch the scan list on the current thread.
    pub fn scan_blocking(&self) -> Result<Vec<AccessPoint>> {
        let url = self.scan_url()?;
        let response: ScanResponse = get_json(&self.agent, &url)?;
        log::debug!(
            "Scan at {url} returned {} access points",
            response.access_points.len()
        );
        Ok(response.access_points)
    }

    /// Fetch the device configuration object (sections keyed by name).
    pub fn fetch_config_blocking(&self) -> Result<Value> {
        let url = self.config_url()?;
        let config: Value = get_json(&self.agent, &url)?;
        if !config.is_object() {
            return Err(anyhow!("Device config at {url} is not a JSON object"));
        }
        Ok(config)
    }

    pub async fn fetch_config(&self) -> Result<Value> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.fetch_config_blocking())
            .await
            .map_err(|err| anyhow!("Config fetch task failed: {err}"))?
    }
}

#[async_trait]
impl ScanSource for DeviceClient {
    async fn scan(&self) -> Result<Vec<AccessPoint>> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.scan_blocking())
            .await
            .map_err(|err| anyhow!("Scan task failed: {err}"))?
    }
}

fn get_json<T: DeserializeOwned>(agent: &ureq::Agent, url: &Url) -> Result<T> {
    let mut response = agent
        .get(url.as_str())
        .call()
        .map_err(|err| anyhow!("Failed to GET {url}: {err}"))?;
    response
        .body_mut()
        .read_json::<T>()
        .map_err(|err| anyhow!("Invalid JSON from {url}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_resolve_against_base() {
        let client = DeviceClient::with_base("http://10.1.2.3:8080/api", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.scan_url().unwrap().as_str(),
            "http://10.1.2.3:8080/api/wifi/scan"
        );
        assert_eq!(
            client.config_url().unwrap().as_str(),
            "http://10.1.2.3:8080/api/config"
        );
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(DeviceClient::with_base("::nope::", Duration::from_secs(1)).is_err());
    }
}
