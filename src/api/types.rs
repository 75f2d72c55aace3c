use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single network reported by the device scan.
///
/// Fields other than `ssid`, `auth` and `quality` are kept in `extra` and
/// written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPoint {
    pub ssid: String,
    pub auth: String,
    pub quality: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessPoint {
    pub fn new(ssid: impl Into<String>, auth: impl Into<String>, quality: f64) -> Self {
        Self {
            ssid: ssid.into(),
            auth: auth.into(),
            quality,
            extra: Map::new(),
        }
    }
}

/// Body of `GET <api-base>wifi/scan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    #[serde(rename = "access-points")]
    pub access_points: Vec<AccessPoint>,
}

impl ScanResponse {
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}
