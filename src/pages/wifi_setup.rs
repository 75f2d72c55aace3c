use anyhow::Result;
use serde_json::Value;

use super::Page;
use crate::core::poller::ScanPoller;

/// Router name of the WiFi setup view.
pub const WIFI_SETUP_PAGE: &str = "setup_wifi";

/// The "setup wifi" view: scanning runs only while the page is shown.
pub struct WifiSetupPage {
    poller: ScanPoller,
}

impl WifiSetupPage {
    pub fn new(poller: ScanPoller) -> Self {
        Self { poller }
    }

    pub fn poller(&self) -> &ScanPoller {
        &self.poller
    }
}

impl Page for WifiSetupPage {
    fn on_activate(&mut self) -> Result<()> {
        self.poller.activate()
    }

    fn on_deactivate(&mut self) {
        self.poller.deactivate();
    }

    fn config_section(&self) -> &'static str {
        "wifi"
    }

    fn on_config_update(&mut self, section: &Value) -> Result<()> {
        // Nothing in the wifi section changes how scanning works.
        log::debug!("Ignoring wifi config update: {section}");
        Ok(())
    }
}
