//! Page activation contract and a small router that drives it.
//!
//! A shell registers pages by name and calls [`PagesMap::navigate`] when the
//! user moves between views. Only one page is active at a time.

pub mod wifi_setup;

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;

pub use wifi_setup::{WifiSetupPage, WIFI_SETUP_PAGE};

/// Lifecycle hooks a view exposes to the router.
pub trait Page: Send {
    /// The page became visible.
    fn on_activate(&mut self) -> Result<()>;

    /// The page is being left. Must be safe to call when not active.
    fn on_deactivate(&mut self);

    /// Key of the device configuration section this page cares about.
    fn config_section(&self) -> &'static str;

    /// New configuration for [`Page::config_section`] is available.
    fn on_config_update(&mut self, section: &Value) -> Result<()>;
}

#[derive(Default)]
pub struct PagesMap {
    pages: HashMap<String, Box<dyn Page>>,
    current: Option<String>,
}

impl PagesMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `page` under `name`, replacing (and deactivating) any page
    /// previously registered with that name.
    pub fn register(&mut self, name: impl Into<String>, page: Box<dyn Page>) {
        let name = name.into();
        if let Some(mut old) = self.pages.insert(name.clone(), page) {
            old.on_deactivate();
            if self.current.as_deref() == Some(name.as_str()) {
                self.current = None;
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Deactivate the current page and activate `name`.
    ///
    /// Navigating to the page that is already current does nothing.
    pub fn navigate(&mut self, name: &str) -> Result<()> {
        if !self.pages.contains_key(name) {
            return Err(anyhow!("Unknown page '{name}'"));
        }
        if self.current.as_deref() == Some(name) {
            return Ok(());
        }
        self.leave();

        let page = self
            .pages
            .get_mut(name)
            .ok_or_else(|| anyhow!("Unknown page '{name}'"))?;
        page.on_activate()
            .map_err(|err| anyhow!("Failed to activate page '{name}': {err}"))?;
        log::debug!("Navigated to page '{name}'");
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Deactivate the current page, leaving none active.
    pub fn leave(&mut self) {
        if let Some(name) = self.current.take() {
            if let Some(page) = self.pages.get_mut(&name) {
                page.on_deactivate();
                log::debug!("Left page '{name}'");
            }
        }
    }

    /// Hand each page its section of a device configuration object.
    /// Pages whose section is missing are skipped; every page is tried even
    /// if an earlier one fails.
    pub fn apply_config(&mut self, config: &Value) -> Result<()> {
        let mut failures = Vec::new();
        for (name, page) in self.pages.iter_mut() {
            let Some(section) = config.get(page.config_section()) else {
                continue;
            };
            if let Err(err) = page.on_config_update(section) {
                log::warn!("Page '{name}' rejected config update: {err}");
                failures.push(name.clone());
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            failures.sort();
            Err(anyhow!("Config update failed for pages: {}", failures.join(", ")))
        }
    }
}

impl Drop for PagesMap {
    fn drop(&mut self) {
        self.leave();
    }
}
