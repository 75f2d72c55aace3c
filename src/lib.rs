//! Scanview — live WiFi network table for device setup
//!
//! This crate implements the "setup wifi" view of a device web UI: while the
//! view is active it polls the device's `wifi/scan` endpoint, merges every
//! reported access point into a table keyed by SSID and renders that table
//! as HTML rows with a "Connect" button per network.
//!
//! The poller talks to the device through the [`api::ScanSource`] trait and
//! draws through [`render::RenderTarget`], so both can be swapped out. The
//! [`pages`] module provides the activation contract a page router uses to
//! start and stop it.

pub mod api;
#[doc(hidden)]
pub mod boot;
#[doc(hidden)]
pub mod cli;
pub mod config;
pub mod core;
pub mod pages;
pub mod render;
pub mod serve;

pub use api::{AccessPoint, DeviceClient, ScanResponse, ScanSource};
pub use config::ScanViewConfig;
pub use crate::core::{KnownAps, PollEvent, PollStats, PollerMonitor, ScanPoller};
pub use pages::{Page, PagesMap, WifiSetupPage};
