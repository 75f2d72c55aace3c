//! Device-facing API: the scan payload types and the HTTP client that
//! fetches them.

pub mod client;
pub mod types;

pub use client::{DeviceClient, ScanSource};
pub use types::{AccessPoint, ScanResponse};
