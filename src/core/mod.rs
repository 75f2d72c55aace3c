//! Polling core of the setup view
//!
//! This package holds the UI-independent pieces:
//! - The accumulated table of seen access points
//! - The scan poller with its activate/deactivate lifecycle
//! - Cycle events and counters reported to observers

pub mod events;
pub mod poller;
pub mod table;

pub use events::{PollEvent, PollStats};
pub use poller::{PollerMonitor, ScanPoller};
pub use table::KnownAps;
