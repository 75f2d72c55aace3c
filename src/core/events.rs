use chrono::{DateTime, Local};
use serde::Serialize;

/// Outcome of one poll cycle, broadcast to subscribers after the table and
/// the render target have been updated.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Scan merged and the table re-rendered.
    Rendered {
        cycle: u64,
        networks: usize,
        added: usize,
    },
    /// Scan failed; table left as it was, next scan still scheduled.
    Failed { cycle: u64, error: String },
    /// A response arrived for an activation that has since ended.
    Discarded { generation: u64 },
}

/// Running counters for the active poller. A non-zero
/// `consecutive_failures` means the view is showing stale data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollStats {
    pub cycles: u64,
    pub successes: u64,
    pub failures: u64,
    pub consecutive_failures: u32,
    pub render_failures: u64,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Local>>,
}

impl PollStats {
    pub fn is_degraded(&self) -> bool {
        self.consecutive_failures > 0
    }

    pub(crate) fn record_success(&mut self) {
        self.successes += 1;
        self.consecutive_failures = 0;
        self.last_error = None;
        self.last_success = Some(Local::now());
    }

    pub(crate) fn record_failure(&mut self, error: String) {
        self.failures += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error);
    }
}
