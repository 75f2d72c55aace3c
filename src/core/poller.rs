use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};

use super::{
    events::{PollEvent, PollStats},
    table::KnownAps,
};
use crate::{
    api::{client::ScanSource, types::AccessPoint},
    config::ScanViewConfig,
    render::{placeholder_row, render_table_body, RenderTarget},
};

/// State shared between the poller handle and its running loop.
#[derive(Default)]
struct PollerShared {
    known: KnownAps,
    active: bool,
    /// Bumped on every activate/deactivate; a loop only applies results
    /// while its own generation is current.
    generation: u64,
    stats: PollStats,
    subscribers: Vec<flume::Sender<PollEvent>>,
}

impl PollerShared {
    fn notify(&mut self, event: PollEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Cloneable read access to a poller's table, counters and events.
#[derive(Clone)]
pub struct PollerMonitor {
    shared: Arc<Mutex<PollerShared>>,
}

impl PollerMonitor {
    pub fn is_active(&self) -> bool {
        self.shared.lock().active
    }

    pub fn known(&self) -> KnownAps {
        self.shared.lock().known.clone()
    }

    pub fn stats(&self) -> PollStats {
        self.shared.lock().stats.clone()
    }

    pub fn subscribe(&self) -> flume::Receiver<PollEvent> {
        let (tx, rx) = flume::unbounded();
        self.shared.lock().subscribers.push(tx);
        rx
    }
}

/// Periodically scans for access points and keeps a rendered table current.
///
/// The next scan is scheduled `interval` after the previous cycle finished,
/// so the real period is request latency plus `interval`. Failed scans are
/// logged and retried on the same cadence.
pub struct ScanPoller {
    source: Arc<dyn ScanSource>,
    target: Arc<dyn RenderTarget>,
    interval: Duration,
    shared: Arc<Mutex<PollerShared>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ScanPoller {
    pub fn new(
        source: Arc<dyn ScanSource>,
        target: Arc<dyn RenderTarget>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            target,
            interval,
            shared: Arc::new(Mutex::new(PollerShared::default())),
            task: None,
        }
    }

    pub fn from_config(
        config: &ScanViewConfig,
        source: Arc<dyn ScanSource>,
        target: Arc<dyn RenderTarget>,
    ) -> Self {
        Self::new(source, target, config.interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True while a poll loop is running. A loop that died (a panicking
    /// source) no longer counts.
    pub fn is_active(&self) -> bool {
        self.shared.lock().active && self.loop_running()
    }

    fn loop_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Snapshot of every network seen so far.
    pub fn known(&self) -> KnownAps {
        self.monitor().known()
    }

    pub fn stats(&self) -> PollStats {
        self.monitor().stats()
    }

    /// Receive a [`PollEvent`] after every cycle. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> flume::Receiver<PollEvent> {
        self.monitor().subscribe()
    }

    /// Read-only view of this poller that can outlive a borrow of it.
    pub fn monitor(&self) -> PollerMonitor {
        PollerMonitor {
            shared: self.shared.clone(),
        }
    }

    /// Show the placeholder row and start polling with an immediate scan.
    ///
    /// Does nothing if already active. Must be called from within a tokio
    /// runtime.
    pub fn activate(&mut self) -> Result<()> {
        if self.is_active() {
            log::debug!("WiFi scan poller already active");
            return Ok(());
        }
        if self.shared.lock().active {
            log::warn!("WiFi scan loop exited unexpectedly; restarting");
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| anyhow!("WiFi scan poller needs a tokio runtime: {err}"))?;

        let generation = {
            let mut shared = self.shared.lock();
            shared.active = true;
            shared.generation += 1;
            shared.generation
        };

        if let Err(err) = self.target.replace(&placeholder_row()) {
            log::warn!("Failed to render scanning placeholder: {err}");
        }

        let poll_loop = PollLoop {
            source: self.source.clone(),
            target: self.target.clone(),
            shared: self.shared.clone(),
            interval: self.interval,
            generation,
        };
        self.task = Some(runtime.spawn(poll_loop.run()));
        log::info!(
            "WiFi scan polling started (generation {generation}, every {:?})",
            self.interval
        );
        Ok(())
    }

    /// Stop polling. Cancels the pending timer and stops waiting on any
    /// request in flight; a request already running on the blocking pool
    /// finishes (or times out) on its own and its result is dropped.
    /// The known-networks table is kept for the next activation.
    pub fn deactivate(&mut self) {
        let was_active = {
            let mut shared = self.shared.lock();
            let was_active = shared.active;
            shared.active = false;
            shared.generation += 1;
            was_active
        };
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if was_active {
            log::info!("WiFi scan polling stopped");
        }
    }
}

impl Drop for ScanPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct PollLoop {
    source: Arc<dyn ScanSource>,
    target: Arc<dyn RenderTarget>,
    shared: Arc<Mutex<PollerShared>>,
    interval: Duration,
    generation: u64,
}

/// What merging one scan result produced.
enum Merge {
    /// The activation this loop belongs to has ended.
    Stale,
    /// The scan failed; already recorded and reported.
    Failed,
    /// The table changed; `body` still has to reach the render target.
    Merged {
        cycle: u64,
        added: usize,
        body: String,
    },
}

impl PollLoop {
    async fn run(self) {
        loop {
            let outcome = self.source.scan().await;
            if !self.finish_cycle(outcome).await {
                return;
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Merge, render and report one scan result. Returns false once this
    /// loop's activation is over.
    async fn finish_cycle(&self, outcome: Result<Vec<AccessPoint>>) -> bool {
        let (cycle, added, body) = match self.merge(outcome) {
            Merge::Stale => return false,
            Merge::Failed => return true,
            Merge::Merged { cycle, added, body } => (cycle, added, body),
        };

        // The state lock is not held while the target does its I/O.
        let rendered = self.render(body).await;

        let mut shared = self.shared.lock();
        if let Err(err) = rendered {
            log::warn!("Failed to render WiFi networks: {err}");
            shared.stats.render_failures += 1;
        }
        shared.stats.record_success();
        let networks = shared.known.len();
        log::debug!("Scan cycle {cycle}: {networks} networks known ({added} new)");
        shared.notify(PollEvent::Rendered {
            cycle,
            networks,
            added,
        });
        true
    }

    /// Generation check, table merge and body rendering under the state lock.
    fn merge(&self, outcome: Result<Vec<AccessPoint>>) -> Merge {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;

        if !shared.active || shared.generation != self.generation {
            log::debug!(
                "Dropping scan result from ended activation (generation {})",
                self.generation
            );
            shared.notify(PollEvent::Discarded {
                generation: self.generation,
            });
            return Merge::Stale;
        }

        shared.stats.cycles += 1;
        let cycle = shared.stats.cycles;

        match outcome {
            Ok(access_points) => {
                let added = shared.known.upsert_all(access_points);
                Merge::Merged {
                    cycle,
                    added,
                    body: render_table_body(&shared.known),
                }
            }
            Err(err) => {
                let error = format!("{err:#}");
                log::warn!(
                    "WiFi scan cycle {cycle} failed: {error}; retrying in {:?}",
                    self.interval
                );
                shared.stats.record_failure(error.clone());
                shared.notify(PollEvent::Failed { cycle, error });
                Merge::Failed
            }
        }
    }

    async fn render(&self, body: String) -> Result<()> {
        if !self.target.blocks() {
            return self.target.replace(&body);
        }
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || target.replace(&body))
            .await
            .map_err(|err| anyhow!("Render task failed: {err}"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SharedTarget;
    use async_trait::async_trait;

    struct Fixed(Vec<AccessPoint>);

    #[async_trait]
    impl ScanSource for Fixed {
        async fn scan(&self) -> Result<Vec<AccessPoint>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_activate_outside_runtime_fails_cleanly() {
        let target = SharedTarget::new();
        let mut poller = ScanPoller::new(
            Arc::new(Fixed(Vec::new())),
            Arc::new(target.clone()),
            Duration::from_secs(5),
        );
        assert!(poller.activate().is_err());
        assert!(!poller.is_active());
        assert_eq!(target.renders(), 0);
    }

    #[test]
    fn test_deactivate_when_idle_is_a_no_op() {
        let mut poller = ScanPoller::new(
            Arc::new(Fixed(Vec::new())),
            Arc::new(SharedTarget::new()),
            Duration::from_secs(5),
        );
        poller.deactivate();
        poller.deactivate();
        assert!(!poller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_renders_rows() {
        let target = SharedTarget::new();
        let mut poller = ScanPoller::new(
            Arc::new(Fixed(vec![AccessPoint::new("A", "WPA2", 80.0)])),
            Arc::new(target.clone()),
            Duration::from_secs(5),
        );
        let events = poller.subscribe();
        poller.activate().unwrap();

        let event = events.recv_async().await.unwrap();
        assert_eq!(
            event,
            PollEvent::Rendered {
                cycle: 1,
                networks: 1,
                added: 1
            }
        );
        assert!(target.body().contains("data-ssid=\"A\""));
        assert_eq!(target.renders(), 2);
        poller.deactivate();
    }

    struct Failing;

    impl RenderTarget for Failing {
        fn replace(&self, _table_body: &str) -> Result<()> {
            Err(anyhow!("disk full"))
        }

        fn blocks(&self) -> bool {
            false
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_failures_are_counted_and_polling_continues() {
        let mut poller = ScanPoller::new(
            Arc::new(Fixed(vec![AccessPoint::new("A", "WPA2", 80.0)])),
            Arc::new(Failing),
            Duration::from_secs(5),
        );
        let events = poller.subscribe();
        poller.activate().unwrap();

        for expected in 1..=2 {
            match events.recv_async().await.unwrap() {
                PollEvent::Rendered { cycle, .. } => assert_eq!(cycle, expected),
                other => panic!("expected a rendered cycle, got {other:?}"),
            }
        }
        let stats = poller.stats();
        assert_eq!(stats.render_failures, 2);
        assert_eq!(stats.successes, 2);
        assert!(poller.is_active());
        poller.deactivate();
    }

    #[tokio::test]
    async fn test_result_from_ended_generation_is_discarded() {
        let target = SharedTarget::new();
        let shared = Arc::new(Mutex::new(PollerShared::default()));
        let events = {
            let mut state = shared.lock();
            state.active = true;
            state.generation = 2;
            state.known.upsert(AccessPoint::new("kept", "WPA2", 50.0));
            let (tx, rx) = flume::unbounded();
            state.subscribers.push(tx);
            rx
        };
        let stale = PollLoop {
            source: Arc::new(Fixed(Vec::new())),
            target: Arc::new(target.clone()),
            shared: shared.clone(),
            interval: Duration::from_secs(5),
            generation: 1,
        };

        let keep_going = stale
            .finish_cycle(Ok(vec![AccessPoint::new("late", "Open", 10.0)]))
            .await;

        assert!(!keep_going);
        let state = shared.lock();
        assert_eq!(state.known.ssids(), vec!["kept".to_string()]);
        assert_eq!(state.stats.cycles, 0);
        assert_eq!(target.renders(), 0);
        assert_eq!(
            events.try_recv().unwrap(),
            PollEvent::Discarded { generation: 1 }
        );
    }

    /// Panics on the first scan, then returns one network.
    struct PanicsOnce(std::sync::atomic::AtomicBool);

    #[async_trait]
    impl ScanSource for PanicsOnce {
        async fn scan(&self) -> Result<Vec<AccessPoint>> {
            if !self.0.swap(true, std::sync::atomic::Ordering::SeqCst) {
                panic!("scan source blew up");
            }
            Ok(vec![AccessPoint::new("back", "WPA2", 60.0)])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_restarts_after_loop_panic() {
        let target = SharedTarget::new();
        let mut poller = ScanPoller::new(
            Arc::new(PanicsOnce(Default::default())),
            Arc::new(target.clone()),
            Duration::from_secs(5),
        );
        let events = poller.subscribe();
        poller.activate().unwrap();

        while !poller.task.as_ref().unwrap().is_finished() {
            tokio::task::yield_now().await;
        }
        assert!(!poller.is_active());

        poller.activate().unwrap();
        assert!(matches!(
            events.recv_async().await.unwrap(),
            PollEvent::Rendered { cycle: 1, .. }
        ));
        assert!(poller.is_active());
        assert!(target.body().contains("data-ssid=\"back\""));
        poller.deactivate();
    }
}
