#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::sync::Semaphore;

use scanview::AccessPoint;

pub fn ap(ssid: &str, auth: &str, quality: f64) -> AccessPoint {
    AccessPoint::new(ssid, auth, quality)
}

/// Replays a queue of canned scan outcomes; an empty queue yields an empty scan.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<AccessPoint>, String>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<Vec<AccessPoint>, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl scanview::ScanSource for ScriptedSource {
    async fn scan(&self) -> Result<Vec<AccessPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().pop_front() {
            Some(Ok(aps)) => Ok(aps),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => Ok(Vec::new()),
        }
    }
}

/// Holds every scan until a permit is released, to simulate a slow device.
pub struct GatedSource {
    gate: Semaphore,
    result: Vec<AccessPoint>,
    calls: AtomicUsize,
}

impl GatedSource {
    pub fn new(result: Vec<AccessPoint>) -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl scanview::ScanSource for GatedSource {
    async fn scan(&self) -> Result<Vec<AccessPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|err| anyhow!("gate closed: {err}"))?;
        permit.forget();
        Ok(self.result.clone())
    }
}
