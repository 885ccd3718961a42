//! Shared test doubles for pipeline scenarios.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use relationship_loader::config::IngestConfig;
use relationship_loader::{EdgeRecord, LoaderError, LoaderResult, RelationshipStore};

/// Store double that records every batch it is asked to write.
///
/// Supports per-call artificial delays, a scripted failure on one call, and
/// a gauge of the maximum number of concurrent writers observed.
pub struct RecordingStore {
    written: Mutex<Vec<Vec<EdgeRecord>>>,
    delays: Mutex<VecDeque<Duration>>,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            written: Mutex::new(Vec::new()),
            delays: Mutex::new(VecDeque::new()),
            fail_on_call: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue artificial per-call delays, consumed one per write.
    pub fn delays(self, delays: Vec<Duration>) -> Self {
        *self.delays.lock().unwrap() = delays.into();
        self
    }

    /// Fail the n-th write call (zero-based) instead of recording it.
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Batches recorded so far, in completion order.
    pub fn written(&self) -> Vec<Vec<EdgeRecord>> {
        self.written.lock().unwrap().clone()
    }

    /// Total write calls observed, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Write calls currently in flight.
    pub fn in_flight_now(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent write calls observed.
    pub fn max_in_flight_seen(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationshipStore for RecordingStore {
    async fn write_edges(&self, edges: &[EdgeRecord]) -> LoaderResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.fail_on_call == Some(call) {
            Err(LoaderError::WriteRejected {
                code: "Internal".to_string(),
                message: "injected failure".to_string(),
            })
        } else {
            self.written.lock().unwrap().push(edges.to_vec());
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn edge(source_id: &str, target_id: &str) -> EdgeRecord {
    EdgeRecord {
        source_id: source_id.to_string(),
        target_id: target_id.to_string(),
    }
}

pub fn ingest_config(batch_size: usize) -> IngestConfig {
    IngestConfig {
        batch_size,
        ..Default::default()
    }
}
