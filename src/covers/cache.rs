//! Remembers which cover path worked for each book.
//!
//! Entries are advisory: dropping any of them only costs a re-probe.
//! Concurrent misses for the same book share one probe through the
//! in-flight map; the map lock is held only around map access, never
//! across the network call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::config::CacheConfig;
use crate::covers::error::CoverError;
use crate::covers::resolver::CoverImage;

type ProbeOutcome = Result<CoverImage, CoverError>;
type Inflight = Arc<Mutex<HashMap<String, (u64, watch::Receiver<Option<ProbeOutcome>>)>>>;

/// Outcome of a coalesced probe and the client generation that produced it.
///
/// A caller that joined a running probe may hold a newer client than the
/// one the probe used, so failures must be attributed to `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledProbe {
    pub outcome: ProbeOutcome,
    pub generation: u64,
}

/// Last known good candidate for a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPathEntry {
    pub candidate: usize,
    pub last_success: SystemTime,
    pub failures: u32,
    last_used: u64,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, ResolvedPathEntry>,
    clock: u64,
}

impl Entries {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

pub struct ResolutionCache {
    entries: Mutex<Entries>,
    inflight: Inflight,
    failure_threshold: u32,
    capacity: Option<usize>,
}

impl ResolutionCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            failure_threshold: config.failure_threshold.max(1),
            capacity: config.capacity,
        }
    }

    /// Cached candidate index for `book_id`, if any.
    pub fn get(&self, book_id: &str) -> Option<usize> {
        let mut entries = self.entries.lock();
        let now = entries.tick();
        let threshold = self.failure_threshold;
        entries
            .map
            .get_mut(book_id)
            .filter(|entry| entry.failures < threshold)
            .map(|entry| {
                entry.last_used = now;
                entry.candidate
            })
    }

    /// Snapshot of the entry for `book_id`.
    pub fn entry(&self, book_id: &str) -> Option<ResolvedPathEntry> {
        self.entries.lock().map.get(book_id).cloned()
    }

    pub fn record_success(&self, book_id: &str, candidate: usize) {
        let mut entries = self.entries.lock();
        let now = entries.tick();
        let is_new = !entries.map.contains_key(book_id);

        if is_new {
            if let Some(capacity) = self.capacity {
                while entries.map.len() >= capacity {
                    let Some(oldest) = entries
                        .map
                        .iter()
                        .min_by_key(|(_, entry)| entry.last_used)
                        .map(|(key, _)| key.clone())
                    else {
                        break;
                    };
                    entries.map.remove(&oldest);
                    tracing::debug!(book_id = %oldest, "Evicted least recently used cover path");
                }
            }
        }

        entries.map.insert(
            book_id.to_string(),
            ResolvedPathEntry {
                candidate,
                last_success: SystemTime::now(),
                failures: 0,
                last_used: now,
            },
        );
    }

    /// Count a failed fetch. Evicts the entry once the threshold is reached.
    pub fn record_failure(&self, book_id: &str) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.map.get_mut(book_id) else {
            return;
        };

        entry.failures += 1;
        if entry.failures >= self.failure_threshold {
            let failures = entry.failures;
            entries.map.remove(book_id);
            tracing::info!(book_id = %book_id, failures, "Dropped cached cover path after repeated failures");
        }
    }

    pub fn clear(&self, book_id: &str) -> bool {
        self.entries.lock().map.remove(book_id).is_some()
    }

    pub fn clear_all(&self) {
        self.entries.lock().map.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of probes currently running.
    pub fn inflight(&self) -> usize {
        self.inflight.lock().len()
    }

    /// Run `probe` for `book_id` on a client of `generation`, or join the
    /// probe already running for that book.
    ///
    /// The probe runs on its own task, so it finishes even if every caller
    /// waiting on it goes away. All waiters receive a clone of its outcome,
    /// tagged with the generation of whoever started it.
    pub async fn coalesce<F>(&self, book_id: &str, generation: u64, probe: F) -> SettledProbe
    where
        F: Future<Output = ProbeOutcome> + Send + 'static,
    {
        let (generation, mut rx) = {
            let mut inflight = self.inflight.lock();
            match inflight.get(book_id) {
                Some((running, rx)) => {
                    tracing::debug!(
                        book_id = %book_id,
                        generation = *running,
                        "Joining in-flight cover probe"
                    );
                    (*running, rx.clone())
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(book_id.to_string(), (generation, rx.clone()));
                    let slot = InflightSlot {
                        map: Arc::clone(&self.inflight),
                        key: book_id.to_string(),
                        tx,
                        released: false,
                    };
                    tokio::spawn(async move {
                        let outcome = probe.await;
                        slot.settle(outcome);
                    });
                    (generation, rx)
                }
            }
        };

        let settled = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => Option::clone(&outcome),
            Err(_) => None,
        };
        let outcome = settled.unwrap_or_else(|| {
            Err(CoverError::Internal(format!(
                "cover probe for '{}' ended without a result",
                book_id
            )))
        });
        SettledProbe {
            outcome,
            generation,
        }
    }
}

/// Owns a probe's map entry and result channel.
///
/// The entry is removed before the result is published, and also when the
/// probe task unwinds, so a key is never left pointing at a dead channel.
struct InflightSlot {
    map: Inflight,
    key: String,
    tx: watch::Sender<Option<ProbeOutcome>>,
    released: bool,
}

impl InflightSlot {
    fn settle(mut self, outcome: ProbeOutcome) {
        self.release();
        let _ = self.tx.send(Some(outcome));
    }

    fn release(&mut self) {
        if !self.released {
            self.map.lock().remove(&self.key);
            self.released = true;
        }
    }
}

impl Drop for InflightSlot {
    fn drop(&mut self) {
        self.release();
    }
}
