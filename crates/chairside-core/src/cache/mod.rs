//! Remote resource cache
//!
//! A process-wide, key-addressed cache of asynchronously fetched backend
//! entities, with explicit invalidation on write.
//!
//! ## Contract
//!
//! - **One entry per key**: entries are created on first read and transition
//!   status in place. There is no TTL and no eviction; an entry only changes
//!   through a fetch it owns or through explicit invalidation.
//! - **Request deduplication**: concurrent readers of the same key share one
//!   in-flight request. The request runs on a detached task, so a reader
//!   that goes away mid-flight never cancels the fetch for everyone else.
//! - **Invalidation**: marking a key stale reaches every entry whose key
//!   equals or is prefixed by the invalidated key, and nothing else. Stale
//!   keys with live subscribers refetch in the background immediately;
//!   unsubscribed keys refetch on their next read.
//! - **Errors are state**: a failed fetch leaves the entry in `Error` with
//!   the error retained, so the UI can display it and offer a manual retry.
//!   The cache itself never retries.

pub mod mutation;
pub mod query;
pub mod types;

#[cfg(test)]
mod tests;

pub use mutation::ResourceMutation;
pub use query::{ResourceFetcher, ResourceQuery, from_fn};
pub use types::{CacheEntry, CacheKey, ResourceState, ResourceStatus, Segment};

use crate::error::ChairsideError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

type FetchOutcome = Result<serde_json::Value, ChairsideError>;

/// Per-key subscription record, kept while at least one query handle is
/// registered for the key.
struct Subscription {
    fetcher: Arc<dyn ResourceFetcher>,
    handles: usize,
    revision: watch::Sender<u64>,
}

impl Subscription {
    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

#[derive(Default)]
struct Shared {
    entries: HashMap<CacheKey, CacheEntry>,
    inflight: HashMap<CacheKey, broadcast::Sender<FetchOutcome>>,
    subscriptions: HashMap<CacheKey, Subscription>,
}

/// Handle to the shared cache state.
///
/// Cloning is cheap and every clone observes the same entries, like a
/// `reqwest::Client`. All state lives behind one mutex and critical
/// sections never await, so entry transitions are atomic: no reader ever
/// observes a partially updated entry.
#[derive(Clone, Default)]
pub struct ResourceCache {
    shared: Arc<Mutex<Shared>>,
}

impl ResourceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entry for a key, if one exists
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.shared.lock().entries.get(key).cloned()
    }

    /// Number of entries currently in the table
    pub fn len(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Whether the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the value for `key`, reusing cached or in-flight work.
    ///
    /// - A fresh entry is returned without touching the network.
    /// - An entry in error state returns its retained error without a new
    ///   request; retry happens through [`ResourceCache::refresh`].
    /// - A missing, stale, or pending entry resolves through a single
    ///   shared request per key.
    pub async fn ensure(
        &self,
        key: &CacheKey,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> FetchOutcome {
        let rx = {
            let mut shared = self.shared.lock();
            if let Some(entry) = shared.entries.get(key) {
                if entry.is_fresh() {
                    if let Some(data) = &entry.data {
                        return Ok(data.clone());
                    }
                }
                if entry.status == ResourceStatus::Error && !entry.stale {
                    if let Some(error) = &entry.error {
                        return Err(error.clone());
                    }
                }
            }
            self.join_or_spawn(&mut shared, key, fetcher)
        };
        Self::await_outcome(rx).await
    }

    /// Force a refetch for `key`, joining an in-flight request if one
    /// exists. This is the manual-retry path for entries in error state.
    pub async fn refresh(
        &self,
        key: &CacheKey,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> FetchOutcome {
        let rx = {
            let mut shared = self.shared.lock();
            self.join_or_spawn(&mut shared, key, fetcher)
        };
        Self::await_outcome(rx).await
    }

    /// Mark stale every entry whose key equals or is prefixed by `prefix`.
    ///
    /// Keys with at least one live subscriber refetch in the background
    /// right away; for everything else the refetch waits for the next
    /// read. Entries outside the prefix are untouched, and invalidating
    /// one key never blocks on another.
    pub fn invalidate(&self, prefix: &CacheKey) {
        let mut shared = self.shared.lock();
        let shared = &mut *shared;

        let mut refetch: Vec<(CacheKey, Arc<dyn ResourceFetcher>)> = Vec::new();
        for (key, entry) in shared.entries.iter_mut() {
            if !key.starts_with(prefix) {
                continue;
            }
            entry.stale = true;
            debug!(key = %key, "entry invalidated");
            if let Some(sub) = shared.subscriptions.get(key) {
                sub.bump();
                if sub.handles > 0 && !shared.inflight.contains_key(key) {
                    refetch.push((key.clone(), sub.fetcher.clone()));
                }
            }
        }

        for (key, fetcher) in refetch {
            let (tx, _rx) = broadcast::channel(4);
            shared.inflight.insert(key.clone(), tx);
            if let Some(entry) = shared.entries.get_mut(&key) {
                entry.begin();
            }
            debug!(key = %key, "background refetch after invalidation");
            self.spawn_fetch(key, fetcher);
        }
    }

    /// Drop every entry and in-flight marker.
    ///
    /// Test lifecycle hook; subscriptions registered by live query handles
    /// survive (and get notified) so the handles stay functional.
    pub fn reset(&self) {
        let mut shared = self.shared.lock();
        shared.entries.clear();
        shared.inflight.clear();
        for sub in shared.subscriptions.values() {
            sub.bump();
        }
    }

    /// Register a query handle for `key`. The latest registered fetcher is
    /// the one used for background refetches.
    pub(crate) fn register(
        &self,
        key: &CacheKey,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> watch::Receiver<u64> {
        let mut shared = self.shared.lock();
        let sub = shared
            .subscriptions
            .entry(key.clone())
            .or_insert_with(|| Subscription {
                fetcher: fetcher.clone(),
                handles: 0,
                revision: watch::channel(0).0,
            });
        sub.handles += 1;
        sub.fetcher = fetcher;
        sub.revision.subscribe()
    }

    /// Counterpart to [`ResourceCache::register`]; the subscription record
    /// is dropped when the last handle unregisters.
    pub(crate) fn unregister(&self, key: &CacheKey) {
        let mut shared = self.shared.lock();
        if let Some(sub) = shared.subscriptions.get_mut(key) {
            sub.handles = sub.handles.saturating_sub(1);
            if sub.handles == 0 {
                shared.subscriptions.remove(key);
            }
        }
    }

    /// Kick off a fetch for `key` if none is in flight, without waiting
    /// for the outcome. Used when a query handle becomes enabled.
    pub(crate) fn trigger(&self, key: &CacheKey, fetcher: Arc<dyn ResourceFetcher>) {
        let mut shared = self.shared.lock();
        let settled = shared.entries.get(key).is_some_and(|entry| {
            entry.is_fresh() || (entry.status == ResourceStatus::Error && !entry.stale)
        });
        if !settled && !shared.inflight.contains_key(key) {
            let _ = self.join_or_spawn(&mut shared, key, fetcher);
        }
    }

    fn join_or_spawn(
        &self,
        shared: &mut Shared,
        key: &CacheKey,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> broadcast::Receiver<FetchOutcome> {
        if let Some(tx) = shared.inflight.get(key) {
            return tx.subscribe();
        }
        let (tx, rx) = broadcast::channel(4);
        shared.inflight.insert(key.clone(), tx);
        shared
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::pending)
            .begin();
        debug!(key = %key, "issuing fetch");
        self.spawn_fetch(key.clone(), fetcher);
        rx
    }

    /// Run the fetch on a detached task so a cancelled caller never kills
    /// the shared request: the response still lands in the cache for every
    /// other reader.
    fn spawn_fetch(&self, key: CacheKey, fetcher: Arc<dyn ResourceFetcher>) {
        let cache = self.clone();
        tokio::spawn(async move {
            let outcome = fetcher.fetch().await;
            cache.complete_fetch(&key, outcome);
        });
    }

    fn complete_fetch(&self, key: &CacheKey, outcome: FetchOutcome) {
        let mut shared = self.shared.lock();
        // A missing marker means reset() ran while the request was in
        // flight; the result no longer has a home.
        let Some(tx) = shared.inflight.remove(key) else {
            debug!(key = %key, "dropping fetch result for cleared cache");
            return;
        };
        let entry = shared
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::pending);
        match &outcome {
            Ok(value) => entry.complete(value.clone()),
            Err(error) => {
                warn!(key = %key, %error, "fetch failed");
                entry.fail(error.clone());
            }
        }
        // No receivers just means every reader went away mid-flight.
        let _ = tx.send(outcome);
        if let Some(sub) = shared.subscriptions.get(key) {
            sub.bump();
        }
    }

    async fn await_outcome(mut rx: broadcast::Receiver<FetchOutcome>) -> FetchOutcome {
        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(ChairsideError::network(
                "request was abandoned before completing",
            )),
        }
    }
}
