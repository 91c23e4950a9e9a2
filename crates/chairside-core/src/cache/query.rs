//! Read handles over the resource cache
//!
//! A [`ResourceQuery`] is the read side of the cache contract: it binds a
//! cache key to the fetcher that knows how to load it, gates everything on
//! an `enabled` flag, and registers itself so invalidations of its key
//! refetch in the background while the handle is alive.

use super::types::{CacheKey, ResourceState, ResourceStatus};
use super::ResourceCache;
use crate::error::{ChairsideError, ChairsideResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;

/// Loader for one cached resource collection.
///
/// Implementations decode the response into the expected shape before
/// handing it to the cache, so shape validation happens at the
/// deserialization boundary and the cache only ever stores canonical JSON.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Perform the network fetch and return the canonical payload
    async fn fetch(&self) -> ChairsideResult<serde_json::Value>;
}

struct FnFetcher<F>(F);

#[async_trait]
impl<F, Fut> ResourceFetcher for FnFetcher<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ChairsideResult<serde_json::Value>> + Send,
{
    async fn fetch(&self) -> ChairsideResult<serde_json::Value> {
        (self.0)().await
    }
}

/// Wrap an async closure as a [`ResourceFetcher`]
pub fn from_fn<F, Fut>(f: F) -> Arc<dyn ResourceFetcher>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ChairsideResult<serde_json::Value>> + Send + 'static,
{
    Arc::new(FnFetcher(f))
}

/// Read handle for one cache key.
///
/// While enabled, the handle counts as a mounted reader: invalidating its
/// key triggers a background refetch, observable through
/// [`ResourceQuery::changed`]. A disabled handle reports
/// [`ResourceStatus::Idle`], performs no network access, and does not
/// subscribe. Dropping the handle unsubscribes.
pub struct ResourceQuery<T> {
    cache: ResourceCache,
    key: CacheKey,
    fetcher: Arc<dyn ResourceFetcher>,
    enabled: bool,
    revision: Option<watch::Receiver<u64>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ResourceQuery<T> {
    /// Create a handle; an enabled handle subscribes and kicks off the
    /// initial fetch immediately.
    ///
    /// Must be called from within a Tokio runtime: fetches run on spawned
    /// tasks so that no single reader owns the shared request.
    pub fn new(
        cache: ResourceCache,
        key: CacheKey,
        fetcher: Arc<dyn ResourceFetcher>,
        enabled: bool,
    ) -> Self {
        let mut query = Self {
            cache,
            key,
            fetcher,
            enabled: false,
            revision: None,
            _marker: PhantomData,
        };
        if enabled {
            query.set_enabled(true);
        }
        query
    }

    /// The key this handle reads
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Whether the handle currently reads anything
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flip the enabled gate.
    ///
    /// Enabling subscribes and starts a fetch unless the key is already
    /// settled; disabling unsubscribes and returns the handle to idle
    /// without touching the shared entry.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.revision = Some(self.cache.register(&self.key, self.fetcher.clone()));
            self.cache.trigger(&self.key, self.fetcher.clone());
        } else {
            self.revision = None;
            self.cache.unregister(&self.key);
        }
    }

    /// Current snapshot of the resource.
    ///
    /// Never performs network access; pair with [`ResourceQuery::ensure`]
    /// or [`ResourceQuery::changed`] to drive loading.
    pub fn state(&self) -> ResourceState<T> {
        if !self.enabled {
            return ResourceState::idle();
        }
        match self.cache.entry(&self.key) {
            None => ResourceState {
                status: ResourceStatus::Pending,
                data: None,
                error: None,
                fetched_at: None,
            },
            Some(entry) => {
                let (data, decode_error) = match &entry.data {
                    Some(value) => match serde_json::from_value::<T>(value.clone()) {
                        Ok(decoded) => (Some(decoded), None),
                        Err(e) => (None, Some(ChairsideError::decode(e.to_string()))),
                    },
                    None => (None, None),
                };
                if let Some(error) = decode_error {
                    return ResourceState {
                        status: ResourceStatus::Error,
                        data: None,
                        error: Some(error),
                        fetched_at: entry.fetched_at,
                    };
                }
                ResourceState {
                    status: entry.status,
                    data,
                    error: entry.error,
                    fetched_at: entry.fetched_at,
                }
            }
        }
    }

    /// Resolve the resource, fetching if the entry is missing or stale and
    /// joining any in-flight request. Errors come back as state, never as
    /// a panic or a detached failure.
    pub async fn ensure(&self) -> ResourceState<T> {
        if !self.enabled {
            return ResourceState::idle();
        }
        let _ = self.cache.ensure(&self.key, self.fetcher.clone()).await;
        self.state()
    }

    /// Force a refetch (manual retry) and wait for it to settle
    pub async fn refresh(&self) -> ResourceState<T> {
        if !self.enabled {
            return ResourceState::idle();
        }
        let _ = self.cache.refresh(&self.key, self.fetcher.clone()).await;
        self.state()
    }

    /// Wait until the entry for this key changes (fetch settled,
    /// invalidation, reset). Returns immediately with `false` if the
    /// handle is disabled.
    pub async fn changed(&mut self) -> bool {
        match &mut self.revision {
            Some(rx) => rx.changed().await.is_ok(),
            None => false,
        }
    }
}

impl<T> Drop for ResourceQuery<T> {
    fn drop(&mut self) {
        if self.enabled {
            self.cache.unregister(&self.key);
        }
    }
}
