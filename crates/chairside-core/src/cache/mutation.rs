//! Write path for cached resources
//!
//! Mutations declare, up front, the cache key their write invalidates.
//! The invalidation runs strictly after the backend has confirmed the
//! write, never speculatively, and a failed write leaves the cache
//! untouched.

use super::types::CacheKey;
use super::ResourceCache;
use crate::error::ChairsideResult;
use std::future::Future;
use tracing::debug;

/// Write handle bound to a dependency key.
///
/// Each [`ResourceMutation::run`] call is an independent, user-intended
/// action: concurrent runs are not deduplicated. On success every cache
/// entry whose key equals or is prefixed by the declared key is marked
/// stale, which refetches subscribed readers in the background.
pub struct ResourceMutation {
    cache: ResourceCache,
    invalidates: CacheKey,
}

impl ResourceMutation {
    /// Create a mutation that invalidates `invalidates` on success
    pub fn new(cache: ResourceCache, invalidates: CacheKey) -> Self {
        Self { cache, invalidates }
    }

    /// The dependency key declared for this mutation
    pub fn invalidates(&self) -> &CacheKey {
        &self.invalidates
    }

    /// Await the write; propagate its error untouched, or invalidate the
    /// declared dependency once the response is confirmed successful.
    pub async fn run<T, Fut>(&self, op: Fut) -> ChairsideResult<T>
    where
        Fut: Future<Output = ChairsideResult<T>>,
    {
        let value = op.await?;
        debug!(key = %self.invalidates, "mutation confirmed, invalidating dependents");
        self.cache.invalidate(&self.invalidates);
        Ok(value)
    }
}
