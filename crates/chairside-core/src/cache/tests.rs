//! Resource cache tests

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::ChairsideError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn notes_key(patient: u64) -> CacheKey {
        CacheKey::root("patients").push(patient).push("medical-notes")
    }

    /// Fetcher double that counts requests and answers after a short delay
    fn counting_fetcher(
        hits: Arc<AtomicUsize>,
        payload: serde_json::Value,
    ) -> Arc<dyn ResourceFetcher> {
        from_fn(move || {
            let hits = hits.clone();
            let payload = payload.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(payload)
            }
        })
    }

    fn failing_fetcher(hits: Arc<AtomicUsize>) -> Arc<dyn ResourceFetcher> {
        from_fn(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Err(ChairsideError::http(500, "/api/patients/7/medical-notes"))
            }
        })
    }

    async fn wait_for_hits(hits: &AtomicUsize, expected: usize) {
        for _ in 0..100 {
            if hits.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {expected} requests, saw {}",
            hits.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn test_key_equality_is_structural() {
        assert_eq!(notes_key(7), notes_key(7));
        assert_ne!(notes_key(7), notes_key(8));
        assert_ne!(
            CacheKey::root("patients").push(7u64),
            CacheKey::root("patients").push("7")
        );
    }

    #[test]
    fn test_key_prefix_matching() {
        let key = notes_key(7);
        assert!(key.starts_with(&key));
        assert!(key.starts_with(&CacheKey::root("patients")));
        assert!(key.starts_with(&CacheKey::root("patients").push(7u64)));
        assert!(!key.starts_with(&CacheKey::root("patients").push(8u64)));
        assert!(!key.starts_with(&key.clone().push("extra")));
        assert!(!key.starts_with(&CacheKey::root("employees")));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(notes_key(7).to_string(), "patients/7/medical-notes");
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_request() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(hits.clone(), json!([{"id": 1}]));
        let key = notes_key(7);

        let (a, b) = tokio::join!(
            cache.ensure(&key, fetcher.clone()),
            cache.ensure(&key, fetcher.clone())
        );
        assert_eq!(a.unwrap(), json!([{"id": 1}]));
        assert_eq!(b.unwrap(), json!([{"id": 1}]));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // A later read is served from cache without a new request.
        let c = cache.ensure(&key, fetcher).await;
        assert!(c.is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_retained_and_not_retried_automatically() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let fetcher = failing_fetcher(hits.clone());
        let key = notes_key(7);

        let first = cache.ensure(&key, fetcher.clone()).await;
        assert!(matches!(first, Err(ChairsideError::Http { status: 500, .. })));

        let entry = cache.entry(&key).unwrap();
        assert_eq!(entry.status, ResourceStatus::Error);
        assert!(entry.error.is_some());

        // The retained error answers later reads without a new request.
        let second = cache.ensure(&key, fetcher.clone()).await;
        assert!(second.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Manual retry goes back to the network.
        let third = cache.refresh(&key, fetcher).await;
        assert!(third.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidation_hits_prefix_and_nothing_else() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let payload = json!([]);

        let keys = [notes_key(7), notes_key(8), CacheKey::root("employees")];
        for key in &keys {
            cache
                .ensure(key, counting_fetcher(hits.clone(), payload.clone()))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 3);

        cache.invalidate(&CacheKey::root("patients").push(7u64));

        assert!(cache.entry(&keys[0]).unwrap().stale);
        assert!(!cache.entry(&keys[1]).unwrap().stale);
        assert!(!cache.entry(&keys[2]).unwrap().stale);
    }

    #[tokio::test]
    async fn test_unsubscribed_invalidation_defers_refetch_to_next_read() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(hits.clone(), json!([]));
        let key = notes_key(7);

        cache.ensure(&key, fetcher.clone()).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        cache.invalidate(&key);
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Nobody is subscribed, so nothing was fetched yet.
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        cache.ensure(&key, fetcher).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(cache.entry(&key).unwrap().is_fresh());
    }

    #[tokio::test]
    async fn test_subscribed_invalidation_refetches_in_background() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(hits.clone(), json!([{"id": 1}]));
        let key = notes_key(7);

        let query: ResourceQuery<serde_json::Value> =
            ResourceQuery::new(cache.clone(), key.clone(), fetcher, true);
        let state = query.ensure().await;
        assert!(state.is_success());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        cache.invalidate(&CacheKey::root("patients").push(7u64));
        wait_for_hits(&hits, 2).await;

        let state = query.ensure().await;
        assert!(state.is_success());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dropped_reader_does_not_cancel_shared_request() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(hits.clone(), json!([{"id": 9}]));
        let key = notes_key(7);

        let reader = {
            let cache = cache.clone();
            let key = key.clone();
            let fetcher = fetcher.clone();
            tokio::spawn(async move { cache.ensure(&key, fetcher).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        reader.abort();

        // The detached request still completes and populates the cache.
        wait_for_hits(&hits, 1).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        let entry = cache.entry(&key).unwrap();
        assert!(entry.is_fresh());
        assert_eq!(entry.data.unwrap(), json!([{"id": 9}]));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_query_is_idle_and_silent() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(hits.clone(), json!([]));

        let query: ResourceQuery<serde_json::Value> =
            ResourceQuery::new(cache.clone(), notes_key(7), fetcher, false);

        assert_eq!(query.state().status, ResourceStatus::Idle);
        assert_eq!(query.ensure().await.status, ResourceStatus::Idle);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_enabling_query_issues_exactly_one_request() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(hits.clone(), json!([]));

        let mut query: ResourceQuery<serde_json::Value> =
            ResourceQuery::new(cache.clone(), notes_key(7), fetcher, false);
        query.set_enabled(true);

        wait_for_hits(&hits, 1).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(query.ensure().await.is_success());
    }

    #[tokio::test]
    async fn test_mutation_invalidates_only_after_success() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(hits.clone(), json!([]));
        let key = notes_key(7);

        cache.ensure(&key, fetcher).await.unwrap();
        let mutation = ResourceMutation::new(cache.clone(), key.clone());

        // A failed write leaves the cache untouched.
        let failed: Result<(), _> = mutation
            .run(async { Err(ChairsideError::http(422, "/api/patients/7/medical-notes")) })
            .await;
        assert!(failed.is_err());
        assert!(!cache.entry(&key).unwrap().stale);

        // A confirmed write invalidates the declared dependency.
        let created = mutation.run(async { Ok(json!({"id": 1})) }).await.unwrap();
        assert_eq!(created, json!({"id": 1}));
        assert!(cache.entry(&key).unwrap().stale);
    }

    #[tokio::test]
    async fn test_reset_clears_entries() {
        let cache = ResourceCache::new();
        let hits = Arc::new(AtomicUsize::new(0));
        cache
            .ensure(&notes_key(7), counting_fetcher(hits.clone(), json!([])))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);

        cache.reset();
        assert!(cache.is_empty());
    }
}
