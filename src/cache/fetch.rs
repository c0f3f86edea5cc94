// src/cache/fetch.rs

//! Stale-while-revalidate fetch path.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::connectivity::Connectivity;
use crate::error::{AppError, Result};

use super::{CacheDomain, CacheStore, Ttl};

use std::future::Future;

/// One delivery from [`fetch_with_cache`]. A single call can deliver
/// twice: `Stale` from the cache first, then the refresh outcome once
/// the network round trip completes.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh<T> {
    /// Cached value, possibly expired; a refresh is in flight.
    Stale(T),
    /// Freshly fetched value, already written back to the cache.
    Fresh(T),
    /// No network; the cached value if one exists.
    Offline(Option<T>),
    /// The portal served its block page. The cache was left untouched;
    /// callers should back off, and UIs may show a throttling notice.
    RateLimited,
    /// The refresh failed and nothing better is coming this call.
    Failed,
}

/// Fetch a domain value through the cache.
///
/// Delivery order: offline short-circuits with `Offline`; otherwise any
/// cached value arrives as `Stale` (skipped when `bypass_cache` is
/// set), then the fetcher runs and its outcome arrives as `Fresh`,
/// `RateLimited` or `Failed`. Refresh failures are delivered, never
/// returned, so a dead network or a block page cannot abort a caller
/// that already got a stale value. The only errors this function
/// returns are the cache's own storage errors.
pub async fn fetch_with_cache<T, F, Fut, C>(
    cache: &CacheStore,
    connectivity: &dyn Connectivity,
    domain: CacheDomain,
    id: &str,
    ttl: Ttl,
    bypass_cache: bool,
    fetch: F,
    mut deliver: C,
) -> Result<()>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
    C: FnMut(Refresh<T>),
{
    let cached: Option<T> = if bypass_cache {
        None
    } else {
        cache.read(domain, id).await?
    };

    if !connectivity.is_connected() {
        deliver(Refresh::Offline(cached));
        return Ok(());
    }

    if let Some(stale) = cached {
        deliver(Refresh::Stale(stale));
    }

    match fetch().await {
        Ok(value) => {
            cache.save(domain, id, &value, ttl).await?;
            deliver(Refresh::Fresh(value));
        }
        Err(AppError::RateLimited) => {
            log::warn!("refresh of {} blocked by rate limit", domain.key(id));
            deliver(Refresh::RateLimited);
        }
        Err(err) => {
            log::warn!("refresh of {} failed: {err}", domain.key(id));
            deliver(Refresh::Failed);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{AlwaysOnline, WatchConnectivity};
    use crate::storage::MemoryKvStore;

    use std::sync::Arc;
    use std::time::Duration;

    fn cache() -> CacheStore {
        CacheStore::new(Arc::new(MemoryKvStore::new()), Duration::from_secs(43200))
    }

    #[tokio::test]
    async fn cold_cache_delivers_fresh_only() {
        let cache = cache();
        let mut seen = Vec::new();

        fetch_with_cache(
            &cache,
            &AlwaysOnline::new(),
            CacheDomain::Grades,
            "me",
            Ttl::Never,
            false,
            || async { Ok(7) },
            |r| seen.push(r),
        )
        .await
        .unwrap();

        assert_eq!(seen, [Refresh::Fresh(7)]);
    }

    #[tokio::test]
    async fn warm_cache_delivers_stale_then_fresh() {
        let cache = cache();
        cache
            .save(CacheDomain::Grades, "me", &7, Ttl::Never)
            .await
            .unwrap();
        let mut seen = Vec::new();

        fetch_with_cache(
            &cache,
            &AlwaysOnline::new(),
            CacheDomain::Grades,
            "me",
            Ttl::Never,
            false,
            || async { Ok(8) },
            |r| seen.push(r),
        )
        .await
        .unwrap();

        assert_eq!(seen, [Refresh::Stale(7), Refresh::Fresh(8)]);

        let stored: Option<i32> = cache.read(CacheDomain::Grades, "me").await.unwrap();
        assert_eq!(stored, Some(8));
    }

    #[tokio::test]
    async fn bypass_skips_stale_delivery() {
        let cache = cache();
        cache
            .save(CacheDomain::Grades, "me", &7, Ttl::Never)
            .await
            .unwrap();
        let mut seen = Vec::new();

        fetch_with_cache(
            &cache,
            &AlwaysOnline::new(),
            CacheDomain::Grades,
            "me",
            Ttl::Never,
            true,
            || async { Ok(8) },
            |r| seen.push(r),
        )
        .await
        .unwrap();

        assert_eq!(seen, [Refresh::Fresh(8)]);
    }

    #[tokio::test]
    async fn offline_short_circuits_without_fetching() {
        let cache = cache();
        cache
            .save(CacheDomain::Grades, "me", &7, Ttl::Never)
            .await
            .unwrap();
        let conn = WatchConnectivity::new(false);
        let mut seen = Vec::new();

        fetch_with_cache(
            &cache,
            &conn,
            CacheDomain::Grades,
            "me",
            Ttl::Never,
            false,
            || async { panic!("fetched while offline") },
            |r: Refresh<i32>| seen.push(r),
        )
        .await
        .unwrap();

        assert_eq!(seen, [Refresh::Offline(Some(7))]);
    }

    #[tokio::test]
    async fn transport_failure_delivers_failed_not_err() {
        let cache = cache();
        let mut seen = Vec::new();

        fetch_with_cache(
            &cache,
            &AlwaysOnline::new(),
            CacheDomain::Grades,
            "me",
            Ttl::Never,
            false,
            || async { Err(AppError::session("fetch", "connection reset")) },
            |r: Refresh<i32>| seen.push(r),
        )
        .await
        .unwrap();

        assert_eq!(seen, [Refresh::Failed]);
    }

    #[tokio::test]
    async fn rate_limit_leaves_cache_and_delivers_signal() {
        let cache = cache();
        cache
            .save(CacheDomain::Grades, "me", &7, Ttl::Never)
            .await
            .unwrap();
        let mut seen = Vec::new();

        fetch_with_cache(
            &cache,
            &AlwaysOnline::new(),
            CacheDomain::Grades,
            "me",
            Ttl::Never,
            false,
            || async { Err::<i32, _>(AppError::RateLimited) },
            |r| seen.push(r),
        )
        .await
        .unwrap();

        assert_eq!(seen, [Refresh::Stale(7), Refresh::RateLimited]);

        // Not overwritten by the blocked refresh.
        let stored: Option<i32> = cache.read(CacheDomain::Grades, "me").await.unwrap();
        assert_eq!(stored, Some(7));
    }
}
