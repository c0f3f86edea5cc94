// src/cache/mod.rs

//! TTL cache over a [`KvStore`], plus the stale-while-revalidate fetch
//! path the client uses for every domain page.

mod fetch;

pub use fetch::{Refresh, fetch_with_cache};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::storage::KvStore;

use std::sync::Arc;

/// Marker entry recording when the last sweep ran.
const SWEEP_MARKER_KEY: &str = "SWEEP-last";

/// Cache namespaces, one per domain page family. The discriminant is
/// the key prefix, so renaming a variant orphans its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDomain {
    Schedule,
    Absence,
    Grades,
    Messages,
    MessageThread,
    Documents,
    Books,
    Rooms,
    Roster,
    Modules,
}

impl CacheDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "SCHEDULE",
            Self::Absence => "ABSENCE",
            Self::Grades => "GRADES",
            Self::Messages => "MESSAGES",
            Self::MessageThread => "MESSAGE_THREAD",
            Self::Documents => "DOCUMENTS",
            Self::Books => "BOOKS",
            Self::Rooms => "ROOMS",
            Self::Roster => "ROSTER",
            Self::Modules => "MODULES",
        }
    }

    pub fn key(self, id: &str) -> String {
        format!("{}-{}", self.as_str(), id)
    }
}

/// How long a saved entry stays fresh.
#[derive(Debug, Clone, Copy)]
pub enum Ttl {
    Never,
    After(Duration),
}

impl Ttl {
    fn deadline(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Never => None,
            Self::After(ttl) => Some(now + ttl),
        }
    }
}

#[derive(Serialize, serde::Deserialize)]
struct CacheEntry {
    value: serde_json::Value,
    invalid_after: Option<DateTime<Utc>>,
}

/// Typed cache facade. Values are stored as JSON envelopes carrying
/// their own expiry, so the sweep needs no external index.
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn KvStore>,
    sweep_interval: Duration,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KvStore>, sweep_interval: std::time::Duration) -> Self {
        Self {
            store,
            sweep_interval: Duration::from_std(sweep_interval)
                .unwrap_or_else(|_| Duration::hours(12)),
        }
    }

    pub async fn save<T: Serialize>(
        &self,
        domain: CacheDomain,
        id: &str,
        value: &T,
        ttl: Ttl,
    ) -> Result<()> {
        let entry = CacheEntry {
            value: serde_json::to_value(value)?,
            invalid_after: ttl.deadline(Utc::now()),
        };
        let bytes = serde_json::to_vec(&entry)?;
        self.store.write(&domain.key(id), &bytes).await
    }

    /// Read an entry, expired or not. An expired entry is deleted on
    /// the way out but still returned, so the caller gets one last
    /// stale value to show while it refreshes.
    pub async fn read<T: DeserializeOwned>(
        &self,
        domain: CacheDomain,
        id: &str,
    ) -> Result<Option<T>> {
        let key = domain.key(id);
        let Some(bytes) = self.store.read(&key).await? else {
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                // Unreadable entries are dropped, not surfaced.
                log::warn!("dropping corrupt cache entry {key}: {err}");
                self.store.delete(&key).await?;
                return Ok(None);
            }
        };

        if entry
            .invalid_after
            .is_some_and(|deadline| deadline <= Utc::now())
        {
            self.store.delete(&key).await?;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                log::warn!("dropping unparsable cache entry {key}: {err}");
                self.store.delete(&key).await?;
                Ok(None)
            }
        }
    }

    pub async fn delete(&self, domain: CacheDomain, id: &str) -> Result<()> {
        self.store.delete(&domain.key(id)).await
    }

    /// Keys of all current entries, sweep bookkeeping excluded.
    pub async fn entries(&self) -> Result<Vec<String>> {
        let mut keys = self.store.keys().await?;
        keys.retain(|k| k != SWEEP_MARKER_KEY);
        Ok(keys)
    }

    /// Delete every expired entry. Throttled: runs at most once per
    /// sweep interval unless `force` is set.
    pub async fn sweep(&self, force: bool) -> Result<usize> {
        let now = Utc::now();
        if !force && !self.sweep_due(now).await? {
            return Ok(0);
        }

        let mut removed = 0;
        for key in self.store.keys().await? {
            if key == SWEEP_MARKER_KEY {
                continue;
            }
            let Some(bytes) = self.store.read(&key).await? else {
                continue;
            };
            let expired = match serde_json::from_slice::<CacheEntry>(&bytes) {
                Ok(entry) => entry
                    .invalid_after
                    .is_some_and(|deadline| deadline <= now),
                Err(_) => true,
            };
            if expired {
                self.store.delete(&key).await?;
                removed += 1;
            }
        }

        let marker = serde_json::to_vec(&now)?;
        self.store.write(SWEEP_MARKER_KEY, &marker).await?;
        log::debug!("cache sweep removed {removed} entr(ies)");
        Ok(removed)
    }

    async fn sweep_due(&self, now: DateTime<Utc>) -> Result<bool> {
        let Some(bytes) = self.store.read(SWEEP_MARKER_KEY).await? else {
            return Ok(true);
        };
        let last: DateTime<Utc> = match serde_json::from_slice(&bytes) {
            Ok(last) => last,
            Err(_) => return Ok(true),
        };
        Ok(now - last >= self.sweep_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;

    fn cache() -> CacheStore {
        CacheStore::new(
            Arc::new(MemoryKvStore::new()),
            std::time::Duration::from_secs(12 * 3600),
        )
    }

    #[tokio::test]
    async fn round_trips_typed_values() {
        let cache = cache();
        cache
            .save(CacheDomain::Books, "all", &vec!["Mat B2".to_string()], Ttl::Never)
            .await
            .unwrap();

        let books: Option<Vec<String>> = cache.read(CacheDomain::Books, "all").await.unwrap();
        assert_eq!(books.unwrap(), ["Mat B2"]);
    }

    #[tokio::test]
    async fn expired_entry_is_returned_once_then_gone() {
        let cache = cache();
        cache
            .save(
                CacheDomain::Schedule,
                "38-2026",
                &"old week".to_string(),
                Ttl::After(Duration::seconds(-1)),
            )
            .await
            .unwrap();

        let first: Option<String> = cache.read(CacheDomain::Schedule, "38-2026").await.unwrap();
        assert_eq!(first.as_deref(), Some("old week"));

        let second: Option<String> = cache.read(CacheDomain::Schedule, "38-2026").await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let cache = cache();
        cache
            .save(CacheDomain::Grades, "me", &1, Ttl::After(Duration::seconds(-1)))
            .await
            .unwrap();
        cache
            .save(CacheDomain::Rooms, "now", &2, Ttl::After(Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(cache.sweep(true).await.unwrap(), 1);

        let kept: Option<i32> = cache.read(CacheDomain::Rooms, "now").await.unwrap();
        assert_eq!(kept, Some(2));
    }

    #[tokio::test]
    async fn sweep_is_throttled_until_forced() {
        let cache = cache();
        assert_eq!(cache.sweep(true).await.unwrap(), 0);

        cache
            .save(CacheDomain::Grades, "me", &1, Ttl::After(Duration::seconds(-1)))
            .await
            .unwrap();

        // Within the interval the throttle wins.
        assert_eq!(cache.sweep(false).await.unwrap(), 0);
        assert_eq!(cache.sweep(true).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn entries_hide_the_sweep_marker() {
        let cache = cache();
        cache
            .save(CacheDomain::Books, "all", &1, Ttl::Never)
            .await
            .unwrap();
        cache.sweep(true).await.unwrap();

        assert_eq!(cache.entries().await.unwrap(), ["BOOKS-all"]);
    }

    #[tokio::test]
    async fn keys_are_namespaced_per_domain() {
        let cache = cache();
        cache
            .save(CacheDomain::Messages, "inbox", &1, Ttl::Never)
            .await
            .unwrap();

        let other: Option<i32> = cache.read(CacheDomain::Documents, "inbox").await.unwrap();
        assert!(other.is_none());
    }
}
