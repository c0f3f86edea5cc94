// src/storage/mod.rs

//! Key/value persistence behind an async trait, so the cache and
//! crawler can run against local files in production and an in-memory
//! map in tests.

mod local;

pub use local::LocalKvStore;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;

use std::collections::BTreeMap;

/// Minimal async key/value store.
///
/// Keys are flat strings; values are opaque byte blobs. `read` of a
/// missing key is `Ok(None)`, and `delete` of a missing key is a no-op.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn write(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryKvStore {
    inner: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        self.inner.lock().await.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.inner.lock().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryKvStore::new();
        assert!(store.read("a").await.unwrap().is_none());

        store.write("a", b"1").await.unwrap();
        store.write("b", b"2").await.unwrap();
        assert_eq!(store.read("a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.keys().await.unwrap(), ["a", "b"]);

        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert!(store.read("a").await.unwrap().is_none());
    }
}
