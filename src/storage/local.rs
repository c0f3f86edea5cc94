// src/storage/local.rs

//! File-backed key/value store.

use async_trait::async_trait;
use tokio::fs;

use crate::error::{AppError, Result};

use std::path::PathBuf;

const ENTRY_EXT: &str = "bin";

/// One file per key under a root directory, written atomically via a
/// temporary file and rename so a crash never leaves a half-written
/// entry behind.
pub struct LocalKvStore {
    root: PathBuf,
}

impl LocalKvStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        // Keys map 1:1 to file names, so only a filename-safe charset
        // is accepted.
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !safe {
            return Err(AppError::storage(format!("invalid store key: {key:?}")));
        }
        Ok(self.root.join(format!("{key}.{ENTRY_EXT}")))
    }
}

#[async_trait]
impl super::KvStore for LocalKvStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.entry_path(key)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KvStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn round_trips_through_files() {
        let dir = tempdir().unwrap();
        let store = LocalKvStore::open(dir.path()).await.unwrap();

        store.write("SCHEDULE-38-2026", b"payload").await.unwrap();
        assert_eq!(
            store.read("SCHEDULE-38-2026").await.unwrap(),
            Some(b"payload".to_vec())
        );
        assert_eq!(store.keys().await.unwrap(), ["SCHEDULE-38-2026"]);

        store.delete("SCHEDULE-38-2026").await.unwrap();
        assert!(store.read("SCHEDULE-38-2026").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_key_reads_none_and_delete_is_noop() {
        let dir = tempdir().unwrap();
        let store = LocalKvStore::open(dir.path()).await.unwrap();

        assert!(store.read("nope").await.unwrap().is_none());
        store.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_escaping_keys() {
        let dir = tempdir().unwrap();
        let store = LocalKvStore::open(dir.path()).await.unwrap();

        assert!(store.write("../evil", b"x").await.is_err());
        assert!(store.write("a/b", b"x").await.is_err());
        assert!(store.write("", b"x").await.is_err());
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let dir = tempdir().unwrap();
        let store = LocalKvStore::open(dir.path()).await.unwrap();

        store.write("k", b"old").await.unwrap();
        store.write("k", b"new").await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(b"new".to_vec()));
    }
}
