//! Key/value capability behind the local cache store.
//!
//! One trait, three interchangeable backends. The concrete backend is picked once
//! at startup (see `storage::connect_kv`) and is opaque to callers afterwards.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::debug;

use crate::storage::StorageError;

#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Short backend label for logs and the session endpoint.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Redis (remote)
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisKv {
    conn: MultiplexedConnection,
}

impl RedisKv {
    pub async fn connect(redis_url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvBackend for RedisKv {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// File directory (local fallback)
// ────────────────────────────────────────────────────────────────────────────

/// Stores each key as `<dir>/<key>.json`. Writes go to a temp file first and are
/// renamed into place so readers never see a half-written value.
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

#[async_trait]
impl KvBackend for FileKv {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory (process-local fallback)
// ────────────────────────────────────────────────────────────────────────────

/// Contents live as long as the process.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvBackend for MemoryKv {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_kv_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path()).await.unwrap();

        assert_eq!(kv.get("app:items").await.unwrap(), None);
        kv.set("app:items", "[1,2]").await.unwrap();
        assert_eq!(kv.get("app:items").await.unwrap().as_deref(), Some("[1,2]"));

        kv.set("app:items", "[3]").await.unwrap();
        assert_eq!(kv.get("app:items").await.unwrap().as_deref(), Some("[3]"));

        kv.remove("app:items").await.unwrap();
        assert_eq!(kv.get("app:items").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_kv_remove_absent_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path()).await.unwrap();
        assert!(kv.remove("never-written").await.is_ok());
    }

    #[tokio::test]
    async fn test_file_kv_key_is_sanitized_into_dir() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path()).await.unwrap();
        kv.set("../escape:key", "x").await.unwrap();
        assert!(dir.path().join(".._escape_key.json").exists());
    }

    #[tokio::test]
    async fn test_memory_kv_round_trip() {
        let kv = MemoryKv::new();
        kv.set("k", "v").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));
        kv.remove("k").await.unwrap();
        kv.remove("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);
    }
}
