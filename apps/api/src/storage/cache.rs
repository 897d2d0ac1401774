//! Local Cache Store: the capped, newest-first list of analyses kept under one key.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::analysis::AnalysisRecord;
use crate::storage::kv::KvBackend;
use crate::storage::StorageError;

/// Namespaced key holding the JSON array of records.
pub const CACHE_KEY: &str = "ai-resume-analyzer:analyses";
/// Oldest records fall off the tail past this length.
pub const MAX_CACHED_ANALYSES: usize = 50;

pub struct AnalysisCache {
    kv: Arc<dyn KvBackend>,
    /// Serializes read-modify-write in `add` / `remove`.
    write_lock: Mutex<()>,
}

impl AnalysisCache {
    pub fn new(kv: Arc<dyn KvBackend>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.kv.name()
    }

    /// Returns the stored records, newest first. Never fails: a backend error or
    /// an unparsable value reads as "nothing saved".
    pub async fn load(&self) -> Vec<AnalysisRecord> {
        match self.kv.get(CACHE_KEY).await {
            Ok(payload) => decode(payload),
            Err(e) => {
                warn!("Failed to read cached analyses from {}: {e}", self.kv.name());
                Vec::new()
            }
        }
    }

    /// Overwrites the full list. The caller enforces the cap.
    pub async fn save(&self, records: &[AnalysisRecord]) -> Result<(), StorageError> {
        let payload = serde_json::to_string(records)?;
        self.kv.set(CACHE_KEY, &payload).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(CACHE_KEY).await?;
        info!("Cleared cached analyses");
        Ok(())
    }

    /// Prepends `record`, truncates to the cap, persists, and returns the new list.
    pub async fn add(&self, record: AnalysisRecord) -> Result<Vec<AnalysisRecord>, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_strict().await?;
        records.insert(0, record);
        records.truncate(MAX_CACHED_ANALYSES);
        self.save(&records).await?;
        Ok(records)
    }

    /// Drops every record with `id`, persists, and returns the new list.
    pub async fn remove(&self, id: Uuid) -> Result<Vec<AnalysisRecord>, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_strict().await?;
        records.retain(|r| r.id != id);
        self.save(&records).await?;
        Ok(records)
    }

    pub async fn find(&self, id: Uuid) -> Option<AnalysisRecord> {
        self.load().await.into_iter().find(|r| r.id == id)
    }

    /// Like `load`, but a backend read error propagates so a mutation never
    /// overwrites a list it could not read. A corrupt value still reads as empty.
    async fn load_strict(&self) -> Result<Vec<AnalysisRecord>, StorageError> {
        Ok(decode(self.kv.get(CACHE_KEY).await?))
    }
}

fn decode(payload: Option<String>) -> Vec<AnalysisRecord> {
    let Some(payload) = payload else {
        return Vec::new();
    };
    serde_json::from_str(&payload).unwrap_or_else(|e| {
        warn!("Discarding unparsable cached analyses: {e}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryKv;
    use crate::test_support::{sample_record, FailingKv};

    fn memory_cache() -> AnalysisCache {
        AnalysisCache::new(Arc::new(MemoryKv::new()))
    }

    #[tokio::test]
    async fn test_fresh_cache_loads_empty() {
        assert!(memory_cache().load().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_prepends_newest() {
        let cache = memory_cache();
        let first = sample_record("first.pdf", 70.0);
        let second = sample_record("second.pdf", 80.0);
        cache.add(first.clone()).await.unwrap();
        let list = cache.add(second.clone()).await.unwrap();
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
        assert_eq!(cache.load().await, list);
    }

    #[tokio::test]
    async fn test_cap_holds_after_fifty_one_adds() {
        let cache = memory_cache();
        let mut added = Vec::new();
        for i in 0..=MAX_CACHED_ANALYSES {
            let record = sample_record(&format!("resume-{i}.pdf"), 50.0);
            added.push(record.id);
            let list = cache.add(record).await.unwrap();
            assert!(list.len() <= MAX_CACHED_ANALYSES);
            assert_eq!(list[0].id, *added.last().unwrap());
        }
        let loaded = cache.load().await;
        assert_eq!(loaded.len(), MAX_CACHED_ANALYSES);
        assert!(loaded.iter().all(|r| r.id != added[0]));
        assert_eq!(loaded[0].id, added[MAX_CACHED_ANALYSES]);
    }

    #[tokio::test]
    async fn test_remove_then_load_excludes_id() {
        let cache = memory_cache();
        let keep = sample_record("keep.pdf", 60.0);
        let drop = sample_record("drop.pdf", 40.0);
        cache.add(keep.clone()).await.unwrap();
        cache.add(drop.clone()).await.unwrap();

        let list = cache.remove(drop.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(cache.load().await.iter().all(|r| r.id != drop.id));
        assert!(cache.find(keep.id).await.is_some());
        assert!(cache.find(drop.id).await.is_none());
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let cache = memory_cache();
        let records: Vec<_> = (0..5)
            .map(|i| sample_record(&format!("r{i}.pdf"), 10.0 * i as f64))
            .collect();
        cache.save(&records).await.unwrap();
        assert_eq!(cache.load().await, records);
    }

    #[tokio::test]
    async fn test_corrupt_value_loads_empty() {
        let kv = Arc::new(MemoryKv::new());
        kv.set(CACHE_KEY, "{not json").await.unwrap();
        let cache = AnalysisCache::new(kv);
        assert!(cache.load().await.is_empty());

        // A mutation over a corrupt value starts from an empty list.
        let record = sample_record("fresh.pdf", 90.0);
        assert_eq!(cache.add(record).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let cache = memory_cache();
        cache.add(sample_record("a.pdf", 1.0)).await.unwrap();
        cache.clear().await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_backend_errors_degrade_on_load_but_propagate_on_write() {
        let cache = AnalysisCache::new(Arc::new(FailingKv));
        assert!(cache.load().await.is_empty());
        assert!(cache.save(&[]).await.is_err());
        assert!(cache.add(sample_record("x.pdf", 1.0)).await.is_err());
        assert!(cache.clear().await.is_err());
    }
}
