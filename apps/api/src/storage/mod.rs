// Persistence for analyses: the capped local cache (key/value) and the
// per-analysis remote asset folders (hierarchical file namespace).
// Backends are chosen once at startup and hidden behind traits afterwards.

pub mod assets;
pub mod cache;
pub mod fs;
pub mod kv;

use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::storage::fs::{AssetFs, LocalAssetFs, S3AssetFs};
use crate::storage::kv::{FileKv, KvBackend, MemoryKv, RedisKv};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Failure reported by a remote backend; the message is user-presentable.
    #[error("{0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Picks the key/value backend: Redis when configured, else a local directory,
/// else process memory. A configured backend that cannot be reached fails startup.
pub async fn connect_kv(config: &Config) -> Result<Arc<dyn KvBackend>> {
    if let Some(url) = &config.redis_url {
        info!("Connecting to Redis...");
        let kv = RedisKv::connect(url)
            .await
            .context("Failed to connect to REDIS_URL")?;
        info!("Redis key/value backend ready");
        return Ok(Arc::new(kv));
    }

    if let Some(dir) = &config.local_cache_dir {
        let kv = FileKv::open(dir)
            .await
            .with_context(|| format!("Failed to open LOCAL_CACHE_DIR {}", dir.display()))?;
        info!("File key/value backend ready at {}", dir.display());
        return Ok(Arc::new(kv));
    }

    info!("No REDIS_URL or LOCAL_CACHE_DIR set; cached analyses will not survive a restart");
    Ok(Arc::new(MemoryKv::new()))
}

/// Picks the asset filesystem: S3 when configured, else a local directory, else none.
pub async fn connect_asset_fs(config: &Config) -> Option<Arc<dyn AssetFs>> {
    if let Some(s3) = &config.s3 {
        return Some(Arc::new(S3AssetFs::connect(s3).await));
    }
    if let Some(dir) = &config.asset_dir {
        info!("Local asset store at {}", dir.display());
        return Some(Arc::new(LocalAssetFs::new(dir)));
    }
    info!("No S3_BUCKET or ASSET_DIR set; remote asset persistence disabled");
    None
}
