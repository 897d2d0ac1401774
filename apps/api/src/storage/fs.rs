//! Hierarchical file namespace behind the remote asset store.
//!
//! Paths are `/`-separated and relative to the backend root, e.g.
//! `AI-Resume-Analyzer/cv-1717171717000/page-1.png`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use futures_util::future::try_join_all;
use tracing::{debug, info};

use crate::config::S3Config;
use crate::storage::StorageError;

#[async_trait]
pub trait AssetFs: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_dir(&self, path: &str) -> Result<(), StorageError>;

    async fn write_file(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    async fn read_file(&self, path: &str) -> Result<Bytes, StorageError>;

    /// Names of the immediate child directories of `path`.
    async fn list_dirs(&self, path: &str) -> Result<Vec<String>, StorageError>;

    /// Recursively removes `path`. A missing directory is not an error.
    async fn remove_dir_all(&self, path: &str) -> Result<(), StorageError>;
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

/// Keys are paths; a "directory" is any key prefix ending in `/`.
pub struct S3AssetFs {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3AssetFs {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Constructs a client configured for MinIO (custom endpoint) or AWS.
    pub async fn connect(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "resume-analyzer-static",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        info!("S3 asset store initialized (bucket: {})", config.bucket);
        Self::new(aws_sdk_s3::Client::from_conf(s3_config), &config.bucket)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(token.take())
                .send()
                .await
                .map_err(|e| s3_error("list objects", e))?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(String::from)),
            );

            match output.next_continuation_token() {
                Some(next) if output.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string())
                }
                _ => break,
            }
        }
        Ok(keys)
    }
}

fn dir_prefix(path: &str) -> String {
    format!("{}/", path.trim_matches('/'))
}

fn s3_error<E>(action: &str, err: E) -> StorageError
where
    E: std::error::Error + 'static,
{
    StorageError::Backend(format!("S3 {action} failed: {}", DisplayErrorContext(err)))
}

#[async_trait]
impl AssetFs for S3AssetFs {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn create_dir(&self, _path: &str) -> Result<(), StorageError> {
        // Prefixes come into existence with their first object.
        Ok(())
    }

    async fn write_file(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path.trim_start_matches('/'))
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| s3_error("upload", e))?;
        debug!("Uploaded s3://{}/{} ({size} bytes)", self.bucket, path);
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path.trim_start_matches('/'))
            .send()
            .await
            .map_err(|e| s3_error("download", e))?;
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 body read failed: {e}")))?;
        Ok(body.into_bytes())
    }

    async fn list_dirs(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let prefix = dir_prefix(path);
        let mut dirs = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .delimiter("/")
                .set_continuation_token(token.take())
                .send()
                .await
                .map_err(|e| s3_error("list prefixes", e))?;

            dirs.extend(output.common_prefixes().iter().filter_map(|cp| {
                cp.prefix()
                    .and_then(|p| p.strip_prefix(prefix.as_str()))
                    .map(|p| p.trim_end_matches('/').to_string())
                    .filter(|p| !p.is_empty())
            }));

            match output.next_continuation_token() {
                Some(next) if output.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string())
                }
                _ => break,
            }
        }
        Ok(dirs)
    }

    async fn remove_dir_all(&self, path: &str) -> Result<(), StorageError> {
        let keys = self.list_keys(&dir_prefix(path)).await?;
        try_join_all(keys.iter().map(|key| async move {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| s3_error("delete", e))
        }))
        .await?;
        info!("Deleted {} objects under s3://{}/{}", keys.len(), self.bucket, path);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Local directory
// ────────────────────────────────────────────────────────────────────────────

pub struct LocalAssetFs {
    root: PathBuf,
}

impl LocalAssetFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a namespace path under the root, rejecting anything that could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetFs for LocalAssetFs {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(self.resolve(path)?).await?;
        Ok(())
    }

    async fn write_file(
        &self,
        path: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &data).await?;
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Bytes, StorageError> {
        Ok(Bytes::from(tokio::fs::read(self.resolve(path)?).await?))
    }

    async fn list_dirs(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let mut entries = tokio::fs::read_dir(self.resolve(path)?).await?;
        let mut dirs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                dirs.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    async fn remove_dir_all(&self, path: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_dir_all(self.resolve(path)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
