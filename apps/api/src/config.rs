use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_ASSET_NAMESPACE: &str = "AI-Resume-Analyzer";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// S3 / MinIO settings. Present only when `S3_BUCKET` is set.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Every backend is optional; missing ones degrade to local fallbacks.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub anthropic_api_key: Option<String>,
    pub redis_url: Option<String>,
    pub local_cache_dir: Option<PathBuf>,
    pub s3: Option<S3Config>,
    pub asset_dir: Option<PathBuf>,
    pub asset_namespace: String,
    pub pdftoppm_path: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let s3 = match get("S3_BUCKET") {
            Some(bucket) => Some(S3Config {
                bucket,
                endpoint: get("S3_ENDPOINT"),
                region: get("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: get("AWS_ACCESS_KEY_ID")
                    .context("S3_BUCKET is set but AWS_ACCESS_KEY_ID is not")?,
                secret_access_key: get("AWS_SECRET_ACCESS_KEY")
                    .context("S3_BUCKET is set but AWS_SECRET_ACCESS_KEY is not")?,
            }),
            None => None,
        };

        let asset_namespace = get("ASSET_NAMESPACE")
            .map(|ns| ns.trim_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_ASSET_NAMESPACE.to_string());
        if asset_namespace.is_empty() || asset_namespace.split('/').any(|c| c == "..") {
            bail!("ASSET_NAMESPACE must be a non-empty relative path");
        }

        Ok(Config {
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            redis_url: get("REDIS_URL"),
            local_cache_dir: get("LOCAL_CACHE_DIR").map(PathBuf::from),
            s3,
            asset_dir: get("ASSET_DIR").map(PathBuf::from),
            asset_namespace,
            pdftoppm_path: get("PDFTOPPM_PATH").unwrap_or_else(|| "pdftoppm".to_string()),
            max_upload_bytes: match get("MAX_UPLOAD_BYTES") {
                Some(v) => v
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a positive integer")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
        })
    }
}
