//! Remote Asset Store: one folder per analysis holding page images, the record
//! as `analysis.json`, and the original upload.
//!
//! Layout: `<namespace>/users/<owner>/<sanitized-name>-<created-at epoch ms>/`
//!   `page-1.png` … `page-N.png`, `analysis.json`, `resume.pdf`
//!
//! Every analysis folder belongs to one signed-in user; listing and deletion
//! never reach outside that user's root.
//!
//! Everything except `delete` is best-effort: an unavailable backend reads as
//! "nothing stored" and a failed save reads as "no assets".

use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::try_join_all;
use tracing::{debug, info, warn};

use crate::models::analysis::{AnalysisRecord, AssetManifest};
use crate::pdf::PageImage;
use crate::storage::fs::AssetFs;
use crate::storage::StorageError;

pub const METADATA_FILE: &str = "analysis.json";
pub const ORIGINAL_FILE: &str = "resume.pdf";
pub const USERS_DIR: &str = "users";

pub struct AssetStore {
    fs: Option<Arc<dyn AssetFs>>,
    namespace: String,
}

impl AssetStore {
    pub fn new(fs: Option<Arc<dyn AssetFs>>, namespace: impl Into<String>) -> Self {
        Self {
            fs,
            namespace: namespace.into(),
        }
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.fs.as_ref().map(|fs| fs.name())
    }

    /// Root folder of everything `owner` has stored.
    pub fn owner_root(&self, owner: &str) -> String {
        format!("{}/{USERS_DIR}/{}", self.namespace, owner_segment(owner))
    }

    /// True when `folder` is an analysis folder directly under `owner`'s root.
    pub fn is_owned_by(&self, owner: &str, folder: &str) -> bool {
        folder
            .strip_prefix(&self.owner_root(owner))
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|dir| !dir.is_empty() && !dir.contains('/') && dir != "." && dir != "..")
    }

    /// Saves every artifact of one analysis under `owner`'s root. Returns `None`
    /// when the backend is unavailable or any write fails; a partial folder is
    /// cleaned up.
    pub async fn save_assets(
        &self,
        owner: &str,
        name: &str,
        images: &[PageImage],
        record: &AnalysisRecord,
        original: &Bytes,
    ) -> Option<AssetManifest> {
        let fs = self.fs.as_ref()?;
        let folder = format!(
            "{}/{}-{}",
            self.owner_root(owner),
            sanitize_name(name),
            record.created_at.timestamp_millis()
        );

        match write_folder(fs.as_ref(), &folder, images, record, original).await {
            Ok(files) => {
                info!(
                    "Saved {} assets for analysis {} to {}",
                    files.len(),
                    record.id,
                    folder
                );
                Some(AssetManifest { folder, files })
            }
            Err(e) => {
                warn!("Failed to save assets for analysis {}: {e}", record.id);
                if let Err(cleanup) = fs.remove_dir_all(&folder).await {
                    warn!("Failed to clean up partial folder {folder}: {cleanup}");
                }
                None
            }
        }
    }

    /// Reads back `owner`'s stored analyses, newest first, each tagged with its
    /// folder. Folders without readable metadata are skipped.
    pub async fn list(&self, owner: &str) -> Vec<AnalysisRecord> {
        let Some(fs) = self.fs.as_ref() else {
            return Vec::new();
        };

        let root = self.owner_root(owner);
        let dirs = match fs.list_dirs(&root).await {
            Ok(dirs) => dirs,
            Err(e) => {
                debug!("No stored analyses under {root}: {e}");
                return Vec::new();
            }
        };

        let mut analyses = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let folder = format!("{root}/{dir}");
            let meta_path = format!("{folder}/{METADATA_FILE}");
            let record = match fs.read_file(&meta_path).await {
                Ok(raw) => serde_json::from_slice::<AnalysisRecord>(&raw).ok(),
                Err(_) => None,
            };
            match record {
                Some(mut record) => {
                    record.storage_path = Some(folder);
                    analyses.push(record);
                }
                None => debug!("Skipping {folder}: missing or invalid {METADATA_FILE}"),
            }
        }

        analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        analyses
    }

    /// Recursively removes an analysis folder. Returns `Ok(false)` when there is
    /// no backend to delete from.
    pub async fn delete(&self, folder: &str) -> Result<bool, StorageError> {
        let Some(fs) = self.fs.as_ref() else {
            return Ok(false);
        };
        fs.remove_dir_all(folder)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to delete analysis: {e}")))?;
        info!("Deleted stored analysis folder {folder}");
        Ok(true)
    }

    /// Best-effort write of one pretty-printed JSON document under the namespace.
    /// Returns the written path.
    pub async fn write_document(
        &self,
        relative_path: &str,
        document: &serde_json::Value,
    ) -> Option<String> {
        let fs = self.fs.as_ref()?;
        let path = format!("{}/{}", self.namespace, relative_path.trim_start_matches('/'));
        let body = match serde_json::to_vec_pretty(document) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to serialize document for {path}: {e}");
                return None;
            }
        };
        match fs
            .write_file(&path, Bytes::from(body), "application/json")
            .await
        {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Failed to write {path}: {e}");
                None
            }
        }
    }
}

async fn write_folder(
    fs: &dyn AssetFs,
    folder: &str,
    images: &[PageImage],
    record: &AnalysisRecord,
    original: &Bytes,
) -> Result<Vec<String>, StorageError> {
    fs.create_dir(folder).await?;

    // Pages are independent; fire all writes and wait for every one.
    let mut files = try_join_all(images.iter().map(|image| async move {
        let path = format!("{folder}/page-{}.png", image.page);
        fs.write_file(&path, image.png.clone(), "image/png").await?;
        Ok::<_, StorageError>(path)
    }))
    .await?;

    let meta_path = format!("{folder}/{METADATA_FILE}");
    let metadata = serde_json::to_vec_pretty(record)?;
    fs.write_file(&meta_path, Bytes::from(metadata), "application/json")
        .await?;
    files.push(meta_path);

    let original_path = format!("{folder}/{ORIGINAL_FILE}");
    fs.write_file(&original_path, original.clone(), "application/pdf")
        .await?;
    files.push(original_path);

    Ok(files)
}

/// Injective folder-safe form of a user id: ASCII letters, digits and `-` are
/// kept, every other byte becomes `_` plus two hex digits.
fn owner_segment(owner: &str) -> String {
    let mut out = String::with_capacity(owner.len());
    for b in owner.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("_{b:02x}"));
        }
    }
    if out.is_empty() {
        "_".to_string()
    } else {
        out
    }
}

/// Folder-safe form of an upload name: extension dropped, anything outside
/// `[A-Za-z0-9._-]` turned into `-`, runs of `-` collapsed.
pub fn sanitize_name(name: &str) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };

    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches(|c| c == '-' || c == '.');
    if trimmed.is_empty() {
        "resume".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fs::LocalAssetFs;
    use crate::test_support::{sample_pages, sample_record, FailingWritesFs};

    const NS: &str = "AI-Resume-Analyzer";
    const OWNER: &str = "user-1";

    fn local_store(dir: &tempfile::TempDir) -> AssetStore {
        AssetStore::new(Some(Arc::new(LocalAssetFs::new(dir.path()))), NS)
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Jane Doe CV.pdf"), "Jane-Doe-CV");
        assert_eq!(sanitize_name("résumé (final).v2.pdf"), "r-sum-final-.v2");
        assert_eq!(sanitize_name("../../etc.pdf"), "etc");
        assert_eq!(sanitize_name(".pdf"), "pdf");
        assert_eq!(sanitize_name("???"), "resume");
    }

    #[test]
    fn test_owner_segment_is_injective_and_path_safe() {
        assert_eq!(owner_segment("user-42"), "user-42");
        assert_eq!(owner_segment("a.b"), "a_2eb");
        assert_eq!(owner_segment("a_b"), "a_5fb");
        assert_eq!(owner_segment("../x"), "_2e_2e_2fx");
        assert_eq!(owner_segment(""), "_");
    }

    #[test]
    fn test_is_owned_by_only_matches_direct_children() {
        let store = AssetStore::new(None, NS);
        let root = store.owner_root("alice");
        assert_eq!(root, "AI-Resume-Analyzer/users/alice");
        assert!(store.is_owned_by("alice", &format!("{root}/cv-1")));
        assert!(!store.is_owned_by("alice", &root));
        assert!(!store.is_owned_by("alice", &format!("{root}/cv-1/page-1.png")));
        assert!(!store.is_owned_by("alice", &format!("{root}/..")));
        assert!(!store.is_owned_by("alice", "AI-Resume-Analyzer/users/alice2/cv-1"));
        assert!(!store.is_owned_by("bob", &format!("{root}/cv-1")));
    }

    #[tokio::test]
    async fn test_save_assets_writes_layout_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir);
        let record = sample_record("Jane Doe.pdf", 77.0);
        let original = Bytes::from_static(b"%PDF-1.7 fake");

        let manifest = store
            .save_assets(OWNER, "Jane Doe.pdf", &sample_pages(3), &record, &original)
            .await
            .expect("assets should be saved");

        let expected_folder = format!(
            "{NS}/users/{OWNER}/Jane-Doe-{}",
            record.created_at.timestamp_millis()
        );
        assert_eq!(manifest.folder, expected_folder);
        let names: Vec<_> = manifest
            .files
            .iter()
            .map(|f| f.rsplit('/').next().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["page-1.png", "page-2.png", "page-3.png", "analysis.json", "resume.pdf"]
        );
        for file in &manifest.files {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }
        let stored = std::fs::read(dir.path().join(&expected_folder).join("resume.pdf")).unwrap();
        assert_eq!(stored, b"%PDF-1.7 fake");
    }

    #[tokio::test]
    async fn test_save_assets_without_backend_is_none() {
        let store = AssetStore::new(None, NS);
        let record = sample_record("a.pdf", 50.0);
        let result = store
            .save_assets(OWNER, "a.pdf", &sample_pages(1), &record, &Bytes::new())
            .await;
        assert!(result.is_none());
        assert!(store.backend_name().is_none());
    }

    #[tokio::test]
    async fn test_save_assets_failure_is_none() {
        let store = AssetStore::new(Some(Arc::new(FailingWritesFs)), NS);
        let record = sample_record("a.pdf", 50.0);
        let result = store
            .save_assets(OWNER, "a.pdf", &sample_pages(2), &record, &Bytes::new())
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_reads_back_sorted_with_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir);

        let mut older = sample_record("older.pdf", 40.0);
        older.created_at = older.created_at - chrono::Duration::hours(2);
        let newer = sample_record("newer.pdf", 90.0);

        let older_manifest = store
            .save_assets(OWNER, "older.pdf", &[], &older, &Bytes::new())
            .await
            .unwrap();
        store
            .save_assets(OWNER, "newer.pdf", &sample_pages(1), &newer, &Bytes::new())
            .await
            .unwrap();
        // Feedback lives in the same namespace and has no metadata file.
        store
            .write_document("feedback/1.json", &serde_json::json!({"rating": 5}))
            .await
            .unwrap();
        // Unparsable metadata is skipped too.
        let broken = dir.path().join(store.owner_root(OWNER)).join("broken-1");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join(METADATA_FILE), "nope").unwrap();
        // Another user's analyses stay out of the listing.
        store
            .save_assets(
                "someone-else",
                "theirs.pdf",
                &[],
                &sample_record("theirs.pdf", 1.0),
                &Bytes::new(),
            )
            .await
            .unwrap();

        let listed = store.list(OWNER).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
        assert_eq!(listed[1].storage_path.as_deref(), Some(older_manifest.folder.as_str()));
        assert!(listed[0].assets.is_none());
    }

    #[tokio::test]
    async fn test_list_missing_namespace_or_backend_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(local_store(&dir).list(OWNER).await.is_empty());
        assert!(AssetStore::new(None, NS).list(OWNER).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir);
        let record = sample_record("gone.pdf", 10.0);
        let manifest = store
            .save_assets(OWNER, "gone.pdf", &sample_pages(1), &record, &Bytes::new())
            .await
            .unwrap();

        assert!(store.delete(&manifest.folder).await.unwrap());
        assert!(store.list(OWNER).await.is_empty());
        assert!(!AssetStore::new(None, NS).delete(&manifest.folder).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported() {
        let store = AssetStore::new(Some(Arc::new(FailingWritesFs)), NS);
        let err = store.delete("AI-Resume-Analyzer/x-1").await.unwrap_err();
        assert!(err.to_string().contains("Failed to delete analysis"));
    }
}
