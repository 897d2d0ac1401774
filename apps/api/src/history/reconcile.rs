//! Chooses the store that backs the history view and keeps deletions
//! consistent across the local cache and the remote asset store.
//!
//! The remote store is only ever read or modified within the signed-in
//! user's own root; anonymous sessions see the local cache alone.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::AnalysisRecord;
use crate::session::Session;
use crate::storage::assets::AssetStore;
use crate::storage::cache::AnalysisCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplaySource {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisListing {
    pub source: DisplaySource,
    pub analyses: Vec<AnalysisRecord>,
}

/// Remote wins for a signed-in user who has remote records; otherwise local.
/// The two lists are never merged.
pub fn select_display(
    session: &Session,
    remote: Vec<AnalysisRecord>,
    local: Vec<AnalysisRecord>,
) -> AnalysisListing {
    if session.is_authenticated() && !remote.is_empty() {
        AnalysisListing {
            source: DisplaySource::Remote,
            analyses: remote,
        }
    } else {
        AnalysisListing {
            source: DisplaySource::Local,
            analyses: local,
        }
    }
}

pub async fn load_display(
    session: &Session,
    cache: &AnalysisCache,
    assets: &AssetStore,
) -> AnalysisListing {
    let remote = remote_records(session, assets).await;
    let local = cache.load().await;
    select_display(session, remote, local)
}

async fn remote_records(session: &Session, assets: &AssetStore) -> Vec<AnalysisRecord> {
    match &session.user {
        Some(user) => assets.list(&user.id).await,
        None => Vec::new(),
    }
}

/// Local cache first; the remote store is only searched for signed-in users.
pub async fn find_analysis(
    session: &Session,
    cache: &AnalysisCache,
    assets: &AssetStore,
    id: Uuid,
) -> Option<AnalysisRecord> {
    if let Some(record) = cache.find(id).await {
        return Some(record);
    }
    remote_records(session, assets)
        .await
        .into_iter()
        .find(|r| r.id == id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub id: Uuid,
    pub deleted_folders: Vec<String>,
    pub remaining: usize,
}

/// Deletes remote folders first, then the cache entry. A failed folder
/// delete leaves the cache untouched so the user can retry.
///
/// Only folders under the caller's own root are touched. An anonymous caller
/// can drop a cache entry but never a remote folder.
pub async fn delete_analysis(
    session: &Session,
    cache: &AnalysisCache,
    assets: &AssetStore,
    id: Uuid,
) -> Result<DeleteOutcome, AppError> {
    let remote = remote_records(session, assets).await;
    let local = cache.find(id).await;

    let mut folders: Vec<String> = remote
        .iter()
        .filter(|r| r.id == id)
        .filter_map(|r| r.storage_path.clone())
        .collect();
    let known_remotely = remote.iter().any(|r| r.id == id);
    let local_folder = local
        .as_ref()
        .and_then(|r| r.assets.as_ref())
        .map(|a| a.folder.clone());
    if let (Some(user), Some(folder)) = (&session.user, local_folder) {
        if assets.is_owned_by(&user.id, &folder) && !folders.contains(&folder) {
            folders.push(folder);
        }
    }

    if local.is_none() && !known_remotely {
        return Err(AppError::NotFound(format!("Analysis {id} not found")));
    }

    let mut deleted_folders = Vec::with_capacity(folders.len());
    for folder in folders {
        if assets.delete(&folder).await? {
            deleted_folders.push(folder);
        }
    }

    let remaining = cache.remove(id).await?.len();
    info!(
        "Deleted analysis {id} ({} folders, {remaining} cached analyses left)",
        deleted_folders.len()
    );
    Ok(DeleteOutcome {
        id,
        deleted_folders,
        remaining,
    })
}
