//! Fakes and fixtures shared by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use crate::analysis::pipeline::{AnalysisGate, AnalysisPipeline};
use crate::analysis::scorer::AtsScorer;
use crate::errors::AppError;
use crate::models::analysis::AnalysisRecord;
use crate::pdf::{PageImage, PdfConverter};
use crate::session::{Session, SessionUser};
use crate::state::AppState;
use crate::storage::assets::AssetStore;
use crate::storage::cache::AnalysisCache;
use crate::storage::fs::{AssetFs, LocalAssetFs};
use crate::storage::kv::{KvBackend, MemoryKv};
use crate::storage::StorageError;

/// Model output wrapped in prose, as models often reply.
pub const VALID_AI_RESPONSE: &str = r#"Here is the analysis:
{
  "atsScore": 78,
  "matchPercentage": 64,
  "summary": "Strong systems background, light on cloud tooling.",
  "strengths": ["Rust", "Distributed systems"],
  "weaknesses": ["No Kubernetes"],
  "missingKeywords": ["Kubernetes", "Terraform"],
  "skillsMatch": { "matched": ["Rust"], "missing": ["Kubernetes"] },
  "experienceRelevance": "High",
  "formattingIssues": [],
  "recommendations": ["Quantify impact in the latest role"],
  "sectionScores": { "contactInfo": 100, "summary": 70, "experience": 80, "education": 75, "skills": 65 }
}"#;

pub fn sample_record(name: &str, ats_score: f64) -> AnalysisRecord {
    AnalysisRecord::new(
        name,
        "Backend engineer",
        json!({ "atsScore": ats_score, "summary": format!("Summary for {name}") }),
    )
}

pub fn signed_in(id: &str) -> Session {
    Session {
        user: Some(SessionUser {
            id: id.to_string(),
            name: None,
        }),
    }
}

pub fn sample_pages(count: u32) -> Vec<PageImage> {
    (1..=count)
        .map(|page| PageImage {
            page,
            png: Bytes::from(format!("png-bytes-{page}")),
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Storage fakes
// ────────────────────────────────────────────────────────────────────────────

/// Every operation fails, as an unreachable Redis would.
pub struct FailingKv;

#[async_trait]
impl KvBackend for FailingKv {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Backend("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("connection refused".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("connection refused".to_string()))
    }
}

/// Accepts directory creation, rejects everything else.
pub struct FailingWritesFs;

#[async_trait]
impl AssetFs for FailingWritesFs {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn create_dir(&self, _path: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn write_file(
        &self,
        path: &str,
        _data: Bytes,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        Err(StorageError::Backend(format!("quota exceeded writing {path}")))
    }

    async fn read_file(&self, path: &str) -> Result<Bytes, StorageError> {
        Err(StorageError::Backend(format!("cannot read {path}")))
    }

    async fn list_dirs(&self, _path: &str) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Backend("listing denied".to_string()))
    }

    async fn remove_dir_all(&self, _path: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("permission denied".to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline collaborator fakes
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeConverter {
    pages: Option<u32>,
    text: String,
}

impl FakeConverter {
    pub fn pages(count: u32) -> Self {
        Self {
            pages: Some(count),
            text: "Jane Doe\nSenior Rust Engineer\nBuilt distributed storage systems.".to_string(),
        }
    }

    /// Fails rendering, as an invalid PDF would.
    pub fn broken() -> Self {
        Self {
            pages: None,
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

#[async_trait]
impl PdfConverter for FakeConverter {
    async fn to_images(&self, _pdf: &Bytes) -> Result<Vec<PageImage>, AppError> {
        match self.pages {
            Some(count) => Ok(sample_pages(count)),
            None => Err(AppError::Conversion("Invalid PDF structure".to_string())),
        }
    }

    async fn extract_text(&self, _pdf: &Bytes) -> Result<String, AppError> {
        Ok(self.text.clone())
    }
}

pub struct FakeScorer {
    response: Result<String, String>,
    calls: Mutex<Vec<usize>>,
}

impl FakeScorer {
    pub fn ok(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of images passed on each call so far.
    pub fn seen_image_counts(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AtsScorer for FakeScorer {
    async fn score(
        &self,
        _resume_text: &str,
        _job_description: &str,
        images: &[PageImage],
    ) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(images.len());
        self.response.clone().map_err(AppError::Llm)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// App state
// ────────────────────────────────────────────────────────────────────────────

/// Full app state over in-memory cache and a temp-dir asset store.
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn test_state(scorer: FakeScorer) -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(AnalysisCache::new(Arc::new(MemoryKv::new())));
    let assets = Arc::new(AssetStore::new(
        Some(Arc::new(LocalAssetFs::new(dir.path()))),
        "AI-Resume-Analyzer",
    ));
    let pipeline = Arc::new(AnalysisPipeline::new(
        Arc::new(FakeConverter::pages(2)),
        Some(Arc::new(scorer)),
        assets.clone(),
        cache.clone(),
    ));
    let state = AppState {
        cache,
        assets,
        pipeline,
        gate: Arc::new(AnalysisGate::new()),
    };
    (state, dir)
}
