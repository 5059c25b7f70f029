//! Similar-case retrieval over the LanceDB case index.
//!
//! The index and the embedding model are both opened on first use, so a run
//! that fails at the fetch stage never touches either.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pressethics_ai::Embedder;
use pressethics_core::{PipelineConfig, SimilarCase};
use pressethics_store::CaseIndex;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::RetrievalError;
use crate::traits::CaseRetriever;

/// Synchronous query embedding.
pub trait QueryEmbedder: Send {
    fn embed_query(&mut self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

/// ONNX embedder loaded from `model_dir` on the first query.
pub struct LazyEmbedder {
    model_dir: PathBuf,
    inner: Option<Embedder>,
}

impl LazyEmbedder {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            inner: None,
        }
    }

    fn loaded(&mut self) -> Result<&mut Embedder, RetrievalError> {
        if self.inner.is_none() {
            let embedder = Embedder::load(&self.model_dir)
                .map_err(|e| RetrievalError::Embed(e.to_string()))?;
            info!(
                model = embedder.model_name(),
                dim = embedder.dim(),
                "embedding model loaded"
            );
            self.inner = Some(embedder);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| RetrievalError::Embed("embedder not loaded".into()))
    }
}

impl QueryEmbedder for LazyEmbedder {
    fn embed_query(&mut self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        self.loaded()?
            .embed(text)
            .map_err(|e| RetrievalError::Embed(e.to_string()))
    }
}

pub struct IndexRetriever {
    index_path: PathBuf,
    table: String,
    index: OnceCell<CaseIndex>,
    embedder: Arc<Mutex<Box<dyn QueryEmbedder>>>,
}

impl IndexRetriever {
    pub fn new(index_path: &Path, table: &str, embedder: Box<dyn QueryEmbedder>) -> Self {
        Self {
            index_path: index_path.to_path_buf(),
            table: table.to_string(),
            index: OnceCell::new(),
            embedder: Arc::new(Mutex::new(embedder)),
        }
    }

    /// Retriever backed by the configured index and ONNX model directory.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            &config.index_path,
            &config.table,
            Box::new(LazyEmbedder::new(&config.embed_model_dir)),
        )
    }

    async fn index(&self) -> Result<&CaseIndex, RetrievalError> {
        Ok(self
            .index
            .get_or_try_init(|| CaseIndex::open(&self.index_path, &self.table))
            .await?)
    }

    /// Model inference runs on the blocking pool, off the async workers.
    async fn embed(&self, query: &str) -> Result<Vec<f32>, RetrievalError> {
        let embedder = Arc::clone(&self.embedder);
        let query = query.to_string();
        tokio::task::spawn_blocking(move || {
            let mut embedder = embedder
                .lock()
                .map_err(|_| RetrievalError::Embed("embedder lock poisoned".into()))?;
            embedder.embed_query(&query)
        })
        .await
        .map_err(|e| RetrievalError::Embed(format!("embedding task failed: {e}")))?
    }
}

#[async_trait]
impl CaseRetriever for IndexRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SimilarCase>, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        let index = self.index().await?;
        let vector = self.embed(query).await?;
        debug!(dim = vector.len(), k, "query embedded");
        Ok(index.search(&vector, k).await?)
    }
}
