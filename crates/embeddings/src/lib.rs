//! Embedding generation for chunk indexing and similarity search
//!
//! [`EmbeddingProvider`] is the synchronous text-to-vector seam. The default
//! implementation, [`EmbeddingService`], runs a local ONNX model through
//! fastembed. Callers on an async runtime run it inside `spawn_blocking`.

mod error;

use std::path::PathBuf;
use std::sync::Mutex;

use dbsage_core::EmbeddingConfig;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

pub use error::EmbeddingError;

/// Text → fixed-length vector.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts; the whole call fails if any text fails.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;
}

/// Map a configured model name to a fastembed model and its dimension.
fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    match name {
        "BAAI/bge-m3" | "bge-m3" => Ok((EmbeddingModel::BGEM3, 1024)),
        "intfloat/multilingual-e5-large" | "multilingual-e5-large" => {
            Ok((EmbeddingModel::MultilingualE5Large, 1024))
        },
        "BAAI/bge-small-en-v1.5" | "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "sentence-transformers/all-MiniLM-L6-v2" | "all-MiniLM-L6-v2" => {
            Ok((EmbeddingModel::AllMiniLML6V2, 384))
        },
        other => Err(EmbeddingError::UnknownModel(other.to_owned())),
    }
}

/// fastembed-backed provider. The ONNX session needs exclusive access, so
/// calls are serialized through a mutex.
pub struct EmbeddingService {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl EmbeddingService {
    /// Load (downloading on first use) the configured model.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let (model, dimension) = resolve_model(&config.model)?;
        let mut options = InitOptions::new(model).with_show_download_progress(false);
        if let Some(dir) = &config.cache_dir {
            options = options.with_cache_dir(PathBuf::from(dir));
        }
        let text_embedding =
            TextEmbedding::try_new(options).map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;
        tracing::info!(model = %config.model, dimension, "embedding model loaded");
        Ok(Self { model: Mutex::new(text_embedding), model_name: config.model.clone(), dimension })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl EmbeddingProvider for EmbeddingService {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text.to_owned()])?.pop().ok_or(EmbeddingError::EmptyResult)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self.model.lock().map_err(|_| EmbeddingError::LockPoisoned)?;
        let vectors =
            model.embed(texts.to_vec(), None).map_err(|e| EmbeddingError::Generation(e.to_string()))?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::EmptyResult);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
