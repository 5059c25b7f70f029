//! Seams between the orchestrator and the services each stage calls.
//!
//! Production implementations live next to the stage that uses them; tests
//! substitute in-process fakes.

use async_trait::async_trait;
use pressethics_ai::GeminiClient;
use pressethics_core::{Article, SimilarCase};
use pressethics_fetch::{ArticleFetcher, FetchError};

use crate::error::{AnnotationError, GenerationError, RetrievalError};

#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Article, FetchError>;
}

#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Describe one image of `article` in Korean.
    async fn describe(&self, image_url: &str, article: &Article) -> Result<String, AnnotationError>;
}

#[async_trait]
pub trait CaseRetriever: Send + Sync {
    /// Up to `k` precedents, most similar first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SimilarCase>, RetrievalError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError>;
}

#[async_trait]
impl ArticleSource for ArticleFetcher {
    async fn fetch(&self, url: &str) -> Result<Article, FetchError> {
        ArticleFetcher::fetch(self, url).await
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        let text = self.generate_text(prompt, temperature).await?;
        if text.trim().is_empty() {
            return Err(GenerationError::Blank);
        }
        Ok(text)
    }
}
