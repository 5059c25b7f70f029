use pressethics_ai::{GeminiError, ImageError};
use pressethics_core::ConfigError;
use pressethics_fetch::FetchError;
use pressethics_store::StoreError;
use thiserror::Error;

use crate::progress::Stage;

/// Failure to describe one article image.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("download of {url} failed: {source}")]
    Download { url: String, source: FetchError },
    #[error("image {url} is unusable: {source}")]
    Image { url: String, source: ImageError },
    #[error("description of {url} failed: {source}")]
    Model { url: String, source: GeminiError },
}

impl AnnotationError {
    pub fn image_url(&self) -> &str {
        match self {
            Self::Download { url, .. } | Self::Image { url, .. } | Self::Model { url, .. } => url,
        }
    }
}

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("embedding failed: {0}")]
    Embed(String),
    #[error("retrieval query is empty")]
    EmptyQuery,
    #[error("no similar cases returned")]
    NoResults,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Model(#[from] GeminiError),
    #[error("model returned blank text")]
    Blank,
}

/// A halted run. Each variant names the stage that failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("model client setup failed: {0}")]
    Client(#[source] GeminiError),
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[source] FetchError),
    #[error("fetch stage failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("describe stage failed: {0}")]
    Annotation(#[from] AnnotationError),
    #[error("retrieve stage failed: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("{stage} stage failed: {source}")]
    Generation {
        stage: Stage,
        source: GenerationError,
    },
}

impl PipelineError {
    /// The stage that failed, or `None` for errors raised before the run started.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Config(_) | Self::Client(_) | Self::HttpClient(_) => None,
            Self::Fetch(_) => Some(Stage::Fetch),
            Self::Annotation(_) => Some(Stage::Describe),
            Self::Retrieval(_) => Some(Stage::Retrieve),
            Self::Generation { stage, .. } => Some(*stage),
        }
    }

    pub fn draft(source: GenerationError) -> Self {
        Self::Generation {
            stage: Stage::Draft,
            source,
        }
    }

    pub fn review(source: GenerationError) -> Self {
        Self::Generation {
            stage: Stage::Review,
            source,
        }
    }
}
