//! Press-ethics review pipeline.
//!
//! Fetch a news article, describe its images, retrieve similar prior
//! rulings, draft a verdict against the 16-clause code, and review it.

pub mod describer;
pub mod drafter;
mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "index")]
pub mod retriever;
pub mod reviewer;
pub mod traits;

#[cfg(test)]
mod testing;

pub use error::{AnnotationError, GenerationError, PipelineError, RetrievalError};
pub use pipeline::{Pipeline, RunReport};
pub use progress::{NoOpSink, ProgressSink, RecordingSink, Stage, StageEvent, StageStatus};
#[cfg(feature = "index")]
pub use retriever::{IndexRetriever, LazyEmbedder, QueryEmbedder};
pub use traits::{ArticleSource, CaseRetriever, ImageDescriber, TextGenerator};
