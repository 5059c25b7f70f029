use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parquet file not found: {0}")]
    ParquetNotFound(PathBuf),

    #[error("case index not found at {0} (run `pressethics index build` first)")]
    IndexNotFound(PathBuf),

    #[error("table '{0}' not found in case index")]
    TableNotFound(String),

    #[error("table '{0}' has no cases")]
    EmptyIndex(String),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("{got} embeddings for {rows} rows")]
    EmbeddingCount { rows: usize, got: usize },

    #[error("embedding has {got} dimensions, expected {expected}")]
    Dimension { expected: usize, got: usize },

    #[cfg(feature = "lancedb")]
    #[error("lancedb error: {0}")]
    Lance(#[from] lancedb::Error),

    #[cfg(feature = "lancedb")]
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
