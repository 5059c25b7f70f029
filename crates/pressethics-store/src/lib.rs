//! Storage layer: the LanceDB index of prior press-ethics rulings.

pub mod batch;
mod error;
pub use error::StoreError;

#[cfg(feature = "lancedb")]
mod lance;
#[cfg(feature = "lancedb")]
pub use lance::{CaseIndex, read_parquet};
