//! Model integrations: local ONNX embeddings, the hosted Gemini API, and
//! statistics over retrieved precedents.

#[cfg(feature = "onnx")]
mod embedder;
pub mod gemini;
pub mod inline_image;
pub mod precedent;

#[cfg(feature = "onnx")]
pub use embedder::{EmbedError, Embedder};
pub use gemini::{GeminiClient, GeminiError};
pub use inline_image::{ImageError, InlineImage};
pub use precedent::PrecedentTally;
