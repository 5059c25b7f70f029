//! Pipeline configuration.
//!
//! Every field has a default; the CLI overrides them from flags, which in
//! turn fall back to environment variables (`GEMINI_MODEL`, `PRESSETHICS_INDEX`,
//! `PRESSETHICS_TOP_K`, …) and a `.env` file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::cases::DEFAULT_TABLE;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_INDEX_PATH: &str = "./lancedb";
pub const DEFAULT_EMBED_MODEL_DIR: &str = "./models/multilingual-e5-large-instruct";
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MAX_ARTICLE_CHARS: usize = 2000;
pub const DEFAULT_MAX_IMAGES: usize = 3;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
pub const DEFAULT_TEXT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_IMAGE_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },

    #[error("{field} must be within 0.0..=2.0, got {value}")]
    Temperature { field: &'static str, value: f32 },

    #[error("unknown image policy '{0}' (expected 'skip' or 'abort')")]
    ImagePolicy(String),
}

/// What to do when a single image cannot be described.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePolicy {
    /// Log a warning and continue without that annotation.
    #[default]
    Skip,
    /// Fail the run with an annotation error.
    Abort,
}

impl FromStr for ImagePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(ConfigError::ImagePolicy(other.to_string())),
        }
    }
}

impl fmt::Display for ImagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::Abort => "abort",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub model: String,
    pub gemini_base_url: String,
    pub index_path: PathBuf,
    pub table: String,
    pub embed_model_dir: PathBuf,
    /// Number of similar cases to retrieve.
    pub top_k: usize,
    /// Characters of `title + body` used for prompts and the retrieval query.
    pub max_article_chars: usize,
    pub max_images: usize,
    pub max_output_tokens: u32,
    pub draft_temperature: f32,
    pub review_temperature: f32,
    pub image_temperature: f32,
    pub image_policy: ImagePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            table: DEFAULT_TABLE.to_string(),
            embed_model_dir: PathBuf::from(DEFAULT_EMBED_MODEL_DIR),
            top_k: DEFAULT_TOP_K,
            max_article_chars: DEFAULT_MAX_ARTICLE_CHARS,
            max_images: DEFAULT_MAX_IMAGES,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            draft_temperature: DEFAULT_TEXT_TEMPERATURE,
            review_temperature: DEFAULT_TEXT_TEMPERATURE,
            image_temperature: DEFAULT_IMAGE_TEMPERATURE,
            image_policy: ImagePolicy::Skip,
        }
    }
}

impl PipelineConfig {
    /// Reject settings that would make a stage meaningless.
    ///
    /// `max_images = 0` is allowed and disables the image stage's work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Zero { field: "top_k" });
        }
        if self.max_article_chars == 0 {
            return Err(ConfigError::Zero {
                field: "max_article_chars",
            });
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::Zero {
                field: "max_output_tokens",
            });
        }
        for (field, value) in [
            ("draft_temperature", self.draft_temperature),
            ("review_temperature", self.review_temperature),
            ("image_temperature", self.image_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::Temperature { field, value });
            }
        }
        Ok(())
    }
}
