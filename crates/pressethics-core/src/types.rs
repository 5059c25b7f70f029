//! Records passed between pipeline stages.

use serde::{Deserialize, Serialize};

use crate::clause::ClauseId;
use crate::verdict::is_no_violation;

/// A fetched news article. Immutable once built by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub body_text: String,
    /// Absolute image URLs in document order, deduplicated.
    pub image_urls: Vec<String>,
}

impl Article {
    /// `title body` truncated to `max_chars` characters.
    ///
    /// Used both as the retrieval query and as the article section of prompts.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let joined = if self.title.is_empty() {
            self.body_text.clone()
        } else {
            format!("{} {}", self.title, self.body_text)
        };
        truncate_chars(&joined, max_chars).to_string()
    }

    /// Body text truncated to `max_chars` characters.
    pub fn body_excerpt(&self, max_chars: usize) -> &str {
        truncate_chars(&self.body_text, max_chars)
    }
}

/// Slice `s` to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Model-written description of one article image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnnotation {
    pub image_url: String,
    pub description: String,
}

/// Outcome recorded for a prior ruling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorVerdict {
    Violation,
    NoViolation,
}

impl PriorVerdict {
    /// Classify a stored verdict string (`"위반 없음"`, `"주의"`, `"경고"`, …).
    pub fn from_text(text: &str) -> Self {
        if is_no_violation(text) {
            Self::NoViolation
        } else {
            Self::Violation
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Violation => "위반",
            Self::NoViolation => "위반 없음",
        }
    }
}

/// A prior ruling retrieved by embedding similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarCase {
    pub case_id: String,
    pub case_text: String,
    pub matched_clause_id: Option<ClauseId>,
    pub prior_verdict: PriorVerdict,
    /// Cosine similarity, higher is closer.
    pub similarity_score: f32,
}
