//! Verdict review stage.
//!
//! A "no violation" draft passes untouched. Otherwise the model rewrites the
//! draft, the rewrite replaces it, and its citations are checked against the
//! clause table.

use pressethics_core::{Article, Review, Verdict};
use tracing::{info, warn};

use crate::error::GenerationError;
use crate::prompts::{self, REVIEWER_META_PHRASES};
use crate::traits::TextGenerator;

pub struct Reviewer<'a> {
    generator: &'a dyn TextGenerator,
    temperature: f32,
    max_article_chars: usize,
}

impl<'a> Reviewer<'a> {
    pub fn new(generator: &'a dyn TextGenerator, temperature: f32, max_article_chars: usize) -> Self {
        Self {
            generator,
            temperature,
            max_article_chars,
        }
    }

    pub async fn review(&self, article: &Article, draft: &Verdict) -> Result<Review, GenerationError> {
        if !draft.is_violation() {
            info!("draft found no violation, review skipped");
            return Ok(Review {
                passed: true,
                issues: Vec::new(),
                verdict: Verdict::no_violation(),
            });
        }

        let prompt = prompts::review_prompt(article, &draft.final_text, self.max_article_chars);
        let text = self.generator.generate(&prompt, self.temperature).await?;
        if text.trim().is_empty() {
            return Err(GenerationError::Blank);
        }

        let (verdict, citation_issues) = Verdict::from_model_text(&text);
        let mut issues: Vec<String> = citation_issues.iter().map(ToString::to_string).collect();
        if verdict.is_violation() && verdict.cited_clauses.is_empty() {
            issues.push("위반 결정이지만 인용된 조항이 없습니다".to_string());
        }
        for phrase in REVIEWER_META_PHRASES {
            if verdict.final_text.contains(phrase) {
                issues.push(format!("검토 의견이 남아 있습니다: \"{phrase}\""));
            }
        }

        for issue in &issues {
            warn!(%issue, "review issue");
        }
        info!(
            outcome = ?verdict.outcome,
            clauses = ?verdict.cited_clauses,
            issues = issues.len(),
            "review complete"
        );
        Ok(Review {
            passed: issues.is_empty(),
            issues,
            verdict,
        })
    }
}
