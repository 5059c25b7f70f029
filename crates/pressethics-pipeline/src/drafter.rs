//! Verdict drafting stage.

use pressethics_ai::PrecedentTally;
use pressethics_core::{Article, ImageAnnotation, SimilarCase, Verdict};
use tracing::{info, warn};

use crate::error::GenerationError;
use crate::prompts;
use crate::traits::TextGenerator;

pub struct Drafter<'a> {
    generator: &'a dyn TextGenerator,
    temperature: f32,
    max_article_chars: usize,
}

impl<'a> Drafter<'a> {
    pub fn new(generator: &'a dyn TextGenerator, temperature: f32, max_article_chars: usize) -> Self {
        Self {
            generator,
            temperature,
            max_article_chars,
        }
    }

    /// One generation call; the reply is parsed into a [`Verdict`].
    ///
    /// Citations that do not resolve are logged here and re-checked by the
    /// reviewer.
    pub async fn draft(
        &self,
        article: &Article,
        annotations: &[ImageAnnotation],
        cases: &[SimilarCase],
        tally: &PrecedentTally,
    ) -> Result<Verdict, GenerationError> {
        let prompt =
            prompts::draft_prompt(article, annotations, cases, tally, self.max_article_chars);
        let text = self.generator.generate(&prompt, self.temperature).await?;
        if text.trim().is_empty() {
            return Err(GenerationError::Blank);
        }

        let (verdict, issues) = Verdict::from_model_text(&text);
        for issue in &issues {
            warn!(%issue, "draft cites a provision outside the code");
        }
        info!(
            outcome = ?verdict.outcome,
            clauses = ?verdict.cited_clauses,
            precedents = %tally.summary(),
            "draft complete"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RULING, ScriptedGenerator, article_with_images, case};
    use pressethics_core::{ClauseId, Outcome, PriorVerdict};

    #[tokio::test]
    async fn violation_draft_is_parsed() {
        let generator = ScriptedGenerator::replying(&[RULING]);
        let drafter = Drafter::new(&generator, 0.0, 2000);
        let cases = vec![case("a", PriorVerdict::Violation, Some(7), 0.9)];
        let verdict = drafter
            .draft(
                &article_with_images(0),
                &[],
                &cases,
                &PrecedentTally::from_cases(&cases),
            )
            .await
            .unwrap();

        assert_eq!(verdict.outcome, Outcome::Violation);
        assert!(verdict.cites(ClauseId::new(7).unwrap()));
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].1, 0.0);
        assert!(prompts[0].0.contains("#유사사례:"));
    }

    #[tokio::test]
    async fn no_violation_draft() {
        let generator = ScriptedGenerator::replying(&["위반 없음"]);
        let drafter = Drafter::new(&generator, 0.0, 2000);
        let verdict = drafter
            .draft(&article_with_images(0), &[], &[], &PrecedentTally::default())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::no_violation());
    }

    #[tokio::test]
    async fn no_violation_draft_that_mentions_a_clause() {
        let generator = ScriptedGenerator::replying(&[
            "위반 없음. 제7조「범죄보도」에 해당하는 내용은 확인되지 않는다.",
        ]);
        let drafter = Drafter::new(&generator, 0.0, 2000);
        let verdict = drafter
            .draft(&article_with_images(0), &[], &[], &PrecedentTally::default())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::no_violation());
    }

    #[tokio::test]
    async fn blank_reply_is_an_error() {
        let generator = ScriptedGenerator::replying(&["  \n"]);
        let drafter = Drafter::new(&generator, 0.0, 2000);
        let err = drafter
            .draft(&article_with_images(0), &[], &[], &PrecedentTally::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Blank));
    }
}
