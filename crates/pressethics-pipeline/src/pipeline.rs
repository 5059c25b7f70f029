//! Sequential orchestration of the five stages.
//!
//! Each stage awaits the previous one. The first failure ends the run:
//! the failed stage gets a `Failed` event, every later stage a `Skipped`
//! event, and the error is returned without calling anything downstream.

use std::sync::Arc;
use std::time::Instant;

use pressethics_ai::PrecedentTally;
use pressethics_core::{Article, ImageAnnotation, PipelineConfig, Review, SimilarCase, Verdict};
use serde::Serialize;
use tracing::{error, info};

use crate::describer::describe_images;
use crate::drafter::Drafter;
use crate::error::{PipelineError, RetrievalError};
use crate::progress::{NoOpSink, ProgressSink, Stage, StageEvent, StageStatus};
use crate::reviewer::Reviewer;
use crate::traits::{ArticleSource, CaseRetriever, ImageDescriber, TextGenerator};

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub article: Article,
    pub annotations: Vec<ImageAnnotation>,
    pub similar_cases: Vec<SimilarCase>,
    pub tally: PrecedentTally,
    pub draft: Verdict,
    pub review: Review,
    pub events: Vec<StageEvent>,
    pub elapsed_ms: u64,
}

impl RunReport {
    /// The reviewed, final verdict.
    pub fn verdict(&self) -> &Verdict {
        &self.review.verdict
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn ArticleSource>,
    describer: Arc<dyn ImageDescriber>,
    retriever: Arc<dyn CaseRetriever>,
    generator: Arc<dyn TextGenerator>,
    sink: Arc<dyn ProgressSink>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn ArticleSource>,
        describer: Arc<dyn ImageDescriber>,
        retriever: Arc<dyn CaseRetriever>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            describer,
            retriever,
            generator,
            sink: Arc::new(NoOpSink),
        })
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, url: &str) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let mut events = Vec::new();
        info!(url, "analysis started");

        // 1. Fetch
        self.emit(&mut events, Stage::Fetch, StageStatus::Started, None);
        let article = match self.source.fetch(url).await {
            Ok(article) => article,
            Err(e) => return Err(self.halt(&mut events, Stage::Fetch, e.into())),
        };
        self.emit(
            &mut events,
            Stage::Fetch,
            StageStatus::Completed,
            Some(format!(
                "{} ({}자, 이미지 {}개)",
                article.title,
                article.body_text.chars().count(),
                article.image_urls.len()
            )),
        );

        // 2. Describe images
        let annotations = if article.image_urls.is_empty() || self.config.max_images == 0 {
            self.emit(
                &mut events,
                Stage::Describe,
                StageStatus::Skipped,
                Some("이미지 없음".into()),
            );
            Vec::new()
        } else {
            self.emit(&mut events, Stage::Describe, StageStatus::Started, None);
            match describe_images(
                self.describer.as_ref(),
                &article,
                self.config.max_images,
                self.config.image_policy,
            )
            .await
            {
                Ok(annotations) => {
                    self.emit(
                        &mut events,
                        Stage::Describe,
                        StageStatus::Completed,
                        Some(format!("{}개 분석", annotations.len())),
                    );
                    annotations
                }
                Err(e) => return Err(self.halt(&mut events, Stage::Describe, e.into())),
            }
        };

        // 3. Retrieve precedents
        self.emit(&mut events, Stage::Retrieve, StageStatus::Started, None);
        let query = article.excerpt(self.config.max_article_chars);
        let similar_cases = match self.retriever.retrieve(&query, self.config.top_k).await {
            Ok(cases) if cases.is_empty() => {
                return Err(self.halt(
                    &mut events,
                    Stage::Retrieve,
                    RetrievalError::NoResults.into(),
                ));
            }
            Ok(cases) => cases,
            Err(e) => return Err(self.halt(&mut events, Stage::Retrieve, e.into())),
        };
        let tally = PrecedentTally::from_cases(&similar_cases);
        self.emit(
            &mut events,
            Stage::Retrieve,
            StageStatus::Completed,
            Some(tally.summary()),
        );

        // 4. Draft
        self.emit(&mut events, Stage::Draft, StageStatus::Started, None);
        let drafter = Drafter::new(
            self.generator.as_ref(),
            self.config.draft_temperature,
            self.config.max_article_chars,
        );
        let draft = match drafter
            .draft(&article, &annotations, &similar_cases, &tally)
            .await
        {
            Ok(draft) => draft,
            Err(e) => return Err(self.halt(&mut events, Stage::Draft, PipelineError::draft(e))),
        };
        self.emit(&mut events, Stage::Draft, StageStatus::Completed, None);

        // 5. Review
        self.emit(&mut events, Stage::Review, StageStatus::Started, None);
        let reviewer = Reviewer::new(
            self.generator.as_ref(),
            self.config.review_temperature,
            self.config.max_article_chars,
        );
        let review = match reviewer.review(&article, &draft).await {
            Ok(review) => review,
            Err(e) => return Err(self.halt(&mut events, Stage::Review, PipelineError::review(e))),
        };
        let detail = if review.passed {
            None
        } else {
            Some(format!("검토 의견 {}건", review.issues.len()))
        };
        self.emit(&mut events, Stage::Review, StageStatus::Completed, detail);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            url,
            outcome = ?review.verdict.outcome,
            passed = review.passed,
            elapsed_ms,
            "analysis complete"
        );
        Ok(RunReport {
            article,
            annotations,
            similar_cases,
            tally,
            draft,
            review,
            events,
            elapsed_ms,
        })
    }

    fn emit(
        &self,
        events: &mut Vec<StageEvent>,
        stage: Stage,
        status: StageStatus,
        detail: Option<String>,
    ) {
        let event = StageEvent::new(stage, status, detail);
        info!(
            stage = %stage,
            status = ?status,
            detail = event.detail.as_deref().unwrap_or(""),
            "stage {}/{}",
            stage.position(),
            Stage::ALL.len()
        );
        self.sink.on_event(&event);
        events.push(event);
    }

    /// Record the failure, mark the remaining stages skipped, and hand the error back.
    fn halt(&self, events: &mut Vec<StageEvent>, stage: Stage, err: PipelineError) -> PipelineError {
        error!(stage = %stage, error = %err, "pipeline halted");
        self.emit(events, stage, StageStatus::Failed, Some(err.to_string()));
        for &later in stage.following() {
            self.emit(events, later, StageStatus::Skipped, None);
        }
        err
    }
}

#[cfg(feature = "index")]
mod gemini {
    use std::sync::Arc;

    use pressethics_ai::GeminiClient;
    use pressethics_core::PipelineConfig;
    use pressethics_fetch::ArticleFetcher;

    use super::Pipeline;
    use crate::describer::GeminiImageDescriber;
    use crate::error::PipelineError;
    use crate::retriever::IndexRetriever;

    impl Pipeline {
        /// Production wiring: HTTP fetcher, Gemini for images and text, ONNX + LanceDB retrieval.
        pub fn gemini(config: PipelineConfig, api_key: &str) -> Result<Self, PipelineError> {
            let fetcher = Arc::new(
                ArticleFetcher::new(config.max_images).map_err(PipelineError::HttpClient)?,
            );
            let client = Arc::new(
                GeminiClient::new(
                    api_key,
                    config.model.clone(),
                    &config.gemini_base_url,
                    config.max_output_tokens,
                )
                .map_err(PipelineError::Client)?,
            );
            let describer = Arc::new(GeminiImageDescriber::new(
                fetcher.clone(),
                client.clone(),
                config.image_temperature,
            ));
            let retriever = Arc::new(IndexRetriever::from_config(&config));
            Pipeline::new(config, fetcher, describer, retriever, client)
        }
    }
}
