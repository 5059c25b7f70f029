//! Image description stage.
//!
//! Images are handled one at a time in article order. What happens when
//! one of them fails is decided by [`ImagePolicy`].

use std::sync::Arc;

use async_trait::async_trait;
use pressethics_ai::{GeminiClient, InlineImage};
use pressethics_core::{Article, ImageAnnotation, ImagePolicy};
use pressethics_fetch::ArticleFetcher;
use tracing::{debug, info, warn};

use crate::error::AnnotationError;
use crate::prompts;
use crate::traits::ImageDescriber;

/// Downloads each image and asks Gemini to describe it.
pub struct GeminiImageDescriber {
    fetcher: Arc<ArticleFetcher>,
    client: Arc<GeminiClient>,
    temperature: f32,
}

impl GeminiImageDescriber {
    pub fn new(fetcher: Arc<ArticleFetcher>, client: Arc<GeminiClient>, temperature: f32) -> Self {
        Self {
            fetcher,
            client,
            temperature,
        }
    }
}

#[async_trait]
impl ImageDescriber for GeminiImageDescriber {
    async fn describe(&self, image_url: &str, article: &Article) -> Result<String, AnnotationError> {
        let fetched = self
            .fetcher
            .fetch_image(image_url)
            .await
            .map_err(|source| AnnotationError::Download {
                url: image_url.to_string(),
                source,
            })?;
        let inline = InlineImage::prepare(&fetched.bytes, &fetched.mime_type).map_err(|source| {
            AnnotationError::Image {
                url: image_url.to_string(),
                source,
            }
        })?;
        debug!(url = image_url, mime = %inline.mime_type, "sending image to model");

        self.client
            .describe_image(&inline, &prompts::image_prompt(article), self.temperature)
            .await
            .map_err(|source| AnnotationError::Model {
                url: image_url.to_string(),
                source,
            })
    }
}

/// Describe up to `max_images` images of `article`.
///
/// Under [`ImagePolicy::Skip`] a failed image is logged and left out; under
/// [`ImagePolicy::Abort`] the first failure is returned.
pub async fn describe_images(
    describer: &dyn ImageDescriber,
    article: &Article,
    max_images: usize,
    policy: ImagePolicy,
) -> Result<Vec<ImageAnnotation>, AnnotationError> {
    let mut annotations = Vec::new();
    for image_url in article.image_urls.iter().take(max_images) {
        match describer.describe(image_url, article).await {
            Ok(description) if description.trim().is_empty() => {
                warn!(url = %image_url, "model returned an empty description, skipping image");
            }
            Ok(description) => annotations.push(ImageAnnotation {
                image_url: image_url.clone(),
                description: description.trim().to_string(),
            }),
            Err(e) if policy == ImagePolicy::Skip => {
                warn!(url = %image_url, error = %e, "image description failed, skipping image");
            }
            Err(e) => return Err(e),
        }
    }
    info!(
        described = annotations.len(),
        available = article.image_urls.len(),
        "image descriptions complete"
    );
    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article_with_images, FakeDescriber};

    #[tokio::test]
    async fn skip_policy_drops_failed_images() {
        let describer = FakeDescriber::failing_on(&["https://img.example/2.jpg"]);
        let article = article_with_images(3);
        let annotations = describe_images(&describer, &article, 3, ImagePolicy::Skip)
            .await
            .unwrap();
        let urls: Vec<_> = annotations.iter().map(|a| a.image_url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://img.example/1.jpg", "https://img.example/3.jpg"]
        );
        assert_eq!(describer.calls(), 3);
    }

    #[tokio::test]
    async fn abort_policy_stops_at_first_failure() {
        let describer = FakeDescriber::failing_on(&["https://img.example/2.jpg"]);
        let article = article_with_images(3);
        let err = describe_images(&describer, &article, 3, ImagePolicy::Abort)
            .await
            .unwrap_err();
        assert_eq!(err.image_url(), "https://img.example/2.jpg");
        assert_eq!(describer.calls(), 2);
    }

    #[tokio::test]
    async fn respects_max_images() {
        let describer = FakeDescriber::default();
        let article = article_with_images(5);
        let annotations = describe_images(&describer, &article, 2, ImagePolicy::Skip)
            .await
            .unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(describer.calls(), 2);
    }

    #[tokio::test]
    async fn no_images_means_no_calls() {
        let describer = FakeDescriber::default();
        let annotations = describe_images(&describer, &article_with_images(0), 3, ImagePolicy::Abort)
            .await
            .unwrap();
        assert!(annotations.is_empty());
        assert_eq!(describer.calls(), 0);
    }
}
