//! In-process fakes for the stage traits.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pressethics_ai::GeminiError;
use pressethics_core::{Article, ClauseId, PriorVerdict, SimilarCase};
use pressethics_fetch::FetchError;

use crate::error::{AnnotationError, GenerationError, RetrievalError};
use crate::traits::{ArticleSource, CaseRetriever, ImageDescriber, TextGenerator};

pub const RULING: &str = "위 기사는 강도 사건 피의자를 검거했다고 보도하면서 피의자의 실명과 얼굴 사진을 그대로 실었다. \
    기사는 경찰 발표를 인용해 범행 경위를 자세히 전했다. \
    그러나 이 보도는 유죄가 확정되지 않은 피의자의 신원을 그대로 드러냈다. \
    이는 무죄추정의 원칙에 어긋나며 피의자의 인격권을 침해할 수 있다. \
    신문윤리실천요강은 피의자의 얼굴을 촬영하거나 보도할 때 신중해야 한다고 규정한다. \
    따라서 위 보도는 신문윤리실천요강 제7조「범죄보도」②항을 위반했다고 인정하여 주문과 같이 결정한다.";

pub fn article_with_images(n: usize) -> Article {
    Article {
        url: "https://news.example.kr/article/1".into(),
        title: "강도 피의자 김철수씨 검거".into(),
        body_text: "경찰은 19일 강도 혐의로 김철수(45)씨를 검거했다고 밝혔다.".into(),
        image_urls: (1..=n)
            .map(|i| format!("https://img.example/{i}.jpg"))
            .collect(),
    }
}

pub fn case(id: &str, verdict: PriorVerdict, clause: Option<u8>, score: f32) -> SimilarCase {
    SimilarCase {
        case_id: id.into(),
        case_text: format!("사례 {id}: 피의자 얼굴 노출"),
        matched_clause_id: clause.and_then(ClauseId::new),
        prior_verdict: verdict,
        similarity_score: score,
    }
}

pub struct FakeSource {
    article: Option<Article>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn returning(article: Article) -> Self {
        Self {
            article: Some(article),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            article: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ArticleSource for FakeSource {
    async fn fetch(&self, url: &str) -> Result<Article, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.article.clone().ok_or_else(|| FetchError::NoContent {
            url: url.to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeDescriber {
    failing: Vec<String>,
    calls: AtomicUsize,
}

impl FakeDescriber {
    pub fn failing_on(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageDescriber for FakeDescriber {
    async fn describe(&self, image_url: &str, _article: &Article) -> Result<String, AnnotationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|u| u == image_url) {
            return Err(AnnotationError::Model {
                url: image_url.to_string(),
                source: GeminiError::Blocked {
                    reason: "SAFETY".into(),
                },
            });
        }
        Ok(format!("{image_url}: 수갑을 찬 남성의 얼굴이 정면으로 보인다."))
    }
}

pub struct FakeRetriever {
    cases: Vec<SimilarCase>,
    calls: AtomicUsize,
}

impl FakeRetriever {
    pub fn returning(cases: Vec<SimilarCase>) -> Self {
        Self {
            cases,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaseRetriever for FakeRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<SimilarCase>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.cases.iter().take(k).cloned().collect())
    }
}

/// Replies with queued responses in order and records every prompt.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<(String, f32)>>,
}

impl ScriptedGenerator {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::default(),
        }
    }

    pub fn push_error(&self, err: GenerationError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn prompts(&self) -> Vec<(String, f32)> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), temperature));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationError::Blank))
    }
}
