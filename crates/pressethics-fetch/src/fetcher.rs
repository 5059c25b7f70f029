//! HTTP client for news pages and their images.

use std::time::Duration;

use pressethics_core::Article;
use reqwest::header::{self, HeaderMap, HeaderValue};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::extract::extract_article;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 5;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("blocked by server ({status}) for {url}")]
    Blocked { status: u16, url: String },
    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("expected an HTML page, got '{content_type}'")]
    NotHtml { content_type: String },
    #[error("expected an image, got '{content_type}'")]
    NotImage { content_type: String },
    #[error("no article text found at {url}")]
    NoContent { url: String },
}

/// Raw image bytes with the server-declared MIME type.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub url: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Fetches article pages with browser-like headers. One attempt per call.
pub struct ArticleFetcher {
    client: reqwest::Client,
    max_images: usize,
}

impl ArticleFetcher {
    pub fn new(max_images: usize) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.8,en-US;q=0.5,en;q=0.3"),
        );
        headers.insert(header::DNT, HeaderValue::from_static("1"));
        headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(PAGE_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client, max_images })
    }

    /// Download and extract the article at `url`.
    pub async fn fetch(&self, url: &str) -> Result<Article, FetchError> {
        let parsed = parse_http_url(url)?;

        info!(url = %parsed, "fetching article");
        let resp = self.client.get(parsed.clone()).send().await?;
        let resp = check_status(resp)?;

        let content_type = content_type(&resp);
        if let Some(ct) = &content_type
            && !is_html(ct)
        {
            return Err(FetchError::NotHtml {
                content_type: ct.clone(),
            });
        }

        // Extract against the post-redirect URL so relative links resolve.
        let final_url = resp.url().clone();
        let html = resp.text().await?;
        debug!(bytes = html.len(), url = %final_url, "downloaded page");

        let mut article = extract_article(&html, &final_url, self.max_images);
        if article.body_text.trim().is_empty() {
            return Err(FetchError::NoContent {
                url: parsed.to_string(),
            });
        }
        article.url = parsed.to_string();

        info!(
            title = %article.title,
            chars = article.body_text.chars().count(),
            images = article.image_urls.len(),
            "article extracted"
        );
        Ok(article)
    }

    /// Download one image. Shorter timeout than pages; `image/*` only.
    pub async fn fetch_image(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let parsed = parse_http_url(url)?;

        debug!(url = %parsed, "fetching image");
        let resp = self
            .client
            .get(parsed.clone())
            .header(header::ACCEPT, "image/avif,image/webp,image/*,*/*;q=0.8")
            .timeout(IMAGE_TIMEOUT)
            .send()
            .await?;
        let resp = check_status(resp)?;

        let mime_type = content_type(&resp).unwrap_or_default();
        if !mime_type.starts_with("image/") {
            return Err(FetchError::NotImage {
                content_type: mime_type,
            });
        }
        let bytes = resp.bytes().await?.to_vec();

        Ok(FetchedImage {
            url: parsed.to_string(),
            mime_type,
            bytes,
        })
    }
}

fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let status = status.as_u16();
    Err(match status {
        403 | 429 => FetchError::Blocked { status, url },
        _ => FetchError::Status { status, url },
    })
}

/// Lowercased MIME type without parameters.
fn content_type(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
}

fn is_html(mime: &str) -> bool {
    mime.contains("html")
}
