//! Article fetcher: single-attempt HTTP retrieval plus static HTML extraction.

pub mod extract;
pub mod fetcher;

pub use extract::extract_article;
pub use fetcher::{ArticleFetcher, FetchError, FetchedImage};
