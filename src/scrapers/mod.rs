//! Feed fetching and article content extraction.
//!
//! Each run goes through two network-facing stages per source:
//!
//! 1. **Feed**: download the source's RSS/Atom feed and list its entries
//!    as [`Candidate`]s, in feed order ([`feed`])
//! 2. **Article**: download the chosen candidate's page and pull a short
//!    summary plus an Open Graph image out of it ([`article`])
//!
//! Both stages sit behind a trait so the orchestrator can be driven by fakes
//! in tests. The HTTP implementations share one `reqwest::Client` with the
//! fixed `User-Agent` and 15 second timeout.

pub mod article;
pub mod feed;

use crate::error::PipelineError;
use crate::models::{Candidate, ExtractedContent, Source};

pub use article::HttpArticleExtractor;
pub use feed::HttpFeedFetcher;

/// Lists the current entries of a source's feed.
pub trait FeedFetcher {
    /// Entries in feed order. An empty or unreachable feed is an error.
    async fn fetch(&self, source: &Source) -> Result<Vec<Candidate>, PipelineError>;
}

/// Derives a summary and image from an article page.
pub trait ContentExtractor {
    /// Extract content for `link` using the source's container selectors.
    async fn extract(&self, source: &Source, link: &str)
    -> Result<ExtractedContent, PipelineError>;
}
