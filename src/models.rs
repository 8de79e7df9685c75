//! Data models shared across the posting pipeline.
//!
//! - [`Source`]: a configured news feed and the selectors for its article body
//! - [`Candidate`]: one feed entry considered for posting
//! - [`ExtractedContent`]: the summary and image pulled from an article page
//! - [`RunOutcome`]: what a single scheduled run ended up doing

use serde::{Deserialize, Serialize};

/// A news source in the rotation catalog.
///
/// Sources are immutable after startup and identified by their position in
/// the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Human-readable name used in logs.
    pub name: String,
    /// RSS or Atom feed URL.
    pub feed_url: String,
    /// Base URL that relative article links are resolved against.
    pub base_url: String,
    /// CSS selectors for the article body, tried in order.
    pub content_selectors: Vec<String>,
}

/// A feed entry that may be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Trimmed entry title.
    pub title: String,
    /// Absolute article URL.
    pub link: String,
}

/// Summary and image derived from an article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    /// First sentences of the article body. Never empty.
    pub summary: String,
    /// Open Graph image, if the page declares one.
    pub image: Option<String>,
}

/// Result of one scheduled run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// An article was published from the source at `source_index`.
    Posted { source_index: usize, title: String },
    /// Every source was tried and none produced a post.
    Exhausted,
    /// The run fell inside quiet hours and did nothing.
    Skipped,
    /// The run panicked; the scheduler logged it and carried on.
    Aborted,
}
