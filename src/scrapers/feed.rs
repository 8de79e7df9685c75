//! RSS/Atom feed fetching.
//!
//! Feeds are parsed with `feed-rs`, so both RSS 2.0 and Atom documents are
//! accepted. Entries keep their document order, which for news feeds is
//! most-recent-first; nothing is re-sorted.

use super::FeedFetcher;
use crate::client::get_text;
use crate::error::PipelineError;
use crate::models::{Candidate, Source};
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

/// [`FeedFetcher`] that downloads feeds over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl FeedFetcher for HttpFeedFetcher {
    #[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.feed_url))]
    async fn fetch(&self, source: &Source) -> Result<Vec<Candidate>, PipelineError> {
        let body = get_text(&self.client, &source.feed_url).await?;
        let candidates = parse_feed(body.as_bytes(), &source.base_url)?;
        info!(count = candidates.len(), "Fetched feed entries");
        Ok(candidates)
    }
}

/// Parse a feed document into candidates.
///
/// Titles are trimmed, links resolved against `base_url`. Entries missing
/// either are skipped. A feed with no usable entries is a parse error.
pub fn parse_feed(body: &[u8], base_url: &str) -> Result<Vec<Candidate>, PipelineError> {
    let base = Url::parse(base_url)?;
    let feed = feed_rs::parser::parse(body).map_err(|e| PipelineError::Feed(e.to_string()))?;

    let candidates: Vec<Candidate> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title.map(|t| t.content.trim().to_string())?;
            let href = entry.links.first().map(|l| l.href.trim().to_string())?;
            if title.is_empty() || href.is_empty() {
                return None;
            }
            match base.join(&href) {
                Ok(link) => Some(Candidate {
                    title,
                    link: link.to_string(),
                }),
                Err(e) => {
                    debug!(%href, error = %e, "Skipping entry with unusable link");
                    None
                }
            }
        })
        .collect();

    if candidates.is_empty() {
        return Err(PipelineError::Feed("feed has no entries".to_string()));
    }
    Ok(candidates)
}
