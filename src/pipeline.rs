//! One posting run.
//!
//! ```text
//! SelectStart -> TrySource(i) -> { Success | NextSource | AllExhausted }
//! ```
//!
//! Sources are visited once each in rotation order. For each source the feed
//! is fetched, the first entry whose title is not a near-duplicate of the
//! history snapshot is chosen, its page is summarized, and the result is
//! published. Any failure along the way abandons the source (the next entry
//! of the same feed is not tried) and moves on to the next one. The first
//! successful publish appends the title to the history, commits the rotation
//! index, and ends the run.

use crate::dedupe::is_duplicate;
use crate::error::PipelineError;
use crate::models::{Candidate, RunOutcome, Source};
use crate::publish::Publisher;
use crate::rotation::{SourceRotator, visit_order};
use crate::scrapers::{ContentExtractor, FeedFetcher};
use crate::state::{History, StateStore};
use crate::utils::truncate_for_log;
use tracing::{debug, error, info, instrument, warn};

/// Wires the pipeline stages together for repeated runs.
pub struct Orchestrator<'a, F, E, P, S> {
    pub sources: &'a [Source],
    pub fetcher: F,
    pub extractor: E,
    pub publisher: P,
    pub store: S,
}

impl<F, E, P, S> Orchestrator<'_, F, E, P, S>
where
    F: FeedFetcher,
    E: ContentExtractor,
    P: Publisher,
    S: StateStore,
{
    /// Try sources in rotation order until one article is posted.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> RunOutcome {
        let rotator = SourceRotator::new(&self.store, self.sources.len());
        let start = rotator.next_start_index().await;

        let history = match self.store.read_history().await {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Could not read title history; treating it as empty");
                History::default()
            }
        };
        if history.is_empty() {
            debug!("Title history is empty; every entry counts as fresh");
        }
        info!(start, sources = self.sources.len(), history = history.len(), "Run started");

        for index in visit_order(start, self.sources.len()) {
            let source = &self.sources[index];
            match self.try_source(source, &history).await {
                Ok(Some(candidate)) => {
                    self.record_success(&rotator, index, &candidate.title).await;
                    info!(index, source = %source.name, title = %candidate.title, "Posted article");
                    return RunOutcome::Posted {
                        source_index: index,
                        title: candidate.title,
                    };
                }
                Ok(None) => {
                    info!(index, source = %source.name, "No unique articles in this source");
                }
                Err(e) => {
                    warn!(index, source = %source.name, kind = ?e.kind(), error = %e, "Source abandoned");
                }
            }
        }

        error!("No source produced a post this run");
        RunOutcome::Exhausted
    }

    /// Fetch, pick, extract, and publish for one source.
    ///
    /// `Ok(None)` means every entry was a duplicate.
    async fn try_source(
        &self,
        source: &Source,
        history: &History,
    ) -> Result<Option<Candidate>, PipelineError> {
        info!(source = %source.name, feed = %source.feed_url, "Checking source");
        let entries = self.fetcher.fetch(source).await?;

        let Some(candidate) = entries
            .into_iter()
            .find(|c| !is_duplicate(&c.title, history.titles()))
        else {
            return Ok(None);
        };
        info!(title = %candidate.title, link = %candidate.link, "Unique article found");

        let content = self.extractor.extract(source, &candidate.link).await?;
        debug!(summary = %truncate_for_log(&content.summary, 120), "Summary ready");
        self.publisher
            .publish(&candidate.title, &content.summary, content.image.as_deref())
            .await?;
        Ok(Some(candidate))
    }

    async fn record_success(&self, rotator: &SourceRotator<'_, S>, index: usize, title: &str) {
        if let Err(e) = self.store.append_history(title).await {
            error!(error = %e, "Post sent but history could not be saved");
        }
        if let Err(e) = rotator.commit(index).await {
            error!(error = %e, "Post sent but rotation index could not be saved");
        }
    }
}
