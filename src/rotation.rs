//! Round-robin source selection.
//!
//! The rotation index names the last source that produced a post. Each run
//! starts with the source after it and visits every source once. The index
//! only moves on a successful publish, so a run where everything fails is
//! retried from the same starting point next time.

use crate::error::PipelineError;
use crate::state::StateStore;
use tracing::{info, warn};

pub struct SourceRotator<'a, S> {
    store: &'a S,
    source_count: usize,
}

impl<'a, S: StateStore> SourceRotator<'a, S> {
    pub fn new(store: &'a S, source_count: usize) -> Self {
        Self {
            store,
            source_count,
        }
    }

    /// Index of the first source to try this run.
    ///
    /// Unreadable, missing, or out-of-range state starts the cycle at 0.
    pub async fn next_start_index(&self) -> usize {
        if self.source_count == 0 {
            return 0;
        }
        match self.store.read_rotation_index().await {
            Ok(Some(last)) if last < self.source_count => (last + 1) % self.source_count,
            Ok(Some(last)) => {
                warn!(last, sources = self.source_count, "Saved rotation index out of range; starting at 0");
                0
            }
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "Could not read rotation index; starting at 0");
                0
            }
        }
    }

    /// Record `index` as the source that produced the latest post.
    pub async fn commit(&self, index: usize) -> Result<(), PipelineError> {
        self.store.write_rotation_index(index).await?;
        info!(index, "Rotation index committed");
        Ok(())
    }
}

/// Every source index once, starting at `start` and wrapping around.
pub fn visit_order(start: usize, source_count: usize) -> impl Iterator<Item = usize> {
    (0..source_count).map(move |i| (start + i) % source_count)
}
