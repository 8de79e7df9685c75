//! Persisted rotation index and posted-title history.
//!
//! Both pieces of state live as small text files in the state directory:
//!
//! ```text
//! state_dir/
//! ├── bot_state.txt              # last source index that produced a post
//! └── global_posted_titles.txt   # one title per line, oldest first
//! ```
//!
//! Writes go to a `.tmp` sibling first and are renamed over the target, so a
//! crash mid-write leaves the previous contents intact.

use crate::error::PipelineError;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument, warn};

/// Maximum number of titles kept in the history.
pub const MAX_TITLES_TO_KEEP: usize = 100;

const ROTATION_FILE: &str = "bot_state.txt";
const HISTORY_FILE: &str = "global_posted_titles.txt";

/// Bounded, chronologically ordered list of posted titles.
///
/// Appending beyond the capacity evicts the oldest entries first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    titles: Vec<String>,
    cap: usize,
}

impl History {
    pub fn new(titles: Vec<String>) -> Self {
        Self::with_capacity(titles, MAX_TITLES_TO_KEEP)
    }

    pub fn with_capacity(titles: Vec<String>, cap: usize) -> Self {
        let mut history = Self { titles, cap };
        history.evict();
        history
    }

    pub fn push(&mut self, title: impl Into<String>) {
        self.titles.push(title.into());
        self.evict();
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    fn evict(&mut self) {
        if self.titles.len() > self.cap {
            let excess = self.titles.len() - self.cap;
            self.titles.drain(..excess);
        }
    }

    fn to_text(&self) -> String {
        self.titles
            .iter()
            .map(|t| t.replace(['\r', '\n'], " "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn from_text(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Storage for the two pieces of process-wide state.
///
/// Missing state is not an error: readers return `None` or an empty history.
pub trait StateStore {
    /// Index of the last source that produced a post, if any was recorded.
    async fn read_rotation_index(&self) -> Result<Option<usize>, PipelineError>;

    /// Overwrite the rotation index.
    async fn write_rotation_index(&self, index: usize) -> Result<(), PipelineError>;

    /// Snapshot of the posted-title history.
    async fn read_history(&self) -> Result<History, PipelineError>;

    /// Append a title, evicting the oldest ones past the cap.
    async fn append_history(&self, title: &str) -> Result<(), PipelineError>;
}

/// [`StateStore`] backed by plain text files in one directory.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn rotation_path(&self) -> PathBuf {
        self.dir.join(ROTATION_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    async fn read_optional(path: &Path) -> Result<Option<String>, PipelineError> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `contents` to `path` via a temporary sibling and a rename.
#[instrument(level = "debug", skip(contents), fields(path = %path.display()))]
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    debug!(bytes = contents.len(), "State file replaced");
    Ok(())
}

impl StateStore for FileStateStore {
    async fn read_rotation_index(&self) -> Result<Option<usize>, PipelineError> {
        let Some(text) = Self::read_optional(&self.rotation_path()).await? else {
            return Ok(None);
        };
        match text.trim().parse::<usize>() {
            Ok(index) => Ok(Some(index)),
            Err(e) => {
                warn!(contents = %text.trim(), error = %e, "Malformed rotation index; starting over");
                Ok(None)
            }
        }
    }

    async fn write_rotation_index(&self, index: usize) -> Result<(), PipelineError> {
        write_atomic(&self.rotation_path(), &index.to_string()).await
    }

    async fn read_history(&self) -> Result<History, PipelineError> {
        Ok(Self::read_optional(&self.history_path())
            .await?
            .map(|text| History::from_text(&text))
            .unwrap_or_default())
    }

    async fn append_history(&self, title: &str) -> Result<(), PipelineError> {
        let mut history = self.read_history().await?;
        history.push(title);
        write_atomic(&self.history_path(), &history.to_text()).await
    }
}
