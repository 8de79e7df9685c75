//! Error types for the posting pipeline and for startup configuration.
//!
//! Every stage of a run (feed fetch, article extraction, publishing, state
//! persistence) returns a [`PipelineError`]. The orchestrator inspects the
//! [`ErrorKind`] tag to decide what to do next; none of these errors ever
//! leave a run.

use thiserror::Error;

/// Coarse classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeout, connection failure, or non-2xx status.
    Transport,
    /// Empty or malformed feed, or no matching content container.
    Parse,
    /// Container matched but produced no usable summary.
    Extraction,
    /// The messaging provider rejected the send.
    Publish,
    /// Rotation index or history could not be read or written.
    State,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("feed parse error: {0}")]
    Feed(String),

    #[error("no content container matched ({0})")]
    NoContainer(String),

    #[error("no usable summary in {0}")]
    EmptySummary(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("state I/O error: {0}")]
    State(#[from] std::io::Error),
}

impl PipelineError {
    /// Error-kind tag used by the orchestrator and in log fields.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Http(_) => ErrorKind::Transport,
            PipelineError::Url(_) | PipelineError::Feed(_) | PipelineError::NoContainer(_) => {
                ErrorKind::Parse
            }
            PipelineError::EmptySummary(_) => ErrorKind::Extraction,
            PipelineError::Telegram(_) => ErrorKind::Publish,
            PipelineError::State(_) => ErrorKind::State,
        }
    }
}

/// Errors raised while assembling [`crate::config::AppConfig`] at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read sources file {path}: {source}")]
    SourcesRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sources file {path}: {source}")]
    SourcesParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("source catalog is empty")]
    EmptyCatalog,

    #[error("source {name:?} has an invalid URL: {source}")]
    SourceUrl {
        name: String,
        #[source]
        source: url::ParseError,
    },

    #[error("source {0:?} has no content selectors")]
    NoSelectors(String),

    #[error("source {name:?} has an invalid selector {selector:?}")]
    Selector { name: String, selector: String },

    #[error("unknown timezone {0:?}")]
    Timezone(String),

    #[error("quiet hours must be within 0..=23, got {start}..={end}")]
    QuietHours { start: u32, end: u32 },
}
