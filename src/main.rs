//! # News Rotator
//!
//! A Telegram channel poster that publishes one fresh article per hour from a
//! rotating pool of news feeds, with fuzzy suppression of near-duplicate
//! stories across sources and over time.
//!
//! ## Usage
//!
//! ```sh
//! BOT_TOKEN=123:abc CHANNEL_ID=@my_channel news_rotator --state-dir ./state
//! ```
//!
//! ## Architecture
//!
//! Each scheduled run goes through:
//! 1. **Rotation**: start with the source after the one that last posted
//! 2. **Feed**: list the source's entries in feed order
//! 3. **Dedupe**: pick the first title not similar to the last 100 posted
//! 4. **Extract**: summarize the article page and find its image
//! 5. **Publish**: send the photo and caption; on success remember the title
//!    and the source index
//!
//! A failure at any stage moves on to the next source. Runs are skipped
//! during quiet hours (01:00-07:59 Kyiv time by default).

use clap::Parser;
use std::error::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod client;
mod config;
mod dedupe;
mod error;
mod models;
mod pipeline;
mod publish;
mod rotation;
mod scheduler;
mod scrapers;
mod state;
mod utils;

use cli::Cli;
use config::AppConfig;
use pipeline::Orchestrator;
use publish::TelegramPublisher;
use scheduler::Scheduler;
use scrapers::{HttpArticleExtractor, HttpFeedFetcher};
use state::FileStateStore;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "news_rotator starting up");

    let args = Cli::parse();
    debug!(state_dir = %args.state_dir.display(), once = args.once, "Parsed CLI arguments");

    let config = AppConfig::from_cli(&args)?;
    ensure_writable_dir(&config.state_dir).await?;

    let http = client::build_client()?;
    let orchestrator = Orchestrator {
        sources: &config.sources,
        fetcher: HttpFeedFetcher::new(http.clone()),
        extractor: HttpArticleExtractor::new(http.clone()),
        publisher: TelegramPublisher::new(http, &config),
        store: FileStateStore::new(&config.state_dir),
    };
    let scheduler = Scheduler::new(&config);

    if args.once {
        let outcome = scheduler.tick(chrono::Utc::now(), || orchestrator.run()).await;
        info!(?outcome, "Single run finished");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested; finishing current run");
                signal_token.cancel();
            }
            Err(e) => warn!(error = %e, "Could not listen for Ctrl-C; running until killed"),
        }
    });

    scheduler.run_loop(shutdown, || orchestrator.run()).await;

    info!("news_rotator stopped");
    Ok(())
}
