//! Command-line interface definitions for the news rotator.
//!
//! Every option can be given as a flag or through the environment. The bot
//! token and channel id are normally supplied only through `BOT_TOKEN` and
//! `CHANNEL_ID`.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the news rotator.
///
/// # Examples
///
/// ```sh
/// # Hourly posting with the built-in source catalog
/// BOT_TOKEN=123:abc CHANNEL_ID=@my_channel news_rotator
///
/// # One gated run with a custom catalog and state directory
/// news_rotator --once --sources-file sources.yaml --state-dir /var/lib/news
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Destination channel (numeric id or @username)
    #[arg(long, env = "CHANNEL_ID", allow_hyphen_values = true)]
    pub channel_id: String,

    /// Directory holding the rotation index and title history
    #[arg(short, long, env = "STATE_DIR", default_value = ".")]
    pub state_dir: PathBuf,

    /// Optional YAML file replacing the built-in source catalog
    #[arg(long, env = "SOURCES_FILE")]
    pub sources_file: Option<PathBuf>,

    /// IANA timezone used for the quiet-hours gate
    #[arg(long, env = "TIMEZONE", default_value = "Europe/Kyiv")]
    pub timezone: String,

    /// First local hour (inclusive) during which posting is suppressed
    #[arg(long, default_value_t = 1)]
    pub quiet_start: u32,

    /// Last local hour (inclusive) during which posting is suppressed
    #[arg(long, default_value_t = 7)]
    pub quiet_end: u32,

    /// Seconds between scheduled runs
    #[arg(long, env = "INTERVAL_SECS", default_value_t = 3600)]
    pub interval_secs: u64,

    /// Image posted when an article has no Open Graph image; empty disables it
    #[arg(long, env = "FALLBACK_IMAGE_URL", default_value = "https://picsum.photos/1280/720")]
    pub fallback_image_url: String,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// Perform a single (time-gated) run and exit
    #[arg(long)]
    pub once: bool,
}
