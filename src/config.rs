//! Immutable application configuration.
//!
//! [`AppConfig`] is assembled once in `main` from the parsed [`Cli`] and then
//! passed by reference to every component. The source catalog is either the
//! built-in one or a YAML list of [`Source`] entries.

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::models::Source;
use chrono_tz::Tz;
use scraper::Selector;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Client identity sent with every feed and article request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Upper bound for each individual network call.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Local hours during which scheduled runs are suppressed.
///
/// Both ends are inclusive. A window whose `start` is after its `end` wraps
/// around midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    pub start: u32,
    pub end: u32,
}

impl QuietHours {
    pub fn new(start: u32, end: u32) -> Result<Self, ConfigError> {
        if start > 23 || end > 23 {
            return Err(ConfigError::QuietHours { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start <= self.end {
            (self.start..=self.end).contains(&hour)
        } else {
            hour >= self.start || hour <= self.end
        }
    }
}

impl Default for QuietHours {
    fn default() -> Self {
        Self { start: 1, end: 7 }
    }
}

/// Configuration shared by every component for the lifetime of the process.
#[derive(Clone)]
pub struct AppConfig {
    pub sources: Vec<Source>,
    pub bot_token: String,
    pub channel_id: String,
    pub state_dir: PathBuf,
    pub timezone: Tz,
    pub quiet_hours: QuietHours,
    pub interval: Duration,
    /// `None` means posts without an article image go out as text.
    pub fallback_image: Option<String>,
    pub telegram_api_url: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("sources", &self.sources.len())
            .field("bot_token", &"***")
            .field("channel_id", &self.channel_id)
            .field("state_dir", &self.state_dir)
            .field("timezone", &self.timezone)
            .field("quiet_hours", &self.quiet_hours)
            .field("interval", &self.interval)
            .field("fallback_image", &self.fallback_image)
            .field("telegram_api_url", &self.telegram_api_url)
            .finish()
    }
}

impl AppConfig {
    /// Build the configuration from parsed CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the sources file cannot be loaded, the
    /// catalog is invalid, the timezone is unknown, or the quiet hours are
    /// out of range.
    #[instrument(level = "info", skip_all)]
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let sources = match &cli.sources_file {
            Some(path) => load_sources(path)?,
            None => default_sources(),
        };
        validate_sources(&sources)?;

        let timezone: Tz = cli
            .timezone
            .parse()
            .map_err(|_| ConfigError::Timezone(cli.timezone.clone()))?;

        let fallback_image = Some(cli.fallback_image_url.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let config = Self {
            sources,
            bot_token: cli.bot_token.clone(),
            channel_id: cli.channel_id.clone(),
            state_dir: cli.state_dir.clone(),
            timezone,
            quiet_hours: QuietHours::new(cli.quiet_start, cli.quiet_end)?,
            interval: Duration::from_secs(cli.interval_secs.max(1)),
            fallback_image,
            telegram_api_url: cli.telegram_api_url.trim_end_matches('/').to_string(),
        };
        info!(?config, "Configuration loaded");
        Ok(config)
    }
}

/// Read a YAML list of sources.
pub fn load_sources(path: &Path) -> Result<Vec<Source>, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SourcesRead {
        path: display.clone(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::SourcesParse {
        path: display,
        source,
    })
}

/// Reject catalogs that could never produce a post.
pub fn validate_sources(sources: &[Source]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::EmptyCatalog);
    }
    for source in sources {
        for url in [&source.feed_url, &source.base_url] {
            Url::parse(url).map_err(|e| ConfigError::SourceUrl {
                name: source.name.clone(),
                source: e,
            })?;
        }
        if source.content_selectors.is_empty() {
            return Err(ConfigError::NoSelectors(source.name.clone()));
        }
        for selector in &source.content_selectors {
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::Selector {
                    name: source.name.clone(),
                    selector: selector.clone(),
                });
            }
        }
    }
    Ok(())
}

/// The built-in rotation catalog.
pub fn default_sources() -> Vec<Source> {
    let source = |name: &str, feed_url: &str, base_url: &str, selectors: &[&str]| Source {
        name: name.to_string(),
        feed_url: feed_url.to_string(),
        base_url: base_url.to_string(),
        content_selectors: selectors.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        source(
            "ІТ (DOU.ua)",
            "https://dou.ua/lenta/articles/feed/",
            "https://dou.ua/",
            &["div.article-body", "div.b-typo"],
        ),
        source(
            "Новини (Укр. Правда)",
            "https://www.pravda.com.ua/rss/",
            "https://www.pravda.com.ua",
            &["div.post_content"],
        ),
        source(
            "ІТ (AIN.UA)",
            "https://ain.ua/feed/",
            "https://ain.ua/",
            &["div.post-content"],
        ),
        source(
            "Війна (УНІАН)",
            "https://rss.unian.ua/war.rss",
            "https://www.unian.ua/",
            &["div.article-text"],
        ),
        source(
            "ІТ (ITC.ua)",
            "https://itc.ua/ua/feed/",
            "https://itc.ua/ua/",
            &["div.entry-content"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec!["news_rotator", "--bot-token", "t", "--channel-id", "@c"];
        args.extend_from_slice(extra);
        Cli::parse_from(args)
    }

    #[test]
    fn test_default_catalog_is_valid() {
        let sources = default_sources();
        assert_eq!(sources.len(), 5);
        validate_sources(&sources).unwrap();
    }

    #[test]
    fn test_from_cli_defaults() {
        let config = AppConfig::from_cli(&cli(&[])).unwrap();
        assert_eq!(config.sources.len(), 5);
        assert_eq!(config.timezone, chrono_tz::Europe::Kyiv);
        assert_eq!(config.quiet_hours, QuietHours::default());
        assert_eq!(config.interval, Duration::from_secs(3600));
        assert_eq!(
            config.fallback_image.as_deref(),
            Some("https://picsum.photos/1280/720")
        );
        assert_eq!(config.telegram_api_url, "https://api.telegram.org");
    }

    #[test]
    fn test_empty_fallback_disables_it() {
        let config = AppConfig::from_cli(&cli(&["--fallback-image-url", ""])).unwrap();
        assert_eq!(config.fallback_image, None);
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let err = AppConfig::from_cli(&cli(&["--timezone", "Mars/Olympus"])).unwrap_err();
        assert!(matches!(err, ConfigError::Timezone(_)));
    }

    #[test]
    fn test_quiet_hours_range_checked() {
        let err = AppConfig::from_cli(&cli(&["--quiet-end", "24"])).unwrap_err();
        assert!(matches!(err, ConfigError::QuietHours { .. }));
    }

    #[test]
    fn test_sources_file_replaces_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
- name: one
  feed_url: https://one.example/feed
  base_url: https://one.example/
  content_selectors: ["article .body"]
- name: two
  feed_url: https://two.example/rss
  base_url: https://two.example/
  content_selectors: ["div.text"]
"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = AppConfig::from_cli(&cli(&["--sources-file", path.as_str()])).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].name, "two");
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut sources = default_sources();
        sources[0].content_selectors = vec!["div[".to_string()];
        assert!(matches!(
            validate_sources(&sources),
            Err(ConfigError::Selector { .. })
        ));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(validate_sources(&[]), Err(ConfigError::EmptyCatalog)));
    }

    #[test]
    fn test_quiet_hours_contains() {
        let quiet = QuietHours::default();
        for hour in 1..=7 {
            assert!(quiet.contains(hour), "hour {hour} should be quiet");
        }
        for hour in [0, 8, 9, 12, 23] {
            assert!(!quiet.contains(hour), "hour {hour} should be active");
        }
    }

    #[test]
    fn test_quiet_hours_wrap_midnight() {
        let quiet = QuietHours::new(22, 5).unwrap();
        assert!(quiet.contains(23));
        assert!(quiet.contains(0));
        assert!(quiet.contains(5));
        assert!(!quiet.contains(6));
        assert!(!quiet.contains(21));
    }

    #[test]
    fn test_debug_hides_token() {
        let config = AppConfig::from_cli(&cli(&[])).unwrap();
        let printed = format!("{config:?}");
        assert!(printed.contains("***"));
        assert!(!printed.contains("bot_token: \"t\""));
    }
}
