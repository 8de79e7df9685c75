//! Posting articles to the Telegram channel.
//!
//! A post is a photo with a Markdown caption: the title in bold followed by
//! the summary. Captions are capped at Telegram's 1024 character limit.
//! Markdown markers inside the summary are escaped so that stray `*` or `_`
//! in article text cannot break entity parsing.
//! Articles without an Open Graph image get the configured fallback image;
//! only a deployment with no fallback at all sends plain text messages.
//!
//! # Bot API calls
//!
//! | Case                         | Method        |
//! |------------------------------|---------------|
//! | article or fallback image    | `sendPhoto`   |
//! | no image and no fallback     | `sendMessage` |

use crate::config::AppConfig;
use crate::error::PipelineError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, instrument};

/// Telegram's caption limit, in characters.
pub const MAX_CAPTION_CHARS: usize = 1024;

const TRUNCATED_CHARS: usize = 1020;
const ELLIPSIS: &str = " ...";

/// Sends a finished post to the channel.
pub trait Publisher {
    async fn publish(
        &self,
        title: &str,
        summary: &str,
        image: Option<&str>,
    ) -> Result<(), PipelineError>;
}

/// Build the Markdown caption `*title*\n\nsummary`, truncated to fit.
///
/// Over-long captions keep their first 1020 characters followed by `" ..."`,
/// giving exactly [`MAX_CAPTION_CHARS`] visible characters. Escapes added to
/// the summary afterwards do not count, as Telegram measures the parsed text.
pub fn build_caption(title: &str, summary: &str) -> String {
    // `*` would close the bold entity early
    let title = title.replace('*', "");
    let caption = format!("*{title}*\n\n{summary}");
    let caption = if caption.chars().count() <= MAX_CAPTION_CHARS {
        caption
    } else {
        let mut truncated: String = caption.chars().take(TRUNCATED_CHARS).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    };

    let head_chars = title.chars().count() + 4;
    match caption.char_indices().nth(head_chars) {
        Some((split, _)) => {
            let (head, body) = caption.split_at(split);
            format!("{head}{}", escape_markdown(body))
        }
        None if caption.chars().count() == head_chars => caption,
        // the cut fell inside the title, so the bold entity cannot be closed
        None => escape_markdown(&caption[1..]),
    }
}

/// Escape the legacy Markdown markers Telegram parses outside entities.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// [`Publisher`] backed by the Telegram Bot API.
pub struct TelegramPublisher {
    client: Client,
    api_url: String,
    token: String,
    channel_id: String,
    fallback_image: Option<String>,
}

impl fmt::Debug for TelegramPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramPublisher")
            .field("api_url", &self.api_url)
            .field("channel_id", &self.channel_id)
            .field("fallback_image", &self.fallback_image)
            .finish()
    }
}

impl TelegramPublisher {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            api_url: config.telegram_api_url.clone(),
            token: config.bot_token.clone(),
            channel_id: config.channel_id.clone(),
            fallback_image: config.fallback_image.clone(),
        }
    }

    async fn call<T: Serialize>(&self, method: &str, body: &T) -> Result<(), PipelineError> {
        let url = format!("{}/bot{}/{}", self.api_url, self.token, method);
        // reqwest errors embed the request URL, which carries the token
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PipelineError::Telegram(e.without_url().to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PipelineError::Telegram(e.without_url().to_string()))?;

        match serde_json::from_str::<ApiResponse>(&text) {
            Ok(api) if api.ok && status.is_success() => Ok(()),
            Ok(api) => Err(PipelineError::Telegram(
                api.description
                    .unwrap_or_else(|| format!("{method} failed with {status}")),
            )),
            Err(_) => Err(PipelineError::Telegram(format!(
                "{method} failed with {status}"
            ))),
        }
    }
}

impl Publisher for TelegramPublisher {
    #[instrument(level = "info", skip(self, summary))]
    async fn publish(
        &self,
        title: &str,
        summary: &str,
        image: Option<&str>,
    ) -> Result<(), PipelineError> {
        let caption = build_caption(title, summary);
        let photo = match image {
            Some(url) => Some(url),
            None => {
                info!("No article image; using fallback");
                self.fallback_image.as_deref()
            }
        };

        let result = match photo {
            Some(photo) => {
                self.call(
                    "sendPhoto",
                    &SendPhoto {
                        chat_id: &self.channel_id,
                        photo,
                        caption: &caption,
                        parse_mode: "Markdown",
                    },
                )
                .await
            }
            None => {
                self.call(
                    "sendMessage",
                    &SendMessage {
                        chat_id: &self.channel_id,
                        text: &caption,
                        parse_mode: "Markdown",
                    },
                )
                .await
            }
        };

        match &result {
            Ok(()) => info!(caption_chars = caption.chars().count(), "Post sent"),
            Err(e) => error!(error = %e, "Telegram rejected the post"),
        }
        result
    }
}
