//! Article page summary and image extraction.
//!
//! The page is fetched, its `og:image` meta property recorded, and the first
//! configured content container with any text is located. Paragraph text
//! inside that container (ignoring code, scripts, styles, and asides) is
//! joined and cut down to its first three sentences.

use super::ContentExtractor;
use crate::client::get_text;
use crate::error::PipelineError;
use crate::models::{ExtractedContent, Source};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Number of leading sentences kept for the summary.
pub const SUMMARY_SENTENCES: usize = 3;

/// Elements whose text never belongs in a summary.
const NOISE_TAGS: [&str; 5] = ["pre", "code", "script", "style", "aside"];

static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("valid og:image selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid p selector"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

/// [`ContentExtractor`] that downloads article pages over HTTP.
#[derive(Debug, Clone)]
pub struct HttpArticleExtractor {
    client: Client,
}

impl HttpArticleExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ContentExtractor for HttpArticleExtractor {
    #[instrument(level = "info", skip_all, fields(source = %source.name, %link))]
    async fn extract(
        &self,
        source: &Source,
        link: &str,
    ) -> Result<ExtractedContent, PipelineError> {
        let page_url = Url::parse(&source.base_url)?.join(link)?;
        let html = get_text(&self.client, page_url.as_str()).await?;
        let content = extract_content(&html, &page_url, &source.content_selectors)?;
        info!(
            summary_chars = content.summary.chars().count(),
            has_image = content.image.is_some(),
            "Extracted article content"
        );
        Ok(content)
    }
}

/// Extract the summary and image from an already downloaded page.
///
/// # Errors
///
/// - [`PipelineError::NoContainer`] if no selector matches a container with text
/// - [`PipelineError::EmptySummary`] if the container holds no paragraph text
pub fn extract_content(
    html: &str,
    page_url: &Url,
    selectors: &[String],
) -> Result<ExtractedContent, PipelineError> {
    let document = Html::parse_document(html);
    let image = og_image(&document, page_url);

    let container = find_container(&document, selectors)
        .ok_or_else(|| PipelineError::NoContainer(selectors.join(", ")))?;

    let text = paragraph_text(container);
    let summary = first_sentences(&text, SUMMARY_SENTENCES);
    if summary.is_empty() {
        return Err(PipelineError::EmptySummary(page_url.to_string()));
    }
    Ok(ExtractedContent { summary, image })
}

fn og_image(document: &Html, page_url: &Url) -> Option<String> {
    let content = document
        .select(&OG_IMAGE)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())?;
    match page_url.join(content) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            debug!(content, error = %e, "Ignoring unusable og:image");
            None
        }
    }
}

fn find_container<'a>(document: &'a Html, selectors: &[String]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|raw| {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(e) => {
                warn!(selector = %raw, error = %e, "Skipping invalid selector");
                return None;
            }
        };
        let found = document
            .select(&selector)
            .find(|el| el.text().any(|t| !t.trim().is_empty()));
        if found.is_some() {
            debug!(selector = %raw, "Content container matched");
        }
        found
    })
}

fn is_noise(element: &ElementRef<'_>) -> bool {
    NOISE_TAGS.contains(&element.value().name())
}

/// Text of every `<p>` in the container, whitespace-normalized.
fn paragraph_text(container: ElementRef<'_>) -> String {
    container
        .select(&PARAGRAPH)
        .filter(|p| {
            !p.ancestors()
                .take_while(|node| node.id() != container.id())
                .filter_map(ElementRef::wrap)
                .any(|el| is_noise(&el))
        })
        .map(|p| {
            let mut text = String::new();
            collect_text(p, &mut text);
            text
        })
        .flat_map(|text| {
            text.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if !is_noise(&el) {
                collect_text(el, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

/// The first `n` sentences of `text`, split after `.`, `!`, or `?` followed
/// by whitespace.
pub fn first_sentences(text: &str, n: usize) -> String {
    let mut sentences = Vec::with_capacity(n);
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        if sentences.len() == n {
            break;
        }
        sentences.push(&text[start..=m.start()]);
        start = m.end();
    }
    if sentences.len() < n && start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::build_client;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_url() -> Url {
        Url::parse("https://news.example/articles/1").unwrap()
    }

    fn selectors(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const PAGE: &str = r#"<html><head>
<meta property="og:image" content="/img/storm.jpg">
</head><body>
<div class="article-body">
  <p>First sentence here.  Second one!</p>
  <pre><p>let x = 1;</p></pre>
  <p>Third   sentence? <code>ignored()</code>Fourth sentence.</p>
  <aside><p>Read also: something else.</p></aside>
  <script>var tracking = 1;</script>
  <p>Fifth.</p>
</div>
</body></html>"#;

    #[test]
    fn test_summary_is_first_three_sentences() {
        let content = extract_content(PAGE, &page_url(), &selectors(&["div.article-body"])).unwrap();
        assert_eq!(
            content.summary,
            "First sentence here. Second one! Third sentence?"
        );
        assert_eq!(
            content.image.as_deref(),
            Some("https://news.example/img/storm.jpg")
        );
    }

    #[test]
    fn test_noise_elements_are_ignored() {
        let container = Html::parse_document(PAGE);
        let selector = Selector::parse("div.article-body").unwrap();
        let el = container.select(&selector).next().unwrap();
        let text = paragraph_text(el);
        assert!(!text.contains("let x"));
        assert!(!text.contains("ignored"));
        assert!(!text.contains("Read also"));
        assert!(!text.contains("tracking"));
        assert!(text.ends_with("Fourth sentence. Fifth."));
    }

    #[test]
    fn test_falls_through_to_next_selector() {
        let html = r#"<div class="b-typo"><p>Only text. In here.</p></div>"#;
        let content =
            extract_content(html, &page_url(), &selectors(&["div.article-body", "div.b-typo"]))
                .unwrap();
        assert_eq!(content.summary, "Only text. In here.");
        assert_eq!(content.image, None);
    }

    #[test]
    fn test_empty_container_is_skipped() {
        let html = r#"<div class="a">   </div><div class="b"><p>Body.</p></div>"#;
        let content = extract_content(html, &page_url(), &selectors(&["div.a", "div.b"])).unwrap();
        assert_eq!(content.summary, "Body.");
    }

    #[test]
    fn test_no_container_is_parse_error() {
        let err = extract_content(PAGE, &page_url(), &selectors(&["div.missing"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_container_without_paragraphs_is_extraction_failure() {
        let html = r#"<div class="post_content"><div>Text outside paragraphs.</div><p>   </p></div>"#;
        let err = extract_content(html, &page_url(), &selectors(&["div.post_content"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
    }

    #[test]
    fn test_first_sentences() {
        assert_eq!(first_sentences("One. Two. Three. Four.", 3), "One. Two. Three.");
        assert_eq!(first_sentences("Just one", 3), "Just one");
        assert_eq!(first_sentences("A! B?", 3), "A! B?");
        assert_eq!(first_sentences("v1.2 is out. Yes.", 3), "v1.2 is out. Yes.");
        assert_eq!(first_sentences("", 3), "");
    }

    #[tokio::test]
    async fn test_extract_over_http_resolves_relative_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/articles/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let source = Source {
            name: "test".into(),
            feed_url: format!("{}/rss", server.uri()),
            base_url: format!("{}/", server.uri()),
            content_selectors: selectors(&["div.article-body"]),
        };
        let extractor = HttpArticleExtractor::new(build_client().unwrap());
        let content = extractor.extract(&source, "/articles/1").await.unwrap();
        assert!(content.summary.starts_with("First sentence here."));
        assert_eq!(
            content.image,
            Some(format!("{}/img/storm.jpg", server.uri()))
        );
    }
}
