//! Page fetch tool
//!
//! Downloads a posting page and reduces it to title and visible text.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

use crate::{create_http_client, HttpConfig, WebError};

/// Text content of a fetched page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedPage {
    pub url: String,
    pub title: Option<String>,
    /// Visible text, cut at `max_content_chars`
    pub text: String,
    pub char_count: usize,
    /// True when `text` was cut
    pub truncated: bool,
}

impl ScrapedPage {
    fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }
}

/// Capability: fetch a URL and return its page text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ScrapedPage, WebError>;
}

/// Thread-safe reference to a fetch tool
pub type SharedFetcher = Arc<dyn PageFetcher>;

/// Plain HTTP fetcher with HTML-to-text extraction
pub struct HttpScraper {
    client: Client,
    config: HttpConfig,
}

impl HttpScraper {
    pub fn new(config: HttpConfig) -> Result<Self, WebError> {
        let client = create_http_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PageFetcher for HttpScraper {
    async fn fetch(&self, url: &str) -> Result<ScrapedPage, WebError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(WebError::InvalidUrl(url.to_string()));
        }

        debug!("Fetching: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Fetch of {} returned {}, skipping content", url, status);
            return Ok(ScrapedPage::empty(url));
        }

        let (title, text) = extract_content(&response.text().await?);
        let (text, truncated) = truncate_chars(text, self.config.max_content_chars);

        Ok(ScrapedPage {
            url: url.to_string(),
            title,
            char_count: text.chars().count(),
            text,
            truncated,
        })
    }
}

/// Cut `text` to at most `max_chars` characters
fn truncate_chars(mut text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            (text, true)
        }
        None => (text, false),
    }
}

/// Elements whose text never reaches the reader
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Title and visible body text of an HTML document, whitespace-normalized
fn extract_content(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);
    (page_title(&document), visible_text(&document))
}

fn page_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

fn visible_text(document: &Html) -> String {
    let Some(body) = document.select(&BODY_SELECTOR).next() else {
        return String::new();
    };

    body.descendants()
        .filter(|node| {
            !node
                .ancestors()
                .filter_map(|a| a.value().as_element())
                .any(|el| HIDDEN_TAGS.contains(&el.name()))
        })
        .filter_map(|node| node.value().as_text())
        .flat_map(|text| text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
