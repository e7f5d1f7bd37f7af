//! Page fetching and readable-text extraction.
//!
//! A [`ContentFetcher`] turns one URL into a bounded excerpt of its paragraph
//! text. Failures come back as [`FetchError`] rather than as text, so an error
//! description can never be mistaken for page content.

mod extract;

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

pub use extract::extract_paragraphs;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Errors from fetching or extracting a single page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or body-read failure
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request timed out
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The resource is not an HTML document
    #[error("Unsupported content type: {content_type}")]
    NotHtml { content_type: String },

    /// The page contained no paragraph text within the budget
    #[error("No readable content")]
    Empty,
}

impl FetchError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout(error)
        } else {
            FetchError::Network(error)
        }
    }
}

/// Retrieves a page and extracts a bounded amount of readable text.
pub trait ContentFetcher: Send + Sync {
    /// Fetches `url` and returns the text of its first `max_paragraphs`
    /// paragraphs, never longer than `max_chars` characters.
    fn fetch_and_extract(
        &self,
        url: &str,
        max_paragraphs: usize,
        max_chars: usize,
    ) -> Result<String, FetchError>;
}

/// [`ContentFetcher`] that performs a plain HTTP GET.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Network)?;
        Ok(Self { client })
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch_and_extract(
        &self,
        url: &str,
        max_paragraphs: usize,
        max_chars: usize,
    ) -> Result<String, FetchError> {
        debug!(url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            && !is_html(content_type)
        {
            return Err(FetchError::NotHtml {
                content_type: content_type.to_string(),
            });
        }

        let html = response.text().map_err(FetchError::from_reqwest)?;
        let content = extract_paragraphs(&html, max_paragraphs, max_chars);
        if content.is_empty() {
            return Err(FetchError::Empty);
        }

        debug!(url, chars = content.chars().count(), "extracted page content");
        Ok(content)
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}
