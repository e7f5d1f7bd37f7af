//! DuckDuckGo search provider.
//!
//! Queries DuckDuckGo's HTML interface, which needs no API key, and reads
//! result links out of the returned page.

use std::time::Duration;

use percent_encoding::percent_decode_str;
use reqwest::Url;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use super::WebSearch;

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const DDG_BASE_URL: &str = "https://duckduckgo.com/";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Errors from a single search request.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Connection, DNS or body-read failure
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The search request timed out
    #[error("Search timed out")]
    Timeout(#[source] reqwest::Error),

    /// DuckDuckGo answered with a non-success status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },
}

impl SearchError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SearchError::Timeout(error)
        } else {
            SearchError::Network(error)
        }
    }
}

/// Web search backed by DuckDuckGo's HTML results page.
pub struct DuckDuckGoSearch {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    /// Creates a provider whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        Self::with_endpoint(DDG_HTML_URL, timeout)
    }

    /// Creates a provider that posts queries to `endpoint` instead of DuckDuckGo.
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(SearchError::Network)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Runs one search, surfacing failures instead of degrading.
    pub fn try_search(&self, query: &str, num_results: usize) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query)])
            .header("Accept", "text/html")
            .send()
            .map_err(SearchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http {
                status: status.as_u16(),
            });
        }

        let html = response.text().map_err(SearchError::from_reqwest)?;
        Ok(parse_result_urls(&html, num_results))
    }
}

impl WebSearch for DuckDuckGoSearch {
    fn search(&self, query: &str, num_results: usize) -> Vec<String> {
        match self.try_search(query, num_results) {
            Ok(urls) => {
                debug!(count = urls.len(), "search returned results");
                urls
            }
            Err(e) => {
                warn!(error = %e, "web search unavailable, continuing without sources");
                Vec::new()
            }
        }
    }
}

/// Extracts result URLs from a DuckDuckGo HTML results page, in page order.
///
/// Redirect links are unwrapped, non-HTTP links and ads are skipped, and
/// duplicates keep their first position.
fn parse_result_urls(html: &str, max_results: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a.result__a").expect("valid selector");

    let mut urls: Vec<String> = Vec::new();
    for link in document.select(&link_selector) {
        if urls.len() >= max_results {
            break;
        }
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if href.contains("duckduckgo.com/y.js") {
            continue;
        }
        let url = unwrap_redirect(href);
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            debug!(href, "skipping non-http result link");
            continue;
        }
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// Returns the target of a DuckDuckGo redirect link, or `href` unchanged.
fn unwrap_redirect(href: &str) -> String {
    redirect_target(href).unwrap_or_else(|| href.to_string())
}

/// DDG wraps result links as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`.
///
/// Only links on a duckduckgo.com host with path `/l/` are unwrapped, and only
/// from a query parameter named exactly `uddg`.
fn redirect_target(href: &str) -> Option<String> {
    let base = Url::parse(DDG_BASE_URL).ok()?;
    let url = base.join(href).ok()?;

    let host = url.host_str()?;
    let is_ddg = host == "duckduckgo.com" || host.ends_with(".duckduckgo.com");
    if !is_ddg || url.path() != "/l/" {
        return None;
    }

    let encoded = url
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("uddg="))?;
    if encoded.is_empty() {
        return None;
    }
    Some(percent_decode_str(encoded).decode_utf8_lossy().into_owned())
}
